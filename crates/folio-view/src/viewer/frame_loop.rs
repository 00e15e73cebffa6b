use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Cloneable handle that ends a `FrameLoop` from anywhere.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameTick {
    pub index: u64,
}

/// Hands out frames until stopped, optionally capped at `max_frames`.
#[derive(Debug)]
pub struct FrameLoop {
    stop: StopHandle,
    frames: u64,
    max_frames: Option<u64>,
}

impl FrameLoop {
    pub fn new(max_frames: Option<u64>) -> Self {
        let stop = StopHandle::new();
        if max_frames == Some(0) {
            stop.stop();
        }
        Self {
            stop,
            frames: 0,
            max_frames,
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_running(&self) -> bool {
        !self.stop.is_stopped()
    }

    pub fn begin_frame(&mut self) -> Option<FrameTick> {
        if self.stop.is_stopped() {
            return None;
        }
        let tick = FrameTick { index: self.frames };
        self.frames += 1;
        if self.max_frames.is_some_and(|max| self.frames >= max) {
            info!(frames = self.frames, "frame limit reached");
            self.stop.stop();
        }
        Some(tick)
    }

    /// Calls `frame` until the loop is stopped, either through a `StopHandle`
    /// or the frame cap. Returns the number of frames delivered by this call.
    pub fn run(&mut self, mut frame: impl FnMut(FrameTick)) -> u64 {
        let start = self.frames;
        while let Some(tick) = self.begin_frame() {
            frame(tick);
        }
        self.frames - start
    }
}
