use folio_base::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

use crate::glb::parse_glb;
use crate::model::Model;

const READ_CHUNK: usize = 64 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: u64,
    /// Unknown when the file length could not be queried.
    pub total: Option<u64>,
}

impl LoadProgress {
    pub fn percent(&self) -> Option<f64> {
        match self.total {
            Some(0) => Some(100.0),
            Some(total) => Some(self.loaded as f64 / total as f64 * 100.0),
            None => None,
        }
    }
}

#[derive(Debug)]
pub enum LoadEvent {
    Progress(LoadProgress),
    Loaded(Model),
    Failed(Error),
}

impl LoadEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoadEvent::Progress(_))
    }
}

/// Reads a GLB file in fixed-size chunks, reporting progress after each one.
pub fn load_model_file(
    path: impl AsRef<Path>,
    mut on_progress: impl FnMut(LoadProgress),
) -> Result<Model> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    let total = file.metadata().ok().map(|meta| meta.len());
    let mut bytes = Vec::with_capacity(total.unwrap_or(0) as usize);
    let mut buffer = vec![0u8; READ_CHUNK];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        bytes.extend_from_slice(&buffer[..read]);
        on_progress(LoadProgress {
            loaded: bytes.len() as u64,
            total,
        });
    }
    if bytes.is_empty() {
        on_progress(LoadProgress {
            loaded: 0,
            total: Some(0),
        });
    }
    debug!(path = %path.display(), bytes = bytes.len(), "read model file");
    parse_glb(&bytes)
}

/// Loads `path` on a worker thread. Events arrive in order and the stream
/// always ends with exactly one `Loaded` or `Failed`.
pub fn spawn_load(path: impl Into<PathBuf>) -> LoadHandle {
    let path = path.into();
    let (sender, receiver) = mpsc::channel();
    let worker_path = path.clone();
    let worker_sender = sender.clone();
    let spawned = thread::Builder::new()
        .name("folio-asset-loader".to_string())
        .spawn(move || {
            let progress_sender = worker_sender.clone();
            let result = load_model_file(&worker_path, |progress| {
                let _ = progress_sender.send(LoadEvent::Progress(progress));
            });
            let event = match result {
                Ok(model) => {
                    info!(
                        path = %worker_path.display(),
                        meshes = model.meshes().len(),
                        triangles = model.triangle_count(),
                        "model parsed"
                    );
                    LoadEvent::Loaded(model)
                }
                Err(err) => LoadEvent::Failed(err),
            };
            let _ = worker_sender.send(event);
        });
    if let Err(err) = spawned {
        let _ = sender.send(LoadEvent::Failed(Error::Io(err)));
    }
    LoadHandle {
        path,
        receiver,
        finished: false,
    }
}

pub struct LoadHandle {
    path: PathBuf,
    receiver: Receiver<LoadEvent>,
    finished: bool,
}

impl LoadHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Non-blocking; `None` once nothing is pending or the load has finished.
    pub fn try_next(&mut self) -> Option<LoadEvent> {
        if self.finished {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(event) => Some(self.observe(event)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(self.disconnected()),
        }
    }

    pub fn next_timeout(&mut self, timeout: Duration) -> Option<LoadEvent> {
        if self.finished {
            return None;
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Some(self.observe(event)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(self.disconnected()),
        }
    }

    /// Blocks until the terminal event, discarding progress.
    pub fn wait(mut self) -> Result<Model> {
        loop {
            let event = match self.receiver.recv() {
                Ok(event) => event,
                Err(_) => self.disconnected(),
            };
            match event {
                LoadEvent::Progress(_) => continue,
                LoadEvent::Loaded(model) => return Ok(model),
                LoadEvent::Failed(err) => return Err(err),
            }
        }
    }

    fn observe(&mut self, event: LoadEvent) -> LoadEvent {
        if event.is_terminal() {
            self.finished = true;
        }
        event
    }

    fn disconnected(&mut self) -> LoadEvent {
        self.finished = true;
        LoadEvent::Failed(Error::InvalidAsset(format!(
            "loader for {} stopped without a result",
            self.path.display()
        )))
    }
}
