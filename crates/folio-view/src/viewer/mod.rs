mod backend;
mod camera;
mod controls;
mod frame_loop;
#[cfg(feature = "gui")]
mod renderer;
mod scene;

pub use backend::{RecordingBackend, RenderBackend, pixel_size};
pub use camera::{OPENGL_TO_WGPU_MATRIX, PerspectiveCamera};
pub use controls::{OrbitControls, ViewerInput};
pub use frame_loop::{FrameLoop, FrameTick, StopHandle};
#[cfg(feature = "gui")]
pub use renderer::SceneRenderer;
pub use scene::{AmbientLight, DirectionalLight, Scene};

use cgmath::{Point3, Vector3};
use folio_base::{Error, FolioConfig, HexColor};
use folio_io::{LoadEvent, LoadHandle, Model, format_point, spawn_load};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub const LOAD_ERROR_MESSAGE: &str =
    "Failed to load 3D model. Please check the file path and console.";
/// Text colour of the load failure message.
pub const LOAD_ERROR_COLOR: HexColor = HexColor(0xff0000);

#[derive(Clone, Debug, PartialEq)]
pub enum LoadState {
    Idle,
    Loading { percent: Option<f64> },
    Loaded,
    Failed,
}

/// Owns the scene, camera, orbit controls and render backend for the model panel.
pub struct Viewer<B: RenderBackend> {
    scene: Scene,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    backend: B,
    size: [f32; 2],
    pixel_ratio: f32,
    loader: Option<LoadHandle>,
    load_path: Option<PathBuf>,
    load_state: LoadState,
    error_message: Option<String>,
    model_offset: Option<Vector3<f32>>,
}

impl<B: RenderBackend> Viewer<B> {
    pub fn new(config: &FolioConfig, mut backend: B, width: f32, height: f32, pixel_ratio: f32) -> Self {
        let camera_config = &config.camera;
        let mut camera = PerspectiveCamera::new(
            camera_config.fov_deg,
            width / height,
            camera_config.near,
            camera_config.far,
        );
        camera.set_position(Point3::from(camera_config.position));
        let mut controls = OrbitControls::new(&config.controls);
        controls.update(&mut camera);

        backend.set_pixel_ratio(pixel_ratio);
        backend.set_size(width, height);
        debug!(
            width,
            height,
            pixel_ratio,
            background = %config.scene.background,
            "viewer initialised"
        );

        Self {
            scene: Scene::from_config(config),
            camera,
            controls,
            backend,
            size: [width, height],
            pixel_ratio,
            loader: None,
            load_path: None,
            load_state: LoadState::Idle,
            error_message: None,
            model_offset: None,
        }
    }

    /// Starts the single background model load. Ignored once a load has started.
    pub fn begin_loading(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if self.load_state != LoadState::Idle {
            warn!(path = %path.display(), "model load already requested; ignoring");
            return;
        }
        info!(path = %path.display(), "loading model");
        self.loader = Some(spawn_load(path.clone()));
        self.load_path = Some(path);
        self.load_state = LoadState::Loading { percent: None };
    }

    /// Drains loader events without blocking. Returns true if the scene changed.
    pub fn poll_asset(&mut self) -> bool {
        let Some(loader) = self.loader.as_mut() else {
            return false;
        };
        let mut events = Vec::new();
        while let Some(event) = loader.try_next() {
            events.push(event);
        }
        if loader.is_finished() {
            self.loader = None;
        }
        let mut changed = false;
        for event in events {
            changed |= self.apply_load_event(event);
        }
        changed
    }

    /// Blocks until the pending load finishes or `timeout` passes. Returns
    /// false on timeout.
    pub fn wait_for_asset(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while let Some(loader) = self.loader.as_mut() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            let event = loader.next_timeout(remaining);
            if loader.is_finished() {
                self.loader = None;
            }
            if let Some(event) = event {
                self.apply_load_event(event);
            }
        }
        true
    }

    /// One frame: advance the controls, then draw.
    pub fn tick(&mut self) -> bool {
        self.poll_asset();
        self.controls.update(&mut self.camera);
        self.backend.render(&self.scene, &self.camera)
    }

    pub fn handle_input(&mut self, input: &ViewerInput) {
        self.controls
            .handle_input(input, &self.camera, self.size[1]);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
            debug!(width, height, "ignoring degenerate viewer size");
            return;
        }
        self.size = [width, height];
        self.camera.set_aspect(width / height);
        self.camera.update_projection_matrix();
        self.backend.set_size(width, height);
        debug!(
            width,
            height,
            buffer = ?self.backend.buffer_size(),
            "viewer resized"
        );
    }

    pub fn set_pixel_ratio(&mut self, ratio: f32) {
        if !(ratio > 0.0 && ratio.is_finite()) {
            return;
        }
        self.pixel_ratio = ratio;
        self.backend.set_pixel_ratio(ratio);
        self.backend.set_size(self.size[0], self.size[1]);
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn size(&self) -> [f32; 2] {
        self.size
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    pub fn buffer_size(&self) -> [u32; 2] {
        self.backend.buffer_size()
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn load_path(&self) -> Option<&Path> {
        self.load_path.as_deref()
    }

    /// Offset subtracted from the model to centre it, once loaded.
    pub fn model_offset(&self) -> Option<Vector3<f32>> {
        self.model_offset
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    fn apply_load_event(&mut self, event: LoadEvent) -> bool {
        match event {
            LoadEvent::Progress(progress) => {
                let percent = progress.percent();
                if let Some(percent) = percent {
                    info!("{percent:.0}% loaded");
                }
                self.load_state = LoadState::Loading { percent };
                false
            }
            LoadEvent::Loaded(model) => self.finish_load(model),
            LoadEvent::Failed(err) => {
                self.fail_load(&err);
                true
            }
        }
    }

    fn finish_load(&mut self, mut model: Model) -> bool {
        let offset = model.center_at_origin();
        match self.scene.add_model(model) {
            Ok(model) => {
                self.backend.upload_model(model);
                info!(
                    meshes = model.meshes().len(),
                    triangles = model.triangle_count(),
                    offset = %format_point(Point3::new(offset.x, offset.y, offset.z)),
                    "model added to scene"
                );
                self.model_offset = Some(offset);
                self.load_state = LoadState::Loaded;
                true
            }
            Err(err) => {
                warn!(error = %err, "discarding loaded model");
                false
            }
        }
    }

    fn fail_load(&mut self, err: &Error) {
        let path = self
            .load_path
            .as_deref()
            .map(|path| path.display().to_string())
            .unwrap_or_default();
        error!(error = %err, path = %path, "failed to load 3D model");
        self.error_message = Some(LOAD_ERROR_MESSAGE.to_string());
        self.load_state = LoadState::Failed;
    }
}
