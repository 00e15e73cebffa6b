use cgmath::Matrix4;
use folio_io::Model;

use super::camera::PerspectiveCamera;
use super::scene::Scene;

/// Seam between viewer logic and whatever draws the frame.
pub trait RenderBackend {
    fn set_pixel_ratio(&mut self, ratio: f32);
    /// Logical size; the drawing buffer is this scaled by the pixel ratio.
    fn set_size(&mut self, width: f32, height: f32);
    fn buffer_size(&self) -> [u32; 2];
    fn upload_model(&mut self, model: &Model);
    /// Returns false when nothing was drawn.
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> bool;
}

/// Drawing-buffer size: the scaled logical size, floored, never below one pixel.
pub fn pixel_size(width: f32, height: f32, pixel_ratio: f32) -> [u32; 2] {
    let width = (width * pixel_ratio).floor().max(1.0) as u32;
    let height = (height * pixel_ratio).floor().max(1.0) as u32;
    [width, height]
}

/// Backend that draws nothing and remembers what it was asked to do.
#[derive(Clone, Debug)]
pub struct RecordingBackend {
    pixel_ratio: f32,
    size: [f32; 2],
    uploads: usize,
    uploaded_triangles: usize,
    frames: u64,
    last_view_projection: Option<Matrix4<f32>>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self {
            pixel_ratio: 1.0,
            size: [1.0, 1.0],
            uploads: 0,
            uploaded_triangles: 0,
            frames: 0,
            last_view_projection: None,
        }
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    pub fn size(&self) -> [f32; 2] {
        self.size
    }

    pub fn uploads(&self) -> usize {
        self.uploads
    }

    pub fn uploaded_triangles(&self) -> usize {
        self.uploaded_triangles
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_view_projection(&self) -> Option<Matrix4<f32>> {
        self.last_view_projection
    }
}

impl RenderBackend for RecordingBackend {
    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = ratio;
    }

    fn set_size(&mut self, width: f32, height: f32) {
        self.size = [width, height];
    }

    fn buffer_size(&self) -> [u32; 2] {
        pixel_size(self.size[0], self.size[1], self.pixel_ratio)
    }

    fn upload_model(&mut self, model: &Model) {
        self.uploads += 1;
        self.uploaded_triangles = model.triangle_count();
    }

    fn render(&mut self, _scene: &Scene, camera: &PerspectiveCamera) -> bool {
        self.frames += 1;
        self.last_view_projection = Some(camera.view_projection());
        true
    }
}
