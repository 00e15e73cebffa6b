pub mod modal;
pub mod viewer;

pub use modal::{ClickTarget, ModalController};
#[cfg(feature = "gui")]
pub use viewer::SceneRenderer;
pub use viewer::{
    FrameLoop, FrameTick, LOAD_ERROR_COLOR, LOAD_ERROR_MESSAGE, LoadState, OrbitControls,
    PerspectiveCamera, RecordingBackend, RenderBackend, Scene, StopHandle, Viewer, ViewerInput,
};
