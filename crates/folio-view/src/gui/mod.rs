mod app;

pub use app::{GuiOptions, run_gui};
