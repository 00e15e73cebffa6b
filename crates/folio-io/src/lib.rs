pub mod glb;
pub mod loader;
pub mod model;
pub mod sample;

pub use glb::{GlbChunks, assemble_glb, parse_glb, split_glb};
pub use loader::{LoadEvent, LoadHandle, LoadProgress, load_model_file, spawn_load};
pub use model::{Aabb, Model, ModelMesh, format_point};
pub use sample::sample_cube_glb;
