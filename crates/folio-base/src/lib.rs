use thiserror::Error;

pub mod color;
pub mod config;
pub mod portfolio;

pub use color::HexColor;
pub use config::{
    AmbientLightConfig, CameraConfig, ControlsConfig, DEFAULT_MODEL_PATH, DirectionalLightConfig,
    FolioConfig, LightsConfig, SceneConfig,
};
pub use portfolio::{
    ATTR_DESCRIPTION, ATTR_ROLE, ATTR_TITLE, ATTR_TOOLS, ItemAttributes, Portfolio, PortfolioItem,
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("invalid asset: {0}")]
    InvalidAsset(String),
    #[error("unsupported asset: {0}")]
    UnsupportedAsset(String),
    #[error("a model is already present in the scene")]
    ModelAlreadyLoaded,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
