use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use folio_base::{FolioConfig, Portfolio};
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Parser)]
#[command(name = "folio-view")]
#[command(about = "Portfolio browser with a 3D model viewer")]
pub struct CliArgs {
    #[command(subcommand)]
    pub mode: Option<Mode>,
    #[command(flatten)]
    pub view: ViewArgs,
}

#[derive(Subcommand)]
pub enum Mode {
    Headless {
        #[command(subcommand)]
        command: HeadlessCommand,
    },
}

#[derive(Args)]
pub struct ViewArgs {
    /// Portfolio JSON document; the built-in sample is used when absent.
    #[arg(long)]
    pub portfolio: Option<PathBuf>,
    /// GLB model shown in the viewer panel; overrides the config file.
    #[arg(long)]
    pub model: Option<PathBuf>,
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Close the window after this many frames.
    #[arg(long)]
    pub max_frames: Option<u64>,
}

#[derive(Subcommand)]
pub enum HeadlessCommand {
    Inspect(InspectArgs),
    Items(ItemsArgs),
    Sample(SampleArgs),
}

#[derive(Args)]
pub struct InspectArgs {
    #[arg(long)]
    pub model: Option<PathBuf>,
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Frames to run after loading.
    #[arg(long, default_value_t = 1)]
    pub frames: u64,
}

#[derive(Args)]
pub struct ItemsArgs {
    #[arg(long)]
    pub portfolio: Option<PathBuf>,
}

#[derive(Args)]
pub struct SampleArgs {
    #[arg(long)]
    pub out: PathBuf,
    #[arg(long, default_value_t = 1.0)]
    pub size: f32,
    /// Node translation, e.g. 0,0.5,0
    #[arg(long)]
    pub offset: Option<String>,
}

pub fn load_config(config: Option<&Path>, model: Option<&Path>) -> Result<FolioConfig> {
    let mut settings = match config {
        Some(path) => FolioConfig::load(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => FolioConfig::default(),
    };
    if let Some(model) = model {
        settings.model_path = model.to_path_buf();
    }
    Ok(settings)
}

/// A missing file falls back to the built-in sample; a malformed one is an error.
pub fn load_portfolio(path: Option<&Path>) -> Result<Portfolio> {
    match path {
        Some(path) if path.exists() => Portfolio::load(path)
            .with_context(|| format!("failed to read portfolio {}", path.display())),
        Some(path) => {
            warn!(path = %path.display(), "portfolio file not found; using built-in sample");
            Ok(Portfolio::sample()?)
        }
        None => Ok(Portfolio::sample()?),
    }
}
