use anyhow::Result;
use clap::Parser;

mod cli;
#[cfg(feature = "gui")]
mod gui;
mod headless;

fn main() -> Result<()> {
    init_tracing();
    let args = cli::CliArgs::parse();
    match args.mode {
        Some(cli::Mode::Headless { command }) => headless::run_headless(command),
        None => run_gui(args.view),
    }
}

#[cfg(feature = "gui")]
fn run_gui(args: cli::ViewArgs) -> Result<()> {
    let config = cli::load_config(args.config.as_deref(), args.model.as_deref())?;
    let portfolio = cli::load_portfolio(args.portfolio.as_deref())?;
    gui::run_gui(gui::GuiOptions {
        config,
        portfolio,
        max_frames: args.max_frames,
    })
}

#[cfg(not(feature = "gui"))]
fn run_gui(_args: cli::ViewArgs) -> Result<()> {
    anyhow::bail!("GUI support disabled. Rebuild with --features gui.");
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
