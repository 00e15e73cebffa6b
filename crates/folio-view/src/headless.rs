use anyhow::{Context, Result, bail};
use cgmath::Point3;
use folio_io::{format_point, sample_cube_glb};
use folio_view::{FrameLoop, LOAD_ERROR_MESSAGE, LoadState, RecordingBackend, Viewer};
use std::time::Duration;

use crate::cli::{HeadlessCommand, InspectArgs, ItemsArgs, SampleArgs, load_config, load_portfolio};

const HEADLESS_SIZE: [f32; 2] = [800.0, 600.0];
const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

pub fn run_headless(command: HeadlessCommand) -> Result<()> {
    match command {
        HeadlessCommand::Inspect(args) => inspect(args),
        HeadlessCommand::Items(args) => items(args),
        HeadlessCommand::Sample(args) => sample(args),
    }
}

fn inspect(args: InspectArgs) -> Result<()> {
    let config = load_config(args.config.as_deref(), args.model.as_deref())?;
    let mut viewer = Viewer::new(
        &config,
        RecordingBackend::new(),
        HEADLESS_SIZE[0],
        HEADLESS_SIZE[1],
        1.0,
    );
    viewer.begin_loading(config.model_path.clone());
    if !viewer.wait_for_asset(LOAD_TIMEOUT) {
        bail!("timed out loading {}", config.model_path.display());
    }
    if *viewer.load_state() == LoadState::Failed {
        bail!("{LOAD_ERROR_MESSAGE} ({})", config.model_path.display());
    }

    let mut frame_loop = FrameLoop::new(Some(args.frames));
    frame_loop.run(|_| {
        viewer.tick();
    });

    let model = viewer
        .scene()
        .model()
        .context("model missing after successful load")?;
    println!("model: {}", config.model_path.display());
    println!(
        "meshes: {}  vertices: {}  triangles: {}",
        model.meshes().len(),
        model.vertex_count(),
        model.triangle_count()
    );
    if let Some(offset) = viewer.model_offset() {
        let center = Point3::new(offset.x, offset.y, offset.z);
        println!("original center: {}", format_point(center));
    }
    if let Some(bounds) = model.bounding_box() {
        println!(
            "bounds: [{}] .. [{}]",
            format_point(bounds.min),
            format_point(bounds.max)
        );
    }
    let buffer = viewer.buffer_size();
    println!(
        "frames: {}  aspect: {:.3}  buffer: {}x{}",
        viewer.backend().frames(),
        viewer.camera().aspect(),
        buffer[0],
        buffer[1]
    );
    Ok(())
}

fn items(args: ItemsArgs) -> Result<()> {
    let portfolio = load_portfolio(args.portfolio.as_deref())?;
    if !portfolio.owner.is_empty() {
        println!("{}", portfolio.owner);
    }
    if !portfolio.headline.is_empty() {
        println!("{}", portfolio.headline);
    }
    for (idx, item) in portfolio.items().iter().enumerate() {
        println!("{}. {} | {} | {}", idx + 1, item.title, item.role, item.tools);
        if !item.description.is_empty() {
            println!("   {}", item.description);
        }
    }
    Ok(())
}

fn sample(args: SampleArgs) -> Result<()> {
    if args.size.is_nan() || args.size <= 0.0 {
        bail!("--size must be positive");
    }
    let offset = match args.offset.as_deref() {
        Some(text) => parse_offset(text)?,
        None => [0.0, 0.0, 0.0],
    };
    if let Some(parent) = args.out.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&args.out, sample_cube_glb(args.size, offset))
        .with_context(|| format!("failed to write {}", args.out.display()))?;
    println!("GLB written: {}", args.out.display());
    Ok(())
}

fn parse_offset(text: &str) -> Result<[f32; 3]> {
    let parts: Vec<&str> = text.split(',').collect();
    if parts.len() != 3 {
        bail!("--offset expects three comma-separated numbers, e.g. 0,0.5,0");
    }

    let x: f32 = parts[0].trim().parse().context("invalid x offset")?;
    let y: f32 = parts[1].trim().parse().context("invalid y offset")?;
    let z: f32 = parts[2].trim().parse().context("invalid z offset")?;
    Ok([x, y, z])
}
