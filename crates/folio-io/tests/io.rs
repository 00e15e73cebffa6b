use anyhow::Result;
use folio_base::Error;
use folio_io::{LoadEvent, LoadProgress, load_model_file, parse_glb, sample_cube_glb, spawn_load};
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    let stamp = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration.as_nanos(),
        Err(_) => 0,
    };
    path.push(format!("folio_{stamp}_{file_name}"));
    path
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1.0e-5
}

#[test]
fn sample_cube_parses_with_normals_and_colour() -> Result<()> {
    let model = parse_glb(&sample_cube_glb(1.0, [0.0, 0.0, 0.0]))?;
    assert_eq!(model.meshes().len(), 1);
    assert_eq!(model.vertex_count(), 24);
    assert_eq!(model.triangle_count(), 12);

    let mesh = &model.meshes()[0];
    assert_eq!(mesh.name.as_deref(), Some("cube"));
    assert_eq!(mesh.normals.len(), mesh.positions.len());
    assert!(close(mesh.base_color[0], 0.8));
    Ok(())
}

#[test]
fn node_translation_moves_bounds() -> Result<()> {
    let model = parse_glb(&sample_cube_glb(2.0, [3.0, 1.0, -2.0]))?;
    let bounds = model.bounding_box().ok_or_else(|| anyhow::anyhow!("no bounds"))?;
    let center = bounds.center();
    assert!(close(center.x, 3.0) && close(center.y, 1.0) && close(center.z, -2.0));
    assert!(close(bounds.size().x, 2.0));
    Ok(())
}

#[test]
fn centering_puts_bounding_box_at_origin() -> Result<()> {
    let mut model = parse_glb(&sample_cube_glb(2.0, [3.0, 1.0, -2.0]))?;
    let offset = model.center_at_origin();
    assert!(close(offset.x, 3.0) && close(offset.y, 1.0) && close(offset.z, -2.0));

    let bounds = model.bounding_box().ok_or_else(|| anyhow::anyhow!("no bounds"))?;
    let center = bounds.center();
    assert!(close(center.x, 0.0) && close(center.y, 0.0) && close(center.z, 0.0));
    assert!(close(model.position().x, -3.0));
    Ok(())
}

#[test]
fn bad_magic_is_rejected() {
    let mut bytes = sample_cube_glb(1.0, [0.0; 3]);
    bytes[0] = b'x';
    assert!(matches!(parse_glb(&bytes), Err(Error::InvalidAsset(_))));
}

#[test]
fn truncated_file_is_rejected() {
    let bytes = sample_cube_glb(1.0, [0.0; 3]);
    let truncated = &bytes[..bytes.len() / 2];
    assert!(matches!(parse_glb(truncated), Err(Error::InvalidAsset(_))));
}

#[test]
fn missing_file_reports_io_error() {
    let path = temp_path("does_not_exist.glb");
    let result = load_model_file(&path, |_| {});
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn progress_is_monotone_and_reaches_full() -> Result<()> {
    let path = temp_path("large.bin");
    fs::write(&path, vec![0u8; 200 * 1024])?;

    let mut seen: Vec<LoadProgress> = Vec::new();
    let result = load_model_file(&path, |progress| seen.push(progress));
    let _ = fs::remove_file(&path);

    assert!(result.is_err());
    assert!(seen.len() >= 4);
    assert!(seen.windows(2).all(|pair| pair[0].loaded <= pair[1].loaded));
    let last = seen.last().and_then(LoadProgress::percent);
    assert_eq!(last, Some(100.0));
    Ok(())
}

#[test]
fn spawned_load_ends_with_loaded_model() -> Result<()> {
    let path = temp_path("cube.glb");
    fs::write(&path, sample_cube_glb(1.0, [0.0, 0.5, 0.0]))?;

    let mut handle = spawn_load(path.clone());
    let mut progress = 0;
    let terminal = loop {
        match handle.next_timeout(Duration::from_secs(5)) {
            Some(LoadEvent::Progress(_)) => progress += 1,
            Some(other) => break other,
            None => anyhow::bail!("loader timed out"),
        }
    };
    let _ = fs::remove_file(&path);

    assert!(progress >= 1);
    assert!(matches!(terminal, LoadEvent::Loaded(ref model) if model.triangle_count() == 12));
    assert!(handle.is_finished());
    assert!(handle.try_next().is_none());
    Ok(())
}

#[test]
fn spawned_load_of_missing_file_fails() {
    let handle = spawn_load(temp_path("missing.glb"));
    assert!(matches!(handle.wait(), Err(Error::Io(_))));
}
