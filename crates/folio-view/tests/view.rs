use anyhow::Result;
use folio_base::FolioConfig;
use folio_io::sample_cube_glb;
use folio_view::{
    LOAD_ERROR_COLOR, LOAD_ERROR_MESSAGE, LoadState, RecordingBackend, Viewer, ViewerInput,
};
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const WAIT: Duration = Duration::from_secs(10);

fn temp_path(file_name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    let stamp = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration.as_nanos(),
        Err(_) => 0,
    };
    path.push(format!("folio_view_{stamp}_{file_name}"));
    path
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1.0e-4
}

fn viewer(width: f32, height: f32, ratio: f32) -> Viewer<RecordingBackend> {
    Viewer::new(
        &FolioConfig::default(),
        RecordingBackend::new(),
        width,
        height,
        ratio,
    )
}

#[test]
fn resize_updates_aspect_and_drawing_buffer() {
    let mut viewer = viewer(640.0, 480.0, 2.0);
    assert!(close(viewer.camera().aspect(), 640.0 / 480.0));
    assert_eq!(viewer.buffer_size(), [1280, 960]);

    viewer.resize(1000.0, 250.0);
    assert!(close(viewer.camera().aspect(), 4.0));
    assert_eq!(viewer.buffer_size(), [2000, 500]);
    assert_eq!(viewer.backend().size(), [1000.0, 250.0]);

    viewer.set_pixel_ratio(1.5);
    assert_eq!(viewer.buffer_size(), [1500, 375]);
}

#[test]
fn degenerate_resize_is_ignored() {
    let mut viewer = viewer(800.0, 600.0, 1.0);
    viewer.resize(800.0, 0.0);
    viewer.resize(f32::NAN, 600.0);
    assert_eq!(viewer.size(), [800.0, 600.0]);
    assert!(close(viewer.camera().aspect(), 800.0 / 600.0));
}

#[test]
fn loaded_model_is_centred_at_origin() -> Result<()> {
    let path = temp_path("offset_cube.glb");
    fs::write(&path, sample_cube_glb(1.0, [4.0, -2.0, 1.5]))?;

    let mut viewer = viewer(800.0, 600.0, 1.0);
    viewer.begin_loading(path.clone());
    assert!(viewer.wait_for_asset(WAIT));
    fs::remove_file(&path)?;

    assert_eq!(*viewer.load_state(), LoadState::Loaded);
    assert!(viewer.error_message().is_none());
    let model = viewer
        .scene()
        .model()
        .ok_or_else(|| anyhow::anyhow!("model missing"))?;
    let center = model
        .bounding_box()
        .ok_or_else(|| anyhow::anyhow!("no bounds"))?
        .center();
    assert!(close(center.x, 0.0) && close(center.y, 0.0) && close(center.z, 0.0));

    let offset = viewer
        .model_offset()
        .ok_or_else(|| anyhow::anyhow!("offset missing"))?;
    assert!(close(offset.x, 4.0) && close(offset.y, -2.0) && close(offset.z, 1.5));
    assert_eq!(viewer.backend().uploads(), 1);
    assert_eq!(viewer.backend().uploaded_triangles(), 12);
    Ok(())
}

#[test]
fn missing_model_shows_error_and_leaves_scene_empty() {
    let path = temp_path("does_not_exist.glb");
    let mut viewer = viewer(800.0, 600.0, 1.0);
    viewer.begin_loading(path);
    assert!(viewer.wait_for_asset(WAIT));

    assert_eq!(*viewer.load_state(), LoadState::Failed);
    assert_eq!(viewer.error_message(), Some(LOAD_ERROR_MESSAGE));
    assert_eq!(LOAD_ERROR_COLOR.rgb(), [0xff, 0x00, 0x00]);
    assert!(!viewer.scene().has_model());
    assert_eq!(viewer.backend().uploads(), 0);

    // The render loop keeps running after a failed load.
    assert!(viewer.tick());
    assert_eq!(viewer.backend().frames(), 1);
}

#[test]
fn second_load_request_is_ignored() -> Result<()> {
    let path = temp_path("cube.glb");
    fs::write(&path, sample_cube_glb(1.0, [0.0, 0.0, 0.0]))?;

    let mut viewer = viewer(800.0, 600.0, 1.0);
    viewer.begin_loading(path.clone());
    viewer.begin_loading(temp_path("other.glb"));
    assert_eq!(viewer.load_path(), Some(path.as_path()));
    assert!(viewer.wait_for_asset(WAIT));
    fs::remove_file(&path)?;

    assert_eq!(*viewer.load_state(), LoadState::Loaded);
    assert_eq!(viewer.backend().uploads(), 1);
    Ok(())
}

#[test]
fn tick_renders_and_orbits_camera() {
    let mut viewer = viewer(800.0, 600.0, 1.0);
    let start = viewer.camera().position();
    for _ in 0..3 {
        assert!(viewer.tick());
    }
    assert_eq!(viewer.backend().frames(), 3);
    assert!(viewer.backend().last_view_projection().is_some());

    viewer.handle_input(&ViewerInput {
        pointer_delta: [60.0, 0.0],
        primary_down: true,
        hovered: true,
        ..ViewerInput::default()
    });
    for _ in 0..10 {
        viewer.tick();
    }
    let moved = viewer.camera().position();
    assert!((moved.x - start.x).abs() > 1.0e-3 || (moved.z - start.z).abs() > 1.0e-3);
}
