use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Error, HexColor, Result};

pub const DEFAULT_MODEL_PATH: &str = "assets/models/your-model.glb";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    pub model_path: PathBuf,
    pub scene: SceneConfig,
    pub camera: CameraConfig,
    pub lights: LightsConfig,
    pub controls: ControlsConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub background: HexColor,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightsConfig {
    pub ambient: AmbientLightConfig,
    pub directional: DirectionalLightConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientLightConfig {
    pub color: HexColor,
    pub intensity: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalLightConfig {
    pub color: HexColor,
    pub intensity: f32,
    pub position: [f32; 3],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub screen_space_panning: bool,
    pub min_distance: f32,
    pub max_distance: f32,
    pub target: [f32; 3],
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            scene: SceneConfig::default(),
            camera: CameraConfig::default(),
            lights: LightsConfig::default(),
            controls: ControlsConfig::default(),
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background: HexColor(0x1f1f1f),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_deg: 75.0,
            near: 0.1,
            far: 1000.0,
            position: [0.0, 1.0, 3.0],
        }
    }
}

impl Default for LightsConfig {
    fn default() -> Self {
        Self {
            ambient: AmbientLightConfig::default(),
            directional: DirectionalLightConfig::default(),
        }
    }
}

impl Default for AmbientLightConfig {
    fn default() -> Self {
        Self {
            color: HexColor::WHITE,
            intensity: 0.5,
        }
    }
}

impl Default for DirectionalLightConfig {
    fn default() -> Self {
        Self {
            color: HexColor::WHITE,
            intensity: 1.5,
            position: [5.0, 10.0, 7.5],
        }
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            screen_space_panning: false,
            min_distance: 1.0,
            max_distance: 10.0,
            target: [0.0, 0.5, 0.0],
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
        }
    }
}

impl FolioConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<()> {
        let camera = &self.camera;
        if !(camera.fov_deg > 0.0 && camera.fov_deg < 180.0) {
            return Err(invalid(format!(
                "camera.fov_deg must be in (0, 180), got {}",
                camera.fov_deg
            )));
        }
        if camera.near <= 0.0 || camera.far <= camera.near {
            return Err(invalid(format!(
                "camera clip planes must satisfy 0 < near < far, got near={} far={}",
                camera.near, camera.far
            )));
        }

        let controls = &self.controls;
        if controls.min_distance < 0.0 || controls.max_distance < controls.min_distance {
            return Err(invalid(format!(
                "controls distance bounds must satisfy 0 <= min <= max, got min={} max={}",
                controls.min_distance, controls.max_distance
            )));
        }
        if !(controls.damping_factor > 0.0 && controls.damping_factor <= 1.0) {
            return Err(invalid(format!(
                "controls.damping_factor must be in (0, 1], got {}",
                controls.damping_factor
            )));
        }
        Ok(())
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidParameter(message)
}
