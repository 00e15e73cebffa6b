use cgmath::{InnerSpace, Point3, Vector3};
use folio_base::{Error, FolioConfig, HexColor, Result};
use folio_io::Model;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientLight {
    pub color: HexColor,
    pub intensity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub color: HexColor,
    pub intensity: f32,
    pub position: Point3<f32>,
    pub target: Point3<f32>,
}

impl DirectionalLight {
    /// Unit vector from the lit surface towards the light.
    pub fn direction_to_light(&self) -> Vector3<f32> {
        let dir = self.position - self.target;
        if dir.magnitude2() <= f32::EPSILON {
            Vector3::unit_y()
        } else {
            dir.normalize()
        }
    }
}

/// Background, the two fixed lights and at most one model.
#[derive(Debug)]
pub struct Scene {
    background: HexColor,
    ambient: AmbientLight,
    directional: DirectionalLight,
    model: Option<Model>,
}

impl Scene {
    pub fn from_config(config: &FolioConfig) -> Self {
        let lights = &config.lights;
        Self {
            background: config.scene.background,
            ambient: AmbientLight {
                color: lights.ambient.color,
                intensity: lights.ambient.intensity,
            },
            directional: DirectionalLight {
                color: lights.directional.color,
                intensity: lights.directional.intensity,
                position: Point3::from(lights.directional.position),
                target: Point3::new(0.0, 0.0, 0.0),
            },
            model: None,
        }
    }

    pub fn background(&self) -> HexColor {
        self.background
    }

    pub fn ambient(&self) -> &AmbientLight {
        &self.ambient
    }

    pub fn directional(&self) -> &DirectionalLight {
        &self.directional
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// The slot is filled once; later models are rejected.
    pub fn add_model(&mut self, model: Model) -> Result<&Model> {
        if self.model.is_some() {
            return Err(Error::ModelAlreadyLoaded);
        }
        Ok(self.model.insert(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_io::{parse_glb, sample_cube_glb};

    #[test]
    fn lights_come_from_config() {
        let scene = Scene::from_config(&FolioConfig::default());
        assert_eq!(scene.background(), HexColor(0x1f1f1f));
        assert_eq!(scene.ambient().intensity, 0.5);
        assert_eq!(scene.directional().intensity, 1.5);
        let dir = scene.directional().direction_to_light();
        assert!(dir.y > 0.0 && (dir.magnitude() - 1.0).abs() < 1.0e-5);
    }

    #[test]
    fn second_model_is_rejected() -> Result<()> {
        let mut scene = Scene::from_config(&FolioConfig::default());
        let model = parse_glb(&sample_cube_glb(1.0, [0.0; 3]))?;
        scene.add_model(model.clone())?;
        assert!(matches!(scene.add_model(model), Err(Error::ModelAlreadyLoaded)));
        assert!(scene.has_model());
        Ok(())
    }
}
