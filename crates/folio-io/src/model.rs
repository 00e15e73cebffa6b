use cgmath::{Point3, Vector3};

#[derive(Clone, Debug, PartialEq)]
pub struct ModelMesh {
    pub name: Option<String>,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub base_color: [f32; 4],
}

impl ModelMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Loaded geometry plus the root translation applied when placed in a scene.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    meshes: Vec<ModelMesh>,
    position: Vector3<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Model {
    pub fn new(meshes: Vec<ModelMesh>) -> Self {
        Self {
            meshes,
            position: Vector3::new(0.0, 0.0, 0.0),
        }
    }

    pub fn meshes(&self) -> &[ModelMesh] {
        &self.meshes
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.position = position;
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.positions.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(ModelMesh::triangle_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.triangle_count() == 0
    }

    /// Bounds of the raw geometry, ignoring `position`.
    pub fn local_bounds(&self) -> Option<Aabb> {
        Aabb::from_points(
            self.meshes
                .iter()
                .flat_map(|mesh| mesh.positions.iter())
                .map(|p| Point3::new(p[0], p[1], p[2])),
        )
    }

    pub fn bounding_box(&self) -> Option<Aabb> {
        self.local_bounds().map(|bounds| bounds.translated(self.position))
    }

    /// Moves the model so its bounding-box centre sits at the origin and
    /// returns the offset that was subtracted.
    pub fn center_at_origin(&mut self) -> Vector3<f32> {
        let Some(bounds) = self.bounding_box() else {
            return Vector3::new(0.0, 0.0, 0.0);
        };
        let center = bounds.center();
        let offset = Vector3::new(center.x, center.y, center.z);
        self.position -= offset;
        offset
    }
}

impl Aabb {
    pub fn from_points(points: impl IntoIterator<Item = Point3<f32>>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self {
            min: first,
            max: first,
        };
        for p in iter {
            bounds.expand(p);
        }
        Some(bounds)
    }

    pub fn expand(&mut self, p: Point3<f32>) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    pub fn center(&self) -> Point3<f32> {
        Point3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn translated(&self, offset: Vector3<f32>) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }
}

pub fn format_point(point: Point3<f32>) -> String {
    format!("{:.3}, {:.3}, {:.3}", point.x, point.y, point.z)
}
