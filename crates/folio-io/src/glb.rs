use cgmath::{Matrix, Matrix3, Matrix4, Quaternion, SquareMatrix, Vector3, Vector4};
use folio_base::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::model::{Model, ModelMesh};

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_VERSION: u32 = 2;
const GLB_HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

const COMPONENT_U8: u32 = 5121;
const COMPONENT_U16: u32 = 5123;
const COMPONENT_U32: u32 = 5125;
const COMPONENT_F32: u32 = 5126;

const MODE_TRIANGLES: u32 = 4;

/// Upper bound on values synthesised for accessors that have no buffer view.
const MAX_UNBACKED_VALUES: usize = 1 << 24;

pub struct GlbChunks {
    pub json: Vec<u8>,
    pub bin: Vec<u8>,
}

pub fn split_glb(bytes: &[u8]) -> Result<GlbChunks> {
    if bytes.len() < GLB_HEADER_LEN + CHUNK_HEADER_LEN {
        return Err(invalid(format!("GLB data too small ({} bytes)", bytes.len())));
    }
    if &bytes[0..4] != GLB_MAGIC {
        return Err(invalid("missing glTF magic".to_string()));
    }
    let version = read_u32(bytes, 4)?;
    if version != GLB_VERSION {
        return Err(Error::UnsupportedAsset(format!("GLB version {version}")));
    }
    let declared = read_u32(bytes, 8)? as usize;
    if declared > bytes.len() {
        return Err(invalid(format!(
            "GLB declares {declared} bytes but only {} are present",
            bytes.len()
        )));
    }

    let mut json = None;
    let mut bin = None;
    let mut offset = GLB_HEADER_LEN;
    while offset + CHUNK_HEADER_LEN <= declared {
        let chunk_len = read_u32(bytes, offset)? as usize;
        let chunk_type = read_u32(bytes, offset + 4)?;
        let start = offset + CHUNK_HEADER_LEN;
        let end = start
            .checked_add(chunk_len)
            .filter(|end| *end <= declared)
            .ok_or_else(|| invalid(format!("chunk at byte {offset} runs past end of file")))?;
        match chunk_type {
            CHUNK_JSON if json.is_none() => json = Some(bytes[start..end].to_vec()),
            CHUNK_BIN if bin.is_none() => bin = Some(bytes[start..end].to_vec()),
            other => debug!(chunk_type = other, "skipping GLB chunk"),
        }
        offset = end;
    }

    let json = json.ok_or_else(|| invalid("GLB has no JSON chunk".to_string()))?;
    Ok(GlbChunks {
        json,
        bin: bin.unwrap_or_default(),
    })
}

/// Packs a JSON document and binary payload into a GLB container.
pub fn assemble_glb(json: &[u8], bin: &[u8]) -> Vec<u8> {
    let json_padded = padded(json, b' ');
    let bin_padded = padded(bin, 0);
    let mut total = GLB_HEADER_LEN + CHUNK_HEADER_LEN + json_padded.len();
    if !bin_padded.is_empty() {
        total += CHUNK_HEADER_LEN + bin_padded.len();
    }

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(GLB_MAGIC);
    out.extend_from_slice(&GLB_VERSION.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json_padded.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&json_padded);
    if !bin_padded.is_empty() {
        out.extend_from_slice(&(bin_padded.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(&bin_padded);
    }
    out
}

pub fn parse_glb(bytes: &[u8]) -> Result<Model> {
    let chunks = split_glb(bytes)?;
    let mut root: GltfRoot = serde_json::from_slice(&chunks.json)?;
    root.bin = chunks.bin;
    build_model(&root)
}

fn build_model(root: &GltfRoot) -> Result<Model> {
    for (idx, buffer) in root.buffers.iter().enumerate() {
        if idx > 0 || buffer.uri.is_some() {
            return Err(Error::UnsupportedAsset(
                "external buffers are not supported in GLB files".to_string(),
            ));
        }
    }

    let mut meshes = Vec::new();
    let mut stack: Vec<(usize, Matrix4<f32>)> = scene_roots(root)?
        .into_iter()
        .rev()
        .map(|idx| (idx, Matrix4::identity()))
        .collect();
    let mut visited = 0usize;

    while let Some((node_idx, parent)) = stack.pop() {
        visited += 1;
        if visited > root.nodes.len() * root.nodes.len().max(1) {
            return Err(invalid("node hierarchy contains a cycle".to_string()));
        }
        let node = root
            .nodes
            .get(node_idx)
            .ok_or_else(|| invalid(format!("node {node_idx} does not exist")))?;
        let world = parent * node_transform(node);

        if let Some(mesh_idx) = node.mesh {
            let mesh = root
                .meshes
                .get(mesh_idx)
                .ok_or_else(|| invalid(format!("mesh {mesh_idx} does not exist")))?;
            for (prim_idx, primitive) in mesh.primitives.iter().enumerate() {
                let mode = primitive.mode.unwrap_or(MODE_TRIANGLES);
                if mode != MODE_TRIANGLES {
                    debug!(mesh = mesh_idx, primitive = prim_idx, mode, "skipping non-triangle primitive");
                    continue;
                }
                let name = node.name.clone().or_else(|| mesh.name.clone());
                meshes.push(build_mesh(root, primitive, world, name)?);
            }
        }

        for child in node.children.iter().rev() {
            stack.push((*child, world));
        }
    }

    Ok(Model::new(meshes))
}

fn scene_roots(root: &GltfRoot) -> Result<Vec<usize>> {
    if let Some(scene_idx) = root.scene {
        let scene = root
            .scenes
            .get(scene_idx)
            .ok_or_else(|| invalid(format!("scene {scene_idx} does not exist")))?;
        return Ok(scene.nodes.clone());
    }
    if let Some(scene) = root.scenes.first() {
        return Ok(scene.nodes.clone());
    }
    let mut is_child = vec![false; root.nodes.len()];
    for node in &root.nodes {
        for child in &node.children {
            if let Some(slot) = is_child.get_mut(*child) {
                *slot = true;
            }
        }
    }
    Ok((0..root.nodes.len()).filter(|idx| !is_child[*idx]).collect())
}

fn build_mesh(
    root: &GltfRoot,
    primitive: &GltfPrimitive,
    world: Matrix4<f32>,
    name: Option<String>,
) -> Result<ModelMesh> {
    let pos_acc = *primitive
        .attributes
        .get("POSITION")
        .ok_or_else(|| invalid("primitive has no POSITION attribute".to_string()))?;
    let positions = read_accessor_vec3(root, pos_acc)?;
    let normals = match primitive.attributes.get("NORMAL") {
        Some(idx) => Some(read_accessor_vec3(root, *idx)?),
        None => None,
    };
    let indices = match primitive.indices {
        Some(idx) => read_accessor_indices(root, idx)?,
        None => (0..positions.len() as u32).collect(),
    };
    if indices.len() % 3 != 0 {
        return Err(invalid(format!(
            "triangle index count {} is not a multiple of three",
            indices.len()
        )));
    }
    if let Some(bad) = indices.iter().find(|idx| **idx as usize >= positions.len()) {
        return Err(invalid(format!(
            "index {bad} out of range for {} vertices",
            positions.len()
        )));
    }

    let positions: Vec<[f32; 3]> = positions
        .iter()
        .map(|p| {
            let v = world * Vector4::new(p[0], p[1], p[2], 1.0);
            [v.x, v.y, v.z]
        })
        .collect();

    let normals = match normals {
        Some(normals) if normals.len() == positions.len() => {
            let normal_matrix = normal_matrix(world);
            normals
                .iter()
                .map(|n| normalize(normal_matrix * Vector3::new(n[0], n[1], n[2])))
                .collect()
        }
        _ => smooth_normals(&positions, &indices),
    };

    let base_color = primitive
        .material
        .and_then(|idx| root.materials.get(idx))
        .and_then(|material| material.pbr_metallic_roughness.as_ref())
        .and_then(|pbr| pbr.base_color_factor)
        .unwrap_or([1.0, 1.0, 1.0, 1.0]);

    Ok(ModelMesh {
        name,
        positions,
        normals,
        indices,
        base_color,
    })
}

fn node_transform(node: &GltfNode) -> Matrix4<f32> {
    if let Some(m) = node.matrix {
        return Matrix4::new(
            m[0], m[1], m[2], m[3], m[4], m[5], m[6], m[7], m[8], m[9], m[10], m[11], m[12],
            m[13], m[14], m[15],
        );
    }
    let t = node.translation.unwrap_or([0.0, 0.0, 0.0]);
    let r = node.rotation.unwrap_or([0.0, 0.0, 0.0, 1.0]);
    let s = node.scale.unwrap_or([1.0, 1.0, 1.0]);

    let trans = Matrix4::from_translation(Vector3::new(t[0], t[1], t[2]));
    let rot = Matrix4::from(Quaternion::new(r[3], r[0], r[1], r[2]));
    let scale = Matrix4::from_nonuniform_scale(s[0], s[1], s[2]);
    trans * rot * scale
}

fn normal_matrix(world: Matrix4<f32>) -> Matrix3<f32> {
    let linear = Matrix3::from_cols(world.x.truncate(), world.y.truncate(), world.z.truncate());
    linear
        .invert()
        .map(|inverse| inverse.transpose())
        .unwrap_or(linear)
}

fn normalize(v: Vector3<f32>) -> [f32; 3] {
    let len = (v.x * v.x + v.y * v.y + v.z * v.z).sqrt();
    if len > 1.0e-9 {
        [v.x / len, v.y / len, v.z / len]
    } else {
        [0.0, 1.0, 0.0]
    }
}

fn smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut sums = vec![Vector3::new(0.0f32, 0.0, 0.0); positions.len()];
    for tri in indices.chunks_exact(3) {
        let [ia, ib, ic] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let a = Vector3::from(positions[ia]);
        let b = Vector3::from(positions[ib]);
        let c = Vector3::from(positions[ic]);
        let n = (b - a).cross(c - a);
        sums[ia] += n;
        sums[ib] += n;
        sums[ic] += n;
    }
    sums.into_iter().map(normalize).collect()
}

fn read_accessor_vec3(root: &GltfRoot, accessor_index: usize) -> Result<Vec<[f32; 3]>> {
    let accessor = accessor(root, accessor_index)?;
    if accessor.component_count()? != 3 {
        return Err(invalid(format!(
            "accessor {accessor_index} is {} but VEC3 was expected",
            accessor.accessor_type
        )));
    }
    let values = read_accessor_f32(root, accessor_index)?;
    Ok(values
        .chunks_exact(3)
        .map(|chunk| [chunk[0], chunk[1], chunk[2]])
        .collect())
}

fn read_accessor_indices(root: &GltfRoot, accessor_index: usize) -> Result<Vec<u32>> {
    let accessor = accessor(root, accessor_index)?;
    let size = accessor.component_size()?;
    let Some(data) = accessor_view(root, accessor, size)? else {
        return Ok(vec![0; unbacked_len(accessor, 1)?]);
    };

    let mut indices = Vec::with_capacity(accessor.count);
    for i in 0..accessor.count {
        let base = data.offset + i * data.stride;
        let bytes = slice(&data.bytes, base, size)?;
        let value = match accessor.component_type {
            COMPONENT_U8 => bytes[0] as u32,
            COMPONENT_U16 => u16::from_le_bytes([bytes[0], bytes[1]]) as u32,
            COMPONENT_U32 => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            other => {
                return Err(Error::UnsupportedAsset(format!(
                    "index component type {other}"
                )));
            }
        };
        indices.push(value);
    }
    Ok(indices)
}

fn read_accessor_f32(root: &GltfRoot, accessor_index: usize) -> Result<Vec<f32>> {
    let accessor = accessor(root, accessor_index)?;
    if accessor.component_type != COMPONENT_F32 {
        return Err(Error::UnsupportedAsset(format!(
            "accessor {accessor_index} component type {} (only float vertex data is supported)",
            accessor.component_type
        )));
    }
    let components = accessor.component_count()?;
    let element = components * 4;
    let Some(data) = accessor_view(root, accessor, element)? else {
        return Ok(vec![0.0; unbacked_len(accessor, components)?]);
    };

    let mut values = Vec::with_capacity(accessor.count * components);
    for i in 0..accessor.count {
        let base = data.offset + i * data.stride;
        let bytes = slice(&data.bytes, base, element)?;
        for chunk in bytes.chunks_exact(4) {
            values.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        }
    }
    Ok(values)
}

struct AccessorData<'a> {
    bytes: &'a [u8],
    offset: usize,
    stride: usize,
}

fn accessor(root: &GltfRoot, index: usize) -> Result<&GltfAccessor> {
    root.accessors
        .get(index)
        .ok_or_else(|| invalid(format!("accessor {index} does not exist")))
}

fn accessor_view<'a>(
    root: &'a GltfRoot,
    accessor: &GltfAccessor,
    element_size: usize,
) -> Result<Option<AccessorData<'a>>> {
    let Some(view_idx) = accessor.buffer_view else {
        return Ok(None);
    };
    let view = root
        .buffer_views
        .get(view_idx)
        .ok_or_else(|| invalid(format!("buffer view {view_idx} does not exist")))?;
    if view.buffer != 0 {
        return Err(Error::UnsupportedAsset(format!(
            "buffer view {view_idx} references buffer {}",
            view.buffer
        )));
    }
    let start = view.byte_offset.unwrap_or(0);
    let bytes = slice(&root.bin, start, view.byte_length)?;
    let offset = accessor.byte_offset.unwrap_or(0);
    let stride = view.byte_stride.unwrap_or(element_size);
    if stride < element_size {
        return Err(invalid(format!(
            "buffer view {view_idx} stride {stride} is smaller than element size {element_size}"
        )));
    }

    // Last element must end inside the view: offset + (count - 1) * stride + element.
    if let Some(last) = accessor.count.checked_sub(1) {
        let end = last
            .checked_mul(stride)
            .and_then(|span| span.checked_add(offset))
            .and_then(|span| span.checked_add(element_size));
        if !end.is_some_and(|end| end <= bytes.len()) {
            return Err(invalid(format!(
                "accessor with {} elements overruns buffer view {view_idx} of {} bytes",
                accessor.count,
                bytes.len()
            )));
        }
    }

    Ok(Some(AccessorData {
        bytes,
        offset,
        stride,
    }))
}

fn unbacked_len(accessor: &GltfAccessor, components: usize) -> Result<usize> {
    accessor
        .count
        .checked_mul(components)
        .filter(|len| *len <= MAX_UNBACKED_VALUES)
        .ok_or_else(|| {
            invalid(format!(
                "accessor without buffer view declares {} elements",
                accessor.count
            ))
        })
}

fn slice(bytes: &[u8], start: usize, len: usize) -> Result<&[u8]> {
    start
        .checked_add(len)
        .and_then(|end| bytes.get(start..end))
        .ok_or_else(|| {
            invalid(format!(
                "range {start}..{} exceeds binary chunk of {} bytes",
                start.saturating_add(len),
                bytes.len()
            ))
        })
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32> {
    let raw = slice(bytes, offset, 4)?;
    Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

fn padded(bytes: &[u8], fill: u8) -> Vec<u8> {
    let mut out = bytes.to_vec();
    while out.len() % 4 != 0 {
        out.push(fill);
    }
    out
}

fn invalid(message: String) -> Error {
    Error::InvalidAsset(message)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfRoot {
    scene: Option<usize>,
    #[serde(default)]
    scenes: Vec<GltfScene>,
    #[serde(default)]
    nodes: Vec<GltfNode>,
    #[serde(default)]
    meshes: Vec<GltfMesh>,
    #[serde(default)]
    accessors: Vec<GltfAccessor>,
    #[serde(default)]
    buffer_views: Vec<GltfBufferView>,
    #[serde(default)]
    buffers: Vec<GltfBuffer>,
    #[serde(default)]
    materials: Vec<GltfMaterial>,
    #[serde(skip)]
    bin: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct GltfScene {
    #[serde(default)]
    nodes: Vec<usize>,
}

#[derive(Debug, Deserialize)]
struct GltfNode {
    name: Option<String>,
    mesh: Option<usize>,
    #[serde(default)]
    children: Vec<usize>,
    rotation: Option<[f32; 4]>,
    translation: Option<[f32; 3]>,
    scale: Option<[f32; 3]>,
    matrix: Option<[f32; 16]>,
}

#[derive(Debug, Deserialize)]
struct GltfMesh {
    name: Option<String>,
    primitives: Vec<GltfPrimitive>,
}

#[derive(Debug, Deserialize)]
struct GltfPrimitive {
    attributes: BTreeMap<String, usize>,
    indices: Option<usize>,
    material: Option<usize>,
    mode: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfAccessor {
    buffer_view: Option<usize>,
    byte_offset: Option<usize>,
    component_type: u32,
    count: usize,
    #[serde(rename = "type")]
    accessor_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfBufferView {
    buffer: usize,
    byte_offset: Option<usize>,
    byte_length: usize,
    byte_stride: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct GltfBuffer {
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfMaterial {
    pbr_metallic_roughness: Option<GltfPbr>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfPbr {
    base_color_factor: Option<[f32; 4]>,
}

impl GltfAccessor {
    fn component_size(&self) -> Result<usize> {
        match self.component_type {
            COMPONENT_F32 | COMPONENT_U32 => Ok(4),
            COMPONENT_U16 | 5122 => Ok(2),
            COMPONENT_U8 | 5120 => Ok(1),
            other => Err(Error::UnsupportedAsset(format!("component type {other}"))),
        }
    }

    fn component_count(&self) -> Result<usize> {
        match self.accessor_type.as_str() {
            "SCALAR" => Ok(1),
            "VEC2" => Ok(2),
            "VEC3" => Ok(3),
            "VEC4" => Ok(4),
            "MAT4" => Ok(16),
            other => Err(Error::UnsupportedAsset(format!("accessor type {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assemble_pads_chunks_to_four_bytes() -> Result<()> {
        let glb = assemble_glb(b"{}", &[1, 2, 3]);
        assert_eq!(glb.len() % 4, 0);
        let chunks = split_glb(&glb)?;
        assert_eq!(chunks.json, b"{}  ");
        assert_eq!(chunks.bin, vec![1, 2, 3, 0]);
        Ok(())
    }

    #[test]
    fn bin_chunk_is_optional() -> Result<()> {
        let chunks = split_glb(&assemble_glb(b"{\"asset\":{}}", &[]))?;
        assert!(chunks.bin.is_empty());
        Ok(())
    }

    #[test]
    fn trs_transform_applies_scale_before_translation() {
        let node = GltfNode {
            name: None,
            mesh: None,
            children: Vec::new(),
            rotation: None,
            translation: Some([1.0, 0.0, 0.0]),
            scale: Some([2.0, 2.0, 2.0]),
            matrix: None,
        };
        let p = node_transform(&node) * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert!((p.x - 3.0).abs() < 1.0e-6);
    }
}
