use serde_json::json;

use crate::glb::assemble_glb;

const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    // normal, u axis, v axis
    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
];

/// Builds a GLB holding one cube of edge `size`, translated by `offset` at the node level.
pub fn sample_cube_glb(size: f32, offset: [f32; 3]) -> Vec<u8> {
    let half = size * 0.5;
    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(24);
    let mut normals: Vec<[f32; 3]> = Vec::with_capacity(24);
    let mut indices: Vec<u16> = Vec::with_capacity(36);

    for (normal, u, v) in FACES {
        let base = positions.len() as u16;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            positions.push([
                (normal[0] + u[0] * su + v[0] * sv) * half,
                (normal[1] + u[1] * su + v[1] * sv) * half,
                (normal[2] + u[2] * su + v[2] * sv) * half,
            ]);
            normals.push(normal);
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    let mut bin = Vec::new();
    for p in &positions {
        for c in p {
            bin.extend_from_slice(&c.to_le_bytes());
        }
    }
    let normals_offset = bin.len();
    for n in &normals {
        for c in n {
            bin.extend_from_slice(&c.to_le_bytes());
        }
    }
    let indices_offset = bin.len();
    for i in &indices {
        bin.extend_from_slice(&i.to_le_bytes());
    }
    let indices_len = bin.len() - indices_offset;

    let document = json!({
        "asset": { "version": "2.0", "generator": "folio-io sample" },
        "scene": 0,
        "scenes": [ { "nodes": [0] } ],
        "nodes": [ { "name": "cube", "mesh": 0, "translation": offset } ],
        "meshes": [ {
            "name": "cube",
            "primitives": [ {
                "attributes": { "POSITION": 0, "NORMAL": 1 },
                "indices": 2,
                "material": 0
            } ]
        } ],
        "materials": [ {
            "pbrMetallicRoughness": { "baseColorFactor": [0.8, 0.55, 0.3, 1.0] }
        } ],
        "accessors": [
            {
                "bufferView": 0, "componentType": 5126, "count": positions.len(), "type": "VEC3",
                "min": [-half, -half, -half], "max": [half, half, half]
            },
            { "bufferView": 1, "componentType": 5126, "count": normals.len(), "type": "VEC3" },
            { "bufferView": 2, "componentType": 5123, "count": indices.len(), "type": "SCALAR" }
        ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": normals_offset },
            { "buffer": 0, "byteOffset": normals_offset, "byteLength": indices_offset - normals_offset },
            { "buffer": 0, "byteOffset": indices_offset, "byteLength": indices_len }
        ],
        "buffers": [ { "byteLength": bin.len() } ]
    });

    assemble_glb(document.to_string().as_bytes(), &bin)
}
