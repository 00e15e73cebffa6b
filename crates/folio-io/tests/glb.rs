use anyhow::Result;
use folio_base::Error;
use folio_io::{assemble_glb, parse_glb};
use serde_json::{Value, json};

const TRIANGLE: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
const COMPONENT_U8: u32 = 5121;
const COMPONENT_U32: u32 = 5125;

fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|value| value.to_le_bytes()).collect()
}

fn glb(document: Value, bin: &[u8]) -> Vec<u8> {
    assemble_glb(document.to_string().as_bytes(), bin)
}

/// One triangle (`TRIANGLE`) as accessor 0, drawn by `primitives` on the given nodes.
fn triangle_glb(nodes: Value, primitives: Value) -> Vec<u8> {
    let document = json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": nodes,
        "meshes": [{ "primitives": primitives }],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3" }
        ],
        "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
        "buffers": [{ "byteLength": 36 }],
    });
    glb(document, &f32_bytes(&TRIANGLE))
}

fn plain_triangle() -> Vec<u8> {
    triangle_glb(
        json!([{ "mesh": 0 }]),
        json!([{ "attributes": { "POSITION": 0 } }]),
    )
}

fn indexed_triangle(component_type: u32, index_bytes: &[u8]) -> Vec<u8> {
    let mut bin = f32_bytes(&TRIANGLE);
    let index_offset = bin.len();
    bin.extend_from_slice(index_bytes);
    let document = json!({
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0 }],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1 }] }],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3" },
            { "bufferView": 1, "componentType": component_type, "count": 3, "type": "SCALAR" }
        ],
        "bufferViews": [
            { "buffer": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": index_offset, "byteLength": index_bytes.len() }
        ],
        "buffers": [{ "byteLength": bin.len() }],
    });
    glb(document, &bin)
}

fn close3(actual: [f32; 3], expected: [f32; 3]) -> bool {
    actual
        .iter()
        .zip(expected)
        .all(|(a, b)| (a - b).abs() < 1.0e-5)
}

#[test]
fn matrix_transform_is_applied_column_major() -> Result<()> {
    let nodes = json!([{
        "mesh": 0,
        "matrix": [2.0, 0.0, 0.0, 0.0,
                   0.0, 1.0, 0.0, 0.0,
                   0.0, 0.0, 1.0, 0.0,
                   0.0, 0.0, 5.0, 1.0]
    }]);
    let model = parse_glb(&triangle_glb(
        nodes,
        json!([{ "attributes": { "POSITION": 0 } }]),
    ))?;
    let positions = &model.meshes()[0].positions;
    assert!(close3(positions[0], [0.0, 0.0, 5.0]));
    assert!(close3(positions[1], [2.0, 0.0, 5.0]));
    assert!(close3(positions[2], [0.0, 1.0, 5.0]));
    Ok(())
}

#[test]
fn parent_transform_applies_to_child_nodes() -> Result<()> {
    let nodes = json!([
        { "translation": [10.0, 0.0, 0.0], "scale": [2.0, 2.0, 2.0], "children": [1] },
        { "mesh": 0, "translation": [0.0, 1.0, 0.0] }
    ]);
    let model = parse_glb(&triangle_glb(
        nodes,
        json!([{ "attributes": { "POSITION": 0 } }]),
    ))?;
    assert_eq!(model.meshes().len(), 1);
    let positions = &model.meshes()[0].positions;
    assert!(close3(positions[0], [10.0, 2.0, 0.0]));
    assert!(close3(positions[1], [12.0, 2.0, 0.0]));
    Ok(())
}

#[test]
fn interleaved_vertices_honour_byte_stride() -> Result<()> {
    let mut bin = Vec::new();
    for vertex in TRIANGLE.chunks_exact(3) {
        bin.extend(f32_bytes(vertex));
        bin.extend(f32_bytes(&[0.0, 0.0, -1.0]));
    }
    let document = json!({
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0 }],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0, "NORMAL": 1 } }] }],
        "accessors": [
            { "bufferView": 0, "byteOffset": 0, "componentType": 5126, "count": 3, "type": "VEC3" },
            { "bufferView": 0, "byteOffset": 12, "componentType": 5126, "count": 3, "type": "VEC3" }
        ],
        "bufferViews": [{ "buffer": 0, "byteLength": 72, "byteStride": 24 }],
        "buffers": [{ "byteLength": 72 }],
    });
    let model = parse_glb(&glb(document, &bin))?;
    let mesh = &model.meshes()[0];
    assert!(close3(mesh.positions[1], [1.0, 0.0, 0.0]));
    assert!(close3(mesh.positions[2], [0.0, 1.0, 0.0]));
    assert!(mesh.normals.iter().all(|n| close3(*n, [0.0, 0.0, -1.0])));
    Ok(())
}

#[test]
fn u8_indices_are_read() -> Result<()> {
    let model = parse_glb(&indexed_triangle(COMPONENT_U8, &[2, 1, 0]))?;
    assert_eq!(model.meshes()[0].indices, vec![2, 1, 0]);
    Ok(())
}

#[test]
fn u32_indices_are_read() -> Result<()> {
    let bytes: Vec<u8> = [2u32, 1, 0]
        .iter()
        .flat_map(|idx| idx.to_le_bytes())
        .collect();
    let model = parse_glb(&indexed_triangle(COMPONENT_U32, &bytes))?;
    assert_eq!(model.meshes()[0].indices, vec![2, 1, 0]);
    Ok(())
}

#[test]
fn missing_indices_are_sequential() -> Result<()> {
    let model = parse_glb(&plain_triangle())?;
    assert_eq!(model.meshes()[0].indices, vec![0, 1, 2]);
    Ok(())
}

#[test]
fn missing_normals_are_computed_from_winding() -> Result<()> {
    let model = parse_glb(&plain_triangle())?;
    let mesh = &model.meshes()[0];
    assert_eq!(mesh.normals.len(), 3);
    assert!(mesh.normals.iter().all(|n| close3(*n, [0.0, 0.0, 1.0])));
    Ok(())
}

#[test]
fn non_triangle_primitives_are_skipped() -> Result<()> {
    let model = parse_glb(&triangle_glb(
        json!([{ "mesh": 0 }]),
        json!([
            { "attributes": { "POSITION": 0 }, "mode": 1 },
            { "attributes": { "POSITION": 0 }, "mode": 4 }
        ]),
    ))?;
    assert_eq!(model.meshes().len(), 1);
    assert_eq!(model.triangle_count(), 1);
    Ok(())
}

#[test]
fn glb_version_one_is_unsupported() {
    let mut bytes = plain_triangle();
    bytes[4..8].copy_from_slice(&1u32.to_le_bytes());
    assert!(matches!(parse_glb(&bytes), Err(Error::UnsupportedAsset(_))));
}

#[test]
fn external_buffer_uri_is_unsupported() {
    let document = json!({
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0 }],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3" }
        ],
        "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
        "buffers": [{ "uri": "triangle.bin", "byteLength": 36 }],
    });
    assert!(matches!(
        parse_glb(&glb(document, &[])),
        Err(Error::UnsupportedAsset(_))
    ));
}

#[test]
fn node_cycle_is_rejected() {
    let bytes = triangle_glb(
        json!([{ "mesh": 0, "children": [1] }, { "children": [0] }]),
        json!([{ "attributes": { "POSITION": 0 } }]),
    );
    assert!(matches!(parse_glb(&bytes), Err(Error::InvalidAsset(_))));
}

#[test]
fn oversized_accessor_count_overruns_view() {
    let document = json!({
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0 }],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 1_000_000_000_000u64, "type": "VEC3" }
        ],
        "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
        "buffers": [{ "byteLength": 36 }],
    });
    let bytes = glb(document, &f32_bytes(&TRIANGLE));
    assert!(matches!(parse_glb(&bytes), Err(Error::InvalidAsset(_))));
}

#[test]
fn oversized_accessor_without_view_is_rejected() {
    let document = json!({
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0 }],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
        "accessors": [
            { "componentType": 5126, "count": 1_000_000_000_000u64, "type": "VEC3" }
        ],
    });
    assert!(matches!(
        parse_glb(&glb(document, &[])),
        Err(Error::InvalidAsset(_))
    ));
}
