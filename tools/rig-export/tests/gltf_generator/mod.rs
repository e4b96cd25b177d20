//! Programmatic GLB generation for integration tests.
//!
//! Generates a GLB with:
//! - Armature -> Hips -> Spine (Spine one unit above Hips)
//! - One triangle skinned to both bones (vertices 0 and 1 to Hips, 2 to Spine)
//! - "Bend" animation moving Spine from y=1 to y=2 over one second

use serde_json::{json, Value};

const FLOAT: u32 = 5126;
const UNSIGNED_SHORT: u32 = 5123;
const UNSIGNED_INT: u32 = 5125;

/// Skin joint order, which is also bone registration order
pub const BONE_NAMES: [&str; 2] = ["Hips", "Spine"];

/// Generate the test rig as GLB bytes
pub fn generate_rig_glb() -> Vec<u8> {
    let mut packer = BufferPacker::default();

    let positions = packer.floats(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    let indices = packer.u32s(&[0, 1, 2]);
    let joints = packer.u16s(&[0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0]);
    let weights = packer.floats(&[
        1.0, 0.0, 0.0, 0.0, //
        1.0, 0.0, 0.0, 0.0, //
        1.0, 0.0, 0.0, 0.0,
    ]);
    #[rustfmt::skip]
    let inverse_bind = packer.floats(&[
        // Hips: identity
        1.0, 0.0, 0.0, 0.0,  0.0, 1.0, 0.0, 0.0,  0.0, 0.0, 1.0, 0.0,  0.0, 0.0, 0.0, 1.0,
        // Spine: translate(0, -1, 0), column-major
        1.0, 0.0, 0.0, 0.0,  0.0, 1.0, 0.0, 0.0,  0.0, 0.0, 1.0, 0.0,  0.0, -1.0, 0.0, 1.0,
    ]);
    let times = packer.floats(&[0.0, 1.0]);
    let translations = packer.floats(&[0.0, 1.0, 0.0, 0.0, 2.0, 0.0]);

    let root = json!({
        "asset": { "version": "2.0", "generator": "rig-export tests" },
        "scene": 0,
        "scenes": [{ "nodes": [0, 3] }],
        "nodes": [
            { "name": "Armature", "children": [1] },
            { "name": "Hips", "children": [2] },
            { "name": "Spine", "translation": [0.0, 1.0, 0.0] },
            { "name": "Body", "mesh": 0, "skin": 0 }
        ],
        "meshes": [{
            "name": "body",
            "primitives": [{
                "attributes": { "POSITION": 0, "JOINTS_0": 2, "WEIGHTS_0": 3 },
                "indices": 1
            }]
        }],
        "skins": [{ "joints": [1, 2], "inverseBindMatrices": 4, "skeleton": 1 }],
        "animations": [{
            "name": "Bend",
            "samplers": [{ "input": 5, "output": 6, "interpolation": "LINEAR" }],
            "channels": [{ "sampler": 0, "target": { "node": 2, "path": "translation" } }]
        }],
        "accessors": [
            accessor(positions, FLOAT, 3, "VEC3", Some(([0.0, 0.0, 0.0], [1.0, 1.0, 0.0]))),
            accessor(indices, UNSIGNED_INT, 3, "SCALAR", None),
            accessor(joints, UNSIGNED_SHORT, 3, "VEC4", None),
            accessor(weights, FLOAT, 3, "VEC4", None),
            accessor(inverse_bind, FLOAT, 2, "MAT4", None),
            json!({
                "bufferView": times, "componentType": FLOAT, "count": 2,
                "type": "SCALAR", "min": [0.0], "max": [1.0]
            }),
            accessor(translations, FLOAT, 2, "VEC3", None),
        ],
        "bufferViews": packer.views,
        "buffers": [{ "byteLength": packer.data.len() }]
    });

    assemble_glb(&root, &packer.data)
}

fn accessor(
    view: usize,
    component_type: u32,
    count: usize,
    kind: &str,
    bounds: Option<([f32; 3], [f32; 3])>,
) -> Value {
    let mut accessor = json!({
        "bufferView": view,
        "componentType": component_type,
        "count": count,
        "type": kind
    });
    if let Some((min, max)) = bounds {
        accessor["min"] = json!(min);
        accessor["max"] = json!(max);
    }
    accessor
}

/// Appends 4-byte aligned buffer views to one binary blob
#[derive(Default)]
struct BufferPacker {
    data: Vec<u8>,
    views: Vec<Value>,
}

impl BufferPacker {
    fn push(&mut self, bytes: Vec<u8>) -> usize {
        let offset = self.data.len();
        self.views.push(json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": bytes.len()
        }));
        self.data.extend_from_slice(&bytes);
        while self.data.len() % 4 != 0 {
            self.data.push(0);
        }
        self.views.len() - 1
    }

    fn floats(&mut self, values: &[f32]) -> usize {
        self.push(values.iter().flat_map(|v| v.to_le_bytes()).collect())
    }

    fn u32s(&mut self, values: &[u32]) -> usize {
        self.push(values.iter().flat_map(|v| v.to_le_bytes()).collect())
    }

    fn u16s(&mut self, values: &[u16]) -> usize {
        self.push(values.iter().flat_map(|v| v.to_le_bytes()).collect())
    }
}

/// Assemble the final GLB binary
fn assemble_glb(root: &Value, buffer_data: &[u8]) -> Vec<u8> {
    let json_bytes = serde_json::to_vec(root).expect("Failed to serialize JSON");

    // Pad JSON to 4-byte alignment
    let json_padding = (4 - (json_bytes.len() % 4)) % 4;
    let json_chunk_length = json_bytes.len() + json_padding;

    // Pad buffer to 4-byte alignment
    let buffer_padding = (4 - (buffer_data.len() % 4)) % 4;
    let buffer_chunk_length = buffer_data.len() + buffer_padding;

    let total_length = 12 + 8 + json_chunk_length + 8 + buffer_chunk_length;
    let mut glb = Vec::with_capacity(total_length);

    // Header
    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&(total_length as u32).to_le_bytes());

    // JSON chunk
    glb.extend_from_slice(&(json_chunk_length as u32).to_le_bytes());
    glb.extend_from_slice(&0x4E4F534Au32.to_le_bytes());
    glb.extend_from_slice(&json_bytes);
    glb.extend(std::iter::repeat_n(0x20u8, json_padding));

    // BIN chunk
    glb.extend_from_slice(&(buffer_chunk_length as u32).to_le_bytes());
    glb.extend_from_slice(&0x004E4942u32.to_le_bytes());
    glb.extend_from_slice(buffer_data);
    glb.extend(std::iter::repeat_n(0u8, buffer_padding));

    glb
}
