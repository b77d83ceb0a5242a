//! Embedded glTF scenes for tests

/// One triangle (extent 2 x 1 x 0) under a translated parent, with one material
pub const TRIANGLE_GLTF: &str = r#"{
    "asset": { "version": "2.0" },
    "scene": 0,
    "scenes": [ { "nodes": [0] } ],
    "nodes": [
        { "name": "root", "translation": [1.0, 0.0, 0.0], "children": [1] },
        { "name": "triangle", "mesh": 0, "scale": [2.0, 2.0, 2.0] }
    ],
    "meshes": [
        { "name": "tri", "primitives": [ { "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 } ] }
    ],
    "materials": [
        {
            "name": "clay",
            "pbrMetallicRoughness": {
                "baseColorFactor": [0.8, 0.5, 0.3, 1.0],
                "metallicFactor": 0.1,
                "roughnessFactor": 0.9
            }
        }
    ],
    "buffers": [
        {
            "byteLength": 44,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAAAAQAAAAAAAAAAAAAAAAAAAgD8AAAAAAAABAAIAAAA="
        }
    ],
    "bufferViews": [
        { "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 },
        { "buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963 }
    ],
    "accessors": [
        {
            "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
            "min": [0.0, 0.0, 0.0], "max": [2.0, 1.0, 0.0]
        },
        { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
    ]
}"#;

/// Valid glTF with nodes but no geometry
pub const EMPTY_NODE_GLTF: &str = r#"{
    "asset": { "version": "2.0" },
    "scenes": [ { "nodes": [0] } ],
    "nodes": [ { "name": "empty" } ]
}"#;

/// Valid glTF document without any scene
pub const NO_SCENE_GLTF: &str = r#"{ "asset": { "version": "2.0" } }"#;
