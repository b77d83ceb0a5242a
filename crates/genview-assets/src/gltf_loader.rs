use tracing::debug;

use crate::error::AssetError;
use crate::mesh::{AssetNode, MaterialAsset, MeshAsset, MeshPrimitive, SceneAsset};
use crate::texture::TextureAsset;

/// Parse an in-memory glTF 2.0 document (.gltf JSON with embedded buffers, or .glb).
///
/// `source` is only used to label errors and logs.
pub fn load_gltf_slice(source: &str, bytes: &[u8]) -> Result<SceneAsset, AssetError> {
    if bytes.is_empty() {
        return Err(AssetError::malformed(source, "empty payload"));
    }

    let (document, buffers, images) =
        gltf::import_slice(bytes).map_err(|e| AssetError::malformed(source, e))?;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| AssetError::EmptyScene {
            url: source.to_string(),
        })?;

    // Extract images; unsupported ones leave a gap that materials skip over.
    let mut textures = Vec::new();
    let mut image_slots = Vec::with_capacity(images.len());
    for image_data in &images {
        match TextureAsset::from_gltf(image_data) {
            Some(texture) => {
                image_slots.push(Some(textures.len()));
                textures.push(texture);
            }
            None => image_slots.push(None),
        }
    }

    let materials = document
        .materials()
        .map(|material| {
            let pbr = material.pbr_metallic_roughness();
            MaterialAsset {
                name: material.name().map(str::to_owned),
                base_color: pbr.base_color_factor(),
                metallic: pbr.metallic_factor(),
                roughness: pbr.roughness_factor(),
                base_color_texture: pbr
                    .base_color_texture()
                    .and_then(|info| image_slots.get(info.texture().source().index()).copied().flatten()),
            }
        })
        .collect();

    // Extract meshes.
    let mut meshes = Vec::new();
    for mesh in document.meshes() {
        let name = mesh.name().unwrap_or("unnamed").to_string();

        let mut primitives = Vec::new();
        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .map(|iter| iter.collect())
                .unwrap_or_default();

            let normals: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|iter| iter.collect())
                .unwrap_or_default();

            let tex_coords: Option<Vec<[f32; 2]>> = reader
                .read_tex_coords(0)
                .map(|tc| tc.into_f32().collect());

            let colors: Option<Vec<[f32; 4]>> = reader
                .read_colors(0)
                .map(|c| c.into_rgba_f32().collect());

            let indices: Option<Vec<u32>> = reader
                .read_indices()
                .map(|idx| idx.into_u32().collect());

            primitives.push(MeshPrimitive {
                positions,
                normals,
                tex_coords,
                colors,
                indices,
                material: primitive.material().index(),
            });
        }

        debug!("Loaded mesh '{}' with {} primitives", name, primitives.len());
        meshes.push(MeshAsset { name, primitives });
    }

    let nodes = document
        .nodes()
        .map(|node| AssetNode {
            name: node.name().map(str::to_owned),
            matrix: node.transform().matrix(),
            mesh: node.mesh().map(|m| m.index()),
            children: node.children().map(|c| c.index()).collect(),
        })
        .collect();

    let roots = scene.nodes().map(|n| n.index()).collect();

    let asset = SceneAsset {
        nodes,
        roots,
        meshes,
        materials,
        textures,
    };

    debug!(
        "glTF '{}': {} meshes, {} primitives, {} vertices, {} textures",
        source,
        asset.meshes.len(),
        asset.primitive_count(),
        asset.vertex_count(),
        asset.textures.len()
    );

    Ok(asset)
}
