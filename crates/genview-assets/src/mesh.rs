use crate::texture::TextureAsset;

/// A parsed glTF scene (renderer-agnostic). Node, mesh, material, and texture
/// references are indices into the vectors of this struct.
#[derive(Debug, Clone, Default)]
pub struct SceneAsset {
    pub nodes: Vec<AssetNode>,
    /// Top-level nodes of the scene that was selected for display
    pub roots: Vec<usize>,
    pub meshes: Vec<MeshAsset>,
    pub materials: Vec<MaterialAsset>,
    pub textures: Vec<TextureAsset>,
}

impl SceneAsset {
    /// Total vertex count across all primitives
    pub fn vertex_count(&self) -> usize {
        self.meshes
            .iter()
            .flat_map(|m| &m.primitives)
            .map(|p| p.positions.len())
            .sum()
    }

    pub fn primitive_count(&self) -> usize {
        self.meshes.iter().map(|m| m.primitives.len()).sum()
    }
}

/// One node of the asset's hierarchy
#[derive(Debug, Clone)]
pub struct AssetNode {
    pub name: Option<String>,
    /// Local transform, column-major
    pub matrix: [[f32; 4]; 4],
    pub mesh: Option<usize>,
    pub children: Vec<usize>,
}

/// A loaded mesh asset. Contains raw vertex data extracted from a glTF file.
#[derive(Debug, Clone)]
pub struct MeshAsset {
    pub name: String,
    pub primitives: Vec<MeshPrimitive>,
}

/// A single draw primitive within a mesh.
#[derive(Debug, Clone)]
pub struct MeshPrimitive {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Option<Vec<[f32; 2]>>,
    pub colors: Option<Vec<[f32; 4]>>,
    pub indices: Option<Vec<u32>>,
    pub material: Option<usize>,
}

/// Metallic-roughness material parameters
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialAsset {
    pub name: Option<String>,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub base_color_texture: Option<usize>,
}
