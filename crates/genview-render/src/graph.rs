//! Arena scene graph
//!
//! Nodes, geometries, materials, and textures live in separate arenas and refer
//! to each other by `Handle`. Several mesh nodes may share one geometry or
//! material, so disposal walks the graph with a visited set and releases each
//! resource exactly once.

use std::collections::HashSet;

use genview_assets::{MaterialAsset, SceneAsset};
use genview_core::{Color, Mat4, Transform};
use tracing::debug;

use crate::bounds::Aabb;
use crate::handle::Handle;
use crate::lights::Light;
use crate::mesh::Mesh;

/// Vertex data plus its mesh-space bounds
#[derive(Debug, Clone)]
pub struct Geometry {
    pub mesh: Mesh,
    pub bounds: Aabb,
}

impl Geometry {
    pub fn new(mesh: Mesh) -> Self {
        let bounds = mesh.bounds();
        Self { mesh, bounds }
    }
}

/// Metallic-roughness surface material
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: Option<String>,
    pub color: Color,
    pub metalness: f32,
    pub roughness: f32,
    /// Strength of environment reflections
    pub env_map_intensity: f32,
    pub map: Option<Handle<Texture>>,
}

impl Material {
    pub fn standard(color: Color, metalness: f32, roughness: f32) -> Self {
        Self {
            name: None,
            color,
            metalness,
            roughness,
            env_map_intensity: 1.0,
            map: None,
        }
    }
}

/// RGBA8 pixel data
#[derive(Debug, Clone)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Group,
    Mesh {
        geometry: Handle<Geometry>,
        material: Handle<Material>,
    },
    Light(Light),
}

/// A node in the scene hierarchy
#[derive(Debug, Clone)]
pub struct Node {
    pub name: Option<String>,
    pub transform: Transform,
    pub kind: NodeKind,
    pub visible: bool,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    parent: Option<Handle<Node>>,
    children: Vec<Handle<Node>>,
    /// Resources `instantiate` created for this subtree, referenced or not
    owned: Option<OwnedResources>,
}

#[derive(Debug, Clone, Default)]
struct OwnedResources {
    geometries: Vec<Handle<Geometry>>,
    materials: Vec<Handle<Material>>,
    textures: Vec<Handle<Texture>>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            name: None,
            transform: Transform::default(),
            kind,
            visible: true,
            cast_shadow: false,
            receive_shadow: false,
            parent: None,
            children: Vec::new(),
            owned: None,
        }
    }

    pub fn named(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(kind)
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn parent(&self) -> Option<Handle<Node>> {
        self.parent
    }

    pub fn children(&self) -> &[Handle<Node>] {
        &self.children
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self.kind, NodeKind::Mesh { .. })
    }
}

/// Number of resources of each kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    pub geometries: usize,
    pub materials: usize,
    pub textures: usize,
}

impl ResourceCounts {
    pub fn total(&self) -> usize {
        self.geometries + self.materials + self.textures
    }
}

/// One mesh node ready to draw
#[derive(Debug, Clone, Copy)]
pub struct DrawItem {
    pub node: Handle<Node>,
    pub world: Mat4,
    pub geometry: Handle<Geometry>,
    pub material: Handle<Material>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

#[derive(Default)]
struct Visited {
    geometries: HashSet<Handle<Geometry>>,
    materials: HashSet<Handle<Material>>,
    textures: HashSet<Handle<Texture>>,
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<Option<Node>>,
    roots: Vec<Handle<Node>>,
    geometries: Vec<Option<Geometry>>,
    materials: Vec<Option<Material>>,
    textures: Vec<Option<Texture>>,
}

fn get<T>(arena: &[Option<T>], index: usize) -> Option<&T> {
    arena.get(index).and_then(Option::as_ref)
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> Handle<Geometry> {
        self.geometries.push(Some(geometry));
        Handle::new(self.geometries.len() - 1)
    }

    pub fn add_material(&mut self, material: Material) -> Handle<Material> {
        self.materials.push(Some(material));
        Handle::new(self.materials.len() - 1)
    }

    pub fn add_texture(&mut self, texture: Texture) -> Handle<Texture> {
        self.textures.push(Some(texture));
        Handle::new(self.textures.len() - 1)
    }

    pub fn geometry(&self, handle: Handle<Geometry>) -> Option<&Geometry> {
        get(&self.geometries, handle.index())
    }

    pub fn material(&self, handle: Handle<Material>) -> Option<&Material> {
        get(&self.materials, handle.index())
    }

    pub fn material_mut(&mut self, handle: Handle<Material>) -> Option<&mut Material> {
        self.materials.get_mut(handle.index()).and_then(Option::as_mut)
    }

    pub fn texture(&self, handle: Handle<Texture>) -> Option<&Texture> {
        get(&self.textures, handle.index())
    }

    /// Resources that have not been disposed yet
    pub fn live_resources(&self) -> ResourceCounts {
        ResourceCounts {
            geometries: self.geometries.iter().flatten().count(),
            materials: self.materials.iter().flatten().count(),
            textures: self.textures.iter().flatten().count(),
        }
    }

    /// Insert a node under `parent`, or as a root when `parent` is `None` or gone
    pub fn add_node(&mut self, parent: Option<Handle<Node>>, mut node: Node) -> Handle<Node> {
        let handle = Handle::new(self.nodes.len());
        let parent = parent.filter(|p| self.node(*p).is_some());
        node.parent = parent;
        node.children.clear();
        node.owned = None;
        self.nodes.push(Some(node));

        match parent.and_then(|p| self.node_mut(p)) {
            Some(parent) => parent.children.push(handle),
            None => self.roots.push(handle),
        }
        handle
    }

    pub fn node(&self, handle: Handle<Node>) -> Option<&Node> {
        get(&self.nodes, handle.index())
    }

    pub fn node_mut(&mut self, handle: Handle<Node>) -> Option<&mut Node> {
        self.nodes.get_mut(handle.index()).and_then(Option::as_mut)
    }

    pub fn roots(&self) -> &[Handle<Node>] {
        &self.roots
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.node_count() == 0
    }

    /// `start` and everything below it, parents before children
    pub fn descendants(&self, start: Handle<Node>) -> Vec<Handle<Node>> {
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(handle) = stack.pop() {
            if let Some(node) = self.node(handle) {
                out.push(handle);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Every node reachable from the roots
    pub fn traverse(&self) -> Vec<Handle<Node>> {
        self.roots
            .iter()
            .flat_map(|root| self.descendants(*root))
            .collect()
    }

    /// Node-to-world transform
    pub fn world_matrix(&self, handle: Handle<Node>) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = self.node(handle);
        while let Some(node) = current {
            matrix = node.transform.matrix() * matrix;
            current = node.parent.and_then(|p| self.node(p));
        }
        matrix
    }

    /// World-space bounds of every mesh at or below `handle`
    pub fn bounding_box(&self, handle: Handle<Node>) -> Aabb {
        self.descendants(handle)
            .into_iter()
            .filter_map(|h| {
                let geometry = match &self.node(h)?.kind {
                    NodeKind::Mesh { geometry, .. } => *geometry,
                    _ => return None,
                };
                let bounds = self.geometry(geometry)?.bounds;
                Some(bounds.transformed(&self.world_matrix(h)))
            })
            .fold(Aabb::EMPTY, |acc, b| acc.union(&b))
    }

    /// Visible mesh nodes with their world transforms
    pub fn draw_list(&self) -> Vec<DrawItem> {
        let mut items = Vec::new();
        let mut stack: Vec<(Handle<Node>, Mat4)> =
            self.roots.iter().rev().map(|r| (*r, Mat4::IDENTITY)).collect();

        while let Some((handle, parent_world)) = stack.pop() {
            let Some(node) = self.node(handle) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            let world = parent_world * node.transform.matrix();
            if let NodeKind::Mesh { geometry, material } = node.kind {
                items.push(DrawItem {
                    node: handle,
                    world,
                    geometry,
                    material,
                    cast_shadow: node.cast_shadow,
                    receive_shadow: node.receive_shadow,
                });
            }
            stack.extend(node.children.iter().rev().map(|c| (*c, world)));
        }
        items
    }

    /// Build nodes and resources for a loaded asset under a new group node.
    ///
    /// Primitives become child mesh nodes of the glTF node that owns them. A
    /// glTF mesh used by several nodes shares its geometries between them.
    pub fn instantiate(&mut self, asset: &SceneAsset, parent: Option<Handle<Node>>) -> Handle<Node> {
        let textures: Vec<Handle<Texture>> = asset
            .textures
            .iter()
            .map(|t| {
                self.add_texture(Texture {
                    width: t.width,
                    height: t.height,
                    data: t.data.clone(),
                })
            })
            .collect();

        let materials: Vec<Handle<Material>> = asset
            .materials
            .iter()
            .map(|m| self.add_material(material_from_asset(m, &textures)))
            .collect();
        let mut fallback_material = None;
        let mut owned = OwnedResources {
            geometries: Vec::new(),
            materials: materials.clone(),
            textures: textures.clone(),
        };

        let mut geometries = Vec::with_capacity(asset.meshes.len());
        for mesh in &asset.meshes {
            let mut parts = Vec::with_capacity(mesh.primitives.len());
            for primitive in &mesh.primitives {
                let geometry = self.add_geometry(Geometry::new(Mesh::from_primitive(
                    primitive,
                    Color::WHITE.to_array(),
                )));
                owned.geometries.push(geometry);
                let material = match primitive.material.and_then(|i| materials.get(i)) {
                    Some(material) => *material,
                    None => *fallback_material.get_or_insert_with(|| {
                        self.add_material(Material::standard(Color::WHITE, 0.0, 1.0))
                    }),
                };
                parts.push((geometry, material));
            }
            geometries.push(parts);
        }

        owned.materials.extend(fallback_material);
        let root = self.add_node(parent, Node::named("model", NodeKind::Group));

        let mut placed = HashSet::new();
        let mut stack: Vec<(usize, Handle<Node>)> =
            asset.roots.iter().rev().map(|i| (*i, root)).collect();
        while let Some((index, parent)) = stack.pop() {
            // glTF nodes have at most one parent; anything else is a malformed cycle
            if !placed.insert(index) {
                continue;
            }
            let Some(source) = asset.nodes.get(index) else {
                continue;
            };

            let transform = Transform::from_matrix(Mat4::from_cols_array_2d(&source.matrix));
            let mut node = Node::new(NodeKind::Group).with_transform(transform);
            node.name = source.name.clone();
            let handle = self.add_node(Some(parent), node);

            if let Some(parts) = source.mesh.and_then(|m| geometries.get(m)) {
                for (geometry, material) in parts {
                    let geometry = *geometry;
                    let material = *material;
                    self.add_node(Some(handle), Node::new(NodeKind::Mesh { geometry, material }));
                }
            }

            stack.extend(source.children.iter().rev().map(|c| (*c, handle)));
        }

        debug!(
            "Instantiated asset: {} nodes, {} geometries, {} materials, {} textures",
            self.descendants(root).len(),
            geometries.iter().map(Vec::len).sum::<usize>(),
            owned.materials.len(),
            owned.textures.len()
        );
        if let Some(node) = self.node_mut(root) {
            node.owned = Some(owned);
        }
        root
    }

    /// Detach `handle` and its subtree, releasing the resources they reference
    /// and anything `instantiate` created for them
    pub fn remove_subtree(&mut self, handle: Handle<Node>) -> ResourceCounts {
        let Some(node) = self.node(handle) else {
            return ResourceCounts::default();
        };
        match node.parent {
            Some(parent) => {
                if let Some(parent) = self.node_mut(parent) {
                    parent.children.retain(|c| *c != handle);
                }
            }
            None => self.roots.retain(|r| *r != handle),
        }

        let subtree = self.descendants(handle);
        let mut visited = Visited::default();
        let mut released = ResourceCounts::default();
        for node in &subtree {
            self.release_node_resources(*node, &mut visited, &mut released);
        }
        for node in &subtree {
            let owned = self.node_mut(*node).and_then(|n| n.owned.take());
            if let Some(owned) = owned {
                self.release_owned(&owned, &mut visited, &mut released);
            }
        }
        for node in subtree {
            if let Some(slot) = self.nodes.get_mut(node.index()) {
                *slot = None;
            }
        }
        released
    }

    /// Release every geometry, material, and texture exactly once.
    ///
    /// Resources reachable from the hierarchy are released in traversal order,
    /// then any left unreferenced. Nodes stay in place; a second call releases
    /// nothing.
    pub fn dispose_resources(&mut self) -> ResourceCounts {
        let mut visited = Visited::default();
        let mut released = ResourceCounts::default();

        for node in self.traverse() {
            self.release_node_resources(node, &mut visited, &mut released);
        }

        released.geometries += self.geometries.iter_mut().filter_map(Option::take).count();
        released.materials += self.materials.iter_mut().filter_map(Option::take).count();
        released.textures += self.textures.iter_mut().filter_map(Option::take).count();

        if released.total() > 0 {
            debug!(
                "Disposed {} geometries, {} materials, {} textures",
                released.geometries, released.materials, released.textures
            );
        }
        released
    }

    /// Drop all nodes and resources
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
        self.geometries.clear();
        self.materials.clear();
        self.textures.clear();
    }

    fn release_node_resources(
        &mut self,
        handle: Handle<Node>,
        visited: &mut Visited,
        released: &mut ResourceCounts,
    ) {
        let (geometry, material) = match self.node(handle).map(|n| &n.kind) {
            Some(NodeKind::Mesh { geometry, material }) => (*geometry, *material),
            _ => return,
        };

        if visited.geometries.insert(geometry)
            && take(&mut self.geometries, geometry.index()).is_some()
        {
            released.geometries += 1;
        }

        if !visited.materials.insert(material) {
            return;
        }
        let Some(material) = take(&mut self.materials, material.index()) else {
            return;
        };
        released.materials += 1;

        if let Some(texture) = material.map {
            if visited.textures.insert(texture) && take(&mut self.textures, texture.index()).is_some()
            {
                released.textures += 1;
            }
        }
    }

    fn release_owned(
        &mut self,
        owned: &OwnedResources,
        visited: &mut Visited,
        released: &mut ResourceCounts,
    ) {
        for geometry in &owned.geometries {
            if visited.geometries.insert(*geometry)
                && take(&mut self.geometries, geometry.index()).is_some()
            {
                released.geometries += 1;
            }
        }
        for material in &owned.materials {
            if visited.materials.insert(*material)
                && take(&mut self.materials, material.index()).is_some()
            {
                released.materials += 1;
            }
        }
        for texture in &owned.textures {
            if visited.textures.insert(*texture)
                && take(&mut self.textures, texture.index()).is_some()
            {
                released.textures += 1;
            }
        }
    }
}

fn take<T>(arena: &mut [Option<T>], index: usize) -> Option<T> {
    arena.get_mut(index).and_then(Option::take)
}

fn material_from_asset(asset: &MaterialAsset, textures: &[Handle<Texture>]) -> Material {
    Material {
        name: asset.name.clone(),
        color: Color::from(asset.base_color),
        metalness: asset.metallic,
        roughness: asset.roughness,
        env_map_intensity: 1.0,
        map: asset.base_color_texture.and_then(|i| textures.get(i).copied()),
    }
}
