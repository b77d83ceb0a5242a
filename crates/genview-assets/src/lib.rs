//! Genview Assets - Asset fetching and glTF scene loading
//!
//! Downloads binary glTF payloads off the frame thread, parses them into a
//! renderer-agnostic `SceneAsset`, and discards results of superseded loads.

mod error;
mod fetch;
mod gltf_loader;
mod loader;
mod mesh;
mod texture;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use error::{AssetError, AssetErrorKind};
pub use fetch::{AssetFetcher, FetchMessage, FetchSink, HttpFetcher};
pub use gltf_loader::load_gltf_slice;
pub use loader::{AssetLoader, LoadEvent};
pub use mesh::{AssetNode, MaterialAsset, MeshAsset, MeshPrimitive, SceneAsset};
pub use texture::{to_rgba8, TextureAsset, TextureFormat};
