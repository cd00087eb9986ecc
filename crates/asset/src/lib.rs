//! Asset loading: OBJ meshes, normal synthesis, vertex packing, primitives.
//!
//! The usual entry point is [`load_mesh`], which runs the whole pipeline and
//! returns CPU-side [`MeshData`]; [`pack`] turns that into upload-ready bytes.

pub mod assemble;
pub mod error;
pub mod layout;
pub mod loader;
pub mod mesh;
pub mod normals;
pub mod obj;
pub mod primitives;
pub mod scan;

pub use assemble::AssemblyMode;
pub use error::{AssetError, AssetResult};
pub use layout::{PackedVertices, VertexAttribute, VertexLayout, VertexPacking, VertexStream, pack};
pub use loader::{LoadOptions, load_mesh, load_mesh_from_str};
pub use mesh::{AttributeSet, MeshData, Vertex};
pub use obj::NgonPolicy;
pub use scan::list_obj_files;
