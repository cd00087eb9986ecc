//! CPU-side mesh representation shared by the loader, primitives and packer.

use bytemuck::{Pod, Zeroable};

/// Vertex with position/normal/uv. Values are in object space.
///
/// `tex_coord` is only meaningful when the owning mesh has
/// [`AttributeSet::tex_coords`] set; otherwise it stays zero and is not packed.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }
}

/// Which optional attributes a mesh carries. Position is always present.
///
/// [`crate::pack`] only emits the attributes flagged here. Meshes from
/// [`crate::load_mesh`] and [`crate::primitives`] always carry normals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AttributeSet {
    pub tex_coords: bool,
    pub normals: bool,
}

impl AttributeSet {
    pub const POSITION_NORMAL: Self = Self {
        tex_coords: false,
        normals: true,
    };
}

/// Indexed triangle list. Indices come in groups of 3.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub attributes: AttributeSet,
}

impl MeshData {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>, attributes: AttributeSet) -> Self {
        Self {
            vertices,
            indices,
            attributes,
        }
    }

    /// Returns `true` if both vertex and index buffers are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty() && !self.indices.is_empty()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Index buffer as raw bytes (`u32`, native endian) for upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
