//! GPU-ready vertex packing and the attribute layout that describes it.
//!
//! The layout is graphics-API agnostic: each stream is a slice of one byte
//! buffer starting at `buffer_offset`, with `stride` bytes per vertex.
//! Attribute locations are fixed: 0 = position, 1 = normal, 2 = tex_coord.

use crate::mesh::MeshData;

pub const LOCATION_POSITION: u32 = 0;
pub const LOCATION_NORMAL: u32 = 1;
pub const LOCATION_TEX_COORD: u32 = 2;

const F32_SIZE: u64 = std::mem::size_of::<f32>() as u64;

/// How vertex attributes are laid out in the vertex buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VertexPacking {
    /// One stream, all attributes of a vertex side by side.
    #[default]
    Interleaved,
    /// One stream per attribute: all positions, then all normals, then uvs.
    Planar,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub location: u32,
    /// Number of `f32` components.
    pub components: u32,
    /// Byte offset inside one stride.
    pub offset: u64,
}

impl VertexAttribute {
    #[inline]
    pub fn size(&self) -> u64 {
        self.components as u64 * F32_SIZE
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VertexStream {
    pub buffer_offset: u64,
    pub stride: u64,
    pub attributes: Vec<VertexAttribute>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    pub streams: Vec<VertexStream>,
}

impl VertexLayout {
    pub fn attribute(&self, location: u32) -> Option<(&VertexStream, &VertexAttribute)> {
        self.streams.iter().find_map(|s| {
            s.attributes
                .iter()
                .find(|a| a.location == location)
                .map(|a| (s, a))
        })
    }

    /// The same layout with every `buffer_offset` zeroed.
    ///
    /// Two meshes with equal shapes can share a pipeline: offsets only
    /// matter when binding buffers, and planar offsets grow with the
    /// vertex count.
    pub fn shape(&self) -> VertexLayout {
        VertexLayout {
            streams: self
                .streams
                .iter()
                .map(|s| VertexStream {
                    buffer_offset: 0,
                    ..s.clone()
                })
                .collect(),
        }
    }
}

/// Packed vertex bytes plus the layout needed to bind them.
#[derive(Clone, Debug, PartialEq)]
pub struct PackedVertices {
    pub bytes: Vec<u8>,
    pub layout: VertexLayout,
    pub vertex_count: usize,
}

/// (location, components) of every attribute the mesh carries, in order.
fn attribute_list(mesh: &MeshData) -> Vec<(u32, u32)> {
    let mut list = vec![(LOCATION_POSITION, 3)];
    if mesh.attributes.normals {
        list.push((LOCATION_NORMAL, 3));
    }
    if mesh.attributes.tex_coords {
        list.push((LOCATION_TEX_COORD, 2));
    }
    list
}

fn components_of(mesh: &MeshData, location: u32, i: usize) -> &[f32] {
    let v = &mesh.vertices[i];
    match location {
        LOCATION_POSITION => &v.position,
        LOCATION_NORMAL => &v.normal,
        _ => &v.tex_coord,
    }
}

/// Pack `mesh` vertices into bytes according to `packing`.
pub fn pack(mesh: &MeshData, packing: VertexPacking) -> PackedVertices {
    let attrs = attribute_list(mesh);
    let n = mesh.vertices.len();
    let floats_per_vertex: u32 = attrs.iter().map(|(_, c)| c).sum();
    let mut floats: Vec<f32> = Vec::with_capacity(n * floats_per_vertex as usize);

    let layout = match packing {
        VertexPacking::Interleaved => {
            let mut offset = 0;
            let mut attributes = Vec::with_capacity(attrs.len());
            for &(location, components) in &attrs {
                attributes.push(VertexAttribute {
                    location,
                    components,
                    offset,
                });
                offset += components as u64 * F32_SIZE;
            }
            for i in 0..n {
                for &(location, _) in &attrs {
                    floats.extend_from_slice(components_of(mesh, location, i));
                }
            }
            VertexLayout {
                streams: vec![VertexStream {
                    buffer_offset: 0,
                    stride: offset,
                    attributes,
                }],
            }
        }
        VertexPacking::Planar => {
            let mut streams = Vec::with_capacity(attrs.len());
            for &(location, components) in &attrs {
                streams.push(VertexStream {
                    buffer_offset: floats.len() as u64 * F32_SIZE,
                    stride: components as u64 * F32_SIZE,
                    attributes: vec![VertexAttribute {
                        location,
                        components,
                        offset: 0,
                    }],
                });
                for i in 0..n {
                    floats.extend_from_slice(components_of(mesh, location, i));
                }
            }
            VertexLayout { streams }
        }
    };

    PackedVertices {
        bytes: bytemuck::cast_slice(&floats).to_vec(),
        layout,
        vertex_count: n,
    }
}
