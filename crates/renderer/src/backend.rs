//! Graphics-API-agnostic buffer upload / draw submission, plus the wgpu
//! implementation.
//!
//! Mesh code only needs four things from the GPU: create a buffer from bytes,
//! bind a vertex stream at an offset, bind a `u32` index buffer, and issue an
//! indexed triangle-list draw.

use asset::VertexLayout;
use wgpu::util::DeviceExt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Index,
}

/// Creates GPU buffers. Buffers free themselves on drop.
pub trait GpuAllocator {
    type Buffer;

    fn upload_buffer(&self, label: &str, kind: BufferKind, contents: &[u8]) -> Self::Buffer;
}

/// Records draw commands against buffers of type `B`.
pub trait DrawSubmit<B> {
    fn bind_vertex_stream(&mut self, slot: u32, buffer: &B, offset: u64);
    /// Index format is always `u32`.
    fn bind_index_buffer(&mut self, buffer: &B);
    /// Triangle list of `index_count` indices, one instance.
    fn submit_indexed(&mut self, index_count: u32);
}

impl GpuAllocator for wgpu::Device {
    type Buffer = wgpu::Buffer;

    fn upload_buffer(&self, label: &str, kind: BufferKind, contents: &[u8]) -> wgpu::Buffer {
        let usage = match kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
        };
        self.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage,
        })
    }
}

impl DrawSubmit<wgpu::Buffer> for wgpu::RenderPass<'_> {
    fn bind_vertex_stream(&mut self, slot: u32, buffer: &wgpu::Buffer, offset: u64) {
        self.set_vertex_buffer(slot, buffer.slice(offset..));
    }

    fn bind_index_buffer(&mut self, buffer: &wgpu::Buffer) {
        self.set_index_buffer(buffer.slice(..), wgpu::IndexFormat::Uint32);
    }

    fn submit_indexed(&mut self, index_count: u32) {
        self.draw_indexed(0..index_count, 0, 0..1);
    }
}

/// wgpu vertex buffer layouts built from a [`VertexLayout`]; one per stream.
#[derive(Clone, Debug)]
pub struct WgpuVertexLayouts {
    streams: Vec<(u64, Vec<wgpu::VertexAttribute>)>,
}

impl WgpuVertexLayouts {
    pub fn new(layout: &VertexLayout) -> Self {
        let streams = layout
            .streams
            .iter()
            .map(|s| {
                let attributes = s
                    .attributes
                    .iter()
                    .map(|a| wgpu::VertexAttribute {
                        format: float_format(a.components),
                        offset: a.offset,
                        shader_location: a.location,
                    })
                    .collect();
                (s.stride, attributes)
            })
            .collect();
        Self { streams }
    }

    pub fn buffers(&self) -> Vec<wgpu::VertexBufferLayout<'_>> {
        self.streams
            .iter()
            .map(|(stride, attributes)| wgpu::VertexBufferLayout {
                array_stride: *stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes,
            })
            .collect()
    }
}

fn float_format(components: u32) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

#[cfg(test)]
mod tests {
    use asset::{AttributeSet, MeshData, Vertex, VertexPacking, pack};

    use super::*;

    fn mesh(tex_coords: bool) -> MeshData {
        MeshData::new(
            vec![Vertex::default(); 3],
            vec![0, 1, 2],
            AttributeSet {
                tex_coords,
                normals: true,
            },
        )
    }

    #[test]
    fn interleaved_maps_to_one_buffer() {
        let packed = pack(&mesh(true), VertexPacking::Interleaved);
        let layouts = WgpuVertexLayouts::new(&packed.layout);
        let buffers = layouts.buffers();
        assert_eq!(buffers.len(), 1);
        assert_eq!(buffers[0].array_stride, 32);
        let formats: Vec<_> = buffers[0].attributes.iter().map(|a| a.format).collect();
        assert_eq!(
            formats,
            vec![
                wgpu::VertexFormat::Float32x3,
                wgpu::VertexFormat::Float32x3,
                wgpu::VertexFormat::Float32x2
            ]
        );
    }

    #[test]
    fn planar_maps_to_one_buffer_per_attribute() {
        let packed = pack(&mesh(false), VertexPacking::Planar);
        let layouts = WgpuVertexLayouts::new(&packed.layout);
        let buffers = layouts.buffers();
        assert_eq!(buffers.len(), 2);
        assert!(buffers.iter().all(|b| b.array_stride == 12));
        assert_eq!(buffers[1].attributes[0].shader_location, 1);
        assert_eq!(buffers[1].attributes[0].offset, 0);
    }
}
