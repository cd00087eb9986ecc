//! Ground grid on the XZ plane plus RGB axes, drawn as a line list.

use bytemuck::{Pod, Zeroable};
use wgpu::{
    Buffer, BufferUsages, Device, RenderPass, VertexBufferLayout, VertexStepMode, util::DeviceExt,
};

const GRID_COLOR: [f32; 3] = [0.1, 0.1, 0.1];

/// Vertex: position + color.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub pos: [f32; 3],
    pub color: [f32; 3],
}

impl LineVertex {
    pub const LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
        array_stride: std::mem::size_of::<LineVertex>() as u64,
        step_mode: VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
    };

    const fn new(pos: [f32; 3], color: [f32; 3]) -> Self {
        Self { pos, color }
    }
}

/// Grid lines followed by axis lines in one vertex list.
#[derive(Clone, Debug, PartialEq)]
pub struct GridGeometry {
    pub vertices: Vec<LineVertex>,
    pub grid_vertex_count: u32,
    pub axes_vertex_count: u32,
}

/// Lines at every multiple of `spacing` in `[-size, size]`, both directions,
/// then X (red), Y (green) and Z (blue) axes of length `size`.
/// A non-positive `spacing` yields the axes only.
pub fn grid_geometry(size: f32, spacing: f32) -> GridGeometry {
    let mut vertices = Vec::new();

    if spacing > 0.0 && spacing.is_finite() {
        let steps = (size / spacing).floor() as i32;
        for k in -steps..=steps {
            let i = k as f32 * spacing;
            vertices.push(LineVertex::new([-size, 0.0, i], GRID_COLOR));
            vertices.push(LineVertex::new([size, 0.0, i], GRID_COLOR));
            vertices.push(LineVertex::new([i, 0.0, -size], GRID_COLOR));
            vertices.push(LineVertex::new([i, 0.0, size], GRID_COLOR));
        }
    }
    let grid_vertex_count = vertices.len() as u32;

    let axes = [
        ([size, 0.0, 0.0], [1.0, 0.0, 0.0]),
        ([0.0, size, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, size], [0.0, 0.0, 1.0]),
    ];
    for (end, color) in axes {
        vertices.push(LineVertex::new([0.0, 0.0, 0.0], color));
        vertices.push(LineVertex::new(end, color));
    }

    GridGeometry {
        grid_vertex_count,
        axes_vertex_count: vertices.len() as u32 - grid_vertex_count,
        vertices,
    }
}

/// Uploaded grid geometry.
pub struct Grid {
    vertex_buf: Buffer,
    grid_vertex_count: u32,
    axes_vertex_count: u32,
}

impl Grid {
    pub fn new(device: &Device, size: f32, spacing: f32) -> Self {
        let geometry = grid_geometry(size, spacing);
        let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Grid VB"),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: BufferUsages::VERTEX,
        });
        Self {
            vertex_buf,
            grid_vertex_count: geometry.grid_vertex_count,
            axes_vertex_count: geometry.axes_vertex_count,
        }
    }

    /// Expects the line pipeline and scene bind group to be set.
    pub fn draw(&self, rpass: &mut RenderPass<'_>) {
        rpass.set_vertex_buffer(0, self.vertex_buf.slice(..));
        rpass.draw(0..self.grid_vertex_count, 0..1);
        let end = self.grid_vertex_count + self.axes_vertex_count;
        rpass.draw(self.grid_vertex_count..end, 0..1);
    }
}
