//! GPU-resident mesh: one vertex buffer, one index buffer, and their layout.

use std::path::Path;

use asset::{
    AssetError, AssetResult, LoadOptions, MeshData, VertexLayout, VertexPacking, load_mesh, pack,
};

use crate::backend::{BufferKind, DrawSubmit, GpuAllocator};

struct GpuMesh<B> {
    vertex: B,
    index: B,
    index_count: u32,
    vertex_count: usize,
    layout: VertexLayout,
}

/// Owns the GPU buffers of one mesh. Buffers are released on reload, on
/// [`MeshResource::release`] and on drop.
pub struct MeshResource<B> {
    label: String,
    gpu: Option<GpuMesh<B>>,
}

impl<B> MeshResource<B> {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            gpu: None,
        }
    }

    /// Load an OBJ file and replace the current buffers with it.
    ///
    /// Parsing happens before anything is released, so on error the
    /// previously loaded mesh stays intact.
    pub fn load<A>(
        &mut self,
        alloc: &A,
        path: impl AsRef<Path>,
        options: &LoadOptions,
        packing: VertexPacking,
    ) -> AssetResult<()>
    where
        A: GpuAllocator<Buffer = B>,
    {
        let mesh = load_mesh(path, options)?;
        self.load_data(alloc, &mesh, packing)
    }

    /// Upload already-assembled mesh data, replacing the current buffers.
    pub fn load_data<A>(
        &mut self,
        alloc: &A,
        mesh: &MeshData,
        packing: VertexPacking,
    ) -> AssetResult<()>
    where
        A: GpuAllocator<Buffer = B>,
    {
        if !mesh.is_valid() {
            return Err(AssetError::EmptyMesh);
        }
        if mesh.indices.len() % 3 != 0 {
            return Err(AssetError::MalformedFile {
                line: None,
                reason: format!("index count {} is not a multiple of 3", mesh.indices.len()),
            });
        }
        let index_count = u32::try_from(mesh.indices.len()).map_err(|_| AssetError::MalformedFile {
            line: None,
            reason: format!("too many indices ({})", mesh.indices.len()),
        })?;

        let packed = pack(mesh, packing);
        self.release();

        let vertex = alloc.upload_buffer(
            &format!("{} VB", self.label),
            BufferKind::Vertex,
            &packed.bytes,
        );
        let index = alloc.upload_buffer(
            &format!("{} IB", self.label),
            BufferKind::Index,
            mesh.index_bytes(),
        );
        self.gpu = Some(GpuMesh {
            vertex,
            index,
            index_count,
            vertex_count: packed.vertex_count,
            layout: packed.layout,
        });
        Ok(())
    }

    /// Bind the buffers and issue the draw. No-op when nothing is loaded.
    pub fn draw<P: DrawSubmit<B>>(&self, pass: &mut P) {
        let Some(gpu) = &self.gpu else {
            return;
        };
        if gpu.index_count == 0 {
            return;
        }
        for (slot, stream) in gpu.layout.streams.iter().enumerate() {
            pass.bind_vertex_stream(slot as u32, &gpu.vertex, stream.buffer_offset);
        }
        pass.bind_index_buffer(&gpu.index);
        pass.submit_indexed(gpu.index_count);
    }

    /// Drop the GPU buffers. Calling it again is a no-op.
    pub fn release(&mut self) {
        if self.gpu.take().is_some() {
            log::debug!("Released mesh buffers for '{}'", self.label);
        }
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn index_count(&self) -> u32 {
        self.gpu.as_ref().map_or(0, |g| g.index_count)
    }

    pub fn vertex_count(&self) -> usize {
        self.gpu.as_ref().map_or(0, |g| g.vertex_count)
    }

    pub fn layout(&self) -> Option<&VertexLayout> {
        self.gpu.as_ref().map(|g| &g.layout)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, fs, rc::Rc};

    use asset::{load_mesh_from_str, primitives};

    use super::*;

    /// Buffer handle that counts how many are alive.
    #[derive(Debug)]
    struct FakeBuffer {
        id: usize,
        kind: BufferKind,
        len: usize,
        live: Rc<Cell<usize>>,
    }

    impl Drop for FakeBuffer {
        fn drop(&mut self) {
            self.live.set(self.live.get() - 1);
        }
    }

    #[derive(Default)]
    struct FakeAllocator {
        live: Rc<Cell<usize>>,
        next_id: Cell<usize>,
    }

    impl GpuAllocator for FakeAllocator {
        type Buffer = FakeBuffer;

        fn upload_buffer(&self, _label: &str, kind: BufferKind, contents: &[u8]) -> FakeBuffer {
            self.live.set(self.live.get() + 1);
            let id = self.next_id.get();
            self.next_id.set(id + 1);
            FakeBuffer {
                id,
                kind,
                len: contents.len(),
                live: self.live.clone(),
            }
        }
    }

    #[derive(Debug, PartialEq)]
    enum Call {
        Vertex { slot: u32, id: usize, offset: u64 },
        Index { id: usize },
        Draw(u32),
    }

    #[derive(Default)]
    struct FakePass {
        calls: Vec<Call>,
    }

    impl DrawSubmit<FakeBuffer> for FakePass {
        fn bind_vertex_stream(&mut self, slot: u32, buffer: &FakeBuffer, offset: u64) {
            assert_eq!(buffer.kind, BufferKind::Vertex);
            self.calls.push(Call::Vertex {
                slot,
                id: buffer.id,
                offset,
            });
        }

        fn bind_index_buffer(&mut self, buffer: &FakeBuffer) {
            assert_eq!(buffer.kind, BufferKind::Index);
            self.calls.push(Call::Index { id: buffer.id });
        }

        fn submit_indexed(&mut self, index_count: u32) {
            self.calls.push(Call::Draw(index_count));
        }
    }

    fn triangle() -> MeshData {
        load_mesh_from_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n", &LoadOptions::default())
            .expect("triangle")
    }

    #[test]
    fn draw_before_load_is_noop() {
        let mesh: MeshResource<FakeBuffer> = MeshResource::new("empty");
        let mut pass = FakePass::default();
        mesh.draw(&mut pass);
        assert!(pass.calls.is_empty());
        assert_eq!(mesh.index_count(), 0);
    }

    #[test]
    fn draw_issues_exactly_index_count() {
        let alloc = FakeAllocator::default();
        let mut mesh = MeshResource::new("tri");
        mesh.load_data(&alloc, &triangle(), VertexPacking::Interleaved)
            .expect("load");
        let mut pass = FakePass::default();
        mesh.draw(&mut pass);
        assert_eq!(
            pass.calls,
            vec![
                Call::Vertex {
                    slot: 0,
                    id: 0,
                    offset: 0
                },
                Call::Index { id: 1 },
                Call::Draw(3),
            ]
        );
    }

    #[test]
    fn planar_binds_one_stream_per_attribute() {
        let alloc = FakeAllocator::default();
        let mut mesh = MeshResource::new("tri");
        mesh.load_data(&alloc, &triangle(), VertexPacking::Planar)
            .expect("load");
        let mut pass = FakePass::default();
        mesh.draw(&mut pass);
        let offsets: Vec<u64> = pass
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Vertex { offset, .. } => Some(*offset),
                _ => None,
            })
            .collect();
        assert_eq!(offsets, vec![0, 36]);
    }

    #[test]
    fn release_is_idempotent() {
        let alloc = FakeAllocator::default();
        let mut mesh = MeshResource::new("tri");
        mesh.load_data(&alloc, &triangle(), VertexPacking::Interleaved)
            .expect("load");
        assert_eq!(alloc.live.get(), 2);

        mesh.release();
        assert_eq!(alloc.live.get(), 0);
        assert!(!mesh.is_loaded());

        mesh.release();
        assert_eq!(alloc.live.get(), 0);
        assert!(!mesh.is_loaded());
        assert_eq!(mesh.index_count(), 0);
        assert!(mesh.layout().is_none());
    }

    #[test]
    fn reload_replaces_previous_buffers() {
        let alloc = FakeAllocator::default();
        let mut mesh = MeshResource::new("scene");
        mesh.load_data(&alloc, &triangle(), VertexPacking::Interleaved)
            .expect("load A");
        mesh.load_data(&alloc, &primitives::cube(1.0), VertexPacking::Interleaved)
            .expect("load B");

        assert_eq!(alloc.live.get(), 2);
        assert_eq!(mesh.index_count(), 36);
        assert_eq!(mesh.vertex_count(), 24);

        let mut pass = FakePass::default();
        mesh.draw(&mut pass);
        // Only the cube's buffers (ids 2 and 3) are reachable.
        assert!(pass.calls.contains(&Call::Index { id: 3 }));
        assert!(pass.calls.contains(&Call::Draw(36)));
        assert!(!pass.calls.contains(&Call::Index { id: 1 }));
    }

    #[test]
    fn failed_reload_keeps_current_mesh() {
        let alloc = FakeAllocator::default();
        let mut mesh = MeshResource::new("scene");
        mesh.load_data(&alloc, &primitives::cube(1.0), VertexPacking::Interleaved)
            .expect("load");

        let missing = std::env::temp_dir().join("glengine-no-such-model.obj");
        let err = mesh
            .load(&alloc, &missing, &LoadOptions::default(), VertexPacking::Interleaved)
            .unwrap_err();
        assert!(matches!(err, AssetError::FileNotFound { .. }));

        let bad = std::env::temp_dir().join(format!("glengine-bad-{}.obj", std::process::id()));
        fs::write(&bad, "v 0 0 0\nf 1 2 3\n").expect("write");
        let err = mesh
            .load(&alloc, &bad, &LoadOptions::default(), VertexPacking::Interleaved)
            .unwrap_err();
        assert!(matches!(err, AssetError::MalformedFile { .. }));
        fs::remove_file(bad).ok();

        assert!(mesh.is_loaded());
        assert_eq!(mesh.index_count(), 36);
        assert_eq!(alloc.live.get(), 2);
    }

    #[test]
    fn empty_or_ragged_data_is_rejected() {
        let alloc = FakeAllocator::default();
        let mut mesh = MeshResource::new("scene");
        let err = mesh
            .load_data(&alloc, &MeshData::default(), VertexPacking::Interleaved)
            .unwrap_err();
        assert!(matches!(err, AssetError::EmptyMesh));

        let mut ragged = triangle();
        ragged.indices.push(0);
        let err = mesh
            .load_data(&alloc, &ragged, VertexPacking::Interleaved)
            .unwrap_err();
        assert!(matches!(err, AssetError::MalformedFile { .. }));
        assert_eq!(alloc.live.get(), 0);
    }

    fn uploaded_lens(mesh: &MeshResource<FakeBuffer>) -> (usize, usize) {
        let gpu = mesh.gpu.as_ref().expect("loaded");
        (gpu.vertex.len, gpu.index.len)
    }

    #[test]
    fn uploads_packed_sizes() {
        let alloc = FakeAllocator::default();
        let mut mesh = MeshResource::new("cube");
        mesh.load_data(&alloc, &primitives::cube(1.0), VertexPacking::Interleaved)
            .expect("load");
        // 24 vertices of position + normal + uv, 36 u32 indices.
        assert_eq!(uploaded_lens(&mesh), (24 * 32, 36 * 4));

        mesh.load_data(&alloc, &triangle(), VertexPacking::Planar)
            .expect("reload");
        // No uvs in the file: positions and normals only.
        assert_eq!(uploaded_lens(&mesh), (3 * 24, 3 * 4));
    }
}
