//! Smooth per-vertex normals from triangle geometry.
//!
//! Face normals are accumulated un-normalized, so larger triangles weigh more.
//! Winding is counter-clockwise front: `cross(p2 - p1, p3 - p1)`.

use glam::Vec3;

use crate::{
    error::{AssetError, AssetResult},
    mesh::Vertex,
};

/// Un-normalized normal of triangle `(a, b, c)`; its length is twice the area.
#[inline]
pub fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a)
}

/// Overwrite every vertex normal with the area-weighted average of the
/// normals of the triangles that reference it.
///
/// Vertices referenced by no (non-degenerate) triangle end up with a zero
/// normal.
pub fn synthesize_normals(vertices: &mut [Vertex], indices: &[u32]) -> AssetResult<()> {
    if indices.len() % 3 != 0 {
        return Err(AssetError::malformed(format!(
            "index count {} is not a multiple of 3",
            indices.len()
        )));
    }

    let mut acc = vec![Vec3::ZERO; vertices.len()];

    for tri in indices.chunks_exact(3) {
        let [i1, i2, i3] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if [i1, i2, i3].iter().any(|&i| i >= vertices.len()) {
            return Err(AssetError::malformed(format!(
                "triangle ({i1}, {i2}, {i3}) references a vertex past {}",
                vertices.len()
            )));
        }

        let n = face_normal(
            Vec3::from(vertices[i1].position),
            Vec3::from(vertices[i2].position),
            Vec3::from(vertices[i3].position),
        );
        acc[i1] += n;
        acc[i2] += n;
        acc[i3] += n;
    }

    for (vertex, n) in vertices.iter_mut().zip(acc) {
        vertex.normal = n.normalize_or_zero().to_array();
    }
    Ok(())
}
