//! Procedural meshes: cube and UV sphere. All triangles wind CCW outward.

use std::f32::consts::PI;

use crate::mesh::{AttributeSet, MeshData, Vertex};

const WITH_UV: AttributeSet = AttributeSet {
    tex_coords: true,
    normals: true,
};

/// Axis-aligned cube of edge `size` centred at the origin, flat-shaded
/// (24 vertices, 4 per face, so each face keeps its own normal).
pub fn cube(size: f32) -> MeshData {
    let h = size * 0.5;
    // (normal, u axis, v axis); u x v == normal keeps the quads CCW.
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),   // front (+Z)
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]), // back (-Z)
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),  // right (+X)
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),  // left (-X)
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),  // top (+Y)
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),  // bottom (-Y)
    ];
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (n, u, v) in faces {
        let base = vertices.len() as u32;
        for (su, sv) in corners {
            let p = [
                h * (n[0] + su * u[0] + sv * v[0]),
                h * (n[1] + su * u[1] + sv * v[1]),
                h * (n[2] + su * u[2] + sv * v[2]),
            ];
            let uv = [(su + 1.0) * 0.5, (sv + 1.0) * 0.5];
            vertices.push(Vertex::new(p, n, uv));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    MeshData::new(vertices, indices, WITH_UV)
}

/// UV sphere (Y up) with `sectors` slices around and `stacks` from pole to pole.
pub fn uv_sphere(radius: f32, sectors: u32, stacks: u32) -> MeshData {
    let sectors = sectors.max(3);
    let stacks = stacks.max(2);

    let mut vertices = Vec::with_capacity(((stacks + 1) * (sectors + 1)) as usize);
    for i in 0..=stacks {
        let stack_angle = PI / 2.0 - i as f32 * PI / stacks as f32;
        let ring = stack_angle.cos();
        let y = stack_angle.sin();
        for j in 0..=sectors {
            let sector_angle = j as f32 * 2.0 * PI / sectors as f32;
            // Right-handed: sweeping the sector angle goes from +X towards -Z.
            let n = [ring * sector_angle.cos(), y, -ring * sector_angle.sin()];
            vertices.push(Vertex::new(
                [n[0] * radius, n[1] * radius, n[2] * radius],
                n,
                [j as f32 / sectors as f32, i as f32 / stacks as f32],
            ));
        }
    }

    let mut indices = Vec::with_capacity((6 * sectors * (stacks - 1)) as usize);
    for i in 0..stacks {
        let mut k1 = i * (sectors + 1);
        let mut k2 = k1 + sectors + 1;
        for _ in 0..sectors {
            if i != 0 {
                indices.extend_from_slice(&[k1, k2, k1 + 1]);
            }
            if i != stacks - 1 {
                indices.extend_from_slice(&[k1 + 1, k2, k2 + 1]);
            }
            k1 += 1;
            k2 += 1;
        }
    }
    MeshData::new(vertices, indices, WITH_UV)
}
