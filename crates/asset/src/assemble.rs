//! Turn parsed OBJ attribute lists into a single vertex stream + indices.

use std::collections::HashMap;

use crate::{
    error::{AssetError, AssetResult},
    mesh::{AttributeSet, MeshData, Vertex},
    obj::{FaceCorner, ObjData},
};

/// How face corners map onto emitted vertices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AssemblyMode {
    /// One vertex per face corner; indices are `0..N` in emission order.
    #[default]
    Flat,
    /// Corners with the same (position, texcoord, normal) triple share a slot.
    Deduplicated,
}

/// Build a [`MeshData`] from parsed OBJ contents.
///
/// Normals missing from the file are written as zero; the loader decides
/// whether to synthesize them.
pub fn assemble(obj: &ObjData, mode: AssemblyMode) -> AssetResult<MeshData> {
    let corner_count = obj.faces.len() * 3;
    let mut vertices: Vec<Vertex> = Vec::with_capacity(corner_count);
    let mut indices: Vec<u32> = Vec::with_capacity(corner_count);
    let mut unique: HashMap<FaceCorner, u32> = HashMap::new();

    for corner in obj.faces.iter().flat_map(|f| f.corners.iter()) {
        if mode == AssemblyMode::Deduplicated {
            if let Some(&idx) = unique.get(corner) {
                indices.push(idx);
                continue;
            }
        }

        let idx = u32::try_from(vertices.len())
            .map_err(|_| AssetError::malformed(format!("too many vertices (>{})", u32::MAX)))?;
        vertices.push(corner_vertex(obj, corner)?);
        indices.push(idx);
        if mode == AssemblyMode::Deduplicated {
            unique.insert(*corner, idx);
        }
    }

    let attributes = AttributeSet {
        tex_coords: !obj.tex_coords.is_empty(),
        normals: !obj.normals.is_empty(),
    };
    Ok(MeshData::new(vertices, indices, attributes))
}

fn corner_vertex(obj: &ObjData, corner: &FaceCorner) -> AssetResult<Vertex> {
    let position = obj
        .positions
        .get(corner.position as usize)
        .copied()
        .ok_or_else(|| {
            AssetError::malformed(format!("position index {} out of range", corner.position))
        })?;
    let tex_coord = lookup(&obj.tex_coords, corner.tex_coord, "texcoord")?.unwrap_or([0.0, 0.0]);
    let normal = lookup(&obj.normals, corner.normal, "normal")?.unwrap_or([0.0, 0.0, 0.0]);
    Ok(Vertex::new(position, normal, tex_coord))
}

fn lookup<T: Copy>(list: &[T], index: Option<u32>, what: &str) -> AssetResult<Option<T>> {
    match index {
        None => Ok(None),
        Some(i) => list
            .get(i as usize)
            .copied()
            .map(Some)
            .ok_or_else(|| AssetError::malformed(format!("{what} index {i} out of range"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obj::{NgonPolicy, parse_obj_str};

    const SQUARE: &str = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3\nf 1 3 4\n";

    #[test]
    fn flat_emits_one_vertex_per_corner() {
        let obj = parse_obj_str(SQUARE, NgonPolicy::Truncate).expect("parse");
        let mesh = assemble(&obj, AssemblyMode::Flat).expect("assemble");
        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(mesh.vertices[3].position, [0.0, 0.0, 0.0]);
        assert!(!mesh.attributes.normals);
        assert!(!mesh.attributes.tex_coords);
    }

    #[test]
    fn dedup_shares_identical_corners() {
        let obj = parse_obj_str(SQUARE, NgonPolicy::Truncate).expect("parse");
        let mesh = assemble(&obj, AssemblyMode::Deduplicated).expect("assemble");
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn dedup_keeps_corners_with_different_normals_apart() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nvn 0 0 -1\n\
                   f 1//1 2//1 3//1\nf 1//2 3//2 2//2\n";
        let obj = parse_obj_str(src, NgonPolicy::Truncate).expect("parse");
        let mesh = assemble(&obj, AssemblyMode::Deduplicated).expect("assemble");
        assert_eq!(mesh.vertices.len(), 6);
    }

    #[test]
    fn attributes_are_copied_and_absent_ones_zeroed() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0.5 0.25\nvn 0 0 1\nf 1/1/1 2//1 3/1/\n";
        let obj = parse_obj_str(src, NgonPolicy::Truncate).expect("parse");
        let mesh = assemble(&obj, AssemblyMode::Flat).expect("assemble");
        assert!(mesh.attributes.tex_coords);
        assert!(mesh.attributes.normals);
        assert_eq!(mesh.vertices[0].tex_coord, [0.5, 0.25]);
        assert_eq!(mesh.vertices[1].tex_coord, [0.0, 0.0]);
        assert_eq!(mesh.vertices[1].normal, [0.0, 0.0, 1.0]);
        assert_eq!(mesh.vertices[2].normal, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn no_faces_gives_empty_mesh_data() {
        let obj = parse_obj_str("v 0 0 0\n", NgonPolicy::Truncate).expect("parse");
        let mesh = assemble(&obj, AssemblyMode::Flat).expect("assemble");
        assert!(!mesh.is_valid());
    }
}
