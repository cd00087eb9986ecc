//! Full OBJ load pipeline: parse, assemble, synthesize normals, validate.

use std::path::Path;

use crate::{
    assemble::{AssemblyMode, assemble},
    error::{AssetError, AssetResult},
    mesh::MeshData,
    normals::synthesize_normals,
    obj::{NgonPolicy, ObjData, parse_obj_str, read_obj},
};

/// Knobs for turning an OBJ file into [`MeshData`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub ngon: NgonPolicy,
    pub assembly: AssemblyMode,
}

/// Load an OBJ mesh from a file path.
pub fn load_mesh(path: impl AsRef<Path>, options: &LoadOptions) -> AssetResult<MeshData> {
    let path = path.as_ref();
    log::info!("Loading OBJ mesh from {}", path.display());
    let obj = read_obj(path, options.ngon)?;
    build_mesh(&obj, options)
}

/// Load an OBJ mesh from in-memory text.
pub fn load_mesh_from_str(contents: &str, options: &LoadOptions) -> AssetResult<MeshData> {
    let obj = parse_obj_str(contents, options.ngon)?;
    build_mesh(&obj, options)
}

/// Assemble parsed OBJ data and fill in normals if the file had none.
pub fn build_mesh(obj: &ObjData, options: &LoadOptions) -> AssetResult<MeshData> {
    if obj.truncated_faces > 0 {
        log::warn!(
            "{} face(s) had more than 3 corners and were truncated to a triangle",
            obj.truncated_faces
        );
    }
    if obj.faces.is_empty() {
        return Err(AssetError::EmptyMesh);
    }

    let mut mesh = assemble(obj, options.assembly)?;
    if mesh.indices.len() % 3 != 0 {
        return Err(AssetError::malformed(format!(
            "index count {} is not a multiple of 3",
            mesh.indices.len()
        )));
    }

    if obj.normals.is_empty() {
        log::debug!("OBJ has no normals; synthesizing smooth normals");
        synthesize_normals(&mut mesh.vertices, &mesh.indices)?;
        mesh.attributes.normals = true;
    }

    log::debug!(
        "OBJ assembled: {} vertices, {} triangles (positions={}, texcoords={}, normals={})",
        mesh.vertices.len(),
        mesh.triangle_count(),
        obj.positions.len(),
        obj.tex_coords.len(),
        obj.normals.len()
    );
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use glam::Vec3;

    use super::*;

    fn temp_obj(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("glengine-{}-{name}", std::process::id()));
        fs::write(&path, contents).expect("write temp obj");
        path
    }

    #[test]
    fn single_triangle_scenario() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let mesh = load_mesh_from_str(src, &LoadOptions::default()).expect("load");
        let positions: Vec<[f32; 3]> = mesh.vertices.iter().map(|v| v.position).collect();
        assert_eq!(positions, vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        for v in &mesh.vertices {
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        }
        assert!(mesh.attributes.normals);
    }

    #[test]
    fn file_normals_are_kept() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 -1\nf 1//1 2//1 3//1\n";
        let mesh = load_mesh_from_str(src, &LoadOptions::default()).expect("load");
        assert!(mesh.vertices.iter().all(|v| v.normal == [0.0, 0.0, -1.0]));
    }

    #[test]
    fn partial_normals_are_not_synthesized() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2 3\n";
        let mesh = load_mesh_from_str(src, &LoadOptions::default()).expect("load");
        assert_eq!(mesh.vertices[0].normal, [0.0, 0.0, 1.0]);
        assert_eq!(mesh.vertices[1].normal, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn no_faces_is_empty_mesh() {
        let err = load_mesh_from_str("v 0 0 0\nv 1 0 0\n", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, AssetError::EmptyMesh));
    }

    #[test]
    fn dedup_gives_smooth_normals_across_shared_edge() {
        // Two triangles folded along the shared edge (1, 2).
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 1\nf 1 2 3\nf 2 4 3\n";
        let options = LoadOptions {
            assembly: AssemblyMode::Deduplicated,
            ..Default::default()
        };
        let mesh = load_mesh_from_str(src, &options).expect("load");
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices.len(), 6);

        let shared = Vec3::from(mesh.vertices[1].normal);
        let lone = Vec3::from(mesh.vertices[0].normal);
        assert!((shared.length() - 1.0).abs() < 1e-5);
        assert_eq!(lone, Vec3::Z);
        assert!(shared.angle_between(lone) > 1e-3);
    }

    #[test]
    fn every_referenced_normal_is_unit_length() {
        let src = "v 0 0 0\nv 2 0 0\nv 2 2 0\nv 0 2 0\nv 1 1 3\n\
                   f 1 2 5\nf 2 3 5\nf 3 4 5\nf 4 1 5\nf 1 3 2\nf 1 4 3\n";
        for assembly in [AssemblyMode::Flat, AssemblyMode::Deduplicated] {
            let options = LoadOptions {
                assembly,
                ..Default::default()
            };
            let mesh = load_mesh_from_str(src, &options).expect("load");
            for v in &mesh.vertices {
                assert!((Vec3::from(v.normal).length() - 1.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn load_from_disk() {
        let path = temp_obj("tri.obj", "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
        let mesh = load_mesh(&path, &LoadOptions::default()).expect("load from disk");
        assert_eq!(mesh.triangle_count(), 1);
        fs::remove_file(path).ok();
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_mesh("/definitely/not/here.obj", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, AssetError::FileNotFound { .. }));

        let err = load_mesh(std::env::temp_dir(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, AssetError::FileNotFound { .. }), "{err:?}");
    }
}
