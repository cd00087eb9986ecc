//! Minimal OBJ parser supporting positions, normals and texture coordinates.
//!
//! Produces raw attribute lists plus triangular faces; turning those into
//! GPU-ready vertices is the job of [`crate::assemble`].

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use crate::error::{AssetError, AssetResult};

/// How faces with more than three corners are handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NgonPolicy {
    /// Keep the first three corners, drop the rest.
    #[default]
    Truncate,
    /// Fan-triangulate around the first corner: (0, i, i + 1).
    Fan,
}

/// One face corner. Indices are 0-based; `None` means the slot was absent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FaceCorner {
    pub position: u32,
    pub tex_coord: Option<u32>,
    pub normal: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjFace {
    pub corners: [FaceCorner; 3],
}

/// Raw contents of an OBJ file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjData {
    pub positions: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub normals: Vec<[f32; 3]>,
    pub faces: Vec<ObjFace>,
    /// Number of `f` lines with more than three corners that were cut down.
    pub truncated_faces: usize,
}

/// Parse an OBJ file from disk.
pub fn read_obj(path: impl AsRef<Path>, policy: NgonPolicy) -> AssetResult<ObjData> {
    let path = path.as_ref();
    let file = File::open(path)
        .and_then(|file| {
            if file.metadata()?.is_file() {
                Ok(file)
            } else {
                Err(io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"))
            }
        })
        .map_err(|source| AssetError::FileNotFound {
            path: path.to_path_buf(),
            source,
        })?;
    parse_obj(BufReader::new(file), policy)
}

/// Convenience helper to parse an OBJ string literal.
pub fn parse_obj_str(contents: &str, policy: NgonPolicy) -> AssetResult<ObjData> {
    parse_obj(io::Cursor::new(contents), policy)
}

/// Parse OBJ text from any [`BufRead`] implementation.
pub fn parse_obj<R: BufRead>(reader: R, policy: NgonPolicy) -> AssetResult<ObjData> {
    let mut obj = ObjData::default();

    for (line_no, line) in reader.lines().enumerate() {
        let line =
            line.map_err(|e| AssetError::at_line(line_no, format!("failed to read line: {e}")))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };

        match tag {
            "v" => {
                let x = parse_f32(parts.next(), line_no, "x coordinate")?;
                let y = parse_f32(parts.next(), line_no, "y coordinate")?;
                let z = parse_f32(parts.next(), line_no, "z coordinate")?;
                obj.positions.push([x, y, z]);
            }
            "vt" => {
                let u = parse_f32(parts.next(), line_no, "u coordinate")?;
                let v = parse_f32(parts.next(), line_no, "v coordinate")?;
                obj.tex_coords.push([u, v]);
            }
            "vn" => {
                let nx = parse_f32(parts.next(), line_no, "nx coordinate")?;
                let ny = parse_f32(parts.next(), line_no, "ny coordinate")?;
                let nz = parse_f32(parts.next(), line_no, "nz coordinate")?;
                obj.normals.push([nx, ny, nz]);
            }
            "f" => parse_face(parts, policy, line_no, &mut obj)?,
            _ => {
                // Ignore other directives (o/g/s/usemtl/mtllib/l/etc.)
            }
        }
    }

    Ok(obj)
}

fn parse_face<'a>(
    tokens: impl Iterator<Item = &'a str>,
    policy: NgonPolicy,
    line_no: usize,
    obj: &mut ObjData,
) -> AssetResult<()> {
    let tokens: Vec<&str> = tokens.collect();
    if tokens.len() < 3 {
        return Err(AssetError::at_line(
            line_no,
            format!("face has {} corners, expected at least 3", tokens.len()),
        ));
    }

    let counts = AttributeCounts::of(obj);
    match policy {
        NgonPolicy::Truncate => {
            let mut corners = [FaceCorner {
                position: 0,
                tex_coord: None,
                normal: None,
            }; 3];
            for (slot, token) in corners.iter_mut().zip(&tokens) {
                *slot = parse_face_corner(token, counts, line_no)?;
            }
            if tokens.len() > 3 {
                obj.truncated_faces += 1;
            }
            obj.faces.push(ObjFace { corners });
        }
        NgonPolicy::Fan => {
            let corners = tokens
                .iter()
                .map(|token| parse_face_corner(token, counts, line_no))
                .collect::<AssetResult<Vec<_>>>()?;
            for i in 1..corners.len() - 1 {
                obj.faces.push(ObjFace {
                    corners: [corners[0], corners[i], corners[i + 1]],
                });
            }
        }
    }
    Ok(())
}

/// Attribute list lengths at the point a face is read.
#[derive(Clone, Copy)]
struct AttributeCounts {
    positions: usize,
    tex_coords: usize,
    normals: usize,
}

impl AttributeCounts {
    fn of(obj: &ObjData) -> Self {
        Self {
            positions: obj.positions.len(),
            tex_coords: obj.tex_coords.len(),
            normals: obj.normals.len(),
        }
    }
}

fn parse_f32(value: Option<&str>, line_no: usize, what: &str) -> AssetResult<f32> {
    let token = value.ok_or_else(|| AssetError::at_line(line_no, format!("missing {what}")))?;
    token
        .parse::<f32>()
        .map_err(|_| AssetError::at_line(line_no, format!("failed to parse {what} '{token}'")))
}

fn parse_face_corner(
    token: &str,
    counts: AttributeCounts,
    line_no: usize,
) -> AssetResult<FaceCorner> {
    let mut split = token.split('/');

    let position = match split.next() {
        Some(value) if !value.is_empty() => resolve_index(value, counts.positions, line_no)?,
        _ => {
            return Err(AssetError::at_line(
                line_no,
                format!("face element '{token}' has no position index"),
            ));
        }
    };
    let position = position.ok_or_else(|| {
        AssetError::at_line(line_no, format!("position index 0 in face element '{token}'"))
    })?;

    let tex_coord = match split.next() {
        Some(value) if !value.is_empty() => resolve_index(value, counts.tex_coords, line_no)?,
        _ => None,
    };

    let normal = match split.next() {
        Some(value) if !value.is_empty() => resolve_index(value, counts.normals, line_no)?,
        _ => None,
    };

    Ok(FaceCorner {
        position,
        tex_coord,
        normal,
    })
}

/// Resolve a 1-based (or negative, end-relative) index against `len`.
/// A literal `0` is the "absent" sentinel and yields `None`.
fn resolve_index(token: &str, len: usize, line_no: usize) -> AssetResult<Option<u32>> {
    let raw = token
        .parse::<i64>()
        .map_err(|_| AssetError::at_line(line_no, format!("invalid index '{token}'")))?;
    if raw == 0 {
        return Ok(None);
    }

    let idx = if raw > 0 { raw - 1 } else { len as i64 + raw };

    if idx < 0 || idx as usize >= len {
        return Err(AssetError::at_line(
            line_no,
            format!("index {raw} out of range (len={len})"),
        ));
    }

    u32::try_from(idx)
        .map(Some)
        .map_err(|_| AssetError::at_line(line_no, format!("index {raw} exceeds u32")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corner(position: u32, tex_coord: Option<u32>, normal: Option<u32>) -> FaceCorner {
        FaceCorner {
            position,
            tex_coord,
            normal,
        }
    }

    #[test]
    fn parse_simple_triangle() {
        let src = r#"
            v 0.0 0.0 0.0
            v 1.0 0.0 0.0
            v 0.0 1.0 0.0
            vn 0.0 0.0 1.0
            vt 0.0 0.0
            vt 1.0 0.0
            vt 0.0 1.0
            f 1/1/1 2/2/1 3/3/1
        "#;
        let obj = parse_obj_str(src, NgonPolicy::Truncate).expect("parse triangle");
        assert_eq!(obj.positions.len(), 3);
        assert_eq!(obj.tex_coords.len(), 3);
        assert_eq!(obj.normals.len(), 1);
        assert_eq!(obj.faces.len(), 1);
        assert_eq!(obj.faces[0].corners[2], corner(2, Some(2), Some(0)));
    }

    #[test]
    fn empty_slots_are_absent() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\n\
                   vn 0 0 1\nvn 0 0 1\nvn 0 0 1\nf 1/1/1 2//2 3/3/\n";
        let obj = parse_obj_str(src, NgonPolicy::Truncate).expect("parse");
        let [a, b, c] = obj.faces[0].corners;
        assert_eq!(a, corner(0, Some(0), Some(0)));
        assert_eq!(b, corner(1, None, Some(1)));
        assert_eq!(c, corner(2, Some(2), None));
    }

    #[test]
    fn position_only_corners() {
        let obj = parse_obj_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n", NgonPolicy::Truncate)
            .expect("parse");
        assert_eq!(obj.faces[0].corners[1], corner(1, None, None));
    }

    #[test]
    fn counts_match_v_and_f_lines() {
        let src = "# cube-ish\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
                   g side\nusemtl red\ns off\nf 1 2 3\nf 1 3 4\n";
        let obj = parse_obj_str(src, NgonPolicy::Truncate).expect("parse");
        assert_eq!(obj.positions.len(), 4);
        assert_eq!(obj.faces.len(), 2);
    }

    #[test]
    fn quad_is_truncated_by_default() {
        let src = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let obj = parse_obj_str(src, NgonPolicy::Truncate).expect("parse");
        assert_eq!(obj.faces.len(), 1);
        assert_eq!(obj.truncated_faces, 1);
        let positions: Vec<u32> = obj.faces[0].corners.iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn quad_is_fanned_when_requested() {
        let src = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let obj = parse_obj_str(src, NgonPolicy::Fan).expect("parse");
        assert_eq!(obj.faces.len(), 2);
        assert_eq!(obj.truncated_faces, 0);
        let second: Vec<u32> = obj.faces[1].corners.iter().map(|c| c.position).collect();
        assert_eq!(second, vec![0, 2, 3]);
    }

    #[test]
    fn negative_indices_are_end_relative() {
        let obj = parse_obj_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n", NgonPolicy::Truncate)
            .expect("parse");
        let positions: Vec<u32> = obj.faces[0].corners.iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn zero_texcoord_and_normal_are_absent() {
        let obj = parse_obj_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1/0/0 2 3\n", NgonPolicy::Truncate)
            .expect("parse");
        assert_eq!(obj.faces[0].corners[0], corner(0, None, None));
    }

    #[test]
    fn out_of_range_position_fails_with_line() {
        let err = parse_obj_str("v 0 0 0\nv 1 0 0\nf 1 2 3\n", NgonPolicy::Truncate).unwrap_err();
        assert!(matches!(err, AssetError::MalformedFile { line: Some(3), .. }));
    }

    #[test]
    fn forward_reference_is_out_of_range() {
        // Index 3 exists by the end of the file, but not when the face is read.
        let err = parse_obj_str("v 0 0 0\nv 1 0 0\nf 1 2 3\nv 0 1 0\n", NgonPolicy::Truncate)
            .unwrap_err();
        assert!(matches!(err, AssetError::MalformedFile { .. }));
    }

    #[test]
    fn out_of_range_normal_fails() {
        let err = parse_obj_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1//1 2 3\n", NgonPolicy::Truncate)
            .unwrap_err();
        assert!(matches!(err, AssetError::MalformedFile { line: Some(4), .. }));
    }

    #[test]
    fn zero_position_index_fails() {
        let err = parse_obj_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n", NgonPolicy::Truncate)
            .unwrap_err();
        assert!(matches!(err, AssetError::MalformedFile { .. }));
    }

    #[test]
    fn short_face_fails() {
        let err = parse_obj_str("v 0 0 0\nv 1 0 0\nf 1 2\n", NgonPolicy::Truncate).unwrap_err();
        assert!(matches!(err, AssetError::MalformedFile { line: Some(3), .. }));
    }

    #[test]
    fn bad_float_fails() {
        let err = parse_obj_str("v 0 zero 0\n", NgonPolicy::Truncate).unwrap_err();
        assert!(err.to_string().contains("y coordinate"));
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let path = std::env::temp_dir().join("glengine-missing-model-does-not-exist.obj");
        let err = read_obj(&path, NgonPolicy::Truncate).unwrap_err();
        assert!(matches!(err, AssetError::FileNotFound { .. }));
    }

    #[test]
    fn directory_is_file_not_found() {
        let err = read_obj(std::env::temp_dir(), NgonPolicy::Truncate).unwrap_err();
        match err {
            AssetError::FileNotFound { path, .. } => assert_eq!(path, std::env::temp_dir()),
            other => panic!("expected FileNotFound, got {other:?}"),
        }
    }
}
