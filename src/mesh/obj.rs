//! Minimal Wavefront OBJ reader.
//!
//! Only `v` and `f` records are interpreted. Face corners may use the
//! `v`, `v/vt`, `v//vn` or `v/vt/vn` forms (negative indices count from the
//! end of the vertex list); polygons are fan-triangulated. Everything else
//! (normals, texture coordinates, groups, materials) is skipped.
use super::TriMesh;
use crate::error::{AbstractionError, Result};
use nalgebra::Point3;
use std::fs;
use std::path::Path;

/// Read and parse an OBJ file into a [`TriMesh`].
pub fn load_obj(path: &Path) -> Result<TriMesh> {
    let text = fs::read_to_string(path)?;
    parse_obj(&text, path)
}

/// Parse OBJ text. `origin` is only used for error messages.
pub fn parse_obj(text: &str, origin: &Path) -> Result<TriMesh> {
    let mut positions: Vec<Point3<f32>> = Vec::new();
    let mut faces: Vec<[u32; 3]> = Vec::new();
    let parse_err = |line: usize, message: String| AbstractionError::Parse {
        path: origin.to_path_buf(),
        line,
        message,
    };

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => {
                let mut xyz = [0.0f32; 3];
                for slot in &mut xyz {
                    let tok = tokens
                        .next()
                        .ok_or_else(|| parse_err(line_no, "vertex needs 3 coordinates".into()))?;
                    *slot = tok
                        .parse()
                        .map_err(|e| parse_err(line_no, format!("bad coordinate '{tok}': {e}")))?;
                }
                positions.push(Point3::new(xyz[0], xyz[1], xyz[2]));
            }
            Some("f") => {
                let mut corners: Vec<u32> = Vec::with_capacity(4);
                for tok in tokens {
                    let corner = resolve_index(tok, positions.len())
                        .map_err(|msg| parse_err(line_no, msg))?;
                    corners.push(corner);
                }
                if corners.len() < 3 {
                    return Err(parse_err(line_no, "face needs at least 3 corners".into()));
                }
                for k in 1..corners.len() - 1 {
                    faces.push([corners[0], corners[k], corners[k + 1]]);
                }
            }
            _ => {}
        }
    }

    if faces.is_empty() {
        return Err(AbstractionError::EmptyMesh);
    }
    TriMesh::new(positions, faces)
}

fn resolve_index(token: &str, n_vertices: usize) -> std::result::Result<u32, String> {
    let head = token.split('/').next().unwrap_or("");
    let value: i64 = head
        .parse()
        .map_err(|e| format!("bad face index '{token}': {e}"))?;
    let resolved = match value {
        v if v > 0 => v - 1,
        v if v < 0 => n_vertices as i64 + v,
        _ => return Err("face index 0 is not valid".to_string()),
    };
    if resolved < 0 || resolved >= n_vertices as i64 {
        return Err(format!("face index {value} out of range"));
    }
    Ok(resolved as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# unit quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vn 0 0 1
f 1//1 2//1 3//1 4//1
";

    #[test]
    fn fan_triangulates_polygons() {
        let mesh = parse_obj(QUAD, Path::new("quad.obj")).expect("parse");
        assert_eq!(mesh.n_vertices(), 4);
        assert_eq!(mesh.faces(), &[[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn negative_indices_are_relative() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2/5 -1/1/1\n";
        let mesh = parse_obj(text, Path::new("rel.obj")).expect("parse");
        assert_eq!(mesh.faces(), &[[0, 1, 2]]);
    }

    #[test]
    fn reports_line_of_bad_record() {
        let text = "v 0 0 0\nv 1 0\n";
        match parse_obj(text, Path::new("bad.obj")) {
            Err(AbstractionError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn faceless_file_is_empty_mesh() {
        let err = parse_obj("v 0 0 0\n", Path::new("pts.obj")).unwrap_err();
        assert!(matches!(err, AbstractionError::EmptyMesh));
    }
}
