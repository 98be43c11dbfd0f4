//! OBJ mesh loading
//!
//! Only positions and faces matter for clustering. Texture and normal
//! references in faces are ignored, so vertices that share a position keep a
//! single index.

use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Positions and a triangle list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjMesh {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl ObjMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Load an OBJ file from disk
pub fn load_obj(input: &Path) -> Result<ObjMesh> {
    let file = File::open(input).with_context(|| format!("Failed to open OBJ: {:?}", input))?;
    let mesh = parse_obj(BufReader::new(file))
        .with_context(|| format!("Failed to parse OBJ: {:?}", input))?;

    tracing::debug!(
        "Loaded OBJ mesh: {} vertices, {} triangles",
        mesh.positions.len(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Parse OBJ text. Polygons are fan-triangulated.
pub fn parse_obj<R: BufRead>(reader: R) -> Result<ObjMesh> {
    let mut mesh = ObjMesh::default();
    let mut face = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0] {
            "v" if parts.len() >= 4 => {
                let mut position = [0.0f32; 3];
                for (axis, value) in position.iter_mut().zip(&parts[1..4]) {
                    *axis = value
                        .parse()
                        .with_context(|| format!("line {}: bad coordinate {:?}", line_no + 1, value))?;
                }
                mesh.positions.push(position);
            }
            "v" => bail!("line {}: vertex needs three coordinates", line_no + 1),
            "f" => {
                face.clear();
                for vert in &parts[1..] {
                    let index = resolve_index(vert, mesh.positions.len())
                        .with_context(|| format!("line {}: bad face vertex {:?}", line_no + 1, vert))?;
                    face.push(index);
                }
                if face.len() < 3 {
                    bail!("line {}: face has {} vertices", line_no + 1, face.len());
                }

                for i in 1..face.len() - 1 {
                    mesh.indices.extend_from_slice(&[face[0], face[i], face[i + 1]]);
                }
            }
            // vt, vn, o, g, s, usemtl, mtllib
            _ => {}
        }
    }

    Ok(mesh)
}

/// Position index of one face entry (`v`, `v/t`, `v/t/n` or `v//n`)
fn resolve_index(vert: &str, position_count: usize) -> Result<u32> {
    let raw = vert.split('/').next().unwrap_or_default();
    let index: i64 = raw.parse().context("index is not an integer")?;

    let resolved = match index {
        0 => bail!("OBJ indices start at 1"),
        i if i > 0 => i - 1,
        i => position_count as i64 + i,
    };
    if resolved < 0 || resolved >= position_count as i64 {
        bail!(
            "index {} out of range ({} vertices defined so far)",
            index,
            position_count
        );
    }
    Ok(resolved as u32)
}
