//! OBJ -> .meshlets conversion and checks

use anyhow::{Context, Result, bail};
use meshlet_common::{MeshletBuilder, PackedMeshlets, Stats, validate};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::format::{MeshletFile, read_meshlet_file, write_meshlet_file};
use crate::manifest::ExportManifest;
use crate::obj::{ObjMesh, load_obj};

/// Build meshlets for an OBJ file and write them to `output`
pub fn build_file(input: &Path, output: &Path, manifest: &ExportManifest) -> Result<Stats> {
    let mesh = load_obj(input)?;
    let builder = MeshletBuilder::new(manifest.meshlet.clone())?;
    let packed = builder
        .build(&mesh.indices, &mesh.positions)
        .with_context(|| format!("Failed to build meshlets for {:?}", input))?;

    if manifest.output.verify {
        check(&packed, &mesh)?;
    }

    let file =
        File::create(output).with_context(|| format!("Failed to create output: {:?}", output))?;
    let mut writer = BufWriter::new(file);
    write_meshlet_file(&mut writer, &packed, mesh.positions.len() as u32)?;
    writer.flush()?;

    tracing::info!(
        "Built {} meshlets ({} stored, {:?} layout) from {} triangles, {} pack words",
        packed.stats.meshlets_total,
        packed.descs.len(),
        packed.layout,
        mesh.triangle_count(),
        packed.pack.len()
    );
    Ok(packed.stats)
}

/// Read a .meshlets file from disk
pub fn read_file(path: &Path) -> Result<MeshletFile> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read: {:?}", path))?;
    let file = read_meshlet_file(&bytes).with_context(|| format!("Invalid meshlet file: {:?}", path))?;
    Ok(file)
}

/// Check a .meshlets file against the OBJ it was built from
pub fn verify_file(meshlets: &Path, input: &Path) -> Result<()> {
    let file = read_file(meshlets)?;
    let mesh = load_obj(input)?;

    if file.header.vertex_count as usize != mesh.positions.len() {
        bail!(
            "{:?} was built from {} vertices, {:?} has {}",
            meshlets,
            file.header.vertex_count,
            input,
            mesh.positions.len()
        );
    }
    check(&file.packed, &mesh)
}

fn check(packed: &PackedMeshlets, mesh: &ObjMesh) -> Result<()> {
    if let Err(err) = validate(packed, &mesh.indices, mesh.positions.len()) {
        bail!("Validation failed ({:?}): {}", err.status(), err);
    }
    tracing::info!("Validation passed: {} meshlets", packed.meshlet_count());
    Ok(())
}
