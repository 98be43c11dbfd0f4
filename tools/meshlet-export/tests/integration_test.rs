//! Integration tests for meshlet-export
//!
//! Tests the full pipeline: generate OBJ -> build -> verify/info -> read back

use std::fmt::Write as _;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

use meshlet_common::LayoutKind;
use meshlet_export::read_meshlet_file;

/// Grid of `size` x `size` quads written as OBJ quads
fn generate_grid_obj(path: &Path, size: u32) {
    let row = size + 1;
    let mut obj = String::from("# generated grid\n");
    for i in 0..row * row {
        writeln!(obj, "v {} {} {}", i % row, i / row, (i % 3) as f32 * 0.25).unwrap();
    }
    for y in 0..size {
        for x in 0..size {
            let v = y * row + x + 1;
            writeln!(obj, "f {} {} {} {}", v, v + 1, v + row + 1, v + row).unwrap();
        }
    }
    std::fs::write(path, obj).expect("Failed to write OBJ");
}

fn meshlet_export(args: &[&str]) -> bool {
    Command::new(env!("CARGO_BIN_EXE_meshlet-export"))
        .args(args)
        .status()
        .expect("Failed to run meshlet-export")
        .success()
}

#[test]
fn test_build_basic_and_verify() {
    let dir = tempdir().expect("Failed to create temp dir");
    let obj_path = dir.path().join("grid.obj");
    let out_path = dir.path().join("grid.meshlets");
    generate_grid_obj(&obj_path, 16);

    assert!(meshlet_export(&[
        "build",
        obj_path.to_str().unwrap(),
        "-o",
        out_path.to_str().unwrap(),
        "--verify",
    ]));
    assert!(out_path.exists(), "Meshlet file should exist");

    let data = std::fs::read(&out_path).expect("Failed to read meshlet file");
    let file = read_meshlet_file(&data).expect("Failed to parse meshlet file");
    assert_eq!(file.header.layout, LayoutKind::Basic);
    assert_eq!(file.header.vertex_count, 17 * 17);
    assert!(file.header.meshlet_count > 1);
    assert_eq!(file.header.desc_count % 32, 0);

    assert!(meshlet_export(&[
        "verify",
        out_path.to_str().unwrap(),
        obj_path.to_str().unwrap(),
    ]));
    assert!(meshlet_export(&["info", out_path.to_str().unwrap()]));
}

#[test]
fn test_build_delta_from_manifest() {
    let dir = tempdir().expect("Failed to create temp dir");
    let obj_path = dir.path().join("grid.obj");
    let out_path = dir.path().join("grid.meshlets");
    let manifest_path = dir.path().join("meshlet.toml");
    generate_grid_obj(&obj_path, 12);
    std::fs::write(
        &manifest_path,
        "[meshlet]\nmax_vertices = 32\nmax_primitives = 32\nlayout = \"delta\"\nmax_block_bits = 512\ntask_alignment = 1\n",
    )
    .expect("Failed to write manifest");

    assert!(meshlet_export(&[
        "build",
        obj_path.to_str().unwrap(),
        "-o",
        out_path.to_str().unwrap(),
        "-c",
        manifest_path.to_str().unwrap(),
    ]));

    let data = std::fs::read(&out_path).expect("Failed to read meshlet file");
    let file = read_meshlet_file(&data).expect("Failed to parse meshlet file");
    assert_eq!(file.header.layout, LayoutKind::Delta);
    assert_eq!(file.header.meshlet_count, file.header.desc_count);

    assert!(meshlet_export(&[
        "verify",
        out_path.to_str().unwrap(),
        obj_path.to_str().unwrap(),
    ]));
}

#[test]
fn test_verify_rejects_other_mesh() {
    let dir = tempdir().expect("Failed to create temp dir");
    let obj_path = dir.path().join("grid.obj");
    let other_path = dir.path().join("other.obj");
    let out_path = dir.path().join("grid.meshlets");
    generate_grid_obj(&obj_path, 8);
    generate_grid_obj(&other_path, 9);

    assert!(meshlet_export(&[
        "build",
        obj_path.to_str().unwrap(),
        "-o",
        out_path.to_str().unwrap(),
    ]));
    assert!(!meshlet_export(&[
        "verify",
        out_path.to_str().unwrap(),
        other_path.to_str().unwrap(),
    ]));
}

#[test]
fn test_invalid_settings_fail() {
    let dir = tempdir().expect("Failed to create temp dir");
    let obj_path = dir.path().join("grid.obj");
    generate_grid_obj(&obj_path, 4);

    assert!(!meshlet_export(&[
        "build",
        obj_path.to_str().unwrap(),
        "--max-vertices",
        "2",
    ]));
    assert!(!meshlet_export(&[
        "build",
        obj_path.to_str().unwrap(),
        "--layout",
        "strips",
    ]));
}
