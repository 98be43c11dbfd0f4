//! meshlet-export library
//!
//! OBJ loading, manifest handling and the .meshlets file format, shared by
//! the `meshlet-export` binary and its tests.

pub mod convert;
pub mod format;
pub mod manifest;
pub mod obj;

pub use convert::{build_file, read_file, verify_file};
pub use format::{FormatError, MeshletFile, MeshletFileHeader, read_meshlet_file, write_meshlet_file};
pub use manifest::{ExportManifest, Overrides, load_manifest};
pub use obj::{ObjMesh, load_obj};
