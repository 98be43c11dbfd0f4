//! Meshlet clustering for mesh-shader pipelines
//!
//! This crate is shared between:
//! - `meshlet-export` (offline asset tool)
//! - any runtime that needs to decode or validate packed meshlets
//!
//! # Modules
//!
//! - [`bits`] - Bit-field packing helpers and `find_msb`
//! - [`cache`] - [`PrimitiveCache`], the greedy meshlet accumulator
//! - [`builder`] - Drives the cache over an index buffer and encodes results
//! - [`layout`] - Descriptor bit layouts (basic and delta)
//! - [`cone`] - Normal cone for backface cluster culling
//! - [`octahedral`] - Octahedral unit-vector encoding
//! - [`quantize`] - Bbox quantization against the object bounds
//! - [`desc`] - Descriptor and bbox records
//! - [`stats`] - Aggregated build statistics
//! - [`validation`] - Post-build consistency check
//! - [`config`] - Builder configuration

pub mod bits;
pub mod builder;
pub mod cache;
pub mod cone;
pub mod config;
pub mod desc;
pub mod layout;
pub mod meshlet;
pub mod octahedral;
pub mod quantize;
pub mod stats;
pub mod validation;

/// Hard upper bound on vertices per meshlet (local indices are u8)
pub const MAX_VERTEX_COUNT_LIMIT: usize = 256;
/// Hard upper bound on primitives per meshlet
pub const MAX_PRIMITIVE_COUNT_LIMIT: usize = 256;

pub use builder::{BuildError, MeshletBuilder, PackedMeshlets};
pub use cache::{CacheLimits, PrimitiveCache};
pub use cone::NormalCone;
pub use config::{BuilderConfig, ConfigError, LayoutKind};
pub use desc::{MeshletBbox, MeshletDesc};
pub use layout::{MeshletLayout, layout_for};
pub use meshlet::Meshlet;
pub use quantize::QVec;
pub use stats::Stats;
pub use validation::{Status, ValidationError, validate};
