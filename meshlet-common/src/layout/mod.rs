//! Descriptor layouts
//!
//! A layout turns a finalized [`Meshlet`] into a [`MeshletDesc`] plus words
//! appended to a shared pack buffer, and decodes them again for validation.
//!
//! - [`BasicLayout`] - absolute vertex indices (16 or 32 bit) and byte triples
//! - [`DeltaLayout`] - XOR deltas against the first vertex in a bit block

mod basic;
mod delta;

pub use basic::BasicLayout;
pub use delta::DeltaLayout;

use crate::cache::CacheLimits;
use crate::cone::NormalCone;
use crate::config::LayoutKind;
use crate::desc::{MeshletBbox, MeshletDesc};
use crate::meshlet::Meshlet;
use crate::quantize::QVec;
use crate::validation::ValidationError;

/// Inputs shared by every meshlet of one build
#[derive(Debug, Clone, Copy)]
pub struct EncodeContext<'a> {
    pub positions: &'a [[f32; 3]],
    /// Bounds of the whole mesh, used for bbox quantization
    pub object_bbox: MeshletBbox,
    pub limits: CacheLimits,
}

/// Result of encoding one meshlet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedMeshlet {
    pub desc: MeshletDesc,
    /// Vertex index slots written, including padding
    pub vertex_slots: u32,
    /// Primitive index slots written, including padding
    pub prim_slots: u32,
    /// Payload bits of a delta block, zero for other layouts
    pub block_bits: u32,
}

/// Meshlet reconstructed from a descriptor and the pack buffer
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMeshlet {
    pub vertices: Vec<u32>,
    pub primitives: Vec<[u8; 3]>,
    /// Packed normal cone (see [`NormalCone::unpack`])
    pub cone: u32,
    /// Bbox quantized against the object bbox, when the layout stores one
    pub quantized_bbox: Option<(QVec, QVec)>,
}

/// A concrete descriptor bit layout
pub trait MeshletLayout: Send + Sync {
    fn kind(&self) -> LayoutKind;

    /// Append the meshlet's payload to `pack` and build its descriptor
    fn encode(
        &self,
        meshlet: &Meshlet,
        cone: &NormalCone,
        ctx: &EncodeContext<'_>,
        pack: &mut Vec<u32>,
    ) -> EncodedMeshlet;

    /// Read back the meshlet described by `desc`
    fn decode(
        &self,
        index: usize,
        desc: &MeshletDesc,
        pack: &[u32],
    ) -> Result<DecodedMeshlet, ValidationError>;
}

/// Layout implementation for `kind`
pub fn layout_for(kind: LayoutKind) -> &'static dyn MeshletLayout {
    match kind {
        LayoutKind::Basic => &BasicLayout,
        LayoutKind::Delta => &DeltaLayout,
    }
}

/// Slice `count` words at `offset`, or report the meshlet as truncated
pub(crate) fn pack_words(
    pack: &[u32],
    index: usize,
    offset: u32,
    count: u32,
) -> Result<&[u32], ValidationError> {
    let start = offset as usize;
    let end = start + count as usize;
    pack.get(start..end).ok_or(ValidationError::PackOutOfBounds {
        meshlet: index,
        offset,
        words: count,
        len: pack.len(),
    })
}
