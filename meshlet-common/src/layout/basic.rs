//! Basic layout: absolute indices
//!
//! ```text
//! field_x: bbox min x | min y | min z | vertex count - 1   (8 bits each)
//! field_y: bbox max x | max y | max z | prim count - 1     (8 bits each)
//! field_z: cone oct x | oct y | cutoff | vertex pack       (8 bits each)
//! field_w: word offset into the pack buffer
//! ```
//!
//! Pack buffer per meshlet: vertex indices (vertex pack 2 = two u16 per word,
//! 1 = one u32 per word), then primitive bytes, four per word.

use glam::Vec3;

use super::{DecodedMeshlet, EncodeContext, EncodedMeshlet, MeshletLayout, pack_words};
use crate::bits::{aligned_size, pack, unpack};
use crate::cone::NormalCone;
use crate::config::LayoutKind;
use crate::desc::MeshletDesc;
use crate::meshlet::Meshlet;
use crate::quantize::QVec;
use crate::validation::ValidationError;

/// Bbox quantization scale (unorm8)
const BBOX_QUANT_MUL: f32 = 255.0;

/// Two u16 indices per word
pub const VERTEX_PACK_U16: u32 = 2;
/// One u32 index per word
pub const VERTEX_PACK_U32: u32 = 1;

#[derive(Debug, Clone, Copy, Default)]
pub struct BasicLayout;

fn vertex_words(vertex_count: u32, vertex_pack: u32) -> u32 {
    if vertex_pack == VERTEX_PACK_U16 {
        vertex_count.div_ceil(2)
    } else {
        vertex_count
    }
}

fn prim_words(prim_count: u32) -> u32 {
    (prim_count * 3).div_ceil(4)
}

impl MeshletLayout for BasicLayout {
    fn kind(&self) -> LayoutKind {
        LayoutKind::Basic
    }

    fn encode(
        &self,
        meshlet: &Meshlet,
        cone: &NormalCone,
        ctx: &EncodeContext<'_>,
        out: &mut Vec<u32>,
    ) -> EncodedMeshlet {
        let vertex_count = meshlet.vertex_count();
        let prim_count = meshlet.primitive_count();
        debug_assert!((1..=256).contains(&vertex_count));
        debug_assert!((1..=256).contains(&prim_count));

        let vertex_pack = if meshlet.vertex_all_bits <= 16 {
            VERTEX_PACK_U16
        } else {
            VERTEX_PACK_U32
        };

        let offset = out.len() as u32;
        if vertex_pack == VERTEX_PACK_U16 {
            out.extend(
                meshlet
                    .vertices
                    .chunks(2)
                    .map(|pair| pair[0] | (pair.get(1).copied().unwrap_or(0) << 16)),
            );
        } else {
            out.extend_from_slice(&meshlet.vertices);
        }

        let prim_bytes: Vec<u8> = meshlet.primitives.iter().flatten().copied().collect();
        out.extend(prim_bytes.chunks(4).map(|chunk| {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            u32::from_le_bytes(word)
        }));

        let bbox_min = ctx.object_bbox.min();
        let bbox_extent = ctx.object_bbox.extent();
        // Min rounds down and max rounds up so the decoded box stays conservative
        let (qmin, qmax) = meshlet
            .vertices
            .iter()
            .map(|&v| Vec3::from(ctx.positions[v as usize]))
            .fold((QVec::splat(u32::MAX), QVec::splat(0)), |(lo, hi), p| {
                (
                    lo.min(QVec::from_vec_floor(p, bbox_min, bbox_extent, BBOX_QUANT_MUL)),
                    hi.max(QVec::from_vec_ceil(p, bbox_min, bbox_extent, BBOX_QUANT_MUL)),
                )
            });

        let field_x = pack(qmin.bits[0], 8, 0)
            | pack(qmin.bits[1], 8, 8)
            | pack(qmin.bits[2], 8, 16)
            | pack(vertex_count - 1, 8, 24);
        let field_y = pack(qmax.bits[0], 8, 0)
            | pack(qmax.bits[1], 8, 8)
            | pack(qmax.bits[2], 8, 16)
            | pack(prim_count - 1, 8, 24);
        let field_z = cone.pack() | pack(vertex_pack, 8, 24);

        EncodedMeshlet {
            desc: MeshletDesc::new(field_x, field_y, field_z, offset),
            vertex_slots: vertex_words(vertex_count, vertex_pack) * vertex_pack,
            prim_slots: aligned_size(prim_count * 3, 4),
            block_bits: 0,
        }
    }

    fn decode(
        &self,
        index: usize,
        desc: &MeshletDesc,
        pack_buf: &[u32],
    ) -> Result<DecodedMeshlet, ValidationError> {
        let vertex_count = unpack(desc.field_x, 8, 24) + 1;
        let prim_count = unpack(desc.field_y, 8, 24) + 1;
        let vertex_pack = unpack(desc.field_z, 8, 24);
        if vertex_pack != VERTEX_PACK_U16 && vertex_pack != VERTEX_PACK_U32 {
            return Err(ValidationError::BadDescriptor {
                meshlet: index,
                reason: format!("vertex pack {vertex_pack}"),
            });
        }

        let v_words = vertex_words(vertex_count, vertex_pack);
        let p_words = prim_words(prim_count);
        let words = pack_words(pack_buf, index, desc.field_w, v_words + p_words)?;
        let (vertex_data, prim_data) = words.split_at(v_words as usize);

        let vertices: Vec<u32> = if vertex_pack == VERTEX_PACK_U16 {
            vertex_data
                .iter()
                .flat_map(|&word| [word & 0xFFFF, word >> 16])
                .take(vertex_count as usize)
                .collect()
        } else {
            vertex_data.to_vec()
        };

        let prim_bytes: Vec<u8> = prim_data.iter().flat_map(|w| w.to_le_bytes()).collect();
        let primitives = prim_bytes
            .chunks_exact(3)
            .take(prim_count as usize)
            .map(|tri| [tri[0], tri[1], tri[2]])
            .collect();

        let qmin = QVec::new(
            unpack(desc.field_x, 8, 0),
            unpack(desc.field_x, 8, 8),
            unpack(desc.field_x, 8, 16),
        );
        let qmax = QVec::new(
            unpack(desc.field_y, 8, 0),
            unpack(desc.field_y, 8, 8),
            unpack(desc.field_y, 8, 16),
        );

        Ok(DecodedMeshlet {
            vertices,
            primitives,
            cone: unpack(desc.field_z, 24, 0),
            quantized_bbox: Some((qmin, qmax)),
        })
    }
}
