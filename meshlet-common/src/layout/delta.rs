//! Delta layout: fixed-width XOR deltas in a bit block
//!
//! ```text
//! field_x: first vertex index (absolute)
//! field_y: word offset of the bit block
//! field_z: vertex count - 1 (8) | prim count - 1 (8) | delta bits (6) | primitive bits (4)
//! field_w: cone oct x | oct y | cutoff (8 bits each)
//! ```
//!
//! The block holds `vertex count - 1` deltas (`vertex ^ first`) followed by
//! the local indices of every primitive but the first, which is always
//! `(0, 1, 2)`. Its size matches the budget formula used by
//! [`crate::PrimitiveCache::cannot_insert_block`].

use super::{DecodedMeshlet, EncodeContext, EncodedMeshlet, MeshletLayout, pack_words};
use crate::bits::{aligned_size, get_bit_field, pack, set_bit_field, unpack};
use crate::cache::block_bits;
use crate::cone::NormalCone;
use crate::config::LayoutKind;
use crate::desc::MeshletDesc;
use crate::meshlet::Meshlet;
use crate::validation::ValidationError;

/// Local indices of the implicit first primitive
const FIRST_PRIMITIVE: [u8; 3] = [0, 1, 2];

#[derive(Debug, Clone, Copy, Default)]
pub struct DeltaLayout;

fn block_words(bits: u64) -> u32 {
    aligned_size(bits as u32, 32) / 32
}

impl MeshletLayout for DeltaLayout {
    fn kind(&self) -> LayoutKind {
        LayoutKind::Delta
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
        debug_assert!((3..=256).contains(&vertex_count));
        debug_assert!((1..=256).contains(&prim_count));
        debug_assert_eq!(meshlet.primitives[0], FIRST_PRIMITIVE);

        let first = meshlet.vertices[0];
        let delta_bits = meshlet.vertex_delta_bits;
        let primitive_bits = ctx.limits.primitive_bits;
        debug_assert!((1..=32).contains(&delta_bits));
        debug_assert!((1..=8).contains(&primitive_bits));

        let bits = block_bits(vertex_count, prim_count, delta_bits, primitive_bits);
        debug_assert!(bits <= u64::from(ctx.limits.max_block_bits));

        let offset = out.len();
        out.resize(offset + block_words(bits) as usize, 0);
        let block = &mut out[offset..];

        let mut bit = 0;
        for &vertex in &meshlet.vertices[1..] {
            set_bit_field(block, delta_bits, bit, vertex ^ first);
            bit += delta_bits;
        }
        for prim in &meshlet.primitives[1..] {
            for &local in prim {
                set_bit_field(block, primitive_bits, bit, u32::from(local));
                bit += primitive_bits;
            }
        }
        debug_assert_eq!(u64::from(bit), bits);

        let field_z = pack(vertex_count - 1, 8, 0)
            | pack(prim_count - 1, 8, 8)
            | pack(delta_bits, 6, 16)
            | pack(primitive_bits, 4, 22);

        EncodedMeshlet {
            desc: MeshletDesc::new(first, offset as u32, field_z, cone.pack()),
            vertex_slots: vertex_count,
            prim_slots: prim_count * 3,
            block_bits: bits as u32,
        }
    }

    fn decode(
        &self,
        index: usize,
        desc: &MeshletDesc,
        pack_buf: &[u32],
    ) -> Result<DecodedMeshlet, ValidationError> {
        let vertex_count = unpack(desc.field_z, 8, 0) + 1;
        let prim_count = unpack(desc.field_z, 8, 8) + 1;
        let delta_bits = unpack(desc.field_z, 6, 16);
        let primitive_bits = unpack(desc.field_z, 4, 22);

        if vertex_count < 3 || !(1..=32).contains(&delta_bits) || !(1..=8).contains(&primitive_bits)
        {
            return Err(ValidationError::BadDescriptor {
                meshlet: index,
                reason: format!(
                    "{vertex_count} vertices, {delta_bits} delta bits, {primitive_bits} primitive bits"
                ),
            });
        }

        let bits = block_bits(vertex_count, prim_count, delta_bits, primitive_bits);
        let block = pack_words(pack_buf, index, desc.field_y, block_words(bits))?;

        let first = desc.field_x;
        let mut bit = 0;
        let mut vertices = Vec::with_capacity(vertex_count as usize);
        vertices.push(first);
        for _ in 1..vertex_count {
            vertices.push(first ^ get_bit_field(block, delta_bits, bit));
            bit += delta_bits;
        }

        let mut primitives = Vec::with_capacity(prim_count as usize);
        primitives.push(FIRST_PRIMITIVE);
        for _ in 1..prim_count {
            let mut prim = [0u8; 3];
            for local in &mut prim {
                *local = get_bit_field(block, primitive_bits, bit) as u8;
                bit += primitive_bits;
            }
            primitives.push(prim);
        }

        Ok(DecodedMeshlet {
            vertices,
            primitives,
            cone: unpack(desc.field_w, 24, 0),
            quantized_bbox: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheLimits, PrimitiveCache};

    fn build(limits: CacheLimits, triangles: &[[u32; 3]]) -> Meshlet {
        let mut cache = PrimitiveCache::new(limits);
        for &[a, b, c] in triangles {
            assert!(!cache.cannot_insert_block(a, b, c));
            cache.insert(a, b, c);
        }
        cache.to_meshlet()
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let limits = CacheLimits::new(64, 64).with_block_budget(6, u32::MAX);
        let meshlet = build(
            limits,
            &[[1000, 1001, 1010], [1010, 1001, 1011], [1011, 1001, 1100], [1100, 1200, 1011]],
        );
        let positions = vec![[0.0f32; 3]; 1201];
        let ctx = EncodeContext {
            positions: &positions,
            object_bbox: Default::default(),
            limits,
        };

        let mut out = vec![7, 7];
        let encoded = DeltaLayout.encode(&meshlet, &NormalCone::OPEN, &ctx, &mut out);
        assert_eq!(encoded.desc.field_x, 1000);
        assert_eq!(encoded.desc.field_y, 2);

        // 6 vertices; 1000 ^ 1100 = 0b111_1010_0100 needs 11 bits
        assert_eq!(meshlet.vertex_delta_bits, 11);
        assert_eq!(encoded.block_bits, 5 * 11 + 3 * 3 * 6);
        assert_eq!(out.len(), 2 + 4);

        let decoded = DeltaLayout.decode(3, &encoded.desc, &out).expect("decodes");
        assert_eq!(decoded.vertices, meshlet.vertices);
        assert_eq!(decoded.primitives, meshlet.primitives);
        assert_eq!(decoded.cone, NormalCone::OPEN.pack());
        assert!(decoded.quantized_bbox.is_none());
    }

    #[test]
    fn test_block_respects_budget() {
        let limits = CacheLimits::new(64, 64).with_block_budget(6, 64);
        let mut cache = PrimitiveCache::new(limits);
        let mut accepted = 0;
        for i in 0..32u32 {
            let tri = [i, i + 1, i + 2];
            if cache.cannot_insert_block(tri[0], tri[1], tri[2]) {
                break;
            }
            cache.insert(tri[0], tri[1], tri[2]);
            accepted += 1;
        }
        assert!(accepted > 1);
        let meshlet = cache.to_meshlet();

        let positions = vec![[0.0f32; 3]; 64];
        let ctx = EncodeContext {
            positions: &positions,
            object_bbox: Default::default(),
            limits,
        };
        let mut out = Vec::new();
        let encoded = DeltaLayout.encode(&meshlet, &NormalCone::OPEN, &ctx, &mut out);
        assert!(encoded.block_bits <= 64);
        assert!(out.len() <= 2);
    }

    #[test]
    fn test_decode_rejects_zero_delta_bits() {
        let desc = MeshletDesc::new(5, 0, pack(2, 8, 0) | pack(4, 4, 22), 0);
        let err = DeltaLayout.decode(0, &desc, &[0; 4]).unwrap_err();
        assert!(matches!(err, ValidationError::BadDescriptor { .. }));
    }
}
