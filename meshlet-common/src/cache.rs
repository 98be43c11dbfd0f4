//! Meshlet construction state
//!
//! [`PrimitiveCache`] finds the unique vertex set used by a run of triangles.
//! A driver asks whether the next triangle still fits (`cannot_insert` or
//! `cannot_insert_block`, both side-effect free) and only then calls
//! [`PrimitiveCache::insert`]. When a check fails the driver finalizes the
//! current meshlet, resets the cache and retries the same triangle.
//!
//! Storage is sized to the hard limits so inserting never allocates.

use crate::bits::{bit_width, find_msb};
use crate::meshlet::Meshlet;
use crate::{MAX_PRIMITIVE_COUNT_LIMIT, MAX_VERTEX_COUNT_LIMIT};

/// Capacity limits applied by a [`PrimitiveCache`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLimits {
    /// Maximum distinct vertices per meshlet, `1..=256`
    pub max_vertex_size: u32,
    /// Maximum primitives per meshlet, `1..=256`
    pub max_primitive_size: u32,
    /// Bits per local vertex reference inside a primitive
    pub primitive_bits: u32,
    /// Budget for the delta-encoded payload, `u32::MAX` for unlimited
    pub max_block_bits: u32,
}

impl CacheLimits {
    pub const fn new(max_vertex_size: u32, max_primitive_size: u32) -> Self {
        Self {
            max_vertex_size,
            max_primitive_size,
            primitive_bits: 1,
            max_block_bits: u32::MAX,
        }
    }

    pub const fn with_block_budget(mut self, primitive_bits: u32, max_block_bits: u32) -> Self {
        self.primitive_bits = primitive_bits;
        self.max_block_bits = max_block_bits;
        self
    }
}

#[inline]
fn is_degenerate(indices: &[u32; 3]) -> bool {
    indices[0] == indices[1] || indices[0] == indices[2] || indices[1] == indices[2]
}

/// Payload bits of a delta block holding `vertices` and `prims`.
///
/// The first vertex is stored absolute and the first primitive is always
/// `(0, 1, 2)`, so neither contributes.
#[inline]
pub(crate) fn block_bits(vertices: u32, prims: u32, delta_bits: u32, primitive_bits: u32) -> u64 {
    let vert_bits = u64::from(vertices.saturating_sub(1)) * u64::from(delta_bits);
    let prim_bits = u64::from(prims.saturating_sub(1)) * 3 * u64::from(primitive_bits);
    vert_bits + prim_bits
}

/// Builder state for one meshlet
#[derive(Clone)]
pub struct PrimitiveCache {
    primitives: [[u8; 3]; MAX_PRIMITIVE_COUNT_LIMIT],
    vertices: [u32; MAX_VERTEX_COUNT_LIMIT],
    num_prims: u32,
    num_vertices: u32,
    num_vertex_delta_bits: u32,
    num_vertex_all_bits: u32,
    limits: CacheLimits,
}

impl PrimitiveCache {
    /// Create an empty cache. Limits are clamped to the hard maxima.
    pub fn new(limits: CacheLimits) -> Self {
        debug_assert!(limits.max_vertex_size > 0 && limits.max_primitive_size > 0);
        let limits = CacheLimits {
            max_vertex_size: limits.max_vertex_size.min(MAX_VERTEX_COUNT_LIMIT as u32),
            max_primitive_size: limits.max_primitive_size.min(MAX_PRIMITIVE_COUNT_LIMIT as u32),
            ..limits
        };
        Self {
            primitives: [[0; 3]; MAX_PRIMITIVE_COUNT_LIMIT],
            vertices: [u32::MAX; MAX_VERTEX_COUNT_LIMIT],
            num_prims: 0,
            num_vertices: 0,
            num_vertex_delta_bits: 0,
            num_vertex_all_bits: 0,
            limits,
        }
    }

    pub fn limits(&self) -> CacheLimits {
        self.limits
    }

    pub fn is_empty(&self) -> bool {
        self.num_vertices == 0
    }

    pub fn num_vertices(&self) -> u32 {
        self.num_vertices
    }

    pub fn num_prims(&self) -> u32 {
        self.num_prims
    }

    /// Widest XOR delta against the first vertex, in bits
    pub fn num_vertex_delta_bits(&self) -> u32 {
        self.num_vertex_delta_bits
    }

    /// Widest absolute vertex index, in bits
    pub fn num_vertex_all_bits(&self) -> u32 {
        self.num_vertex_all_bits
    }

    /// Global vertex indices in admission order
    pub fn vertices(&self) -> &[u32] {
        &self.vertices[..self.num_vertices as usize]
    }

    /// Primitives as local offsets into [`Self::vertices`]
    pub fn primitives(&self) -> &[[u8; 3]] {
        &self.primitives[..self.num_prims as usize]
    }

    pub fn reset(&mut self) {
        self.num_prims = 0;
        self.num_vertices = 0;
        self.num_vertex_delta_bits = 0;
        self.num_vertex_all_bits = 0;
        self.vertices.fill(u32::MAX);
    }

    /// Current payload fits the block budget (simple formula)
    pub fn fits_block(&self) -> bool {
        block_bits(
            self.num_vertices,
            self.num_prims,
            self.num_vertex_delta_bits,
            self.limits.primitive_bits,
        ) <= u64::from(self.limits.max_block_bits)
    }

    /// How many of `indices` are already in the vertex table
    #[inline]
    fn count_found(&self, indices: &[u32; 3]) -> u32 {
        self.vertices()
            .iter()
            .map(|v| indices.iter().filter(|&&idx| idx == *v).count() as u32)
            .sum()
    }

    /// True if the triangle would exceed the vertex or primitive limit.
    ///
    /// Degenerate triangles report `false`; [`Self::insert`] drops them.
    pub fn cannot_insert(&self, a: u32, b: u32, c: u32) -> bool {
        let indices = [a, b, c];
        if is_degenerate(&indices) {
            return false;
        }

        let found = self.count_found(&indices);
        (self.num_vertices + 3 - found) > self.limits.max_vertex_size
            || (self.num_prims + 1) > self.limits.max_primitive_size
    }

    /// Like [`Self::cannot_insert`] but also enforces the delta block budget.
    ///
    /// The delta width is shared by the whole meshlet, so a new vertex far
    /// from the first one widens every stored delta.
    pub fn cannot_insert_block(&self, a: u32, b: u32, c: u32) -> bool {
        let indices = [a, b, c];
        if is_degenerate(&indices) {
            return false;
        }

        let found = self.count_found(&indices);

        // `| 1` keeps find_msb defined and reserves at least one delta bit
        let first_vertex = if self.num_vertices > 0 {
            self.vertices[0]
        } else {
            indices[0]
        };
        let cmp_bits = indices
            .iter()
            .map(|&idx| find_msb((first_vertex ^ idx) | 1))
            .max()
            .unwrap_or(0)
            + 1;
        let delta_bits = cmp_bits.max(self.num_vertex_delta_bits);

        let new_vertices = self.num_vertices + 3 - found;
        let new_prims = self.num_prims + 1;
        let new_bits = block_bits(new_vertices, new_prims, delta_bits, self.limits.primitive_bits);

        new_prims > self.limits.max_primitive_size
            || new_vertices > self.limits.max_vertex_size
            || new_bits > u64::from(self.limits.max_block_bits)
    }

    /// Admit a triangle. The caller must have checked admission first.
    pub fn insert(&mut self, a: u32, b: u32, c: u32) {
        let indices = [a, b, c];
        if is_degenerate(&indices) {
            return;
        }

        let mut tri = [0u8; 3];
        for (slot, &idx) in tri.iter_mut().zip(indices.iter()) {
            let existing = self.vertices().iter().position(|&v| v == idx);
            *slot = match existing {
                Some(local) => local as u8,
                None => {
                    let local = self.num_vertices as usize;
                    debug_assert!(local < MAX_VERTEX_COUNT_LIMIT, "vertex table overflow");
                    self.vertices[local] = idx;

                    if local > 0 {
                        let delta = bit_width(idx ^ self.vertices[0]);
                        self.num_vertex_delta_bits = self.num_vertex_delta_bits.max(delta);
                    }
                    self.num_vertex_all_bits = self.num_vertex_all_bits.max(bit_width(idx));

                    self.num_vertices += 1;
                    local as u8
                }
            };
        }

        debug_assert!(
            (self.num_prims as usize) < MAX_PRIMITIVE_COUNT_LIMIT,
            "primitive table overflow"
        );
        self.primitives[self.num_prims as usize] = tri;
        self.num_prims += 1;

        debug_assert!(self.fits_block(), "insert exceeded the block budget");
    }

    /// Copy the accumulated tables into an owned [`Meshlet`]
    pub fn to_meshlet(&self) -> Meshlet {
        Meshlet {
            vertices: self.vertices().to_vec(),
            primitives: self.primitives().to_vec(),
            vertex_delta_bits: self.num_vertex_delta_bits,
            vertex_all_bits: self.num_vertex_all_bits,
        }
    }
}

impl std::fmt::Debug for PrimitiveCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrimitiveCache")
            .field("vertices", &self.vertices())
            .field("primitives", &self.primitives())
            .field("num_vertex_delta_bits", &self.num_vertex_delta_bits)
            .field("num_vertex_all_bits", &self.num_vertex_all_bits)
            .field("limits", &self.limits)
            .finish()
    }
}
