//! Finalized meshlet tables

/// One finalized cluster, copied out of a [`crate::PrimitiveCache`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Meshlet {
    /// Global vertex indices, admission order, unique
    pub vertices: Vec<u32>,
    /// Local index triples into `vertices`
    pub primitives: Vec<[u8; 3]>,
    /// Widest XOR delta against `vertices[0]`
    pub vertex_delta_bits: u32,
    /// Widest absolute index
    pub vertex_all_bits: u32,
}

impl Meshlet {
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn primitive_count(&self) -> u32 {
        self.primitives.len() as u32
    }

    /// Primitives resolved back to global indices
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.primitives.iter().map(|prim| {
            [
                self.vertices[prim[0] as usize],
                self.vertices[prim[1] as usize],
                self.vertices[prim[2] as usize],
            ]
        })
    }
}
