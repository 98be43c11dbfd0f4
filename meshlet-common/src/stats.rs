//! Meshlet quality statistics
//!
//! Purely observational. One [`Stats`] is produced per build; several can be
//! summed with [`Stats::append`] to report averages over many meshes.

use std::fmt;

/// Aggregated meshlet metrics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    pub meshlets_total: usize,
    /// Slightly more than `meshlets_total` due to task-group alignment
    pub meshlets_stored: usize,
    /// Meshlets whose normal cone allows backface culling
    pub backface_total: usize,

    /// Stored primitive index slots, including padding
    pub prim_indices: usize,
    pub prim_total: usize,

    /// Stored vertex index slots, including padding
    pub vertex_indices: usize,
    pub vertex_total: usize,

    /// Delta block payload bits (delta layout only)
    pub block_bits_total: usize,

    /// Number of builds summed into this instance
    pub appended: usize,

    pub prim_load_avg: f64,
    pub prim_load_var: f64,
    pub vertex_load_avg: f64,
    pub vertex_load_var: f64,
}

/// Mean and population variance of `values`
fn mean_var(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let count = values.clone().count();
    if count == 0 {
        return (0.0, 0.0);
    }
    let mean = values.clone().sum::<f64>() / count as f64;
    let var = values.map(|v| (v - mean) * (v - mean)).sum::<f64>() / count as f64;
    (mean, var)
}

impl Stats {
    /// Fill the load averages from per-meshlet `(vertices, primitives)` counts.
    ///
    /// Loads are relative to the configured maxima and count as one appended build.
    pub fn set_loads(&mut self, counts: &[(u32, u32)], max_vertices: u32, max_prims: u32) {
        let (prim_avg, prim_var) =
            mean_var(counts.iter().map(|&(_, p)| f64::from(p) / f64::from(max_prims)));
        let (vertex_avg, vertex_var) =
            mean_var(counts.iter().map(|&(v, _)| f64::from(v) / f64::from(max_vertices)));

        self.prim_load_avg = prim_avg;
        self.prim_load_var = prim_var;
        self.vertex_load_avg = vertex_avg;
        self.vertex_load_var = vertex_var;
        self.appended = 1;
    }

    /// Sum every field of `other` into `self`
    pub fn append(&mut self, other: &Stats) {
        self.meshlets_total += other.meshlets_total;
        self.meshlets_stored += other.meshlets_stored;
        self.backface_total += other.backface_total;

        self.prim_indices += other.prim_indices;
        self.prim_total += other.prim_total;
        self.vertex_indices += other.vertex_indices;
        self.vertex_total += other.vertex_total;
        self.block_bits_total += other.block_bits_total;

        self.appended += other.appended;
        self.prim_load_avg += other.prim_load_avg;
        self.prim_load_var += other.prim_load_var;
        self.vertex_load_avg += other.vertex_load_avg;
        self.vertex_load_var += other.vertex_load_var;
    }

    /// Fraction of meshlets that can be backface culled
    pub fn backface_ratio(&self) -> f64 {
        if self.meshlets_total == 0 {
            return 0.0;
        }
        self.backface_total as f64 / self.meshlets_total as f64
    }

    /// Stored vertex slots per real vertex, minus one
    pub fn vertex_waste(&self) -> f64 {
        if self.vertex_total == 0 {
            return 0.0;
        }
        self.vertex_indices as f64 / self.vertex_total as f64 - 1.0
    }

    /// Stored primitive slots per real primitive index, minus one
    pub fn prim_waste(&self) -> f64 {
        if self.prim_total == 0 {
            return 0.0;
        }
        self.prim_indices as f64 / (self.prim_total * 3) as f64 - 1.0
    }

    /// Padding descriptors per real meshlet
    pub fn meshlet_waste(&self) -> f64 {
        if self.meshlets_total == 0 {
            return 0.0;
        }
        self.meshlets_stored as f64 / self.meshlets_total as f64 - 1.0
    }
}

/// One report line; prints nothing for empty stats
impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.appended == 0 || self.meshlets_total == 0 {
            return Ok(());
        }

        let prim_load_avg = self.prim_load_avg / self.appended as f64;
        let vertex_load_avg = self.vertex_load_avg / self.appended as f64;

        write!(
            f,
            "meshlets; {:7}; prim; {:9}; {:.2}; vertex; {:9}; {:.2}; backface; {:.2}; waste; v; {:.2}; p; {:.2}; m; {:.2};",
            self.meshlets_total,
            self.prim_total,
            prim_load_avg,
            self.vertex_total,
            vertex_load_avg,
            self.backface_ratio(),
            self.vertex_waste(),
            self.prim_waste(),
            self.meshlet_waste(),
        )
    }
}
