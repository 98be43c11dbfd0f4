//! Builder configuration
//!
//! Deserializable from the `[meshlet]` table of a `meshlet.toml` file:
//!
//! ```toml
//! [meshlet]
//! max_vertices = 64
//! max_primitives = 126
//! layout = "delta"
//! max_block_bits = 1024
//! ```

use serde::{Deserialize, Serialize};

use crate::bits::bit_width;
use crate::cache::CacheLimits;
use crate::{MAX_PRIMITIVE_COUNT_LIMIT, MAX_VERTEX_COUNT_LIMIT};

/// Descriptor layout, which also selects the admission mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    /// Absolute vertex indices, plain capacity admission
    #[default]
    Basic,
    /// XOR-delta bit block, bit-budget admission
    Delta,
}

impl LayoutKind {
    pub const fn as_u32(self) -> u32 {
        match self {
            LayoutKind::Basic => 0,
            LayoutKind::Delta => 1,
        }
    }

    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(LayoutKind::Basic),
            1 => Some(LayoutKind::Delta),
            _ => None,
        }
    }
}

impl std::str::FromStr for LayoutKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(LayoutKind::Basic),
            "delta" => Ok(LayoutKind::Delta),
            _ => Err(ConfigError::UnknownLayout(s.to_string())),
        }
    }
}

/// Invalid builder configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("max_vertices {0} out of range (must be 3-256)")]
    MaxVertices(u32),

    #[error("max_primitives {0} out of range (must be 1-256)")]
    MaxPrimitives(u32),

    #[error("primitive_bits {bits} out of range (must be {min}-8 for max_vertices)")]
    PrimitiveBits { bits: u32, min: u32 },

    #[error("max_block_bits is only supported by the delta layout")]
    BlockBudgetWithoutDelta,

    #[error("task_alignment {0} must be a non-zero power of two")]
    TaskAlignment(u32),

    #[error("parallel_chunk_triangles must be non-zero")]
    ParallelChunk,

    #[error("unknown layout {0:?} (use basic or delta)")]
    UnknownLayout(String),
}

fn default_max_vertices() -> u32 {
    64
}

fn default_max_primitives() -> u32 {
    126
}

fn default_task_alignment() -> u32 {
    32
}

/// Meshlet builder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuilderConfig {
    /// Distinct vertices per meshlet (3-256). Default: 64
    #[serde(default = "default_max_vertices")]
    pub max_vertices: u32,

    /// Primitives per meshlet (1-256). Default: 126
    #[serde(default = "default_max_primitives")]
    pub max_primitives: u32,

    /// Descriptor layout. Default: basic
    #[serde(default)]
    pub layout: LayoutKind,

    /// Bits per local index in the delta block.
    /// Default: just enough for `max_vertices - 1`
    #[serde(default)]
    pub primitive_bits: Option<u32>,

    /// Delta block budget in bits. Default: unlimited
    #[serde(default)]
    pub max_block_bits: Option<u32>,

    /// Descriptor count is padded to a multiple of this. Default: 32
    #[serde(default = "default_task_alignment")]
    pub task_alignment: u32,

    /// Build contiguous chunks of this many triangles in parallel.
    /// Default: sequential
    #[serde(default)]
    pub parallel_chunk_triangles: Option<usize>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            max_vertices: default_max_vertices(),
            max_primitives: default_max_primitives(),
            layout: LayoutKind::default(),
            primitive_bits: None,
            max_block_bits: None,
            task_alignment: default_task_alignment(),
            parallel_chunk_triangles: None,
        }
    }
}

impl BuilderConfig {
    /// Bits needed to address every local vertex
    pub fn min_primitive_bits(&self) -> u32 {
        bit_width(self.max_vertices.saturating_sub(1))
    }

    pub fn effective_primitive_bits(&self) -> u32 {
        self.primitive_bits
            .unwrap_or_else(|| self.min_primitive_bits())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(3..=MAX_VERTEX_COUNT_LIMIT as u32).contains(&self.max_vertices) {
            return Err(ConfigError::MaxVertices(self.max_vertices));
        }
        if !(1..=MAX_PRIMITIVE_COUNT_LIMIT as u32).contains(&self.max_primitives) {
            return Err(ConfigError::MaxPrimitives(self.max_primitives));
        }

        let min = self.min_primitive_bits();
        let bits = self.effective_primitive_bits();
        if bits < min || bits > 8 {
            return Err(ConfigError::PrimitiveBits { bits, min });
        }

        if self.max_block_bits.is_some() && self.layout != LayoutKind::Delta {
            return Err(ConfigError::BlockBudgetWithoutDelta);
        }
        if !self.task_alignment.is_power_of_two() {
            return Err(ConfigError::TaskAlignment(self.task_alignment));
        }
        if self.parallel_chunk_triangles == Some(0) {
            return Err(ConfigError::ParallelChunk);
        }
        Ok(())
    }

    /// Limits handed to every [`crate::PrimitiveCache`] of a build
    pub fn cache_limits(&self) -> CacheLimits {
        CacheLimits::new(self.max_vertices, self.max_primitives).with_block_budget(
            self.effective_primitive_bits(),
            self.max_block_bits.unwrap_or(u32::MAX),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = BuilderConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.effective_primitive_bits(), 6);
        let limits = config.cache_limits();
        assert_eq!(limits.max_vertex_size, 64);
        assert_eq!(limits.max_primitive_size, 126);
        assert_eq!(limits.max_block_bits, u32::MAX);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let config = BuilderConfig {
            max_vertices: 257,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MaxVertices(257)));

        let config = BuilderConfig {
            max_primitives: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MaxPrimitives(0)));

        let config = BuilderConfig {
            primitive_bits: Some(5),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::PrimitiveBits { bits: 5, min: 6 })
        );

        let config = BuilderConfig {
            task_alignment: 12,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::TaskAlignment(12)));
    }

    #[test]
    fn test_budget_requires_delta_layout() {
        let mut config = BuilderConfig {
            max_block_bits: Some(512),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::BlockBudgetWithoutDelta));

        config.layout = LayoutKind::Delta;
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.cache_limits().max_block_bits, 512);
    }

    #[test]
    fn test_parse_toml() {
        let config: BuilderConfig = toml::from_str(
            r#"
            max_vertices = 256
            layout = "delta"
            max_block_bits = 2048
            "#,
        )
        .expect("valid config");

        assert_eq!(config.max_vertices, 256);
        assert_eq!(config.max_primitives, 126);
        assert_eq!(config.layout, LayoutKind::Delta);
        assert_eq!(config.effective_primitive_bits(), 8);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_parse_layout_name() {
        assert_eq!("Delta".parse::<LayoutKind>(), Ok(LayoutKind::Delta));
        assert!(matches!(
            "packed".parse::<LayoutKind>(),
            Err(ConfigError::UnknownLayout(_))
        ));
        assert_eq!(LayoutKind::from_u32(LayoutKind::Delta.as_u32()), Some(LayoutKind::Delta));
    }
}
