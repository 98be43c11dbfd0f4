//! meshlet.toml manifest parsing
//!
//! ```toml
//! [meshlet]
//! max_vertices = 64
//! max_primitives = 126
//! layout = "delta"
//! max_block_bits = 1024
//!
//! [output]
//! verify = true
//! ```

use anyhow::{Context, Result};
use meshlet_common::{BuilderConfig, LayoutKind};
use serde::Deserialize;
use std::path::Path;

/// meshlet.toml manifest structure
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportManifest {
    #[serde(default)]
    pub meshlet: BuilderConfig,
    #[serde(default)]
    pub output: OutputSection,
}

/// Output settings
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    /// Decode and check the result after building.
    /// Default: false
    #[serde(default)]
    pub verify: bool,
}

/// Builder settings given on the command line; each one wins over the manifest
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub max_vertices: Option<u32>,
    pub max_primitives: Option<u32>,
    pub layout: Option<LayoutKind>,
    pub max_block_bits: Option<u32>,
    pub verify: bool,
}

impl ExportManifest {
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(max_vertices) = overrides.max_vertices {
            self.meshlet.max_vertices = max_vertices;
        }
        if let Some(max_primitives) = overrides.max_primitives {
            self.meshlet.max_primitives = max_primitives;
        }
        if let Some(layout) = overrides.layout {
            self.meshlet.layout = layout;
        }
        if let Some(bits) = overrides.max_block_bits {
            // A budget only makes sense for the delta layout
            self.meshlet.layout = LayoutKind::Delta;
            self.meshlet.max_block_bits = Some(bits);
        }
        self.output.verify |= overrides.verify;
    }
}

/// Load a manifest from disk
pub fn load_manifest(path: &Path) -> Result<ExportManifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    parse_manifest(&content).with_context(|| format!("Failed to parse manifest: {:?}", path))
}

pub fn parse_manifest(content: &str) -> Result<ExportManifest> {
    let manifest: ExportManifest = toml::from_str(content)?;
    manifest.meshlet.validate()?;
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_manifest_uses_defaults() {
        let manifest = parse_manifest("").unwrap();
        assert_eq!(manifest.meshlet, BuilderConfig::default());
        assert!(!manifest.output.verify);
    }

    #[test]
    fn test_parse_full_manifest() {
        let manifest = parse_manifest(
            r#"
            [meshlet]
            max_vertices = 32
            max_primitives = 48
            layout = "delta"
            max_block_bits = 512

            [output]
            verify = true
            "#,
        )
        .unwrap();
        assert_eq!(manifest.meshlet.max_vertices, 32);
        assert_eq!(manifest.meshlet.layout, LayoutKind::Delta);
        assert_eq!(manifest.meshlet.max_block_bits, Some(512));
        assert!(manifest.output.verify);
    }

    #[test]
    fn test_invalid_manifest_rejected() {
        assert!(parse_manifest("[meshlet]\nmax_vertices = 1000\n").is_err());
        assert!(parse_manifest("[meshlet]\nmax_block_bits = 64\n").is_err());
        assert!(parse_manifest("[mesh]\n").is_err());
    }

    #[test]
    fn test_overrides_win() {
        let mut manifest = parse_manifest("[meshlet]\nmax_vertices = 32\n").unwrap();
        manifest.apply(&Overrides {
            max_vertices: Some(128),
            max_block_bits: Some(256),
            verify: true,
            ..Default::default()
        });
        assert_eq!(manifest.meshlet.max_vertices, 128);
        assert_eq!(manifest.meshlet.layout, LayoutKind::Delta);
        assert!(manifest.output.verify);
    }
}
