//! Engine configuration
//!
//! Loaded from JSON with [`EngineConfig::from_file`]; every section falls back
//! to its `Default` when omitted.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub refine: RefineConfig,
    pub simplify: SimplifyConfig,
    pub store: StoreConfig,
}

impl EngineConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.refine.max_expansion_depth == 0 {
            return Err(Error::Config("refine.max_expansion_depth must be at least 1".into()));
        }
        if self.simplify.max_rewrites_per_node == 0 {
            return Err(Error::Config("simplify.max_rewrites_per_node must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RefineConfig {
    /// Rounds of generated-op expansion before giving up.
    pub max_expansion_depth: usize,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self { max_expansion_depth: 16 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimplifyConfig {
    pub enabled: bool,
    /// Upper bound on rewrites applied at a single node before moving on.
    pub max_rewrites_per_node: usize,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_rewrites_per_node: 32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Warn when two ops render identically and accept overlapping inputs.
    pub check_ambiguous_signatures: bool,
    /// Reject non-hidden ops that lack descriptions.
    pub require_documentation: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            check_ambiguous_signatures: cfg!(debug_assertions),
            require_documentation: true,
        }
    }
}
