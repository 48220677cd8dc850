use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Configuration for the [`crate::pool::Pool`] driven by the `iopool` CLI.
#[derive(Debug, Deserialize, Clone)]
pub struct PoolConfig {
    /// Number of slots to pre-allocate in the pool's slot vector.
    #[serde(default = "default_initial_slots")]
    pub initial_slots: usize,
    /// Maximum number of concurrently open OS descriptors. `None` (absent
    /// from the TOML) means unbounded.
    #[serde(default)]
    pub max_open: Option<u32>,
    /// Chunk size used by the `cat` subcommand when streaming bytes.
    #[serde(default = "default_read_chunk_bytes")]
    pub read_chunk_bytes: usize,
}

fn default_initial_slots() -> usize {
    16
}

fn default_read_chunk_bytes() -> usize {
    64 * 1024
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_slots: default_initial_slots(),
            max_open: None,
            read_chunk_bytes: default_read_chunk_bytes(),
        }
    }
}

impl PoolConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ArgumentInvalid(format!("cannot read {path:?}: {e}")))?;
        toml::from_str(&content)
            .map_err(|e| Error::ArgumentInvalid(format!("invalid config {path:?}: {e}")))
    }
}

/// Resolve an optional `--max-open` CLI override against a loaded config.
pub fn resolve_max_open(cli_override: Option<u32>, cfg: &PoolConfig) -> Option<u32> {
    cli_override.or(cfg.max_open)
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("iopool.toml")
}
