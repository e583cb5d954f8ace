//! Editor configuration
//!
//! ```toml
//! exclude_sequence_files = false
//! enable_defragmentation = true
//! default_path = "/home/me/firmware"
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Switches the engine reads from the caller
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Skip the sequence index files on load and never regenerate them
    pub exclude_sequence_files: bool,

    /// Defragment the data region before every save
    pub enable_defragmentation: bool,

    /// Starting directory for file pickers; not used by the engine
    pub default_path: Option<PathBuf>,
}

impl EditorConfig {
    /// Read a TOML config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from {:?}", path);
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn with_defragmentation(mut self, enabled: bool) -> Self {
        self.enable_defragmentation = enabled;
        self
    }

    pub fn with_sequence_files_excluded(mut self, excluded: bool) -> Self {
        self.exclude_sequence_files = excluded;
        self
    }
}
