//! # Configuration
//!
//! Entree configuration is a [`confique`]-derived struct loaded in layers.
//!
//! ## Resolution Order
//!
//! Highest priority first:
//! 1. **Environment variables**: `ENTREE_DATA_FILE`, `ENTREE_EXPORT_FILE_NAME`.
//! 2. **Project Config**: `entree.toml` in the working directory.
//! 3. **Global Config**: `entree.toml` in the OS-appropriate config directory (via the
//!    `directories` crate).
//! 4. **Compiled Defaults**: `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `data_file` | `entity_hierarchy.json` | Document the CLI reads and writes |
//! | `export_file_name` | `entity_hierarchy.json` | Name of the export artifact |
//! | `import_extensions` | `[".json"]` | File extensions accepted by import |

use crate::error::{EntreeError, Result};
use crate::io::DEFAULT_EXPORT_FILE_NAME;
use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "entree.toml";

fn default_import_ext() -> Vec<String> {
    vec![".json".to_string()]
}

/// Configuration for entree, stored in `entree.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EntreeConfig {
    /// Document read and written by the CLI, relative to the working directory.
    #[config(env = "ENTREE_DATA_FILE", default = "entity_hierarchy.json")]
    pub data_file: String,

    /// File name used by `export`.
    #[config(env = "ENTREE_EXPORT_FILE_NAME", default = "entity_hierarchy.json")]
    pub export_file_name: String,

    /// Extensions accepted on import. When absent, defaults to [".json"].
    pub import_extensions: Option<Vec<String>>,
}

impl Default for EntreeConfig {
    fn default() -> Self {
        Self {
            data_file: DEFAULT_EXPORT_FILE_NAME.to_string(),
            export_file_name: DEFAULT_EXPORT_FILE_NAME.to_string(),
            import_extensions: None,
        }
    }
}

impl EntreeConfig {
    /// Import extensions, normalized to start with a dot.
    pub fn import_extensions(&self) -> Vec<String> {
        self.import_extensions
            .clone()
            .unwrap_or_else(default_import_ext)
            .into_iter()
            .map(|ext| {
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{}", ext)
                }
            })
            .collect()
    }

    /// Loads the layered configuration for `project_dir`.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let mut builder = Self::builder()
            .env()
            .file(project_dir.join(CONFIG_FILE_NAME));
        if let Some(global) = global_config_path() {
            builder = builder.file(global);
        }
        let config = builder
            .load()
            .map_err(|e| EntreeError::Config(e.to_string()))?;
        debug!(?config, "configuration loaded");
        Ok(config)
    }
}

/// `entree.toml` inside the OS config directory, when one can be determined.
pub fn global_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "entree", "entree")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = EntreeConfig::default();
        assert_eq!(config.data_file, "entity_hierarchy.json");
        assert_eq!(config.export_file_name, "entity_hierarchy.json");
        assert_eq!(config.import_extensions(), vec![".json"]);
    }

    #[test]
    fn test_import_extensions_custom() {
        let config = EntreeConfig {
            import_extensions: Some(vec![".json".to_string(), "geojson".to_string()]),
            ..Default::default()
        };
        assert_eq!(config.import_extensions(), vec![".json", ".geojson"]);
    }

    #[test]
    fn test_load_reads_project_file() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "data_file = \"model.json\"\nimport_extensions = [\"json\", \".txt\"]\n",
        )
        .unwrap();

        let config = EntreeConfig::load(dir.path()).unwrap();
        assert_eq!(config.data_file, "model.json");
        assert_eq!(config.import_extensions(), vec![".json", ".txt"]);
    }

    #[test]
    fn test_load_reports_bad_toml() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "data_file = [").unwrap();
        let err = EntreeConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, EntreeError::Config(_)));
    }
}
