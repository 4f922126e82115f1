//! Configuration handling for the ragctx CLI.
//!
//! The config file is TOML. Every section and field is optional; missing
//! values take their defaults.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use ragctx_core::ChunkingConfig;
use ragctx_query::RetrievalConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Context retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (`trace`, `debug`, `info`, `warn`, `error`)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load from the default config path, or defaults when no file exists.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load from `path`, falling back to the default config path.
    ///
    /// An explicit path must exist. A missing default file yields the
    /// default configuration.
    pub fn load_from(path: Option<PathBuf>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::read(&path)?,
            None => match Self::config_path() {
                Some(path) if path.exists() => Self::read(&path)?,
                _ => Self::default(),
            },
        };

        config
            .chunking
            .validate()
            .context("Invalid chunking configuration")?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Default config file location.
    pub fn config_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Annotated sample configuration.
    pub fn sample_toml() -> &'static str {
        r#"# ragctx configuration

[chunking]
# Sizes are in characters
target_chunk_size = 1000
min_chunk_size = 100
max_chunk_size = 2000
overlap_size = 200
overlap_percentage = 0.1
# sentence, paragraph, section, page, semantic, sliding_window
boundary_strategy = "semantic"
pdf_respect_pages = true
docx_respect_sections = true
csv_chunk_by_rows = true
csv_rows_per_chunk = 100
enable_entity_extraction = true
enable_reference_tracking = true
enable_semantic_analysis = true
preserve_headers = true
preserve_lists = true
preserve_tables = true
preserve_code_blocks = true
language = "en"

[retrieval]
context_window = 1
snippet_length = 500
min_confidence = 0.0

[logging]
level = "info"
"#
    }
}

/// Get the XDG config directory for ragctx.
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("RAGCTX_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }

    ProjectDirs::from("", "", "ragctx").map(|dirs| dirs.config_dir().to_path_buf())
}
