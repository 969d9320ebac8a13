//! Splits multilingual base documents into one document per language.
//!
//! Content for each language is written inline and separated by switch
//! markers (`<!-- [en] -->` or `# [en]`). The pipeline is:
//! configuration extraction, health check, classification, then table of
//! contents insertion. See [`convert`] and friends.

pub mod classify;
pub mod config;
pub mod convert;
pub mod health;
pub mod io;
pub mod lang_map;
pub mod markers;
pub mod source;
pub mod toc;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use classify::{ActiveTag, Classification, classify};
pub use config::{Config, ConfigError, LangTag, extract_config, extract_config_from_tree};
pub use convert::{
    ConvertError, ConvertOptions, Notebook, convert, convert_lines, convert_notebook, convert_tree,
};
pub use health::{HealthChecker, HealthStatus, Verbosity};
pub use io::*;
pub use lang_map::LangMap;
pub use markers::Marker;
