/// TOML configuration (`ragline.toml`).
pub mod toml_config;

pub use toml_config::{ConfigError, RagConfig};
