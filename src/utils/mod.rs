/// String cleaning helpers (markdown, HTML).
pub mod text;
/// TOML configuration loading and validation.
pub mod toml_config;
