use parkspot_core::Pagination;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    /// Server-side limit for a single statement. Abandoned claims are rolled
    /// back once it elapses.
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaginationConfig {
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { max_page_size: default_max_page_size() }
    }
}

impl From<&PaginationConfig> for Pagination {
    fn from(config: &PaginationConfig) -> Self {
        Pagination { max_page_size: config.max_page_size }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_filter() }
    }
}

fn default_max_connections() -> u32 { 5 }
fn default_acquire_timeout() -> u64 { 3 }
fn default_statement_timeout() -> u64 { 5_000 }
fn default_max_page_size() -> u32 { 100 }
fn default_filter() -> String { "parkspot_core=info,parkspot_store=info,sqlx=warn".to_string() }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local, uncommitted overrides
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `PARKSPOT_DATABASE__URL=postgres://...` sets `database.url`
            .add_source(config::Environment::with_prefix("PARKSPOT").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    const DEFAULT: &str = include_str!("../../config/default.toml");

    #[test]
    fn test_default_file_deserializes() {
        let config: Config = config::Config::builder()
            .add_source(File::from_str(DEFAULT, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.database.statement_timeout_ms, 5_000);
        assert_eq!(Pagination::from(&config.pagination).max_page_size, 100);
    }

    #[test]
    fn test_optional_sections_fall_back_to_defaults() {
        let config: Config = config::Config::builder()
            .add_source(File::from_str(
                "[database]\nurl = \"postgres://localhost/test\"\n",
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.database.acquire_timeout_secs, 3);
        assert_eq!(config.pagination.max_page_size, 100);
        assert!(config.logging.filter.contains("parkspot_core"));
    }
}
