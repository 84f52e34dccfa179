//! Configuration for statement generation.
//!
//! [`RelmetaConfig::load`] reads `config/relmeta.toml` (optional) and `RELMETA__*`
//! environment variables, for example `RELMETA__DIALECT=postgres` and
//! `RELMETA__TABLE_PREFIX=app_`.

use crate::statement::Dialect;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "config/relmeta.toml";

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct RelmetaConfig {
    /// SQL dialect for placeholders and insert-or-ignore statements
    #[serde(default)]
    pub dialect: Dialect,
    /// Prefix applied to every registered storage name
    #[serde(default)]
    pub table_prefix: Option<String>,
}

impl RelmetaConfig {
    /// Load from `config/relmeta.toml`, falling back to env vars, then to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix("RELMETA").separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("failed to load {CONFIG_FILE}, falling back to env: {err}");
                Config::builder()
                    .add_source(Environment::with_prefix("RELMETA").separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {err}, \
                             then env-only error: {env_err}"
                        ))
                    })?
            }
        };

        settings.try_deserialize::<RelmetaConfig>().map_err(|e| {
            ConfigError::Message(format!("relmeta configuration is invalid: {e}"))
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(text, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = RelmetaConfig::from_toml("").unwrap();
        assert_eq!(cfg.dialect, Dialect::Sqlite);
        assert_eq!(cfg.table_prefix, None);
    }

    #[test]
    fn test_from_toml() {
        let cfg =
            RelmetaConfig::from_toml("dialect = \"postgres\"\ntable_prefix = \"app_\"").unwrap();
        assert_eq!(cfg.dialect, Dialect::Postgres);
        assert_eq!(cfg.table_prefix.as_deref(), Some("app_"));
    }

    #[test]
    fn test_unknown_dialect_is_rejected() {
        assert!(RelmetaConfig::from_toml("dialect = \"oracle\"").is_err());
    }
}
