use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_DATABASE_PATH: &str = "opteyes.db";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Root of the `{dataset}/{label}/{datapoint-id}` tree.
    pub data_dir: String,
    /// SQLite file holding the index.
    pub database_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: DEFAULT_DATA_DIR.to_string(),
            database_path: DEFAULT_DATABASE_PATH.to_string(),
        }
    }
}

/// Defaults, then `Config.{toml,json,...}` if present, then `OPTEYES_*` env vars.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    load_from(ConfigFile::with_name("Config").required(false))
}

fn load_from(
    file: ConfigFile<config::FileSourceFile, config::FileFormat>,
) -> Result<AppConfig, ConfigError> {
    Config::builder()
        .set_default("data_dir", DEFAULT_DATA_DIR)?
        .set_default("database_path", DEFAULT_DATABASE_PATH)?
        .add_source(file)
        .add_source(Environment::with_prefix("OPTEYES"))
        .build()?
        .try_deserialize::<AppConfig>()
}
