// --- File: crates/calgraph_config/src/lib.rs ---
use config::{Config, ConfigError, Environment, File, FileFormat};
use once_cell::sync::OnceCell;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

pub mod env_vars;
pub mod models;
pub use models::*;

use env_vars::{config_path_to_env_var, get_config_prefix, CONFIG_SEPARATOR};

/// Files read when no explicit path is given. Later files override earlier ones.
pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["config.cfg", "config.dev.cfg"];

/// Loads the configuration from the default files.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let paths: Vec<PathBuf> = DEFAULT_CONFIG_FILES.iter().map(PathBuf::from).collect();
    load_config_from(&paths)
}

/// Loads the configuration from the given INI files plus `CALGRAPH__*` environment overrides.
///
/// Missing files are skipped. Keys are matched case-insensitively and without
/// underscores, so `clientId`, `client_id` and `CALGRAPH__AZURE__CLIENTID`
/// all address the same setting.
pub fn load_config_from<P: AsRef<Path>>(paths: &[P]) -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let prefix = get_config_prefix();
    let mut builder = Config::builder();
    for path in paths {
        let path = path.as_ref();
        debug!("config: adding source {}", path.display());
        builder = builder.add_source(
            File::new(&path.to_string_lossy(), FileFormat::Ini).required(false),
        );
    }
    let builder = builder.add_source(Environment::with_prefix(&prefix).separator(CONFIG_SEPARATOR));

    let mut raw: Value = builder.build()?.try_deserialize()?;
    normalize_keys(&mut raw);

    let config: AppConfig = Config::try_from(&raw)?.try_deserialize()?;
    validate(&config)?;
    Ok(config)
}

/// Recursively rewrites object keys to lowercase without underscores.
///
/// When two spellings collide the one already in normalised form wins; the
/// environment source always produces that form.
fn normalize_keys(value: &mut Value) {
    if let Value::Object(map) = value {
        let mut normalized = Map::new();
        for (key, mut child) in std::mem::take(map) {
            normalize_keys(&mut child);
            let flat = key.to_lowercase().replace('_', "");
            if flat == key || !normalized.contains_key(&flat) {
                normalized.insert(flat, child);
            }
        }
        *map = normalized;
    }
}

fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    let required = [
        ("azure.clientid", config.azure.client_id.as_str()),
        ("azure.tenantid", config.azure.tenant_id.as_str()),
        ("azure.graphuserscopes", config.azure.graph_user_scopes.as_str()),
    ];
    for (path, value) in required {
        if value.trim().is_empty() {
            return Err(ConfigError::Message(format!(
                "{path} must not be empty (set it in config.cfg or {})",
                config_path_to_env_var(path)
            )));
        }
    }
    if config.graph.availability_interval == 0 {
        return Err(ConfigError::Message(
            "graph.availability_interval must be at least one minute".to_string(),
        ));
    }
    Ok(())
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Ensures that the dotenv file is loaded into the environment variables.
///
/// The file is `.env` unless `DOTENV_OVERRIDE` names another one. Loading
/// happens at most once per process; the chosen path is returned.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path = std::env::var("DOTENV_OVERRIDE").unwrap_or_else(|_| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}
