// --- File: crates/calgraph_config/src/env_vars.rs ---
//! Environment variable naming for configuration overrides.
//!
//! Any setting can be overridden with `CALGRAPH__<SECTION>__<KEY>`, for
//! example `CALGRAPH__AZURE__CLIENTID`. The prefix itself can be changed with
//! the `PREFIX` variable.

use std::env;

/// The default prefix for configuration environment variables
pub const DEFAULT_PREFIX: &str = "CALGRAPH";

/// The separator for configuration environment variables
pub const CONFIG_SEPARATOR: &str = "__";

/// Get the prefix for configuration environment variables
pub fn get_config_prefix() -> String {
    env::var("PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string())
}

/// Convert a configuration path to an environment variable name
///
/// # Arguments
///
/// * `path` - The configuration path (e.g., "azure.clientid")
///
/// # Returns
///
/// The environment variable name (e.g., "CALGRAPH__AZURE__CLIENTID")
pub fn config_path_to_env_var(path: &str) -> String {
    let prefix = get_config_prefix();
    let path = path.replace('.', CONFIG_SEPARATOR);
    format!("{}{}{}", prefix, CONFIG_SEPARATOR, path).to_uppercase()
}

/// Get an environment variable for a configuration path
pub fn get_config_env_var(path: &str) -> Option<String> {
    env::var(config_path_to_env_var(path)).ok()
}
