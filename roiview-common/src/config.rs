//! Configuration resolution
//!
//! The export job needs two deployment-specific values: the path of the
//! application database and the base URL of the deep-zoom image service.
//! Both resolve through a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (database path only; the service URL has none and
//!    is an error when absent)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable naming the application database file
pub const DB_ENV_VAR: &str = "ROIVIEW_DB";

/// Environment variable naming the deep-zoom service base URL
pub const SERVICE_URL_ENV_VAR: &str = "ROIVIEW_SERVICE_URL";

/// Values read from the optional TOML config file
#[derive(Debug, Default, Deserialize)]
pub struct TomlConfig {
    pub database: Option<PathBuf>,
    pub service_url: Option<String>,
}

impl TomlConfig {
    /// Load the config file if one exists; missing or unreadable files
    /// resolve to the empty config, a malformed one is ignored with a
    /// warning.
    pub fn load() -> TomlConfig {
        let Some(path) = config_file_path() else {
            return TomlConfig::default();
        };
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => return TomlConfig::default(),
        };
        match toml::from_str(&raw) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring malformed config file {}: {}", path.display(), e);
                TomlConfig::default()
            }
        }
    }
}

/// Locate the config file: user config dir first, then the system-wide
/// path on Linux.
fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = dirs::config_dir().map(|d| d.join("roiview").join("config.toml")) {
        if path.exists() {
            return Some(path);
        }
    }
    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/roiview/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }
    None
}

/// Resolve the database path; falls back to the platform data directory.
pub fn resolve_database_path(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var(DB_ENV_VAR) {
        return PathBuf::from(path);
    }
    if let Some(path) = &toml_config.database {
        return path.clone();
    }
    default_database_path()
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("roiview").join("roiview.db"))
        .unwrap_or_else(|| PathBuf::from("roiview.db"))
}

/// Resolve the deep-zoom service base URL. There is no compiled default:
/// an unconfigured URL is an error, reported with the ways to set it.
pub fn resolve_service_url(cli_arg: Option<&str>, toml_config: &TomlConfig) -> Result<String> {
    if let Some(url) = cli_arg {
        return Ok(url.to_string());
    }
    if let Ok(url) = std::env::var(SERVICE_URL_ENV_VAR) {
        return Ok(url);
    }
    if let Some(url) = &toml_config.service_url {
        return Ok(url.clone());
    }
    Err(Error::Config(format!(
        "deep-zoom service URL not configured; pass --service-url, set {}, \
         or add service_url to the config file",
        SERVICE_URL_ENV_VAR
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn toml_config_parses_both_keys() {
        let config: TomlConfig = toml::from_str(
            "database = \"/srv/app/app.db\"\nservice_url = \"http://images.local:4080\"\n",
        )
        .unwrap();
        assert_eq!(config.database.as_deref(), Some(Path::new("/srv/app/app.db")));
        assert_eq!(config.service_url.as_deref(), Some("http://images.local:4080"));
    }

    #[test]
    fn toml_config_keys_are_optional() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert!(config.database.is_none());
        assert!(config.service_url.is_none());
    }

    #[test]
    #[serial]
    fn cli_argument_wins_over_environment() {
        std::env::set_var(DB_ENV_VAR, "/from/env.db");
        let path = resolve_database_path(Some(Path::new("/from/cli.db")), &TomlConfig::default());
        std::env::remove_var(DB_ENV_VAR);
        assert_eq!(path, PathBuf::from("/from/cli.db"));
    }

    #[test]
    #[serial]
    fn environment_wins_over_toml() {
        std::env::set_var(DB_ENV_VAR, "/from/env.db");
        let toml_config = TomlConfig {
            database: Some(PathBuf::from("/from/toml.db")),
            service_url: None,
        };
        let path = resolve_database_path(None, &toml_config);
        std::env::remove_var(DB_ENV_VAR);
        assert_eq!(path, PathBuf::from("/from/env.db"));
    }

    #[test]
    #[serial]
    fn toml_used_when_cli_and_env_absent() {
        std::env::remove_var(DB_ENV_VAR);
        let toml_config = TomlConfig {
            database: Some(PathBuf::from("/from/toml.db")),
            service_url: None,
        };
        assert_eq!(
            resolve_database_path(None, &toml_config),
            PathBuf::from("/from/toml.db")
        );
    }

    #[test]
    #[serial]
    fn missing_service_url_is_a_config_error() {
        std::env::remove_var(SERVICE_URL_ENV_VAR);
        let result = resolve_service_url(None, &TomlConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    #[serial]
    fn service_url_resolves_from_environment() {
        std::env::set_var(SERVICE_URL_ENV_VAR, "http://images.local:4080");
        let url = resolve_service_url(None, &TomlConfig::default()).unwrap();
        std::env::remove_var(SERVICE_URL_ENV_VAR);
        assert_eq!(url, "http://images.local:4080");
    }
}
