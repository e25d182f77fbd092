use crate::config::schema::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[cfg(test)]
use std::sync::Mutex;

#[cfg(test)]
static CONFIG_TEST_ENV_LOCK: Mutex<()> = Mutex::new(());

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file contains invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),
}

/// Loads configuration in three layers: file, environment, CLI overrides.
///
/// Later layers win. The file layer is `~/.stockdeck/config.json` unless a
/// path is supplied on the command line.
pub fn load_config(cli_config_path: Option<PathBuf>) -> Result<Config> {
    tracing::debug!("Loading configuration");

    let mut config = Config::default();

    // Layer 1: config file (~/.stockdeck/config.json)
    let config_file = cli_config_path.or_else(get_default_config_path);

    if let Some(ref path) = config_file {
        if path.exists() {
            tracing::debug!(config_path = %path.display(), "Loading configuration from file");
            config = merge_config_from_file(path)?;
        } else {
            tracing::debug!(config_path = %path.display(), "Config file not found, using defaults");
        }
    }

    // Layer 2: environment variables override
    merge_env_variables(&mut config);

    tracing::debug!(
        api_url = %config.api_url,
        ws_url = %config.ws_url,
        idle_timeout_secs = config.idle_timeout_secs,
        absolute_timeout_secs = config.absolute_timeout_secs,
        "Configuration loaded"
    );

    Ok(config)
}

/// Returns the default config file path (`~/.stockdeck/config.json`)
pub fn get_default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".stockdeck").join("config.json"))
}

fn merge_config_from_file(path: &PathBuf) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .map_err(ConfigError::IoError)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    let config: Config = serde_json::from_str(&contents)
        .map_err(ConfigError::InvalidJson)
        .with_context(|| format!("Invalid JSON in config file at {}", path.display()))?;

    Ok(config)
}

fn merge_env_variables(config: &mut Config) {
    if let Ok(url) = std::env::var("STOCKDECK_API_URL") {
        config.api_url = url;
    }
    if let Ok(url) = std::env::var("STOCKDECK_WS_URL") {
        config.ws_url = url;
    }
    merge_env_u64("STOCKDECK_IDLE_TIMEOUT_SECS", &mut config.idle_timeout_secs);
    merge_env_u64(
        "STOCKDECK_ABSOLUTE_TIMEOUT_SECS",
        &mut config.absolute_timeout_secs,
    );
    merge_env_u64(
        "STOCKDECK_RECONNECT_INITIAL_DELAY_SECS",
        &mut config.reconnect_initial_delay_secs,
    );
    merge_env_u64(
        "STOCKDECK_RECONNECT_MAX_DELAY_SECS",
        &mut config.reconnect_max_delay_secs,
    );
    merge_env_u64(
        "STOCKDECK_REQUEST_TIMEOUT_SECS",
        &mut config.request_timeout_secs,
    );

    if let Ok(value) = std::env::var("STOCKDECK_RECONNECT_MAX_ATTEMPTS") {
        match value.parse::<u32>() {
            Ok(parsed) => config.reconnect_max_attempts = Some(parsed),
            Err(_) => {
                tracing::warn!(value = %value, "Ignoring invalid STOCKDECK_RECONNECT_MAX_ATTEMPTS")
            }
        }
    }

    if let Ok(value) = std::env::var("STOCKDECK_EXTEND_ABSOLUTE_ON_REFRESH") {
        config.extend_absolute_on_refresh = matches!(value.as_str(), "1" | "true" | "yes");
    }
}

fn merge_env_u64(name: &str, target: &mut u64) {
    if let Ok(value) = std::env::var(name) {
        match value.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => tracing::warn!(var = name, value = %value, "Ignoring invalid env override"),
        }
    }
}

/// Saves the configuration to the given path with restrictive permissions.
pub fn save_config(config: &Config, path: &PathBuf) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
    }

    let contents = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(path, contents)
        .with_context(|| format!("Failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(path, perms)
            .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn clear_env() {
        for var in [
            "STOCKDECK_API_URL",
            "STOCKDECK_WS_URL",
            "STOCKDECK_IDLE_TIMEOUT_SECS",
            "STOCKDECK_ABSOLUTE_TIMEOUT_SECS",
            "STOCKDECK_RECONNECT_INITIAL_DELAY_SECS",
            "STOCKDECK_RECONNECT_MAX_DELAY_SECS",
            "STOCKDECK_REQUEST_TIMEOUT_SECS",
            "STOCKDECK_RECONNECT_MAX_ATTEMPTS",
            "STOCKDECK_EXTEND_ABSOLUTE_ON_REFRESH",
        ] {
            unsafe { std::env::remove_var(var) };
        }
    }

    #[test]
    fn test_load_config_defaults_when_file_missing() {
        let _guard = CONFIG_TEST_ENV_LOCK.lock().unwrap();
        clear_env();

        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("config.json");
        let config = load_config(Some(missing)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_config_from_file() {
        let _guard = CONFIG_TEST_ENV_LOCK.lock().unwrap();
        clear_env();

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"api_url": "https://api.example.com", "idle_timeout_secs": 60}"#,
        )
        .unwrap();

        let config = load_config(Some(path)).unwrap();
        assert_eq!(config.api_url, "https://api.example.com");
        assert_eq!(config.idle_timeout_secs, 60);
        assert_eq!(config.absolute_timeout_secs, 1800);
    }

    #[test]
    fn test_env_overrides_file() {
        let _guard = CONFIG_TEST_ENV_LOCK.lock().unwrap();
        clear_env();

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"api_url": "https://from-file.example.com"}"#).unwrap();

        unsafe {
            std::env::set_var("STOCKDECK_API_URL", "https://from-env.example.com");
            std::env::set_var("STOCKDECK_RECONNECT_MAX_ATTEMPTS", "5");
        }

        let config = load_config(Some(path)).unwrap();
        assert_eq!(config.api_url, "https://from-env.example.com");
        assert_eq!(config.reconnect_max_attempts, Some(5));

        clear_env();
    }

    #[test]
    fn test_invalid_env_value_ignored() {
        let _guard = CONFIG_TEST_ENV_LOCK.lock().unwrap();
        clear_env();

        unsafe { std::env::set_var("STOCKDECK_IDLE_TIMEOUT_SECS", "not-a-number") };

        let temp_dir = TempDir::new().unwrap();
        let config = load_config(Some(temp_dir.path().join("config.json"))).unwrap();
        assert_eq!(config.idle_timeout_secs, 300);

        clear_env();
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let _guard = CONFIG_TEST_ENV_LOCK.lock().unwrap();
        clear_env();

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(load_config(Some(path)).is_err());
    }

    #[test]
    fn test_save_config_roundtrip() {
        let _guard = CONFIG_TEST_ENV_LOCK.lock().unwrap();
        clear_env();

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");

        let config = Config {
            api_url: "https://saved.example.com".to_string(),
            ..Config::default()
        };
        save_config(&config, &path).unwrap();

        let loaded = load_config(Some(path)).unwrap();
        assert_eq!(loaded.api_url, "https://saved.example.com");
    }
}
