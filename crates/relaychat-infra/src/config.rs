//! Global configuration loader for Relaychat.
//!
//! Reads `config.toml` from the data directory (`~/.relaychat/` in
//! production) and deserializes it into [`GlobalConfig`]. Falls back to
//! defaults when the file is missing or malformed.

use std::path::{Path, PathBuf};

use relaychat_types::config::{GlobalConfig, UsageConfig};

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `RELAYCHAT_DATA_DIR` environment variable
/// 2. `~/.relaychat`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RELAYCHAT_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".relaychat");
    }

    // Last resort: current directory
    PathBuf::from(".relaychat")
}

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - An out-of-range `usage.window_secs` is replaced by the default window.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(mut config) => {
            if let Err(reason) = config.usage.validate() {
                let fallback = UsageConfig::default().window_secs;
                tracing::warn!("{reason} in {}, using {fallback}", config_path.display());
                config.usage.window_secs = fallback;
            }
            config
        }
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaychat_types::llm::ProviderMode;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_global_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.usage.limit, 5);
        assert_eq!(config.providers.initial_mode, ProviderMode::Secondary);
    }

    #[tokio::test]
    async fn load_global_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(
            &config_path,
            r#"
[usage]
limit = 20

[providers]
initial_mode = "local"

[providers.local]
name = "Offline"
"#,
        )
        .await
        .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.usage.limit, 20);
        assert_eq!(config.usage.window_secs, 10_800);
        assert_eq!(config.providers.initial_mode, ProviderMode::Local);
        assert_eq!(config.providers.local.name, "Offline");
    }

    #[tokio::test]
    async fn load_global_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(&config_path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.usage.limit, 5);
    }

    #[tokio::test]
    async fn load_global_config_out_of_range_window_uses_default() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(
            &config_path,
            "[usage]\nlimit = 7\nwindow_secs = 9300000000000000\n",
        )
        .await
        .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.usage.limit, 7);
        assert_eq!(config.usage.window_secs, 10_800);
        assert_eq!(config.usage.policy().window, chrono::Duration::hours(3));
    }

    #[test]
    fn test_resolve_data_dir_from_env() {
        // SAFETY: This test is single-threaded and restores the env var immediately.
        unsafe {
            std::env::set_var("RELAYCHAT_DATA_DIR", "/tmp/test-relaychat");
        }
        let dir = resolve_data_dir();
        assert_eq!(dir, PathBuf::from("/tmp/test-relaychat"));
        unsafe {
            std::env::remove_var("RELAYCHAT_DATA_DIR");
        }
    }
}
