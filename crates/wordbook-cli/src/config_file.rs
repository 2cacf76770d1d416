//! Persistent cloud configuration for the CLI.
//!
//! One JSON file holding a [`CloudConfig`]; `WORDBOOK_SUPABASE_URL` and
//! `WORDBOOK_SUPABASE_ANON_KEY` override the stored values at runtime
//! without being written back.

use std::path::{Path, PathBuf};

use wordbook_core::config::CloudConfig;
use wordbook_core::util::normalize_text_option;

const CONFIG_FILE_NAME: &str = "config.json";

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| panic!("Failed to resolve CLI config directory"))
        .join("wordbook")
        .join(CONFIG_FILE_NAME)
}

/// Load the effective runtime configuration: stored file plus env overrides.
pub fn load() -> Result<CloudConfig, String> {
    let mut config = load_from_path(&default_config_path())?;
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Load the stored configuration only. A missing file is an empty config.
pub fn load_from_path(path: &Path) -> Result<CloudConfig, String> {
    if !path.exists() {
        return Ok(CloudConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
    let mut config = serde_json::from_str::<CloudConfig>(&raw)
        .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
    normalize(&mut config);
    Ok(config)
}

pub fn save(config: &CloudConfig) -> Result<PathBuf, String> {
    let path = default_config_path();
    save_to_path(config, &path)?;
    Ok(path)
}

pub fn save_to_path(config: &CloudConfig, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|error| {
            format!(
                "Failed to create config directory {}: {}",
                parent.display(),
                error
            )
        })?;
    }

    let mut normalized = config.clone();
    normalize(&mut normalized);
    let serialized = serde_json::to_string_pretty(&normalized)
        .map_err(|error| format!("Failed to serialize config: {error}"))?;
    std::fs::write(path, serialized)
        .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
}

fn apply_env_overrides(config: &mut CloudConfig) {
    if let Some(url) = normalize_text_option(std::env::var("WORDBOOK_SUPABASE_URL").ok()) {
        config.supabase_url = Some(url);
    }
    if let Some(key) = normalize_text_option(std::env::var("WORDBOOK_SUPABASE_ANON_KEY").ok()) {
        config.supabase_anon_key = Some(key);
    }
}

fn normalize(config: &mut CloudConfig) {
    config.supabase_url = normalize_text_option(config.supabase_url.take());
    config.supabase_anon_key = normalize_text_option(config.supabase_anon_key.take());
}

#[cfg(test)]
mod tests {
    use wordbook_core::config::ScopeMode;

    use super::*;

    #[test]
    fn load_from_missing_path_returns_empty_config() {
        let path = std::env::temp_dir().join("wordbook-config-does-not-exist.json");
        let config = load_from_path(&path).unwrap();
        assert!(!config.is_configured());
        assert_eq!(config.scope_mode, ScopeMode::User);
    }

    #[test]
    fn config_roundtrip_normalizes_fields() {
        let path = std::env::temp_dir().join(format!(
            "wordbook-cli-config-test-{}.json",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map_or(0, |duration| duration.as_nanos())
        ));

        let config = CloudConfig {
            supabase_url: Some(" https://project.supabase.co ".to_string()),
            supabase_anon_key: Some(" anon-key ".to_string()),
            scope_mode: ScopeMode::Device,
        };

        save_to_path(&config, &path).unwrap();
        let loaded = load_from_path(&path).unwrap();
        assert_eq!(
            loaded.supabase_url.as_deref(),
            Some("https://project.supabase.co")
        );
        assert_eq!(loaded.supabase_anon_key.as_deref(), Some("anon-key"));
        assert_eq!(loaded.scope_mode, ScopeMode::Device);
        assert!(loaded.is_configured());

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn blank_values_load_as_unset() {
        let path = std::env::temp_dir().join(format!(
            "wordbook-cli-config-blank-test-{}.json",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map_or(0, |duration| duration.as_nanos())
        ));

        std::fs::write(
            &path,
            r#"{ "supabase_url": "   ", "scope_mode": "device" }"#,
        )
        .unwrap();
        let loaded = load_from_path(&path).unwrap();
        assert_eq!(loaded.supabase_url, None);
        assert!(!loaded.is_configured());

        let _ = std::fs::remove_file(path);
    }
}
