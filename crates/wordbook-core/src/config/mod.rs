//! Cloud configuration for client apps.
//!
//! Provides the `CloudConfig` struct used by the CLI to discover the
//! Supabase auth/REST endpoint and to choose the owner scope mode.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::util::{is_http_url, normalize_text_option};

/// Which credential scopes rows in the cloud store.
///
/// A deployment uses exactly one mode; rows are never owner-ambiguous.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeMode {
    /// Rows belong to the signed-in user; sync requires a session.
    #[default]
    User,
    /// Rows belong to this installation's device id; no account needed.
    Device,
}

impl fmt::Display for ScopeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Device => write!(f, "device"),
        }
    }
}

impl FromStr for ScopeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "device" => Ok(Self::Device),
            other => Err(format!(
                "unknown scope mode '{other}' (expected 'user' or 'device')"
            )),
        }
    }
}

/// Public endpoint configuration for auth and sync.
///
/// These values are safe-to-ship public endpoints/keys. Secret credentials
/// must never be stored here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CloudConfig {
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
    #[serde(default)]
    pub scope_mode: ScopeMode,
}

/// Normalized, validated cloud endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudEndpoints {
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl CloudConfig {
    /// Check if enough is present to reach the cloud at all
    pub fn is_configured(&self) -> bool {
        normalize_text_option(self.supabase_url.clone()).is_some()
            && normalize_text_option(self.supabase_anon_key.clone()).is_some()
    }

    /// Validate and normalize the configured endpoints.
    ///
    /// Returns a description of the first missing or malformed field.
    pub fn endpoints(&self) -> Result<CloudEndpoints, String> {
        let supabase_url =
            normalize_required_http_url(self.supabase_url.clone(), "supabase_url")?;
        let supabase_anon_key = normalize_text_option(self.supabase_anon_key.clone())
            .ok_or_else(|| "config field 'supabase_anon_key' is required".to_string())?;

        Ok(CloudEndpoints {
            supabase_url,
            supabase_anon_key,
        })
    }
}

fn normalize_required_http_url(raw: Option<String>, field: &str) -> Result<String, String> {
    let value = normalize_text_option(raw)
        .ok_or_else(|| format!("config field '{field}' is required"))?;
    if is_http_url(&value) {
        Ok(value.trim_end_matches('/').to_string())
    } else {
        Err(format!(
            "config field '{field}' must include http:// or https://"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scope_mode_parses_known_values() {
        assert_eq!(" User ".parse::<ScopeMode>().unwrap(), ScopeMode::User);
        assert_eq!("device".parse::<ScopeMode>().unwrap(), ScopeMode::Device);
        assert!("cloud".parse::<ScopeMode>().is_err());
    }

    #[test]
    fn default_config_is_unconfigured() {
        let config = CloudConfig::default();
        assert!(!config.is_configured());
        assert!(config.endpoints().is_err());
    }

    #[test]
    fn endpoints_normalizes_trailing_slash() {
        let config = CloudConfig {
            supabase_url: Some("https://project.supabase.co/".to_string()),
            supabase_anon_key: Some("anon".to_string()),
            scope_mode: ScopeMode::User,
        };

        let endpoints = config.endpoints().unwrap();
        assert_eq!(endpoints.supabase_url, "https://project.supabase.co");
        assert_eq!(endpoints.supabase_anon_key, "anon");
    }

    #[test]
    fn endpoints_rejects_non_http_url() {
        let config = CloudConfig {
            supabase_url: Some("project.supabase.co".to_string()),
            supabase_anon_key: Some("anon".to_string()),
            scope_mode: ScopeMode::User,
        };

        let error = config.endpoints().unwrap_err();
        assert!(error.contains("http"));
    }

    #[test]
    fn config_rejects_unknown_fields() {
        let payload = r#"{"supabase_url": "https://x", "turso_url": "y"}"#;
        let parsed: Result<CloudConfig, _> = serde_json::from_str(payload);
        assert!(parsed.is_err());
    }

    #[test]
    fn config_defaults_scope_mode_to_user() {
        let parsed: CloudConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.scope_mode, ScopeMode::User);
    }
}
