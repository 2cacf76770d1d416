//! PostgREST-backed cloud store client.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

use super::{require_owner_key, DeleteTarget, RemoteStore, SyncError};
use crate::models::{Entry, RemoteEntry, RemoteId};
use crate::session::SessionContext;
use crate::util::compact_text;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// HTTP client for the cloud `words` table.
///
/// Anonymous (device-scoped) requests authenticate with the public anon
/// key; user-scoped requests carry the session's access token so row-level
/// security applies.
#[derive(Clone)]
pub struct RestRemoteStore {
    rest_url: String,
    anon_key: String,
    client: Client,
}

impl RestRemoteStore {
    pub fn new(url: impl AsRef<str>, anon_key: impl Into<String>) -> Result<Self, SyncError> {
        let rest_url = normalize_rest_url(url.as_ref())?;
        let anon_key = anon_key.into().trim().to_string();
        if anon_key.is_empty() {
            return Err(SyncError::Unavailable(
                "Supabase anon key must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|error| {
                SyncError::Unavailable(format!("failed to build HTTP client: {error}"))
            })?;

        Ok(Self {
            rest_url,
            anon_key,
            client,
        })
    }

    fn authed_request(&self, request: RequestBuilder, session: &SessionContext) -> RequestBuilder {
        let bearer = session.access_token().unwrap_or(&self.anon_key);
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, SyncError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = parse_api_error(status, &body);
        if is_transient(status) {
            Err(SyncError::Unavailable(message))
        } else {
            Err(SyncError::Rejected(message))
        }
    }
}

impl RemoteStore for RestRemoteStore {
    async fn upsert(
        &self,
        session: &SessionContext,
        entry: &Entry,
    ) -> Result<RemoteId, SyncError> {
        let owner = require_owner_key(session)?;

        let rows: Vec<RemoteEntry> = if let Some(remote_id) = entry.remote_id {
            let url = format!(
                "{}/words?id=eq.{}&owner=eq.{}",
                self.rest_url,
                remote_id.as_i64(),
                urlencoding::encode(&owner),
            );
            let patch = RemoteRowPatch {
                word: &entry.word,
                description: &entry.description,
                updated_at: entry.updated_at,
            };
            let request = self
                .authed_request(self.client.patch(url), session)
                .header("Prefer", "return=representation")
                .json(&patch);
            self.send(request).await?.json().await.map_err(transport_error)?
        } else {
            let url = format!("{}/words", self.rest_url);
            let row = NewRemoteRow {
                owner: &owner,
                word: &entry.word,
                description: &entry.description,
                updated_at: entry.updated_at,
            };
            let request = self
                .authed_request(self.client.post(url), session)
                .header("Prefer", "return=representation")
                .json(&row);
            self.send(request).await?.json().await.map_err(transport_error)?
        };

        // PATCH against a filter that matches nothing still returns 200,
        // with an empty body instead of the updated row.
        rows.into_iter().map(|row| row.id).next().ok_or_else(|| {
            SyncError::Rejected(format!(
                "no row for entry {} under owner scope {owner}",
                entry.id
            ))
        })
    }

    async fn delete(
        &self,
        session: &SessionContext,
        target: &DeleteTarget,
    ) -> Result<(), SyncError> {
        let owner = require_owner_key(session)?;

        let url = match target {
            DeleteTarget::ByRemoteId(remote_id) => format!(
                "{}/words?id=eq.{}&owner=eq.{}",
                self.rest_url,
                remote_id.as_i64(),
                urlencoding::encode(&owner),
            ),
            DeleteTarget::ByContent { word, description } => format!(
                "{}/words?owner=eq.{}&word=eq.{}&description=eq.{}",
                self.rest_url,
                urlencoding::encode(&owner),
                urlencoding::encode(word),
                urlencoding::encode(description),
            ),
        };

        let request = self.authed_request(self.client.delete(url), session);
        self.send(request).await?;
        Ok(())
    }

    async fn list_all(&self, session: &SessionContext) -> Result<Vec<RemoteEntry>, SyncError> {
        let owner = require_owner_key(session)?;

        let url = format!(
            "{}/words?select=*&owner=eq.{}&order=updated_at.desc",
            self.rest_url,
            urlencoding::encode(&owner),
        );

        let request = self.authed_request(self.client.get(url), session);
        self.send(request).await?.json().await.map_err(transport_error)
    }
}

#[derive(Debug, Serialize)]
struct NewRemoteRow<'a> {
    owner: &'a str,
    word: &'a str,
    description: &'a str,
    updated_at: i64,
}

#[derive(Debug, Serialize)]
struct RemoteRowPatch<'a> {
    word: &'a str,
    description: &'a str,
    updated_at: i64,
}

#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    message: Option<String>,
    error: Option<String>,
}

fn transport_error(error: reqwest::Error) -> SyncError {
    SyncError::Unavailable(compact_text(&error.to_string()))
}

fn is_transient(status: StatusCode) -> bool {
    status.is_server_error()
        || matches!(
            status,
            StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS
        )
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<RemoteErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", compact_text(trimmed), status.as_u16())
    }
}

fn normalize_rest_url(url: &str) -> Result<String, SyncError> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(SyncError::Unavailable(
            "Supabase URL must not be empty".to_string(),
        ));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(SyncError::Unavailable(
            "Supabase URL must include http:// or https://".to_string(),
        ));
    }
    if trimmed.ends_with("/rest/v1") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/rest/v1"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_rest_url_appends_rest_path() {
        let normalized = normalize_rest_url("https://demo.supabase.co/").unwrap();
        assert_eq!(normalized, "https://demo.supabase.co/rest/v1");
    }

    #[test]
    fn normalize_rest_url_keeps_existing_rest_path() {
        let normalized = normalize_rest_url("https://demo.supabase.co/rest/v1").unwrap();
        assert_eq!(normalized, "https://demo.supabase.co/rest/v1");
    }

    #[test]
    fn normalize_rest_url_rejects_bare_host() {
        assert!(normalize_rest_url("demo.supabase.co").is_err());
        assert!(normalize_rest_url("  ").is_err());
    }

    #[test]
    fn new_rejects_blank_anon_key() {
        assert!(RestRemoteStore::new("https://demo.supabase.co", "  ").is_err());
    }

    #[test]
    fn server_failures_are_transient() {
        assert!(is_transient(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_transient(StatusCode::BAD_GATEWAY));
        assert!(is_transient(StatusCode::REQUEST_TIMEOUT));
        assert!(is_transient(StatusCode::TOO_MANY_REQUESTS));
    }

    #[test]
    fn client_refusals_are_not_transient() {
        assert!(!is_transient(StatusCode::UNAUTHORIZED));
        assert!(!is_transient(StatusCode::FORBIDDEN));
        assert!(!is_transient(StatusCode::NOT_FOUND));
        assert!(!is_transient(StatusCode::CONFLICT));
    }

    #[test]
    fn parse_api_error_uses_postgrest_message() {
        let rendered = parse_api_error(
            StatusCode::CONFLICT,
            r#"{"message": "duplicate key value", "code": "23505"}"#,
        );
        assert_eq!(rendered, "duplicate key value (409)");
    }

    #[test]
    fn parse_api_error_falls_back_to_body() {
        let rendered = parse_api_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(rendered, "upstream down (502)");
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, "  "), "HTTP 502");
    }
}
