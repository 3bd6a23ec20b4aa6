use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A shortened URL held by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlRecord {
    pub id: Uuid,
    pub original_url: String,
    pub short_code: String,
    pub created_at: DateTime<Utc>,
    pub visits: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_visited: Option<DateTime<Utc>>,
}

/// Visit counters for a single short code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlStats {
    pub visits: u64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_visited: Option<DateTime<Utc>>,
}

impl From<&UrlRecord> for UrlStats {
    fn from(record: &UrlRecord) -> Self {
        Self {
            visits: record.visits,
            created_at: record.created_at,
            last_visited: record.last_visited,
        }
    }
}

// ── API payloads ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EncodeRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeResponse {
    pub short_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeResponse {
    pub original_url: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}
