use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{EventSink, TrackerError, VisitorEvent};
use crate::config::SiteConfig;

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const COLLECTION: &str = "visitors";

/// Visitor events stored as documents of the `visitors` Firestore collection.
#[derive(Debug, Clone)]
pub struct FirestoreSink {
    project: String,
    api_key: String,
}

impl FirestoreSink {
    pub fn new(project: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &SiteConfig) -> Result<Self, TrackerError> {
        let api_key = config
            .firestore_api_key
            .clone()
            .ok_or(TrackerError::Disabled)?;
        Ok(Self::new(config.firestore_project.clone(), api_key))
    }

    fn documents_url(&self) -> String {
        format!(
            "{FIRESTORE_BASE_URL}/projects/{}/databases/(default)/documents",
            self.project
        )
    }

    async fn post(&self, url: String, body: &Value) -> Result<Value, TrackerError> {
        let response = HTTP_CLIENT
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<Value>().await?)
    }
}

impl EventSink for FirestoreSink {
    async fn record(&self, event: VisitorEvent) -> Result<(), TrackerError> {
        let url = format!("{}/{COLLECTION}", self.documents_url());
        let created = self.post(url, &encode_document(&event)).await?;
        let name = document_name(&created);
        debug!(name, event_type = %event.event_type, "visitor event stored");
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<VisitorEvent>, TrackerError> {
        let url = format!("{}:runQuery", self.documents_url());
        let rows = self.post(url, &recent_query(limit)).await?;
        decode_query_rows(&rows)
    }
}

pub(crate) fn encode_document(event: &VisitorEvent) -> Value {
    json!({
        "fields": {
            "eventType": { "stringValue": event.event_type },
            "detail": { "stringValue": event.detail },
            "timestamp": { "timestampValue": event.timestamp.to_rfc3339() },
            "userAgent": { "stringValue": event.user_agent },
            "screenSize": { "stringValue": event.screen_size },
        }
    })
}

pub(crate) fn recent_query(limit: usize) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": COLLECTION }],
            "orderBy": [{
                "field": { "fieldPath": "timestamp" },
                "direction": "DESCENDING"
            }],
            "limit": limit
        }
    })
}

pub(crate) fn decode_query_rows(rows: &Value) -> Result<Vec<VisitorEvent>, TrackerError> {
    let rows = rows
        .as_array()
        .ok_or_else(|| TrackerError::Decode("runQuery response is not an array".to_string()))?;

    // Rows without a document only carry a readTime (empty result).
    Ok(rows
        .iter()
        .filter_map(|row| row.get("document"))
        .filter_map(|document| {
            let event = decode_document(document);
            if event.is_none() {
                let name = document_name(document);
                warn!(name, "skipping malformed visitor document");
            }
            event
        })
        .collect())
}

fn document_name(document: &Value) -> &str {
    document
        .get("name")
        .and_then(|name| name.as_str())
        .unwrap_or("")
}

pub(crate) fn decode_document(document: &Value) -> Option<VisitorEvent> {
    let fields = document.get("fields")?;
    let string = |name: &str| {
        fields
            .get(name)
            .and_then(|field| field.get("stringValue"))
            .and_then(|value| value.as_str())
            .unwrap_or("")
            .to_string()
    };
    let timestamp = fields
        .get("timestamp")
        .and_then(|field| field.get("timestampValue"))
        .and_then(|value| value.as_str())
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|ts| ts.with_timezone(&Utc))?;

    Some(VisitorEvent {
        event_type: string("eventType"),
        detail: string("detail"),
        timestamp,
        user_agent: string("userAgent"),
        screen_size: string("screenSize"),
    })
}
