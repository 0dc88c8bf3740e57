//! Visitor tracking: a write-mostly event sink with a "most recent N" query.

mod firestore;

pub use firestore::FirestoreSink;

use std::cell::RefCell;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PAGE_VISIT: &str = "Page Visit";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorEvent {
    pub event_type: String,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
    pub user_agent: String,
    pub screen_size: String,
}

impl VisitorEvent {
    pub fn new(
        event_type: impl Into<String>,
        detail: impl Into<String>,
        user_agent: impl Into<String>,
        screen_size: impl Into<String>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            detail: detail.into(),
            timestamp: Utc::now(),
            user_agent: user_agent.into(),
            screen_size: screen_size.into(),
        }
    }

    pub fn page_visit(path: &str, user_agent: &str, width: u32, height: u32) -> Self {
        Self::new(PAGE_VISIT, path, user_agent, format!("{width}x{height}"))
    }

    pub fn is_download(&self) -> bool {
        self.event_type.contains("Download")
    }

    pub fn device_kind(&self) -> DeviceKind {
        if self.user_agent.contains("Mobile") {
            DeviceKind::Mobile
        } else {
            DeviceKind::Desktop
        }
    }

    /// Short local-style time for the dashboard, e.g. "Mar 4, 09:15 PM".
    pub fn display_time(&self) -> String {
        self.timestamp.format("%b %-d, %I:%M %p").to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Mobile,
    Desktop,
}

impl DeviceKind {
    pub fn label(self) -> &'static str {
        match self {
            DeviceKind::Mobile => "Mobile",
            DeviceKind::Desktop => "Desktop",
        }
    }
}

/// Totals shown above the dashboard table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisitSummary {
    pub total: usize,
    pub downloads: usize,
}

impl VisitSummary {
    pub fn of(events: &[VisitorEvent]) -> Self {
        Self {
            total: events.len(),
            downloads: events.iter().filter(|event| event.is_download()).count(),
        }
    }
}

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("document store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected document store response: {0}")]
    Decode(String),

    #[error("visitor tracking is not configured")]
    Disabled,
}

/// Destination for visitor events.
#[allow(async_fn_in_trait)]
pub trait EventSink {
    async fn record(&self, event: VisitorEvent) -> Result<(), TrackerError>;

    /// Up to `limit` events, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<VisitorEvent>, TrackerError>;
}

/// Sink that keeps events in memory; used offline and in tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: RefCell<Vec<VisitorEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl EventSink for MemorySink {
    async fn record(&self, event: VisitorEvent) -> Result<(), TrackerError> {
        self.events.borrow_mut().push(event);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<VisitorEvent>, TrackerError> {
        let mut events = self.events.borrow().clone();
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        events.truncate(limit);
        Ok(events)
    }
}

/// Record the once-per-session page visit unless this browser belongs to the admin.
pub async fn track_page_visit<S: EventSink>(
    sink: &S,
    is_admin_browser: bool,
    event: VisitorEvent,
) -> Result<bool, TrackerError> {
    if is_admin_browser {
        tracing::debug!("skipping visit tracking for the admin browser");
        return Ok(false);
    }
    sink.record(event).await?;
    Ok(true)
}
