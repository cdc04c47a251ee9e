//! External collaborators the briefing composers pull from. Neither has
//! local persistence in this workspace — a real adapter would talk to a
//! calendar/email provider and return `AuthRequired` when uncredentialed;
//! the null implementations here stand in for that absence with empty
//! results, so composers degrade gracefully instead of failing (§7).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jarvis_core::types::CalendarEvent;
use serde::Serialize;

use crate::error::Result;

#[async_trait]
pub trait CalendarSource: Send + Sync {
    async fn events_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<CalendarEvent>>;
}

pub struct NullCalendarSource;

#[async_trait]
impl CalendarSource for NullCalendarSource {
    async fn events_between(&self, _start: DateTime<Utc>, _end: DateTime<Utc>) -> Result<Vec<CalendarEvent>> {
        Ok(vec![])
    }
}

/// A priority/unread email, as surfaced by an `EmailSource` collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct PriorityEmail {
    pub id: String,
    pub subject: Option<String>,
    pub from_display: String,
    pub snippet: String,
    pub received_at: DateTime<Utc>,
    pub is_important: bool,
}

#[async_trait]
pub trait EmailSource: Send + Sync {
    /// Priority/unread messages received at or after `since`.
    async fn priority_unread_since(&self, since: DateTime<Utc>) -> Result<Vec<PriorityEmail>>;
}

pub struct NullEmailSource;

#[async_trait]
impl EmailSource for NullEmailSource {
    async fn priority_unread_since(&self, _since: DateTime<Utc>) -> Result<Vec<PriorityEmail>> {
        Ok(vec![])
    }
}
