use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Processing status of a stored [`Capture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl fmt::Display for CaptureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CaptureStatus::Pending => "pending",
            CaptureStatus::Processing => "processing",
            CaptureStatus::Completed => "completed",
            CaptureStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl FromStr for CaptureStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CaptureStatus::Pending),
            "processing" => Ok(CaptureStatus::Processing),
            "completed" => Ok(CaptureStatus::Completed),
            "failed" => Ok(CaptureStatus::Failed),
            other => Err(format!("unknown capture status: {other}")),
        }
    }
}

/// A single screenshot artifact plus metadata (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capture {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub monitor_index: i32,
    pub width: i32,
    pub height: i32,
    pub byte_size: i64,
    pub filepath: String,
    pub ocr_text: Option<String>,
    pub status: CaptureStatus,
}

/// Source format a [`Conversation`] was imported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationSource {
    Chatgpt,
    Claude,
    Grok,
    /// Not a real import source — used for capture-derived text chunks that
    /// flow through the same chunk/tag/embed pipeline as imported
    /// conversations (the `"screen"` payload source in C6/C7).
    Screen,
}

impl fmt::Display for ConversationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConversationSource::Chatgpt => "chatgpt",
            ConversationSource::Claude => "claude",
            ConversationSource::Grok => "grok",
            ConversationSource::Screen => "screen",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ConversationSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "chatgpt" => Ok(ConversationSource::Chatgpt),
            "claude" => Ok(ConversationSource::Claude),
            "grok" => Ok(ConversationSource::Grok),
            "screen" => Ok(ConversationSource::Screen),
            other => Err(format!("unknown conversation source: {other}")),
        }
    }
}

/// An imported chat transcript (§3). Immutable after import except
/// `processing_status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub external_id: String,
    pub source: ConversationSource,
    pub title: String,
    pub full_text: String,
    pub message_count: i32,
    pub conversation_date: Option<DateTime<Utc>>,
    pub imported_at: DateTime<Utc>,
    pub processing_status: CaptureStatus,
}

/// A bounded slice of a conversation's text, the unit of embedding (C4a).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub conversation_id: Uuid,
    pub source: ConversationSource,
    pub title: String,
    pub chunk_text: String,
    pub chunk_index: i32,
    pub total_chunks: i32,
    pub conversation_date: Option<DateTime<Utc>>,
}

/// Sentiment bucket produced by the tagger (C4b).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        };
        write!(f, "{s}")
    }
}

/// Deterministic heuristic extraction from a chunk's text (C4b).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkTags {
    pub people: Vec<String>,
    pub projects: Vec<String>,
    pub decisions: Vec<String>,
    pub action_items: Vec<String>,
    pub topics: Vec<String>,
    pub dates_mentioned: Vec<String>,
    pub sentiment: Option<Sentiment>,
}

/// Dense embedding vector, fixed 384 dimensions (C5).
pub type DenseVector = Vec<f32>;

/// Sparse embedding as parallel index/value arrays (C5).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

/// Kind of a [`DetectedPattern`] (C8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    TimeHabit,
    ContextSwitching,
    ProductivityWindow,
    RecurringTheme,
    CommunicationPattern,
    ForgottenFollowup,
    WorkRhythm,
    ToolPreference,
    RecurringPerson,
    StalePerson,
    RecurringTopic,
    UnfinishedBusiness,
    StaleProject,
    BrokenPromise,
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PatternType::TimeHabit => "time_habit",
            PatternType::ContextSwitching => "context_switching",
            PatternType::ProductivityWindow => "productivity_window",
            PatternType::RecurringTheme => "recurring_theme",
            PatternType::CommunicationPattern => "communication_pattern",
            PatternType::ForgottenFollowup => "forgotten_followup",
            PatternType::WorkRhythm => "work_rhythm",
            PatternType::ToolPreference => "tool_preference",
            PatternType::RecurringPerson => "recurring_person",
            PatternType::StalePerson => "stale_person",
            PatternType::RecurringTopic => "recurring_topic",
            PatternType::UnfinishedBusiness => "unfinished_business",
            PatternType::StaleProject => "stale_project",
            PatternType::BrokenPromise => "broken_promise",
        };
        write!(f, "{s}")
    }
}

impl FromStr for PatternType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "time_habit" => Ok(PatternType::TimeHabit),
            "context_switching" => Ok(PatternType::ContextSwitching),
            "productivity_window" => Ok(PatternType::ProductivityWindow),
            "recurring_theme" => Ok(PatternType::RecurringTheme),
            "communication_pattern" => Ok(PatternType::CommunicationPattern),
            "forgotten_followup" => Ok(PatternType::ForgottenFollowup),
            "work_rhythm" => Ok(PatternType::WorkRhythm),
            "tool_preference" => Ok(PatternType::ToolPreference),
            "recurring_person" => Ok(PatternType::RecurringPerson),
            "stale_person" => Ok(PatternType::StalePerson),
            "recurring_topic" => Ok(PatternType::RecurringTopic),
            "unfinished_business" => Ok(PatternType::UnfinishedBusiness),
            "stale_project" => Ok(PatternType::StaleProject),
            "broken_promise" => Ok(PatternType::BrokenPromise),
            other => Err(format!("unknown pattern type: {other}")),
        }
    }
}

/// Lifecycle status of a [`DetectedPattern`] row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternStatus {
    Active,
    Dismissed,
    Resolved,
}

impl fmt::Display for PatternStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PatternStatus::Active => "active",
            PatternStatus::Dismissed => "dismissed",
            PatternStatus::Resolved => "resolved",
        };
        write!(f, "{s}")
    }
}

impl FromStr for PatternStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "active" => Ok(PatternStatus::Active),
            "dismissed" => Ok(PatternStatus::Dismissed),
            "resolved" => Ok(PatternStatus::Resolved),
            other => Err(format!("unknown pattern status: {other}")),
        }
    }
}

/// A behavioral pattern surfaced by C8's detectors (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedPattern {
    pub id: Uuid,
    pub pattern_type: PatternType,
    pub pattern_key: String,
    pub description: String,
    pub frequency: i32,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub suggested_action: Option<String>,
    pub conversation_ids: Vec<Uuid>,
    pub detected_at: DateTime<Utc>,
    pub status: PatternStatus,
}

/// LLM-assigned or heuristic-assigned category for an entity name (C11).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityType {
    Person,
    Project,
    Company,
    Tool,
    Topic,
    Noise,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityType::Person => "PERSON",
            EntityType::Project => "PROJECT",
            EntityType::Company => "COMPANY",
            EntityType::Tool => "TOOL",
            EntityType::Topic => "TOPIC",
            EntityType::Noise => "NOISE",
        };
        write!(f, "{s}")
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PERSON" => Ok(EntityType::Person),
            "PROJECT" => Ok(EntityType::Project),
            "COMPANY" => Ok(EntityType::Company),
            "TOOL" => Ok(EntityType::Tool),
            "TOPIC" => Ok(EntityType::Topic),
            "NOISE" => Ok(EntityType::Noise),
            other => Err(format!("unknown entity type: {other}")),
        }
    }
}

/// Which path produced an [`EntityClassification`] — the original source's
/// cache conflated this; it is a first-class field here (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationSource {
    Llm,
    Heuristic,
}

impl fmt::Display for ClassificationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClassificationSource::Llm => "llm",
            ClassificationSource::Heuristic => "heuristic",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ClassificationSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "llm" => Ok(ClassificationSource::Llm),
            "heuristic" => Ok(ClassificationSource::Heuristic),
            other => Err(format!("unknown classification source: {other}")),
        }
    }
}

/// Cache row for C11's entity classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityClassification {
    pub entity_name: String,
    pub entity_type: EntityType,
    pub source: ClassificationSource,
    pub classified_at: DateTime<Utc>,
}

/// Source kind referenced by a [`Source`] in a Why payload (C10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Capture,
    Email,
    Calendar,
    Conversation,
    Pattern,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceType::Capture => "capture",
            SourceType::Email => "email",
            SourceType::Calendar => "calendar",
            SourceType::Conversation => "conversation",
            SourceType::Pattern => "pattern",
        };
        write!(f, "{s}")
    }
}

/// A single cited source within a [`WhyPayload`] (C10).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub source_type: SourceType,
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub snippet: String,
    pub url: Option<String>,
}

/// Explanation payload attached to every proactive suggestion (C10/§4.11).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhyPayload {
    pub reasons: Vec<String>,
    pub confidence: f64,
    pub sources: Vec<Source>,
}

/// An event attendee, as surfaced by a `CalendarSource` collaborator (C9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendee {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// A calendar event, as surfaced by a `CalendarSource` collaborator (C9/C10).
/// Not backed by local persistence — this workspace only consumes events an
/// external calendar adapter hands in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub attendees: Vec<Attendee>,
}

/// A detected video-call meeting, optionally linked to a [`CalendarEvent`] (C9/C10).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub id: String,
    pub platform: Option<String>,
    pub detected_at: DateTime<Utc>,
    pub calendar_event: Option<CalendarEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_status_roundtrip() {
        for s in [
            CaptureStatus::Pending,
            CaptureStatus::Processing,
            CaptureStatus::Completed,
            CaptureStatus::Failed,
        ] {
            let parsed: CaptureStatus = s.to_string().parse().unwrap();
            assert_eq!(parsed, s);
        }
    }

    #[test]
    fn conversation_source_roundtrip() {
        for s in [
            ConversationSource::Chatgpt,
            ConversationSource::Claude,
            ConversationSource::Grok,
            ConversationSource::Screen,
        ] {
            let parsed: ConversationSource = s.to_string().parse().unwrap();
            assert_eq!(parsed, s);
        }
    }

    #[test]
    fn entity_type_parse_is_case_insensitive() {
        assert_eq!("person".parse::<EntityType>().unwrap(), EntityType::Person);
        assert_eq!("NOISE".parse::<EntityType>().unwrap(), EntityType::Noise);
        assert!("unknown".parse::<EntityType>().is_err());
    }
}
