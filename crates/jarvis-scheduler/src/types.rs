use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What class of worker slot a [`JobKind`] competes for (§4.13: "OCR-class
/// jobs are capped lower than I/O-class jobs").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencyClass {
    Io,
    Ocr,
}

/// The six background job kinds the scheduler dispatches. Carried as the
/// `action` column's JSON payload rather than as a separate table, so the
/// scheduler engine itself stays agnostic of what a job actually does.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobKind {
    /// Run OCR + chunking + tagging + embedding for one freshly uploaded capture.
    ProcessCapture { capture_id: String },
    /// Sweep for captures stuck in `queued`/`processing` and retry them.
    ProcessBacklog,
    /// Pull new calendar events from the configured `CalendarSource`.
    CalendarSync,
    /// Pull new messages from the configured `EmailSource`.
    EmailSync,
    /// Re-run pattern detection over the recent lookback window.
    PatternDetection,
    /// Re-run entity classification for names whose cached classification
    /// is stale or was produced by a lower-confidence source.
    ReclassifyEntities,
}

impl JobKind {
    /// Which concurrency pool (and therefore which `SchedulerConfig` cap)
    /// this kind draws from. Only capture processing is OCR-bound; the
    /// rest are I/O-bound (HTTP calls, SQL scans).
    pub fn concurrency_class(&self) -> ConcurrencyClass {
        match self {
            JobKind::ProcessCapture { .. } => ConcurrencyClass::Ocr,
            JobKind::ProcessBacklog
            | JobKind::CalendarSync
            | JobKind::EmailSync
            | JobKind::PatternDetection
            | JobKind::ReclassifyEntities => ConcurrencyClass::Io,
        }
    }

    /// Encode as the `action` column's JSON payload.
    pub fn to_action_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decode a `Job::action` payload back into a [`JobKind`].
    pub fn from_action_json(action: &str) -> serde_json::Result<Self> {
        serde_json::from_str(action)
    }

    /// The configured concurrency cap for this job's pool, read from
    /// `jarvis_core::config::SchedulerConfig` instead of a hardcoded constant.
    pub fn max_concurrent(&self, config: &jarvis_core::config::SchedulerConfig) -> usize {
        match self.concurrency_class() {
            ConcurrencyClass::Ocr => config.max_jobs_ocr,
            ConcurrencyClass::Io => config.max_jobs_io,
        }
    }
}

/// Defines when and how often a job should run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schedule {
    /// Run exactly once at the given UTC instant.
    Once { at: DateTime<Utc> },

    /// Run repeatedly with a fixed interval in seconds.
    Interval { every_secs: u64 },

    /// Run every day at the given hour and minute (UTC).
    Daily { hour: u8, minute: u8 },

    /// Run on a specific weekday (0 = Monday … 6 = Sunday) at the given time (UTC).
    Weekly { day: u8, hour: u8, minute: u8 },

    /// Run according to a cron expression (parsing support planned for a future phase).
    Cron { expression: String },
}

/// Lifecycle state of a job execution slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for its next_run time.
    Pending,
    /// Currently being executed.
    Running,
    /// Finished successfully (used for Once jobs after their single run).
    Completed,
    /// Last execution returned an error.
    Failed,
    /// The scheduled window was skipped (e.g. engine was offline).
    Missed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Missed => "missed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "missed" => Ok(JobStatus::Missed),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

/// A persisted job record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// UUID v4 string — primary key.
    pub id: String,
    /// Human-readable label.
    pub name: String,
    /// Serialised schedule definition.
    pub schedule: Schedule,
    /// Arbitrary JSON payload forwarded to the job handler.
    pub action: String,
    /// Current lifecycle state.
    pub status: JobStatus,
    /// ISO-8601 timestamp of the most recent execution start, if any.
    pub last_run: Option<String>,
    /// ISO-8601 timestamp of the next planned execution, if any.
    pub next_run: Option<String>,
    /// Total number of completed runs.
    pub run_count: u32,
    /// If set, the job is removed / marked Completed after this many runs.
    pub max_runs: Option<u32>,
    /// ISO-8601 timestamp of job creation.
    pub created_at: String,
    /// ISO-8601 timestamp of the last metadata update.
    pub updated_at: String,
}

impl Job {
    /// Parse `self.action` as a [`JobKind`]. Fails if the job was created
    /// with an action payload that isn't one of the six known kinds.
    pub fn job_kind(&self) -> serde_json::Result<JobKind> {
        JobKind::from_action_json(&self.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_kind_round_trips_through_action_json() {
        let kind = JobKind::ProcessCapture { capture_id: "cap-1".to_string() };
        let encoded = kind.to_action_json().unwrap();
        assert_eq!(JobKind::from_action_json(&encoded).unwrap(), kind);
    }

    #[test]
    fn process_capture_is_ocr_class_and_others_are_io_class() {
        assert_eq!(JobKind::ProcessCapture { capture_id: "x".to_string() }.concurrency_class(), ConcurrencyClass::Ocr);
        assert_eq!(JobKind::ProcessBacklog.concurrency_class(), ConcurrencyClass::Io);
        assert_eq!(JobKind::CalendarSync.concurrency_class(), ConcurrencyClass::Io);
        assert_eq!(JobKind::EmailSync.concurrency_class(), ConcurrencyClass::Io);
        assert_eq!(JobKind::PatternDetection.concurrency_class(), ConcurrencyClass::Io);
        assert_eq!(JobKind::ReclassifyEntities.concurrency_class(), ConcurrencyClass::Io);
    }

    #[test]
    fn ocr_and_io_kinds_read_from_distinct_config_caps() {
        let config = jarvis_core::config::SchedulerConfig { max_jobs_io: 8, max_jobs_ocr: 2, ..Default::default() };
        assert_eq!(JobKind::ProcessCapture { capture_id: "x".to_string() }.max_concurrent(&config), 2);
        assert_eq!(JobKind::CalendarSync.max_concurrent(&config), 8);
    }

    #[test]
    fn unknown_action_payload_fails_to_parse() {
        let job = Job {
            id: "1".to_string(),
            name: "legacy".to_string(),
            schedule: Schedule::Interval { every_secs: 60 },
            action: "not json".to_string(),
            status: JobStatus::Pending,
            last_run: None,
            next_run: None,
            run_count: 0,
            max_runs: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        };
        assert!(job.job_kind().is_err());
    }
}
