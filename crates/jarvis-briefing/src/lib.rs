pub mod collaborators;
pub mod error;
pub mod handoff;
pub mod meeting;
pub mod morning;

pub use collaborators::{CalendarSource, EmailSource, NullCalendarSource, NullEmailSource, PriorityEmail};
pub use error::{BriefingError, Result};
pub use handoff::{compose_context_handoff, ContextHandoff, SourceReference};
pub use meeting::{compose_meeting_brief, MeetingBrief};
pub use morning::{compose_morning_briefing, render_spoken, HourlyCaptureSummary, MorningBriefing};
