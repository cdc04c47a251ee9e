pub mod builder;
pub mod endpoint;

pub use builder::{
    build_why_from_calendar, build_why_from_capture, build_why_from_conversation,
    build_why_from_email, build_why_from_pattern, build_why_payload, merge_why_payloads,
};
pub use endpoint::{build_why, parse_suggestion_type, WhyTarget};
