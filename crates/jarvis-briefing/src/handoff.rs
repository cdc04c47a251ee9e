//! Context handoff (§4.10 "Context Handoff"): catch-up summary when
//! switching back to a project. Grounded on
//! `api/context_handoff.py` (search-then-summarize flow, "PENDING:"
//! section split, bullet/numbered-list item extraction, 5-source and
//! 5-pending-item caps).

use chrono::{DateTime, Utc};
use jarvis_core::LlmBackend;
use serde::Serialize;

use jarvis_memory::search::{MemorySearch, SearchRequest, SearchResult};

use crate::error::{BriefingError, Result};

const SEARCH_LIMIT: u64 = 10;
const MAX_SOURCES: usize = 5;
const MAX_PENDING_ITEMS: usize = 5;
const PENDING_MARKER: &str = "PENDING:";

#[derive(Debug, Clone, Serialize)]
pub struct SourceReference {
    pub conversation_id: String,
    pub timestamp: DateTime<Utc>,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextHandoff {
    pub project: String,
    pub last_touched: Option<DateTime<Utc>>,
    pub summary: String,
    pub pending: Vec<String>,
    pub sources: Vec<SourceReference>,
}

fn build_context_document(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| format!("[{} - {}]\n{}", r.source, r.timestamp.to_rfc3339(), r.text_preview))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

fn build_prompt(project: &str, context_doc: &str) -> String {
    format!(
        "Based on these excerpts about the \"{project}\" project, generate a context \
         handoff summary for someone returning to work on it.\n\n\
         Context:\n\n{context_doc}\n\n\
         Provide a 2-paragraph summary (paragraph 1: what happened last; paragraph 2: \
         what's pending/next), followed by:\n\
         PENDING:\n\
         - item 1\n\
         - item 2\n\
         ...(3-5 items)"
    )
}

/// Splits the model's response on the `PENDING:` marker and extracts up
/// to [`MAX_PENDING_ITEMS`] bullet/numbered/plain lines from the tail.
fn parse_summary_and_pending(answer: &str) -> (String, Vec<String>) {
    let Some((summary, pending_section)) = answer.split_once(PENDING_MARKER) else {
        return (answer.trim().to_string(), Vec::new());
    };

    let mut items = Vec::new();
    for line in pending_section.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("PENDING") {
            continue;
        }
        let item = if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            rest.trim().to_string()
        } else {
            line.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ' ').to_string()
        };
        if !item.is_empty() {
            items.push(item);
        }
        if items.len() >= MAX_PENDING_ITEMS {
            break;
        }
    }

    (summary.trim().to_string(), items)
}

pub async fn compose_context_handoff(
    project: &str,
    search: &dyn MemorySearch,
    llm: &dyn LlmBackend,
) -> Result<ContextHandoff> {
    let request = SearchRequest {
        query: format!("{project} project status update"),
        limit: SEARCH_LIMIT,
        start_date: None,
        end_date: None,
        sources: vec![],
    };
    let results = search.search(&request).await?;

    if results.is_empty() {
        return Ok(ContextHandoff {
            project: project.to_string(),
            last_touched: None,
            summary: format!(
                "No recent conversations found about {project}. This might be a new project or one you haven't discussed recently."
            ),
            pending: Vec::new(),
            sources: Vec::new(),
        });
    }

    let last_touched = results.iter().map(|r| r.timestamp).max();
    let mut sorted = results.clone();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    let sources: Vec<SourceReference> = sorted
        .iter()
        .take(MAX_SOURCES)
        .map(|r| SourceReference {
            conversation_id: r.id.clone(),
            timestamp: r.timestamp,
            snippet: r.text_preview.clone(),
        })
        .collect();

    let context_doc = build_context_document(&results);
    let prompt = build_prompt(project, &context_doc);

    let answer = llm
        .summarize(&prompt, "2-paragraph last/next handoff with a PENDING: bullet list")
        .await
        .map_err(BriefingError::Llm)?;

    let (summary, pending) = parse_summary_and_pending(&answer);

    Ok(ContextHandoff { project: project.to_string(), last_touched, summary, pending, sources })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use jarvis_core::types::EntityType;

    struct FakeSearch(Vec<SearchResult>);

    #[async_trait]
    impl MemorySearch for FakeSearch {
        async fn search(&self, _request: &SearchRequest) -> jarvis_memory::error::Result<Vec<SearchResult>> {
            Ok(self.0.clone())
        }
    }

    struct FakeLlm(String);

    #[async_trait]
    impl LlmBackend for FakeLlm {
        async fn classify_entities(&self, _names: &[String]) -> anyhow::Result<Vec<(String, EntityType)>> {
            Ok(vec![])
        }

        async fn summarize(&self, _text: &str, _instructions: &str) -> anyhow::Result<String> {
            Ok(self.0.clone())
        }
    }

    fn result(id: &str, days_ago: i64) -> SearchResult {
        SearchResult {
            id: id.to_string(),
            score: 0.8,
            text_preview: format!("discussion {id}"),
            timestamp: Utc::now() - chrono::Duration::days(days_ago),
            source: "conversation".to_string(),
            metadata: serde_json::json!({}),
        }
    }

    #[test]
    fn parses_pending_bullets_after_marker() {
        let answer = "Para one.\n\nPara two.\n\nPENDING:\n- Ship the draft\n- Review feedback\n";
        let (summary, pending) = parse_summary_and_pending(answer);
        assert!(summary.starts_with("Para one."));
        assert_eq!(pending, vec!["Ship the draft".to_string(), "Review feedback".to_string()]);
    }

    #[test]
    fn parses_numbered_pending_items() {
        let answer = "Summary.\n\nPENDING:\n1. Follow up with design\n2. Close the ticket\n";
        let (_summary, pending) = parse_summary_and_pending(answer);
        assert_eq!(pending, vec!["Follow up with design".to_string(), "Close the ticket".to_string()]);
    }

    #[test]
    fn no_marker_returns_full_text_with_no_pending() {
        let (summary, pending) = parse_summary_and_pending("Just a summary, nothing else.");
        assert_eq!(summary, "Just a summary, nothing else.");
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn empty_search_returns_new_project_fallback() {
        let search = FakeSearch(vec![]);
        let llm = FakeLlm(String::new());
        let handoff = compose_context_handoff("Atlas", &search, &llm).await.unwrap();
        assert!(handoff.summary.contains("No recent conversations"));
        assert!(handoff.pending.is_empty());
    }

    #[tokio::test]
    async fn composes_handoff_caps_sources_and_pending() {
        let results: Vec<SearchResult> = (0..8).map(|i| result(&format!("pt-{i}"), i)).collect();
        let search = FakeSearch(results);
        let answer = "Last paragraph.\n\nNext paragraph.\n\nPENDING:\n- a\n- b\n- c\n- d\n- e\n- f\n";
        let llm = FakeLlm(answer.to_string());
        let handoff = compose_context_handoff("Atlas", &search, &llm).await.unwrap();
        assert_eq!(handoff.sources.len(), MAX_SOURCES);
        assert_eq!(handoff.pending.len(), MAX_PENDING_ITEMS);
        assert!(handoff.last_touched.is_some());
    }
}
