//! Weekly project activity heartbeat, ported from
//! `original_source/server/src/jarvis_server/api/project_pulse.py`.

use std::collections::{HashMap, HashSet};
use std::process::Stdio;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jarvis_core::types::EntityType;
use jarvis_core::LlmBackend;
use jarvis_memory::vectorstore::{VectorStore, MEMORY_CHUNKS_COLLECTION};
use once_cell::sync::Lazy;
use serde::Serialize;
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::Result;

static KNOWN_PROJECTS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "recruitos", "jarvis", "cmp", "sourcetrace", "atlas intelligence", "nerd", "koda",
        "danbolig", "source angel", "jbia", "clawdbot", "eureka", "dozy", "dronewatch",
        "skillsync",
    ]
    .into_iter()
    .collect()
});

static COMMON_ENGLISH_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "this", "that", "these", "those", "the", "a", "an", "and", "or", "but", "if", "then",
        "else", "when", "where", "what", "why", "how", "who", "which", "is", "are", "was",
        "were", "be", "been", "being", "have", "has", "had", "do", "does", "did", "will",
        "would", "should", "could", "may", "might", "can", "must", "shall", "to", "of", "in",
        "on", "at", "by", "for", "with", "from", "as", "about", "into", "through", "during",
        "before", "after", "above", "below", "between", "under", "over", "up", "down", "out",
        "off", "again", "further", "once", "here", "there", "all", "both", "each", "few",
        "more", "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same",
        "so", "than", "too", "very", "just", "now", "also", "back", "even", "still", "way",
        "well", "much", "many", "new", "old", "good", "great", "little", "long", "first",
        "last", "next", "right", "big", "different", "small", "large", "high", "low", "local",
        "start", "math", "clean", "light", "background", "hover", "drop", "luke", "flat",
        "shake", "realistic", "chart", "code", "explore", "search", "filter", "sort", "page",
        "view", "edit", "delete", "save", "cancel", "submit", "close", "get", "make", "take",
        "give", "find", "know", "think", "see", "come", "want", "use", "work", "try", "ask",
        "need", "feel", "become", "leave", "put", "mean", "keep", "let", "begin", "seem",
        "help", "show", "hear", "play", "run", "move", "like", "live", "believe", "hold",
        "bring", "happen", "write", "provide", "sit", "stand", "lose", "pay", "meet",
        "include", "continue", "set", "learn", "change", "lead", "understand", "watch",
        "follow", "stop", "create", "speak", "read", "allow", "add", "spend", "grow", "open",
        "walk", "win", "offer", "remember", "love", "consider", "appear", "buy", "wait",
        "serve", "die", "send", "expect", "build", "stay", "fall", "cut", "reach", "kill",
        "remain", "suggest", "raise", "pass", "sell", "require", "report", "decide", "pull",
        "looking", "cards", "via", "using",
    ]
    .into_iter()
    .collect()
});

static COMMON_DANISH_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "hvad", "vi", "jeg", "det", "klar", "så", "men", "eller", "og", "at", "en", "et",
        "der", "som", "på", "med", "kan", "har", "er", "til", "de", "af", "ikke", "også",
        "for", "om", "han", "hun", "dit", "din", "denne", "dette", "disse", "var", "bliver",
        "blevet", "være", "have", "kunne", "skulle", "ville", "må", "lige", "meget", "godt",
        "hvis", "bare", "selv", "når", "hvor", "hvorfor", "hvordan", "hvem", "hvilken",
        "alle", "nogle", "noget", "ingen", "intet", "anden", "andet", "andre", "hver",
        "hvert", "mig", "dig", "ham", "hende", "os", "jer", "dem", "min", "mit", "mine",
        "sin", "sit", "sine", "vores", "jeres", "deres", "fase", "susanne", "overblik",
        "sporbart", "website",
    ]
    .into_iter()
    .collect()
});

static GENERIC_SINGLE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "intelligence", "website", "platform", "solution", "system", "service", "tool",
        "app", "application", "software", "dashboard", "portal", "product", "project",
        "program", "plan", "strategy", "campaign",
    ]
    .into_iter()
    .collect()
});

/// Multi-stage heuristic filter distinguishing a project name from a
/// common word or phrase.
pub fn is_likely_project_name(name: &str) -> bool {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return false;
    }
    let name_lower = trimmed.to_lowercase();

    if KNOWN_PROJECTS.contains(name_lower.as_str()) {
        return true;
    }

    let words: Vec<&str> = name_lower.split_whitespace().collect();

    if words.len() == 1 {
        if name_lower.chars().count() < 4 {
            return false;
        }
        if COMMON_ENGLISH_WORDS.contains(name_lower.as_str())
            || COMMON_DANISH_WORDS.contains(name_lower.as_str())
            || GENERIC_SINGLE_WORDS.contains(name_lower.as_str())
        {
            return false;
        }
        return trimmed.chars().next().is_some_and(|c| c.is_uppercase()) && trimmed.chars().count() >= 4;
    }

    if words.len() > 1 {
        let all_common = words
            .iter()
            .all(|w| COMMON_ENGLISH_WORDS.contains(w) || COMMON_DANISH_WORDS.contains(w));
        if all_common {
            return false;
        }

        let all_capitalized = trimmed.split_whitespace().all(|w| w.chars().next().is_some_and(|c| c.is_uppercase()));
        if all_capitalized {
            return true;
        }

        let has_meaningful_word = words
            .iter()
            .any(|w| w.chars().count() >= 4 && !COMMON_ENGLISH_WORDS.contains(w) && !COMMON_DANISH_WORDS.contains(w));
        if has_meaningful_word {
            return true;
        }
    }

    false
}

/// Shell out to the `gh` CLI for commit counts in the trailing `days`
/// window, falling back to 0 on any failure (spawn error, non-zero
/// exit, timeout, or unparseable output) exactly like the original.
pub async fn github_commits_7d(repo_slug: &str, days: i64) -> i32 {
    let since_date = (Utc::now() - chrono::Duration::days(days)).format("%Y-%m-%d").to_string();
    let jq_filter = format!(r#"[.[] | select(.commit.author.date >= "{since_date}")] | length"#);

    let run = Command::new("gh")
        .args([
            "api",
            &format!("repos/Arnarsson/{repo_slug}/commits"),
            "--jq",
            &jq_filter,
            "-q",
            &format!("since={since_date}"),
            "--paginate",
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output();

    match timeout(Duration::from_secs(5), run).await {
        Ok(Ok(output)) if output.status.success() => {
            String::from_utf8_lossy(&output.stdout).trim().parse::<i32>().unwrap_or(0)
        }
        _ => 0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    Warming,
    Cooling,
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectActivity {
    pub name: String,
    pub activity_score: i32,
    pub status: ProjectStatus,
    pub trend: Trend,
    pub last_activity: Option<DateTime<Utc>>,
    pub mentions_7d: u32,
    pub mentions_prev_7d: u32,
    pub github_commits_7d: i32,
    pub github_repo: Option<String>,
    pub days_since_activity: Option<i64>,
    pub suggested_action: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectPulse {
    pub projects: Vec<ProjectActivity>,
    pub active_count: usize,
    pub warming_count: usize,
    pub cooling_count: usize,
    pub stale_count: usize,
}

#[derive(Default)]
struct Tracker {
    mentions_7d: u32,
    mentions_prev_7d: u32,
    dates: Vec<DateTime<Utc>>,
}

pub async fn project_pulse(
    store: &dyn VectorStore,
    llm: Option<&dyn LlmBackend>,
    min_mentions: u32,
    include_github: bool,
    limit: usize,
) -> Result<ProjectPulse> {
    let points = store.scroll_payloads(MEMORY_CHUNKS_COLLECTION).await?;

    let now = Utc::now();
    let seven_days_ago = now - chrono::Duration::days(7);
    let fourteen_days_ago = now - chrono::Duration::days(14);
    let thirty_days_ago = now - chrono::Duration::days(30);

    let mut tracker: HashMap<String, Tracker> = HashMap::new();
    for point in &points {
        let chunk_date = point
            .payload
            .get("conversation_date")
            .or_else(|| point.payload.get("timestamp"))
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(&s.replace('Z', "+00:00")).ok())
            .map(|d| d.with_timezone(&Utc));

        let projects: Vec<String> = point
            .payload
            .get("projects")
            .and_then(|v| v.as_array())
            .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default();

        for project in projects {
            if project.trim().chars().count() < 2 {
                continue;
            }
            let entry = tracker.entry(project).or_default();
            if let Some(d) = chunk_date {
                entry.dates.push(d);
                if d >= seven_days_ago {
                    entry.mentions_7d += 1;
                } else if d >= fourteen_days_ago {
                    entry.mentions_prev_7d += 1;
                }
            }
        }
    }

    if let Some(llm) = llm {
        let names: Vec<String> = tracker.keys().cloned().collect();
        match llm.classify_entities(&names).await {
            Ok(classifications) => {
                let projects: HashSet<String> = classifications
                    .into_iter()
                    .filter(|(_, t)| *t == EntityType::Project)
                    .map(|(n, _)| n)
                    .collect();
                tracker.retain(|name, _| projects.contains(name));
            }
            Err(e) => {
                tracing::warn!(error = %e, "llm_classification_failed, falling back to heuristic");
                tracker.retain(|name, _| is_likely_project_name(name));
            }
        }
    } else {
        tracker.retain(|name, _| is_likely_project_name(name));
    }

    tracker.retain(|_, data| data.mentions_7d + data.mentions_prev_7d >= min_mentions);

    let mut projects = Vec::new();
    let mut active_count = 0;
    let mut warming_count = 0;
    let mut cooling_count = 0;
    let mut stale_count = 0;

    for (name, data) in tracker {
        let mut dates = data.dates;
        dates.sort();
        let last_activity = dates.last().copied();
        let days_since = last_activity.map(|d| (now - d).num_days());

        let (github_commits, github_repo) = if include_github {
            let repo_candidate = name.to_lowercase().replace(' ', "-");
            let commits = github_commits_7d(&repo_candidate, 7).await;
            let repo = if commits > 0 { Some(format!("Arnarsson/{repo_candidate}")) } else { None };
            (commits, repo)
        } else {
            (0, None)
        };

        let activity_score = data.mentions_7d as i32 * 3 + data.mentions_prev_7d as i32 + github_commits * 2;

        let trend = match data.mentions_7d.cmp(&data.mentions_prev_7d) {
            std::cmp::Ordering::Greater => Trend::Up,
            std::cmp::Ordering::Less => Trend::Down,
            std::cmp::Ordering::Equal => Trend::Flat,
        };

        let (status, suggested_action) = if data.mentions_7d >= 5 || github_commits >= 3 {
            active_count += 1;
            (ProjectStatus::Active, Some(format!("Keep momentum on {name}")))
        } else if data.mentions_7d >= 1 || github_commits >= 1 {
            warming_count += 1;
            (ProjectStatus::Warming, Some(format!("Continue progress on {name}")))
        } else if last_activity.is_some_and(|d| d >= thirty_days_ago) {
            cooling_count += 1;
            (ProjectStatus::Cooling, Some(format!("Check in on {name} - activity declining")))
        } else {
            stale_count += 1;
            let action = match days_since {
                Some(d) => format!("Revive {name} (inactive for {d} days)"),
                None => format!("Review status of {name}"),
            };
            (ProjectStatus::Stale, Some(action))
        };

        projects.push(ProjectActivity {
            name,
            activity_score,
            status,
            trend,
            last_activity,
            mentions_7d: data.mentions_7d,
            mentions_prev_7d: data.mentions_prev_7d,
            github_commits_7d: github_commits,
            github_repo,
            days_since_activity: days_since,
            suggested_action,
        });
    }

    projects.sort_by(|a, b| b.activity_score.cmp(&a.activity_score));
    projects.truncate(limit);

    Ok(ProjectPulse { projects, active_count, warming_count, cooling_count, stale_count })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitelisted_project_is_always_accepted() {
        assert!(is_likely_project_name("jarvis"));
    }

    #[test]
    fn rejects_short_single_words() {
        assert!(!is_likely_project_name("abc"));
    }

    #[test]
    fn rejects_common_english_words() {
        assert!(!is_likely_project_name("Looking"));
    }

    #[test]
    fn rejects_generic_single_words() {
        assert!(!is_likely_project_name("Platform"));
    }

    #[test]
    fn accepts_capitalized_unknown_single_word() {
        assert!(is_likely_project_name("Skynet"));
    }

    #[test]
    fn rejects_all_common_word_phrases() {
        assert!(!is_likely_project_name("the other"));
    }

    #[test]
    fn accepts_all_capitalized_multi_word_phrase() {
        assert!(is_likely_project_name("Atlas Pipeline"));
    }
}
