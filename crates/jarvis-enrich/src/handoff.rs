//! Resume/handoff engine: infers the user's last active project from
//! recent capture OCR text, ported from
//! `original_source/server/src/jarvis_server/services/resume_engine.py`.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::process::Command;
use tokio::time::timeout;
use uuid::Uuid;

use crate::project_pulse::is_likely_project_name;

/// Known project names shared with `project_pulse`, reused here so a
/// path like `~/Documents/jarvis/` is recognized even without a chunk
/// mention.
static KNOWN_PROJECTS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "recruitos", "jarvis", "cmp", "sourcetrace", "atlas intelligence", "nerd", "koda",
        "danbolig", "source angel", "jbia", "clawdbot", "eureka", "dozy", "dronewatch",
        "skillsync",
    ]
    .into_iter()
    .collect()
});

static FILE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[/\\][^\s\])(<>"']{2,}?\.[a-zA-Z0-9]{1,6}"#).unwrap());
static PATH_HINT_DOCUMENTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"/Documents/(?P<proj>[A-Za-z0-9_.-]{2,})/").unwrap());
static PATH_HINT_DEV: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(?:dev|code|src)/(?P<proj>[A-Za-z0-9_.-]{2,})/").unwrap());
static PATH_HINT_GIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(?:git|repos)/(?P<proj>[A-Za-z0-9_.-]{2,})/").unwrap());
static OWNER_REPO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Za-z0-9_.-]{2,}/(?P<repo>[A-Za-z0-9_.-]{2,})\b").unwrap());
static SOURCE_FILE_EXT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.(?:ts|tsx|js|jsx|py|css|md|json|yml|yaml)$").unwrap());
static DECISION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?im)^(?:decision|decided|we decided)\s*[:\-]\s*(.+)$").unwrap());
static NEXT_ACTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?im)^(?:next(?: action)?|todo|to-do)\s*[:\-]\s*(.+)$").unwrap());

const GAP_CAP_SECONDS: f64 = 120.0;

#[derive(Debug, Clone)]
pub struct CaptureSignal {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub ocr_text: String,
}

#[derive(Debug, Clone)]
pub struct OpenFile {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct RecentCommit {
    pub message: String,
    pub time: String,
}

#[derive(Debug, Clone)]
pub struct ResumeStats {
    pub name: String,
    pub duration_seconds: f64,
    pub last_active: DateTime<Utc>,
    pub capture_ids: Vec<Uuid>,
    pub open_files: Vec<OpenFile>,
    pub uncommitted_changes: bool,
    pub repo_path: Option<PathBuf>,
    pub recent_commits: Vec<RecentCommit>,
}

#[derive(Debug, Clone)]
pub struct ResumeWhy {
    pub reasons: Vec<String>,
    pub confidence: f64,
    pub sources: Vec<String>,
}

pub fn extract_file_paths(text: &str, limit: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for m in FILE_RE.find_iter(text) {
        let p = m.as_str().trim_end_matches([':', ',', '.', ';']).to_string();
        if p.chars().count() < 4 || seen.contains(&p) {
            continue;
        }
        seen.insert(p.clone());
        out.push(p);
        if out.len() >= limit {
            break;
        }
    }
    out
}

/// Detect project-name candidates from OCR text: known-project substring
/// matches, path-derived folder names, and `owner/repo` snippets.
pub fn detect_project_candidates(text: &str) -> HashSet<String> {
    if text.is_empty() {
        return HashSet::new();
    }
    let lowered = text.to_lowercase();
    let mut candidates = HashSet::new();

    for proj in KNOWN_PROJECTS.iter() {
        if lowered.contains(proj) {
            candidates.insert(normalize_project_name(proj));
        }
    }

    for rx in [&*PATH_HINT_DOCUMENTS, &*PATH_HINT_DEV, &*PATH_HINT_GIT] {
        for caps in rx.captures_iter(text) {
            if let Some(proj) = caps.name("proj") {
                candidates.insert(normalize_project_name(proj.as_str()));
            }
        }
    }

    for caps in OWNER_REPO_RE.captures_iter(text) {
        if let Some(repo) = caps.name("repo") {
            candidates.insert(normalize_project_name(repo.as_str()));
        }
    }

    candidates.into_iter().filter(|c| !c.is_empty()).collect()
}

fn normalize_project_name(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        return String::new();
    }
    let lower = name.to_lowercase();
    if KNOWN_PROJECTS.contains(lower.as_str()) {
        if lower.contains(' ') {
            return title_case(&lower);
        }
        return capitalize_first(name);
    }

    let cleaned: String = name.chars().map(|c| if c == '_' || c == '-' { ' ' } else { c }).collect();
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.chars().count() <= 1 {
        return String::new();
    }
    title_case(&cleaned)
}

fn title_case(s: &str) -> String {
    s.split_whitespace().map(capitalize_first).collect::<Vec<_>>().join(" ")
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Estimate per-project time spent by summing adjacent capture deltas,
/// capping each delta so a long idle gap doesn't get attributed.
pub fn estimate_durations(signals: &[CaptureSignal], project_for_signal: &[Option<String>]) -> HashMap<String, f64> {
    if signals.is_empty() {
        return HashMap::new();
    }

    let mut pairs: Vec<(&CaptureSignal, &Option<String>)> = signals.iter().zip(project_for_signal.iter()).collect();
    pairs.sort_by_key(|(s, _)| s.timestamp);

    let mut durations: HashMap<String, f64> = HashMap::new();
    for window in pairs.windows(2) {
        let (sig_a, proj_a) = window[0];
        let (sig_b, _) = window[1];
        let Some(proj_a) = proj_a else { continue };
        let delta = (sig_b.timestamp - sig_a.timestamp).num_milliseconds() as f64 / 1000.0;
        if delta < 0.0 {
            continue;
        }
        let delta = delta.min(GAP_CAP_SECONDS);
        *durations.entry(proj_a.clone()).or_insert(0.0) += delta;
    }

    if let Some((_, Some(last_proj))) = pairs.last() {
        *durations.entry(last_proj.clone()).or_insert(0.0) += GAP_CAP_SECONDS / 2.0;
    }

    durations
}

/// Best-effort local git repo lookup under common dev folders.
pub fn find_repo_for_project(project_name: &str, home: &Path) -> Option<PathBuf> {
    if project_name.is_empty() {
        return None;
    }
    let normalized = project_name.to_lowercase().replace(' ', "-");
    let raw = project_name.to_lowercase().replace(' ', "");

    for base in ["Documents", "Code", "code", "dev"] {
        let base = home.join(base);
        if !base.exists() {
            continue;
        }
        for candidate in [base.join(project_name), base.join(project_name.to_lowercase()), base.join(&normalized), base.join(&raw)] {
            if candidate.join(".git").exists() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Shell out to `git status --porcelain` and `git log -5` with a 2s
/// timeout each; any failure yields a clean/empty result, matching the
/// original's blanket try/except.
pub async fn git_status_and_recent_commits(repo: &Path) -> (bool, Vec<RecentCommit>) {
    let is_dirty = run_git(repo, &["status", "--porcelain"])
        .await
        .map(|out| !out.trim().is_empty())
        .unwrap_or(false);

    let commits = match run_git(repo, &["log", "-5", "--pretty=%s|%ct"]).await {
        Some(out) if !out.trim().is_empty() => {
            let now = Utc::now();
            out.trim()
                .lines()
                .filter_map(|line| {
                    let (msg, ts) = line.rsplit_once('|')?;
                    let secs: i64 = ts.parse().ok()?;
                    let dt = DateTime::from_timestamp(secs, 0)?;
                    Some(RecentCommit { message: msg.trim().to_string(), time: relative_time(now, dt) })
                })
                .collect()
        }
        _ => Vec::new(),
    };

    (is_dirty, commits)
}

async fn run_git(repo: &Path, args: &[&str]) -> Option<String> {
    let mut full_args = vec!["-C", repo.to_str()?];
    full_args.extend_from_slice(args);
    let run = Command::new("git").args(&full_args).stdout(Stdio::piped()).stderr(Stdio::null()).output();
    match timeout(Duration::from_secs(2), run).await {
        Ok(Ok(out)) if out.status.success() => Some(String::from_utf8_lossy(&out.stdout).to_string()),
        _ => None,
    }
}

fn relative_time(now: DateTime<Utc>, then: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }
    let mins = seconds / 60;
    if mins < 60 {
        return format!("{mins}m ago");
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    format!("{}d ago", hours / 24)
}

/// Heuristic extraction of the last decision and next action from
/// recent conversation text, falling back to a commit message and a
/// generic "continue work on X" suggestion.
pub fn infer_last_decision_and_next_action(
    project_name: &str,
    conversation_texts: &[String],
    fallback_commit_message: Option<&str>,
) -> (Option<String>, Option<String>) {
    let mut last_decision = None;
    let mut next_action = None;

    for text in conversation_texts {
        if text.is_empty() {
            continue;
        }
        if let Some(caps) = DECISION_RE.captures_iter(text).last() {
            last_decision = Some(caps[1].trim().to_string());
        }
        if let Some(caps) = NEXT_ACTION_RE.captures_iter(text).last() {
            next_action = Some(caps[1].trim().to_string());
        }
    }

    if last_decision.is_none() {
        last_decision = fallback_commit_message.map(str::to_string);
    }
    if next_action.is_none() && !project_name.is_empty() {
        next_action = Some(format!("Continue work on {project_name}"));
    }

    (last_decision, next_action)
}

/// Build resume stats for the dominant project from recent capture
/// signals, plus a `why` payload explaining the inference.
pub async fn resume(signals: &[CaptureSignal], home: &Path) -> (Option<ResumeStats>, ResumeWhy) {
    let now = Utc::now();

    if signals.is_empty() {
        return (None, ResumeWhy { reasons: vec!["No recent captures".to_string()], confidence: 0.0, sources: Vec::new() });
    }

    let mut signal_projects: Vec<Option<String>> = Vec::new();
    let mut per_project_capture_ids: HashMap<String, Vec<Uuid>> = HashMap::new();
    let mut per_project_last_active: HashMap<String, DateTime<Utc>> = HashMap::new();
    let mut per_project_files: HashMap<String, Vec<String>> = HashMap::new();

    for sig in signals {
        let candidates = detect_project_candidates(&sig.ocr_text);
        let proj = candidates.into_iter().filter(|c| is_likely_project_name(c)).max_by_key(|c| c.len());
        signal_projects.push(proj.clone());

        if let Some(proj) = proj {
            per_project_capture_ids.entry(proj.clone()).or_default().push(sig.id);
            let entry = per_project_last_active.entry(proj.clone()).or_insert(sig.timestamp);
            if sig.timestamp > *entry {
                *entry = sig.timestamp;
            }
            per_project_files.entry(proj).or_default().extend(extract_file_paths(&sig.ocr_text, 25));
        }
    }

    let mut durations = estimate_durations(signals, &signal_projects);

    if durations.is_empty() {
        for (sig, proj) in signals.iter().zip(signal_projects.iter()).rev() {
            if let Some(proj) = proj {
                durations.insert(proj.clone(), 1.0);
                per_project_last_active.insert(proj.clone(), sig.timestamp);
                per_project_capture_ids.entry(proj.clone()).or_default().push(sig.id);
                per_project_files.entry(proj.clone()).or_default().extend(extract_file_paths(&sig.ocr_text, 25));
                break;
            }
        }
    }

    if durations.is_empty() {
        let sources = signals.iter().rev().take(5).map(|s| format!("capture:{}", s.id)).collect();
        return (None, ResumeWhy { reasons: vec!["No project detected in recent captures".to_string()], confidence: 0.0, sources });
    }

    let (dominant, dominant_duration) = durations.iter().max_by(|a, b| a.1.partial_cmp(b.1).unwrap()).map(|(k, v)| (k.clone(), *v)).unwrap();
    let total_duration: f64 = durations.values().sum::<f64>().max(1.0);
    let confidence = (dominant_duration / total_duration).clamp(0.2, 0.99);

    let files = per_project_files.get(&dominant).cloned().unwrap_or_default();
    let mut seen = HashSet::new();
    let open_files: Vec<OpenFile> = files
        .into_iter()
        .filter(|f| SOURCE_FILE_EXT_RE.is_match(f))
        .filter(|f| seen.insert(f.clone()))
        .take(10)
        .map(|f| OpenFile { name: Path::new(&f).file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| f.clone()), path: f })
        .collect();

    let duration_today_s = dominant_duration;
    let mut reasons = vec!["Most recent activity".to_string(), format!("{} file(s) detected on screen", open_files.len())];
    let mut sources: Vec<String> = per_project_capture_ids.get(&dominant).map(|ids| ids.iter().rev().take(5).map(|id| format!("capture:{id}")).collect()).unwrap_or_default();

    let mut stats = ResumeStats {
        name: dominant.clone(),
        duration_seconds: duration_today_s,
        last_active: per_project_last_active.get(&dominant).copied().unwrap_or(now),
        capture_ids: per_project_capture_ids.get(&dominant).cloned().unwrap_or_default(),
        open_files,
        uncommitted_changes: false,
        repo_path: None,
        recent_commits: Vec::new(),
    };

    if let Some(repo) = find_repo_for_project(&dominant, home) {
        let (dirty, commits) = git_status_and_recent_commits(&repo).await;
        stats.uncommitted_changes = dirty;
        stats.repo_path = Some(repo.clone());
        if dirty {
            reasons.push("Uncommitted changes".to_string());
            sources.push(format!("git:{}:dirty", repo.display()));
        }
        if !commits.is_empty() {
            sources.push(format!("git:{}:recent_commits", repo.display()));
        }
        stats.recent_commits = commits;
    }

    (Some(stats), ResumeWhy { reasons, confidence: (confidence * 100.0).round() / 100.0, sources })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_a_unix_style_file_path() {
        let text = "editing /home/sven/dev/jarvis/src/main.rs right now";
        let paths = extract_file_paths(text, 10);
        assert_eq!(paths, vec!["/home/sven/dev/jarvis/src/main.rs".to_string()]);
    }

    #[test]
    fn detects_known_project_substring() {
        let candidates = detect_project_candidates("working on Jarvis today");
        assert!(candidates.contains("Jarvis"));
    }

    #[test]
    fn detects_project_from_dev_path_hint() {
        let candidates = detect_project_candidates("/Users/sven/dev/skynet-proto/README.md");
        assert!(candidates.contains("Skynet Proto"));
    }

    #[test]
    fn estimate_durations_caps_long_gaps() {
        let t0 = DateTime::parse_from_rfc3339("2026-07-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let signals = vec![
            CaptureSignal { id: Uuid::new_v4(), timestamp: t0, ocr_text: String::new() },
            CaptureSignal { id: Uuid::new_v4(), timestamp: t0 + chrono::Duration::hours(5), ocr_text: String::new() },
        ];
        let projects = vec![Some("Jarvis".to_string()), Some("Jarvis".to_string())];
        let durations = estimate_durations(&signals, &projects);
        assert!(durations["Jarvis"] <= GAP_CAP_SECONDS + GAP_CAP_SECONDS / 2.0 + 1.0);
    }

    #[test]
    fn infers_next_action_default_when_nothing_found() {
        let (decision, next) = infer_last_decision_and_next_action("Jarvis", &[], None);
        assert!(decision.is_none());
        assert_eq!(next, Some("Continue work on Jarvis".to_string()));
    }

    #[test]
    fn extracts_explicit_decision_marker() {
        let text = "random notes\nDecision: ship the hybrid search today\nmore notes";
        let (decision, _) = infer_last_decision_and_next_action("Jarvis", &[text.to_string()], None);
        assert_eq!(decision, Some("ship the hybrid search today".to_string()));
    }
}
