//! Contact frequency map over memory chunks, ported from
//! `original_source/server/src/jarvis_server/api/people_graph.py`.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use jarvis_core::LlmBackend;
use jarvis_core::types::EntityType;
use jarvis_memory::vectorstore::{VectorStore, MEMORY_CHUNKS_COLLECTION};
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::error::Result;

static NAME_BLOCKLIST: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "operations automation", "changes made", "what changed", "source angel", "next steps",
        "key features", "google ads", "google tag", "google sheet", "google sheets",
        "google analytics", "google calendar", "analysis tool", "prompt engineering",
        "business developer", "data analysis", "market research", "user experience",
        "project manager", "system admin", "tech support", "customer service", "sales team",
        "marketing team", "design team", "dev team", "engineering team", "product team",
        "senior developer", "lead engineer", "chief architect", "technical lead",
        "scrum master", "product owner", "business analyst", "quality assurance",
        "user interface", "user story", "sprint planning", "code review", "pull request",
        "merge conflict", "claude desktop", "claude sonnet", "chatgpt", "error handling",
        "exception handling", "content creation", "content strategy", "seo optimization",
        "git", "github", "gitlab", "bitbucket", "docker", "kubernetes", "aws", "azure", "gcp",
        "atlas intelligence", "bright star", "north star", "key performance",
        "performance indicators", "machine learning", "deep learning", "neural network",
        "artificial intelligence", "bright data", "key results", "set up", "log in",
        "sign up", "sign in", "check out", "follow up", "scale up", "start up", "shut down",
        "break down", "roll out", "pick up", "environment variables", "atlas consulting",
        "through rate", "click through", "conversion rate", "bounce rate", "barry energy",
        "ad group", "ad campaign", "campaign performance", "model context", "context window",
        "linked", "linkedin", "open", "close", "save", "load", "run", "stop", "action items",
        "custom instructions", "vercel", "home assistant", "your name", "facebook pixel",
        "facebook ads", "twitter ads", "linkedin ads", "instagram ads", "tiktok ads",
        "social media", "landing page", "chat", "over time", "high quality", "seven consult",
        "docker compose", "coolify", "looker studio", "key observations", "landing pages",
        "quality score", "page speed", "load time", "health auto", "agent kit", "what you",
        "what we", "executive summary", "beyond beta", "apps script", "event tracking",
        "hej sven", "app router", "hello world", "thank you", "best regards", "tech stack",
        "key takeaways", "cost per", "dit navn", "shot example", "additional tips",
        "best practices", "quick start", "getting started", "click through rate", "web page",
        "home page", "contact form", "search bar", "nav bar", "side bar", "menu bar",
        "status bar", "tool bar", "scroll bar", "wait but", "target zone", "linear",
        "seven oceans", "growth hacking", "samlet karakter", "zone of", "rate of", "level of",
        "type of", "kind of", "sort of", "part of", "end of", "start of", "top of",
        "bottom of", "side of", "technical assessment", "together tracker", "consent mode",
        "ad copy", "next", "elon musk", "steve jobs", "mark zuckerberg", "jeff bezos",
        "bill gates", "larry page", "sergey brin",
    ]
    .into_iter()
    .collect()
});

static TOPIC_INDICATORS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "automation", "system", "process", "tool", "feature", "analysis", "research",
        "management", "service", "support", "development", "engineering", "marketing",
        "design", "sales", "product", "platform", "software", "application", "database",
        "api", "integration", "workflow", "pipeline", "infrastructure", "deployment",
        "configuration", "optimization", "monitoring", "testing", "debugging", "prompt",
        "template", "framework", "library", "module", "component", "interface", "backend",
        "frontend", "fullstack", "devops", "cloud", "analytics", "metrics", "dashboard",
        "report", "export", "import", "consulting", "consultancy", "energy", "variables",
        "variable", "constants", "parameters", "arguments", "rate", "ratio", "percentage",
        "conversion", "click", "impression", "campaign", "group", "segment", "cohort",
        "audience", "targeting", "model", "context", "window", "token", "embedding",
        "vector", "items", "instructions", "pixel", "assistant", "helper", "wizard",
        "action", "custom", "default", "standard", "advanced", "basic", "media", "social",
        "page", "pages", "chat", "quality", "consult", "compose", "studio", "observations",
        "observation", "speed", "score", "time", "loading", "coolify", "stack", "takeaways",
        "tips", "cost", "example", "examples", "practices", "quick", "getting", "started",
        "per",
    ]
    .into_iter()
    .collect()
});

static VERB_INDICATORS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "made", "changed", "updated", "created", "deleted", "added", "removed", "modified",
        "fixed", "improved", "optimized", "refactored", "deployed", "tested", "debugged",
        "reviewed", "approved", "rejected", "merged", "committed", "pushed", "pulled",
        "forked", "cloned", "branched",
    ]
    .into_iter()
    .collect()
});

static COMMON_FIRST_NAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "sven", "thomas", "christopher", "chris", "hjalti", "avnit", "nikolaj", "michael",
        "jesper", "daniel", "marco", "anne", "atlas", "kristian", "jimmy", "john", "james",
        "robert", "mary", "patricia", "linda", "barbara", "elizabeth", "jennifer", "maria",
        "susan", "margaret", "dorothy", "lisa", "nancy", "karen", "betty", "helen", "sandra",
        "donna", "carol", "ruth", "sharon", "michelle", "laura", "sarah", "kimberly",
        "deborah", "jessica", "shirley", "cynthia", "angela", "melissa", "brenda", "amy",
        "anna", "rebecca", "virginia", "kathleen", "david", "richard", "charles", "joseph",
        "donald", "kenneth", "steven", "edward", "brian", "ronald", "anthony", "kevin",
        "jason", "matthew", "gary", "timothy", "jose", "larry", "jeffrey", "frank", "scott",
        "eric", "stephen", "andrew", "raymond", "gregory", "joshua", "jerry", "dennis",
        "walter", "patrick", "peter", "harold", "douglas", "henry", "carl", "arthur", "ryan",
        "roger", "joe", "juan", "jack", "albert", "jonathan", "justin", "terry", "gerald",
        "keith", "samuel", "willie", "ralph", "lawrence", "nicholas", "roy", "benjamin",
        "bruce", "brandon", "adam", "harry", "fred", "wayne", "billy", "steve", "louis",
        "jeremy", "aaron", "randy", "howard", "eugene", "carlos", "russell", "bobby",
        "victor", "martin", "ernest", "phillip", "todd", "jesse", "craig", "alan", "shawn",
        "clarence", "sean", "philip", "johnny", "earl", "antonio", "danny", "bryan", "tony",
        "luis", "mike", "stanley", "leonard", "nathan", "dale", "manuel", "rodney", "curtis",
        "norman", "allen", "marvin", "vincent", "glenn", "jeffery", "travis", "jeff", "chad",
        "jacob", "lee", "melvin", "alfred", "kyle", "francis", "bradley", "jesus", "herbert",
        "frederick", "ray", "joel", "edwin", "don", "eddie", "ricky", "troy", "randall",
    ]
    .into_iter()
    .collect()
});

const TECH_TERMS: &[&str] = &[
    "error", "exception", "handling", "creation", "strategy", "optimization", "intelligence",
    "star", "performance", "indicators", "learning", "network", "data", "results", "insights",
    "metrics", "report", "dashboard",
];

const SINGLE_WORD_BLOCKLIST: &[&str] = &[
    "git", "docker", "aws", "gcp", "api", "sdk", "cli", "open", "close", "save", "load", "run",
    "stop", "start", "linked", "link", "connect", "sync", "export", "import", "create",
    "delete", "update", "edit", "view", "read", "write", "vercel", "netlify", "heroku",
    "railway", "render", "danish", "english", "french", "german", "spanish", "italian",
    "google", "facebook", "twitter", "linkedin", "instagram", "tiktok", "apple", "microsoft",
    "amazon", "netflix", "spotify", "uber", "linear", "notion", "slack", "discord", "zoom",
    "teams", "figma", "sketch", "photoshop", "illustrator", "canva", "trello", "asana", "jira",
    "github", "gitlab", "bitbucket",
];

const ACTION_PATTERNS: &[(&str, &str)] = &[
    ("set", "up"), ("log", "in"), ("sign", "up"), ("sign", "in"), ("check", "out"),
    ("follow", "up"), ("scale", "up"), ("start", "up"), ("shut", "down"), ("break", "down"),
    ("roll", "out"), ("pick", "up"), ("key", "results"), ("key", "performance"),
];

/// Multi-stage heuristic filter distinguishing a person name from a topic
/// or phrase. Each stage is a short-circuiting predicate, checked in the
/// same order as the original.
pub fn is_likely_person_name(name: &str) -> bool {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return false;
    }
    let name_lower = trimmed.to_lowercase();

    if NAME_BLOCKLIST.contains(name_lower.as_str()) {
        return false;
    }
    if name_lower.contains("your") || name_lower.contains("my") {
        return false;
    }

    const PRODUCT_PREFIXES: &[&str] = &["google", "claude", "chatgpt", "openai", "microsoft", "apple", "amazon"];
    for prefix in PRODUCT_PREFIXES {
        if name_lower.starts_with(&format!("{prefix} ")) {
            return false;
        }
    }

    let words: Vec<&str> = name_lower.split_whitespace().collect();
    const QUESTION_WORDS: &[&str] = &["what", "when", "where", "why", "how", "who", "which"];
    const GREETING_WORDS: &[&str] = &["hello", "hi", "hey", "hej", "hola", "bonjour"];
    let first_word = words.first().copied().unwrap_or("");
    if QUESTION_WORDS.contains(&first_word) || GREETING_WORDS.contains(&first_word) {
        return false;
    }

    if words.len() > 3 || words.is_empty() {
        return false;
    }
    if words.iter().any(|w| TOPIC_INDICATORS.contains(w)) {
        return false;
    }
    if words.iter().any(|w| VERB_INDICATORS.contains(w)) {
        return false;
    }
    if TECH_TERMS.iter().any(|t| name_lower.contains(t)) {
        return false;
    }

    if words.len() == 2 {
        let pair = (words[0], words[1]);
        if ACTION_PATTERNS.contains(&pair) {
            return false;
        }
    }

    if COMMON_FIRST_NAMES.contains(words[0]) {
        return true;
    }

    if words.len() == 1 {
        if SINGLE_WORD_BLOCKLIST.contains(&name_lower.as_str()) {
            return false;
        }
        if ["google", "facebook", "apple", "microsoft", "amazon", "linear"].contains(&name_lower.as_str()) {
            return false;
        }
        if name_lower.ends_with('s') && !COMMON_FIRST_NAMES.contains(name_lower.as_str()) {
            let base = &name_lower[..name_lower.len() - 1];
            if COMMON_FIRST_NAMES.contains(base) {
                return false;
            }
        }
        if trimmed.chars().next().is_some_and(|c| c.is_uppercase()) && trimmed.chars().count() >= 3 {
            return true;
        }
        return false;
    }

    if words.iter().any(|w| COMMON_FIRST_NAMES.contains(w)) {
        return true;
    }

    let all_capitalized = trimmed.split_whitespace().all(|w| w.chars().next().is_some_and(|c| c.is_uppercase()));
    if all_capitalized {
        if ["tool", "system", "process"].iter().any(|i| name_lower.contains(i)) {
            return false;
        }
        return true;
    }

    false
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    Active,
    Fading,
    Stale,
    Unknown,
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonContact {
    pub name: String,
    pub frequency: u32,
    pub last_seen: Option<DateTime<Utc>>,
    pub first_seen: Option<DateTime<Utc>>,
    pub days_since_contact: Option<i64>,
    pub projects: Vec<String>,
    pub topics: Vec<String>,
    pub status: ContactStatus,
    pub suggested_action: Option<String>,
    pub conversation_count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PeopleGraph {
    pub contacts: Vec<PersonContact>,
    pub active_count: usize,
    pub fading_count: usize,
    pub stale_count: usize,
    pub top_5: Vec<String>,
}

#[derive(Default)]
struct Tracker {
    count: u32,
    conversations: HashSet<String>,
    dates: Vec<DateTime<Utc>>,
    projects: HashSet<String>,
    topics: HashSet<String>,
}

/// Scan `memory_chunks`, classify mentioned names as people (via `llm` if
/// given, else the heuristic cascade), and bucket them by recency.
pub async fn people_graph(
    store: &dyn VectorStore,
    llm: Option<&dyn LlmBackend>,
    min_frequency: u32,
    limit: usize,
) -> Result<PeopleGraph> {
    let points = store.scroll_payloads(MEMORY_CHUNKS_COLLECTION).await?;

    let mut tracker: HashMap<String, Tracker> = HashMap::new();
    for point in &points {
        let conversation_id = point.payload.get("conversation_id").and_then(|v| v.as_str()).unwrap_or("").to_string();
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
        let topics: Vec<String> = point
            .payload
            .get("topics")
            .and_then(|v| v.as_array())
            .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default();

        let people: Vec<String> = point
            .payload
            .get("people")
            .and_then(|v| v.as_array())
            .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default();

        for person in people {
            if person.trim().chars().count() < 2 {
                continue;
            }
            let entry = tracker.entry(person).or_default();
            entry.count += 1;
            entry.conversations.insert(conversation_id.clone());
            if let Some(d) = chunk_date {
                entry.dates.push(d);
            }
            entry.projects.extend(projects.iter().cloned());
            entry.topics.extend(topics.iter().cloned());
        }
    }

    if let Some(llm) = llm {
        let names: Vec<String> = tracker.keys().cloned().collect();
        match llm.classify_entities(&names).await {
            Ok(classifications) => {
                let people: HashSet<String> = classifications
                    .into_iter()
                    .filter(|(_, t)| *t == EntityType::Person)
                    .map(|(n, _)| n)
                    .collect();
                tracker.retain(|name, _| people.contains(name));
            }
            Err(e) => {
                tracing::warn!(error = %e, "llm_classification_failed, falling back to heuristic");
                tracker.retain(|name, _| is_likely_person_name(name));
            }
        }
    } else {
        tracker.retain(|name, _| is_likely_person_name(name));
    }

    tracker.retain(|_, data| data.count >= min_frequency);

    let now = Utc::now();
    let mut contacts: Vec<PersonContact> = Vec::new();
    let mut active_count = 0;
    let mut fading_count = 0;
    let mut stale_count = 0;

    for (name, data) in tracker {
        let mut dates = data.dates;
        dates.sort();
        let first_seen = dates.first().copied();
        let last_seen = dates.last().copied();

        let (status, days_since, suggested_action) = match last_seen {
            Some(seen) => {
                let days = (now - seen).num_days();
                if days <= 7 {
                    active_count += 1;
                    (ContactStatus::Active, Some(days), Some(format!("Stay in touch with {name}")))
                } else if days <= 30 {
                    fading_count += 1;
                    (ContactStatus::Fading, Some(days), Some(format!("Consider reaching out to {name}")))
                } else {
                    stale_count += 1;
                    (ContactStatus::Stale, Some(days), Some(format!("Reconnect with {name} (no contact for {days} days)")))
                }
            }
            None => (ContactStatus::Unknown, None, None),
        };

        let mut projects: Vec<String> = data.projects.into_iter().collect();
        projects.truncate(10);
        let mut topics: Vec<String> = data.topics.into_iter().collect();
        topics.truncate(10);

        contacts.push(PersonContact {
            name,
            frequency: data.count,
            last_seen,
            first_seen,
            days_since_contact: days_since,
            projects,
            topics,
            status,
            suggested_action,
            conversation_count: data.conversations.len(),
        });
    }

    contacts.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    let top_5 = contacts.iter().take(5).map(|c| c.name.clone()).collect();
    contacts.truncate(limit);

    Ok(PeopleGraph { contacts, active_count, fading_count, stale_count, top_5 })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_single_common_first_name() {
        assert!(is_likely_person_name("Sven"));
    }

    #[test]
    fn rejects_blocklisted_phrases() {
        assert!(!is_likely_person_name("next steps"));
        assert!(!is_likely_person_name("Google Analytics"));
    }

    #[test]
    fn rejects_topic_indicator_words() {
        assert!(!is_likely_person_name("Deployment Pipeline"));
    }

    #[test]
    fn rejects_two_word_action_patterns() {
        assert!(!is_likely_person_name("Follow Up"));
    }

    #[test]
    fn rejects_possessive_form_of_a_common_name() {
        assert!(!is_likely_person_name("Svens"));
    }

    #[test]
    fn accepts_a_two_word_name_with_known_first_name() {
        assert!(is_likely_person_name("Anne Clara"));
    }

    #[test]
    fn rejects_question_and_greeting_openers() {
        assert!(!is_likely_person_name("What changed today"));
        assert!(!is_likely_person_name("Hey there friend"));
    }

    #[test]
    fn rejects_single_word_company_names() {
        assert!(!is_likely_person_name("Microsoft"));
    }
}
