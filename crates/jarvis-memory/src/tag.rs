//! Heuristic tag extraction for conversation chunks (§4.4b). Deterministic
//! regex and keyword-count based extraction — no LLM calls, since tagging
//! runs over every chunk at ingest time and an LLM call per chunk would be
//! far too expensive at 50k+ chunks.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use jarvis_core::types::{ChunkTags, Sentiment};

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "be", "to", "of", "and", "a", "in", "that", "have", "i", "it", "for", "not", "on",
        "with", "he", "as", "you", "do", "at", "this", "but", "his", "by", "from", "they", "we",
        "say", "her", "she", "or", "an", "will", "my", "one", "all", "would", "there", "their",
        "what", "so", "up", "out", "if", "about", "who", "get", "which", "go", "me", "when",
        "make", "can", "like", "time", "no", "just", "him", "know", "take", "people", "into",
        "year", "your", "good", "some", "could", "them", "see", "other", "than", "then", "now",
        "look", "only", "come", "its", "over", "think", "also", "back", "after", "use", "two",
        "how", "our", "work", "first", "well", "way", "even", "new", "want", "because", "any",
        "these", "give", "day", "most", "us", "is", "was", "are", "been", "has", "had", "were",
        "said", "did", "having", "may",
    ]
    .into_iter()
    .collect()
});

static POSITIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "great", "good", "excellent", "awesome", "perfect", "love", "amazing", "wonderful",
        "fantastic", "brilliant", "success", "agree", "yes", "correct", "right", "exactly",
        "definitely", "absolutely", "thanks", "thank",
    ]
    .into_iter()
    .collect()
});

static NEGATIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "bad", "terrible", "awful", "horrible", "wrong", "error", "problem", "issue", "fail",
        "failed", "broken", "bug", "no", "not", "never", "cant", "cannot", "dont", "wont",
        "shouldnt", "wouldnt", "mistake", "sorry",
    ]
    .into_iter()
    .collect()
});

static NAME_STOP: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday", "January",
        "February", "March", "April", "May", "June", "July", "August", "September", "October",
        "November", "December", "Human", "Assistant", "User", "ChatGPT", "Claude", "System",
    ]
    .into_iter()
    .collect()
});

static PEOPLE_PATTERN_1: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:with|from|to|cc:|by)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)").unwrap());
static PEOPLE_PATTERN_2: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\s*([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)").unwrap());
static PEOPLE_PATTERN_3: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([A-Z][a-z]+\s+[A-Z][a-z]+)\b").unwrap());

static PROJECT_PATTERN_1: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:project|repo|repository)\s+([A-Z][a-zA-Z0-9_-]+)").unwrap());
static PROJECT_PATTERN_2: Lazy<Regex> = Lazy::new(|| Regex::new(r"github\.com/[\w-]+/([\w-]+)").unwrap());
static PROJECT_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z][a-z]+(?:[A-Z][a-z]+)*\b").unwrap());

static TOPIC_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[a-z]{3,}\b").unwrap());

static DATE_ISO: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").unwrap());
static DATE_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},?\s+\d{4}\b").unwrap()
});
static DATE_SLASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{1,2}/\d{1,2}/\d{2,4})\b").unwrap());

const DECISION_KEYWORDS: &[&str] = &[
    "decided", "agreed", "will do", "going with", "chose", "selected", "picked", "settled on",
    "concluded", "determined", "resolved",
];

const ACTION_KEYWORDS: &[&str] = &[
    "need to", "should", "must", "have to", "got to", "ought to", "todo", "to-do", "action item",
    "task:", "next step",
];

pub fn extract_people(text: &str) -> Vec<String> {
    let mut people: HashSet<String> = HashSet::new();
    for re in [&*PEOPLE_PATTERN_1, &*PEOPLE_PATTERN_2, &*PEOPLE_PATTERN_3] {
        for cap in re.captures_iter(text) {
            people.insert(cap[1].to_string());
        }
    }

    let mut filtered: Vec<String> = people
        .into_iter()
        .filter(|name| !NAME_STOP.contains(name.as_str()) && name.len() >= 2)
        .collect();
    filtered.sort();
    filtered.truncate(5);
    filtered
}

pub fn extract_projects(text: &str) -> Vec<String> {
    let mut projects: Vec<String> = Vec::new();
    for cap in PROJECT_PATTERN_1.captures_iter(text) {
        projects.push(cap[1].to_string());
    }
    for cap in PROJECT_PATTERN_2.captures_iter(text) {
        projects.push(cap[1].to_string());
    }

    let mut counts: HashMap<String, u32> = HashMap::new();
    for m in PROJECT_WORD.find_iter(text) {
        *counts.entry(m.as_str().to_string()).or_insert(0) += 1;
    }
    let mut ranked: Vec<(String, u32)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    for (word, count) in ranked.into_iter().take(10) {
        if count >= 2 && !matches!(word.as_str(), "Human" | "Assistant" | "User" | "ChatGPT" | "Claude") {
            projects.push(word);
        }
    }

    let mut unique: Vec<String> = projects.into_iter().collect::<HashSet<_>>().into_iter().collect();
    unique.sort();
    unique.truncate(5);
    unique
}

fn split_sentences(text: &str) -> Vec<&str> {
    static SENTENCE_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").unwrap());
    SENTENCE_SPLIT.split(text).collect()
}

fn clean_sentence(sentence: &str) -> Option<String> {
    let clean = sentence.trim();
    if clean.is_empty() {
        return None;
    }
    if clean.chars().count() > 150 {
        let truncated: String = clean.chars().take(147).collect();
        Some(format!("{truncated}..."))
    } else {
        Some(clean.to_string())
    }
}

pub fn extract_decisions(text: &str) -> Vec<String> {
    split_sentences(text)
        .into_iter()
        .filter(|s| {
            let lower = s.to_lowercase();
            DECISION_KEYWORDS.iter().any(|k| lower.contains(k))
        })
        .filter_map(clean_sentence)
        .take(3)
        .collect()
}

pub fn extract_action_items(text: &str) -> Vec<String> {
    split_sentences(text)
        .into_iter()
        .filter(|s| {
            let lower = s.to_lowercase();
            ACTION_KEYWORDS.iter().any(|k| lower.contains(k))
        })
        .filter_map(clean_sentence)
        .take(3)
        .collect()
}

pub fn extract_topics(text: &str, top_n: usize) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for m in TOPIC_WORD.find_iter(&lower) {
        let word = m.as_str();
        if !STOPWORDS.contains(word) {
            *counts.entry(word).or_insert(0) += 1;
        }
    }
    let mut ranked: Vec<(&str, u32)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.into_iter().take(top_n).map(|(w, _)| w.to_string()).collect()
}

pub fn extract_dates(text: &str) -> Vec<String> {
    let mut dates: HashSet<String> = HashSet::new();
    for cap in DATE_ISO.captures_iter(text) {
        dates.insert(cap[1].to_string());
    }
    for m in DATE_MONTH.find_iter(text) {
        dates.insert(m.as_str().to_string());
    }
    for cap in DATE_SLASH.captures_iter(text) {
        dates.insert(cap[1].to_string());
    }
    let mut out: Vec<String> = dates.into_iter().collect();
    out.sort();
    out.truncate(5);
    out
}

pub fn analyze_sentiment(text: &str) -> Sentiment {
    let lower = text.to_lowercase();
    let positive_count = POSITIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();
    let negative_count = NEGATIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();

    if positive_count > negative_count + 1 {
        Sentiment::Positive
    } else if negative_count > positive_count + 1 {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

pub fn extract_tags(chunk_text: &str) -> ChunkTags {
    ChunkTags {
        people: extract_people(chunk_text),
        projects: extract_projects(chunk_text),
        decisions: extract_decisions(chunk_text),
        action_items: extract_action_items(chunk_text),
        topics: extract_topics(chunk_text, 5),
        dates_mentioned: extract_dates(chunk_text),
        sentiment: Some(analyze_sentiment(chunk_text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_people_from_with_from_patterns() {
        let people = extract_people("Had a call with John Smith about the roadmap.");
        assert!(people.contains(&"John Smith".to_string()));
    }

    #[test]
    fn filters_weekday_and_month_false_positives() {
        let people = extract_people("Meeting on Monday with January and Assistant.");
        assert!(!people.iter().any(|p| p == "Monday"));
    }

    #[test]
    fn extracts_decisions_by_keyword() {
        let decisions = extract_decisions("We decided to ship Friday. The weather was nice.");
        assert_eq!(decisions.len(), 1);
        assert!(decisions[0].contains("decided"));
    }

    #[test]
    fn extracts_action_items_by_keyword() {
        let actions = extract_action_items("I need to finish the report. It was a good day.");
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn topics_exclude_stopwords() {
        let topics = extract_topics("the project database migration migration migration", 3);
        assert!(topics.contains(&"migration".to_string()));
        assert!(!topics.contains(&"the".to_string()));
    }

    #[test]
    fn sentiment_requires_a_two_vote_margin() {
        assert_eq!(analyze_sentiment("great great great"), Sentiment::Positive);
        assert_eq!(analyze_sentiment("great bad"), Sentiment::Neutral);
        assert_eq!(analyze_sentiment("bad broken bug"), Sentiment::Negative);
    }

    #[test]
    fn extracts_iso_dates() {
        let dates = extract_dates("Due 2026-03-05, see you then.");
        assert_eq!(dates, vec!["2026-03-05".to_string()]);
    }
}
