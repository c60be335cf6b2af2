//! Personal knowledge base: keyword-scored entries loaded from a JSON file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Combined answers longer than this fall back to the best entry alone.
const MAX_COMBINED_CHARS: usize = 200;
const MAX_RESULTS: usize = 2;
const EXACT_MATCH_SCORE: u32 = 10;
const PARTIAL_MATCH_SCORE: u32 = 2;
/// Query words shorter than this are ignored for partial matches.
const MIN_PARTIAL_WORD_LEN: usize = 3;

const PERSONAL_INDICATORS: &[&str] = &[
    "you",
    "your",
    "yourself",
    "who are you",
    "about you",
    "tell me about",
    "what do you",
    "your background",
    "your experience",
    "your skills",
    "your projects",
    "your interests",
    "your goals",
    "what are you working on",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: String,
    pub content: String,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid knowledge file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
}

impl KnowledgeBase {
    pub fn new(entries: Vec<KnowledgeEntry>) -> Self {
        Self { entries }
    }

    /// Load entries from a JSON array file.
    pub fn load(path: &Path) -> Result<Self, KnowledgeError> {
        let data = fs::read_to_string(path).map_err(|source| KnowledgeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let entries = serde_json::from_str(&data).map_err(|source| KnowledgeError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(entries))
    }

    /// Like [`KnowledgeBase::load`], but a missing or broken file yields an empty base.
    pub fn load_or_empty(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        if !path.exists() {
            log::debug!("No knowledge file at {}", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(kb) => {
                log::info!("Loaded {} knowledge entries from {}", kb.len(), path.display());
                kb
            }
            Err(e) => {
                log::warn!("{}", e);
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries with a positive score for `query`, best first, at most `max`.
    pub fn retrieve(&self, query: &str, max: usize) -> Vec<&KnowledgeEntry> {
        let mut scored: Vec<(&KnowledgeEntry, u32)> = self
            .entries
            .iter()
            .map(|entry| (entry, score(query, entry)))
            .filter(|(_, score)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.into_iter().take(max).map(|(entry, _)| entry).collect()
    }

    /// Answer a personal query from the base, or `None` to defer to the model.
    pub fn answer(&self, query: &str) -> Option<String> {
        if !is_personal_query(query) {
            return None;
        }
        let hits = self.retrieve(query, MAX_RESULTS);
        let best = hits.first()?;
        let combined = hits
            .iter()
            .map(|entry| entry.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        log::debug!(
            "Knowledge hits for {:?}: {:?}",
            query,
            hits.iter().map(|e| e.id.as_str()).collect::<Vec<_>>()
        );
        if combined.chars().count() > MAX_COMBINED_CHARS {
            Some(best.content.clone())
        } else {
            Some(combined)
        }
    }
}

/// Whether `query` asks about the wearer rather than a general topic.
pub fn is_personal_query(query: &str) -> bool {
    let lower = query.to_lowercase();
    PERSONAL_INDICATORS.iter().any(|i| lower.contains(i))
}

fn score(query: &str, entry: &KnowledgeEntry) -> u32 {
    let lower = query.to_lowercase();
    let mut total = 0;
    for keyword in &entry.keywords {
        let keyword = keyword.to_lowercase();
        if lower.contains(&keyword) {
            total += EXACT_MATCH_SCORE;
        }
        for q in lower
            .split_whitespace()
            .filter(|q| q.chars().count() >= MIN_PARTIAL_WORD_LEN)
        {
            for k in keyword.split_whitespace() {
                if q.contains(k) || k.contains(q) {
                    total += PARTIAL_MATCH_SCORE;
                }
            }
        }
    }
    total
}
