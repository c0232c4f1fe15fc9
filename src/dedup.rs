//! Near-duplicate detection for generated prompts.
//!
//! The [`SimilarityIndex`] maintains a growing set of normalized prompt
//! texts and answers "is this new text a near-duplicate of any existing
//! entry?" in one of four modes (see [`DedupMode`]).
//!
//! # Similarity metric
//!
//! High-similarity and fuzzy modes use weighted token Jaccard. Each token's
//! weight is `1 / (1 + df)` where `df` is the number of stored entries
//! containing it, so corpus-common filler words ("best", "for") contribute
//! little while rare distinguishing tokens — competitor names in particular
//! — dominate the score. Two prompts that share most filler but differ in
//! the critical entity stay below the 0.90 threshold; case, punctuation,
//! and singular/plural keyword variants collapse to similarity 1.0.
//!
//! # Blocking
//!
//! Candidates are gathered by unioning per-token posting lists instead of
//! scanning every stored entry; an entry sharing zero tokens with the probe
//! can never reach either threshold, so the union loses nothing. Entries
//! with an identical sorted-token-set signature are matched without any
//! metric evaluation. The posting union degenerates toward a full scan only
//! when every stored prompt shares a token with the probe, which keeps
//! lookups cheap up to a few thousand entries — the scaling limit of this
//! design.

use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Duplicate detection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupMode {
    /// Never reject.
    Disabled,
    /// Reject only exact normalized-key matches.
    Exact,
    /// Reject at similarity ≥ the high threshold (default 0.90).
    HighSimilarity,
    /// Aggressive: reject at similarity ≥ the fuzzy threshold (default 0.75).
    Fuzzy,
}

impl DedupMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "disabled" => Some(DedupMode::Disabled),
            "exact" => Some(DedupMode::Exact),
            "high_similarity" => Some(DedupMode::HighSimilarity),
            "fuzzy" => Some(DedupMode::Fuzzy),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DedupMode::Disabled => "disabled",
            DedupMode::Exact => "exact",
            DedupMode::HighSimilarity => "high_similarity",
            DedupMode::Fuzzy => "fuzzy",
        }
    }
}

/// Running duplicate-check counters, reported after a generation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupStats {
    pub total_checked: u64,
    pub exact_duplicates: u64,
    pub similar_duplicates: u64,
}

/// One stored entry's comparison token set.
struct Entry {
    tokens: BTreeSet<String>,
}

/// Accumulating set of normalized prompt texts with near-duplicate lookup.
pub struct SimilarityIndex {
    high_threshold: f64,
    fuzzy_threshold: f64,
    keys: HashSet<String>,
    entries: Vec<Entry>,
    /// token → indices into `entries` (ascending, deduplicated).
    postings: HashMap<String, Vec<usize>>,
    /// sorted-token-set signature → any entry carrying it.
    signatures: HashSet<[u8; 32]>,
    stats: DedupStats,
}

impl SimilarityIndex {
    pub fn new(high_threshold: f64, fuzzy_threshold: f64) -> Self {
        Self {
            high_threshold,
            fuzzy_threshold,
            keys: HashSet::new(),
            entries: Vec::new(),
            postings: HashMap::new(),
            signatures: HashSet::new(),
            stats: DedupStats::default(),
        }
    }

    /// Number of distinct normalized keys stored.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn stats(&self) -> DedupStats {
        self.stats
    }

    /// Check whether `text` duplicates a stored entry under `mode`.
    ///
    /// Empty text after normalization is always a duplicate, so blank
    /// prompts can never enter the set. Never fails for any string input.
    pub fn is_duplicate(&mut self, text: &str, mode: DedupMode) -> bool {
        if mode == DedupMode::Disabled {
            return false;
        }

        self.stats.total_checked += 1;

        let key = normalize(text);
        if key.is_empty() {
            self.stats.exact_duplicates += 1;
            return true;
        }

        if self.keys.contains(&key) {
            self.stats.exact_duplicates += 1;
            return true;
        }

        let threshold = match mode {
            DedupMode::Exact => return false,
            DedupMode::HighSimilarity => self.high_threshold,
            DedupMode::Fuzzy => self.fuzzy_threshold,
            DedupMode::Disabled => unreachable!(),
        };

        let tokens = tokenize(&key);
        if self.signatures.contains(&signature(&tokens)) {
            // Same token set in a different order or inflection.
            self.stats.similar_duplicates += 1;
            return true;
        }

        let mut candidates: BTreeSet<usize> = BTreeSet::new();
        for token in &tokens {
            if let Some(indices) = self.postings.get(token) {
                candidates.extend(indices.iter().copied());
            }
        }

        for idx in candidates {
            let sim = self.weighted_jaccard(&tokens, &self.entries[idx].tokens);
            if sim >= threshold {
                self.stats.similar_duplicates += 1;
                return true;
            }
        }

        false
    }

    /// Add `normalize(text)` to the stored set.
    ///
    /// Idempotent: inserting the same normalized key twice leaves the
    /// observable size unchanged. Empty-after-normalization text is ignored.
    pub fn insert(&mut self, text: &str) {
        let key = normalize(text);
        if key.is_empty() || !self.keys.insert(key.clone()) {
            return;
        }

        let tokens = tokenize(&key);
        let idx = self.entries.len();
        for token in &tokens {
            let indices = self.postings.entry(token.clone()).or_default();
            if indices.last() != Some(&idx) {
                indices.push(idx);
            }
        }
        self.signatures.insert(signature(&tokens));
        self.entries.push(Entry { tokens });
    }

    /// Weighted Jaccard over two token sets, with weights derived from the
    /// stored corpus: `weight(t) = 1 / (1 + df(t))`.
    fn weighted_jaccard(&self, a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
        let mut intersection = 0.0;
        let mut union = 0.0;

        for token in a.union(b) {
            let df = self.postings.get(token).map(|p| p.len()).unwrap_or(0);
            let weight = 1.0 / (1.0 + df as f64);
            union += weight;
            if a.contains(token) && b.contains(token) {
                intersection += weight;
            }
        }

        if union <= 0.0 {
            return 0.0;
        }
        intersection / union
    }
}

/// Collapse text to a canonical comparable form: lowercase, punctuation
/// stripped, whitespace collapsed to single spaces.
///
/// Stable and idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a normalized key into its comparison token set.
///
/// Trailing-`s` plural folding (words longer than 3 chars, not ending in
/// `ss`) collapses singular/plural keyword variants.
fn tokenize(key: &str) -> BTreeSet<String> {
    key.split_whitespace().map(fold_plural).collect()
}

fn fold_plural(word: &str) -> String {
    if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

/// SHA-256 over the sorted token set, joined with `\x1f` separators.
fn signature(tokens: &BTreeSet<String>) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for token in tokens {
        hasher.update(token.as_bytes());
        hasher.update([0x1f]);
    }
    hasher.finalize().into()
}
