//! Entity ruler: custom entity spans from a JSONL rule file.
//!
//! Each non-blank line is one record:
//! ```json
//! {"label": "SKILL", "pattern": [{"LOWER": "machine"}, {"LOWER": "learning"}]}
//! {"label": "SKILL", "pattern": "Kubernetes", "id": "k8s"}
//! ```
//! A string pattern is a phrase, matched token-by-token on exact text.
//! The file is loaded once at startup; any malformed record aborts loading.
//!
//! Ruler spans never overwrite what the recognizer already found: a candidate
//! that overlaps an existing entity is dropped, and overlapping candidates
//! resolve to the longest (then earliest) span.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::matcher::pattern::TokenPatternSpec;
use crate::matcher::{Match, PatternError, TokenPattern, TokenTest};
use crate::nlp::tokenizer::tokenize;
use crate::nlp::AnnotatedDoc;

#[derive(Debug, Error)]
pub enum RuleFileError {
    #[error("failed to read rule file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{origin}:{line}: malformed record: {source}")]
    Json {
        origin: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("{origin}:{line}: invalid pattern: {source}")]
    Pattern {
        origin: String,
        line: usize,
        #[source]
        source: PatternError,
    },

    #[error("{origin}:{line}: {message}")]
    Invalid {
        origin: String,
        line: usize,
        message: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleRecord {
    label: String,
    pattern: RulePattern,
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RulePattern {
    Phrase(String),
    Tokens(Vec<TokenPatternSpec>),
}

#[derive(Debug, Clone)]
pub struct EntityRule {
    pub label: String,
    /// Optional entity id from the rule file; kept for spaCy compatibility.
    #[allow(dead_code)]
    pub id: Option<String>,
    pattern: TokenPattern,
}

#[derive(Debug, Clone, Default)]
pub struct EntityRuler {
    rules: Vec<EntityRule>,
}

impl EntityRuler {
    #[cfg(test)]
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RuleFileError> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let source = std::fs::read_to_string(path).map_err(|source| RuleFileError::Io {
            path: origin.clone(),
            source,
        })?;
        let ruler = Self::from_jsonl(&source, &origin)?;
        info!("Loaded {} entity rules from {}", ruler.len(), origin);
        Ok(ruler)
    }

    /// Parses JSONL rule records. `origin` names the source in error messages.
    pub fn from_jsonl(source: &str, origin: &str) -> Result<Self, RuleFileError> {
        let mut rules = Vec::new();
        for (index, raw) in source.lines().enumerate() {
            let line = index + 1;
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let record: RuleRecord =
                serde_json::from_str(raw).map_err(|source| RuleFileError::Json {
                    origin: origin.to_string(),
                    line,
                    source,
                })?;
            rules.push(compile_record(record, origin, line)?);
        }
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[EntityRule] {
        &self.rules
    }

    /// Adds non-overlapping rule matches to `doc.entities`.
    pub fn apply(&self, doc: &mut AnnotatedDoc) {
        if self.is_empty() || doc.tokens.is_empty() {
            return;
        }

        let mut candidates: Vec<(Match, &str)> = Vec::new();
        for start in 0..doc.tokens.len() {
            for rule in &self.rules {
                if let Some(end) = rule.pattern.longest_match_at(&doc.tokens, start) {
                    candidates.push((Match { start, end }, rule.label.as_str()));
                }
            }
        }
        candidates.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then(a.start.cmp(&b.start)));

        let mut taken: Vec<Match> = doc
            .entities
            .iter()
            .map(|e| Match {
                start: e.start,
                end: e.end,
            })
            .collect();
        let mut added = Vec::new();
        for (candidate, label) in candidates {
            if taken.iter().any(|t| t.overlaps(&candidate)) {
                continue;
            }
            taken.push(candidate);
            added.push(doc.entity(label, candidate.start, candidate.end));
        }

        doc.entities.extend(added);
        doc.entities.sort_by_key(|e| e.start);
    }
}

fn compile_record(record: RuleRecord, origin: &str, line: usize) -> Result<EntityRule, RuleFileError> {
    let invalid = |message: &str| RuleFileError::Invalid {
        origin: origin.to_string(),
        line,
        message: message.to_string(),
    };

    if record.label.trim().is_empty() {
        return Err(invalid("label must not be empty"));
    }

    let pattern = match record.pattern {
        RulePattern::Phrase(phrase) => {
            let elements: Vec<_> = tokenize(&phrase)
                .into_iter()
                .map(|piece| TokenTest::orth(piece.text).one())
                .collect();
            if elements.is_empty() {
                return Err(invalid("phrase pattern must contain at least one token"));
            }
            TokenPattern::new(elements)
        }
        RulePattern::Tokens(specs) => TokenPattern::compile(&specs),
    }
    .map_err(|source| RuleFileError::Pattern {
        origin: origin.to_string(),
        line,
        source,
    })?;

    Ok(EntityRule {
        label: record.label,
        id: record.id,
        pattern,
    })
}
