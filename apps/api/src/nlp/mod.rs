//! Language pipeline: turns plain text into tagged tokens and entity spans.
//!
//! The statistical model is opaque and lives behind the `Annotator` trait:
//! - `RemoteAnnotator` calls an external annotation service (spaCy `Doc.to_json()` shape).
//! - `HeuristicAnnotator` is an in-process stand-in so the service runs with no model.
//!
//! `LanguagePipeline` runs the annotator and then the `EntityRuler` loaded from the
//! rule file. The whole pipeline is built once at startup and shared read-only.

pub mod remote;
pub mod ruler;
pub mod tagger;
pub mod tokenizer;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use remote::RemoteAnnotator;
pub use ruler::EntityRuler;
pub use tagger::HeuristicAnnotator;

/// Entity label the recognizer assigns to person names.
pub const LABEL_PERSON: &str = "PERSON";
/// Entity label the rule file conventionally uses for skills.
pub const LABEL_SKILL: &str = "SKILL";

static EMAIL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?$",
    )
    .expect("email shape regex is valid")
});

static URL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:https?://|www\.)[^\s]+$|^[a-z0-9-]+(?:\.[a-z0-9-]+)*\.(?:com|org|net|io|dev|edu|gov|co)(?:/[^\s]*)?$")
        .expect("url shape regex is valid")
});

// ────────────────────────────────────────────────────────────────────────────
// Part of speech
// ────────────────────────────────────────────────────────────────────────────

/// Coarse Universal Dependencies part-of-speech tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Pos {
    Adj,
    Adp,
    Adv,
    Aux,
    Cconj,
    Det,
    Intj,
    Noun,
    Num,
    Part,
    Pron,
    Propn,
    Punct,
    Sconj,
    Sym,
    Verb,
    Space,
    X,
}

impl Pos {
    pub const ALL: [Pos; 18] = [
        Pos::Adj,
        Pos::Adp,
        Pos::Adv,
        Pos::Aux,
        Pos::Cconj,
        Pos::Det,
        Pos::Intj,
        Pos::Noun,
        Pos::Num,
        Pos::Part,
        Pos::Pron,
        Pos::Propn,
        Pos::Punct,
        Pos::Sconj,
        Pos::Sym,
        Pos::Verb,
        Pos::Space,
        Pos::X,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Pos::Adj => "ADJ",
            Pos::Adp => "ADP",
            Pos::Adv => "ADV",
            Pos::Aux => "AUX",
            Pos::Cconj => "CCONJ",
            Pos::Det => "DET",
            Pos::Intj => "INTJ",
            Pos::Noun => "NOUN",
            Pos::Num => "NUM",
            Pos::Part => "PART",
            Pos::Pron => "PRON",
            Pos::Propn => "PROPN",
            Pos::Punct => "PUNCT",
            Pos::Sconj => "SCONJ",
            Pos::Sym => "SYM",
            Pos::Verb => "VERB",
            Pos::Space => "SPACE",
            Pos::X => "X",
        }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown part-of-speech tag '{0}'")]
pub struct UnknownPos(pub String);

impl FromStr for Pos {
    type Err = UnknownPos;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "CONJ" is the pre-v2 spelling of CCONJ, still emitted by some models.
        if s.eq_ignore_ascii_case("CONJ") {
            return Ok(Pos::Cconj);
        }
        Pos::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownPos(s.to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Annotated document
// ────────────────────────────────────────────────────────────────────────────

/// A single token with its grammatical annotations.
///
/// `start`/`end` are byte offsets into the owning document's text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedToken {
    pub text: String,
    pub pos: Pos,
    pub lemma: String,
    pub start: usize,
    pub end: usize,
    lower: String,
}

impl AnnotatedToken {
    pub fn new(text: impl Into<String>, pos: Pos, lemma: impl Into<String>, start: usize) -> Self {
        let text = text.into();
        let end = start + text.len();
        let lower = text.to_lowercase();
        Self {
            text,
            pos,
            lemma: lemma.into(),
            start,
            end,
            lower,
        }
    }

    pub fn lower(&self) -> &str {
        &self.lower
    }

    pub fn is_alpha(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(char::is_alphabetic)
    }

    pub fn is_digit(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(|c| c.is_ascii_digit())
    }

    pub fn is_punct(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(is_punct_char)
    }

    pub fn like_num(&self) -> bool {
        let stripped: String = self
            .text
            .trim_start_matches(['+', '-', '~'])
            .chars()
            .filter(|c| *c != ',' && *c != '.')
            .collect();
        if !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit()) {
            return true;
        }
        if let Some((num, den)) = self.text.split_once('/') {
            return !num.is_empty()
                && !den.is_empty()
                && num.chars().all(|c| c.is_ascii_digit())
                && den.chars().all(|c| c.is_ascii_digit());
        }
        false
    }

    pub fn like_email(&self) -> bool {
        EMAIL_SHAPE.is_match(&self.text)
    }

    pub fn like_url(&self) -> bool {
        !self.like_email() && URL_SHAPE.is_match(&self.text)
    }
}

pub(crate) fn is_punct_char(c: char) -> bool {
    matches!(
        c,
        '!' | '"'
            | '\''
            | '('
            | ')'
            | ','
            | '-'
            | '.'
            | '/'
            | ':'
            | ';'
            | '?'
            | '['
            | ']'
            | '{'
            | '}'
            | '_'
            | '•'
            | '·'
            | '–'
            | '—'
            | '‘'
            | '’'
            | '“'
            | '”'
            | '…'
            | '▪'
            | '●'
    )
}

/// A labelled run of tokens `[start, end)` (token indices).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitySpan {
    pub label: String,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Output of the language pipeline for one document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnnotatedDoc {
    pub text: String,
    pub tokens: Vec<AnnotatedToken>,
    pub entities: Vec<EntitySpan>,
}

impl AnnotatedDoc {
    /// Source text covered by tokens `[start, end)`.
    pub fn span_text(&self, start: usize, end: usize) -> String {
        if start >= end || end > self.tokens.len() {
            return String::new();
        }
        let (from, to) = (self.tokens[start].start, self.tokens[end - 1].end);
        match self.text.get(from..to) {
            Some(slice) => slice.to_string(),
            None => self.tokens[start..end]
                .iter()
                .map(|t| t.text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// Builds an entity span over tokens `[start, end)` with its surface text filled in.
    pub fn entity(&self, label: &str, start: usize, end: usize) -> EntitySpan {
        EntitySpan {
            label: label.to_string(),
            start,
            end,
            text: self.span_text(start, end),
        }
    }

    #[cfg(test)]
    pub fn entities_labelled<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a EntitySpan> {
        self.entities.iter().filter(move |e| e.label == label)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Annotator seam
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AnnotatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("annotation service error (status {status}): {message}")]
    Service { status: u16, message: String },

    #[error("annotation service returned an invalid document: {0}")]
    InvalidResponse(String),

    #[error("annotation service unavailable after {retries} retries")]
    Unavailable { retries: u32 },
}

/// Produces tokens, POS tags, lemmas and recognizer entities for a text.
///
/// Carried in `LanguagePipeline` as `Arc<dyn Annotator>` so the backend is
/// chosen once at startup.
#[async_trait]
pub trait Annotator: Send + Sync {
    /// Short backend name for logs ("heuristic" | "remote").
    fn backend(&self) -> &'static str;

    async fn annotate(&self, text: &str) -> Result<AnnotatedDoc, AnnotatorError>;
}

/// Annotator followed by the rule-file entity ruler.
pub struct LanguagePipeline {
    annotator: Arc<dyn Annotator>,
    ruler: EntityRuler,
}

impl LanguagePipeline {
    pub fn new(annotator: Arc<dyn Annotator>, ruler: EntityRuler) -> Self {
        Self { annotator, ruler }
    }

    pub fn backend(&self) -> &'static str {
        self.annotator.backend()
    }

    pub async fn process(&self, text: &str) -> Result<AnnotatedDoc, AnnotatorError> {
        let mut doc = self.annotator.annotate(text).await?;
        let recognized = doc.entities.len();
        self.ruler.apply(&mut doc);
        debug!(
            "Annotated document: tokens={}, recognizer_entities={}, ruler_entities={}",
            doc.tokens.len(),
            recognized,
            doc.entities.len() - recognized
        );
        Ok(doc)
    }
}
