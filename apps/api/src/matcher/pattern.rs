//! Serialized token-pattern format (spaCy attribute spelling).
//!
//! ```json
//! [{"LOWER": "machine"}, {"LOWER": {"IN": ["learning", "vision"]}}]
//! [{"POS": "PROPN", "OP": "+"}, {"LOWER": "at"}, {"POS": "PROPN", "OP": "+"}]
//! ```

use serde::{Deserialize, Serialize};

/// One element of a serialized pattern. Every present attribute must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenPatternSpec {
    #[serde(rename = "ORTH", alias = "TEXT", default, skip_serializing_if = "Option::is_none")]
    pub orth: Option<StringPredicateSpec>,

    #[serde(rename = "LOWER", default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<StringPredicateSpec>,

    #[serde(rename = "LEMMA", default, skip_serializing_if = "Option::is_none")]
    pub lemma: Option<StringPredicateSpec>,

    #[serde(rename = "POS", default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<StringPredicateSpec>,

    #[serde(rename = "IS_ALPHA", default, skip_serializing_if = "Option::is_none")]
    pub is_alpha: Option<bool>,

    #[serde(rename = "IS_DIGIT", default, skip_serializing_if = "Option::is_none")]
    pub is_digit: Option<bool>,

    #[serde(rename = "IS_PUNCT", default, skip_serializing_if = "Option::is_none")]
    pub is_punct: Option<bool>,

    #[serde(rename = "LIKE_NUM", default, skip_serializing_if = "Option::is_none")]
    pub like_num: Option<bool>,

    #[serde(rename = "LIKE_EMAIL", default, skip_serializing_if = "Option::is_none")]
    pub like_email: Option<bool>,

    #[serde(rename = "LIKE_URL", default, skip_serializing_if = "Option::is_none")]
    pub like_url: Option<bool>,

    /// Quantifier: absent (exactly one), "+", "*" or "?".
    #[serde(rename = "OP", default, skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
}

/// A string attribute value: exact match or a set/regex predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringPredicateSpec {
    Exact(String),
    Complex(ComplexPredicateSpec),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComplexPredicateSpec {
    #[serde(rename = "IN", default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<String>>,

    #[serde(rename = "NOT_IN", default, skip_serializing_if = "Option::is_none")]
    pub none_of: Option<Vec<String>>,

    #[serde(rename = "REGEX", default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
}
