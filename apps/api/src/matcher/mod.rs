//! Token-pattern matcher.
//!
//! A `TokenPattern` is a sequence of `PatternElement`s, each a conjunction of
//! per-token checks plus a quantifier. Matching walks the pattern over a token
//! slice keeping the set of reachable positions, so `+`/`*` are greedy with
//! full backtracking. Patterns are compiled once; matching never fails.

pub mod pattern;

use std::collections::BTreeSet;

use regex::Regex;
use thiserror::Error;

use crate::nlp::{AnnotatedToken, Pos};
use pattern::{ComplexPredicateSpec, StringPredicateSpec, TokenPatternSpec};

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("pattern has no elements")]
    Empty,

    #[error("unsupported operator '{0}' (expected '+', '*' or '?')")]
    UnsupportedOperator(String),

    #[error("{0}")]
    UnknownPos(#[from] crate::nlp::UnknownPos),

    #[error("invalid REGEX '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("predicate object must contain exactly one of IN, NOT_IN or REGEX")]
    AmbiguousPredicate,
}

// ────────────────────────────────────────────────────────────────────────────
// Compiled predicates
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    One,
    OneOrMore,
    ZeroOrMore,
    Optional,
}

impl Quantifier {
    fn parse(op: Option<&str>) -> Result<Self, PatternError> {
        match op {
            None | Some("1") => Ok(Quantifier::One),
            Some("+") => Ok(Quantifier::OneOrMore),
            Some("*") => Ok(Quantifier::ZeroOrMore),
            Some("?") => Ok(Quantifier::Optional),
            Some(other) => Err(PatternError::UnsupportedOperator(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Orth,
    Lower,
    Lemma,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    IsAlpha,
    IsDigit,
    IsPunct,
    LikeNum,
    LikeEmail,
    LikeUrl,
}

impl Flag {
    fn test(self, token: &AnnotatedToken) -> bool {
        match self {
            Flag::IsAlpha => token.is_alpha(),
            Flag::IsDigit => token.is_digit(),
            Flag::IsPunct => token.is_punct(),
            Flag::LikeNum => token.like_num(),
            Flag::LikeEmail => token.like_email(),
            Flag::LikeUrl => token.like_url(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum StringTest {
    Equals(String),
    OneOf(Vec<String>),
    NoneOf(Vec<String>),
    Matches(Regex),
}

impl StringTest {
    fn test(&self, value: &str) -> bool {
        match self {
            StringTest::Equals(s) => s == value,
            StringTest::OneOf(set) => set.iter().any(|s| s == value),
            StringTest::NoneOf(set) => !set.iter().any(|s| s == value),
            StringTest::Matches(re) => re.is_match(value),
        }
    }
}

#[derive(Debug, Clone)]
enum Check {
    Text(TextField, StringTest),
    PosIn(Vec<Pos>),
    PosNotIn(Vec<Pos>),
    PosMatches(Regex),
    Flag(Flag, bool),
}

impl Check {
    fn test(&self, token: &AnnotatedToken) -> bool {
        match self {
            Check::Text(field, test) => {
                let value = match field {
                    TextField::Orth => token.text.as_str(),
                    TextField::Lower => token.lower(),
                    TextField::Lemma => token.lemma.as_str(),
                };
                test.test(value)
            }
            Check::PosIn(tags) => tags.contains(&token.pos),
            Check::PosNotIn(tags) => !tags.contains(&token.pos),
            Check::PosMatches(re) => re.is_match(token.pos.as_str()),
            Check::Flag(flag, expected) => flag.test(token) == *expected,
        }
    }
}

/// Conjunction of checks against a single token. An empty test matches any token.
#[derive(Debug, Clone, Default)]
pub struct TokenTest {
    checks: Vec<Check>,
}

impl TokenTest {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn pos(pos: Pos) -> Self {
        Self::any().and_pos(pos)
    }

    pub fn lower(value: &str) -> Self {
        Self::any().and_text(TextField::Lower, StringTest::Equals(value.to_lowercase()))
    }

    pub fn lower_in(values: &[&str]) -> Self {
        Self::any().and_text(
            TextField::Lower,
            StringTest::OneOf(values.iter().map(|v| v.to_lowercase()).collect()),
        )
    }

    pub fn orth(value: &str) -> Self {
        Self::any().and_text(TextField::Orth, StringTest::Equals(value.to_string()))
    }

    pub fn flag(flag: Flag, expected: bool) -> Self {
        Self::any().and_flag(flag, expected)
    }

    pub fn and_pos(mut self, pos: Pos) -> Self {
        self.checks.push(Check::PosIn(vec![pos]));
        self
    }

    pub fn and_text(mut self, field: TextField, test: StringTest) -> Self {
        self.checks.push(Check::Text(field, test));
        self
    }

    pub fn and_flag(mut self, flag: Flag, expected: bool) -> Self {
        self.checks.push(Check::Flag(flag, expected));
        self
    }

    pub fn matches(&self, token: &AnnotatedToken) -> bool {
        self.checks.iter().all(|c| c.test(token))
    }

    pub fn one(self) -> PatternElement {
        PatternElement::new(self, Quantifier::One)
    }

    pub fn one_or_more(self) -> PatternElement {
        PatternElement::new(self, Quantifier::OneOrMore)
    }

    pub fn zero_or_more(self) -> PatternElement {
        PatternElement::new(self, Quantifier::ZeroOrMore)
    }

    #[cfg(test)]
    pub fn optional(self) -> PatternElement {
        PatternElement::new(self, Quantifier::Optional)
    }

    fn compile(spec: &TokenPatternSpec) -> Result<Self, PatternError> {
        let mut test = Self::any();
        let text_fields = [
            (TextField::Orth, &spec.orth),
            (TextField::Lower, &spec.lower),
            (TextField::Lemma, &spec.lemma),
        ];
        for (field, predicate) in text_fields {
            if let Some(predicate) = predicate {
                test.checks
                    .push(Check::Text(field, compile_string_test(predicate)?));
            }
        }
        if let Some(predicate) = &spec.pos {
            test.checks.push(compile_pos_check(predicate)?);
        }
        let flags = [
            (Flag::IsAlpha, spec.is_alpha),
            (Flag::IsDigit, spec.is_digit),
            (Flag::IsPunct, spec.is_punct),
            (Flag::LikeNum, spec.like_num),
            (Flag::LikeEmail, spec.like_email),
            (Flag::LikeUrl, spec.like_url),
        ];
        for (flag, expected) in flags {
            if let Some(expected) = expected {
                test.checks.push(Check::Flag(flag, expected));
            }
        }
        Ok(test)
    }
}

fn single_complex(spec: &ComplexPredicateSpec) -> Result<(), PatternError> {
    let present = [
        spec.one_of.is_some(),
        spec.none_of.is_some(),
        spec.regex.is_some(),
    ];
    if present.iter().filter(|p| **p).count() == 1 {
        Ok(())
    } else {
        Err(PatternError::AmbiguousPredicate)
    }
}

fn compile_regex(pattern: &str) -> Result<Regex, PatternError> {
    Regex::new(pattern).map_err(|source| PatternError::InvalidRegex {
        pattern: pattern.to_string(),
        source,
    })
}

fn compile_string_test(spec: &StringPredicateSpec) -> Result<StringTest, PatternError> {
    match spec {
        StringPredicateSpec::Exact(s) => Ok(StringTest::Equals(s.clone())),
        StringPredicateSpec::Complex(c) => {
            single_complex(c)?;
            if let Some(values) = &c.one_of {
                Ok(StringTest::OneOf(values.clone()))
            } else if let Some(values) = &c.none_of {
                Ok(StringTest::NoneOf(values.clone()))
            } else {
                let pattern = c.regex.as_deref().unwrap_or_default();
                Ok(StringTest::Matches(compile_regex(pattern)?))
            }
        }
    }
}

fn parse_pos_list(values: &[String]) -> Result<Vec<Pos>, PatternError> {
    values
        .iter()
        .map(|v| v.parse::<Pos>().map_err(PatternError::from))
        .collect()
}

fn compile_pos_check(spec: &StringPredicateSpec) -> Result<Check, PatternError> {
    match spec {
        StringPredicateSpec::Exact(s) => Ok(Check::PosIn(vec![s.parse::<Pos>()?])),
        StringPredicateSpec::Complex(c) => {
            single_complex(c)?;
            if let Some(values) = &c.one_of {
                Ok(Check::PosIn(parse_pos_list(values)?))
            } else if let Some(values) = &c.none_of {
                Ok(Check::PosNotIn(parse_pos_list(values)?))
            } else {
                let pattern = c.regex.as_deref().unwrap_or_default();
                Ok(Check::PosMatches(compile_regex(pattern)?))
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Patterns
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PatternElement {
    pub test: TokenTest,
    pub quantifier: Quantifier,
}

impl PatternElement {
    pub fn new(test: TokenTest, quantifier: Quantifier) -> Self {
        Self { test, quantifier }
    }
}

/// A half-open token range `[start, end)` produced by a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Match {
    pub start: usize,
    pub end: usize,
}

impl Match {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Match) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone)]
pub struct TokenPattern {
    elements: Vec<PatternElement>,
}

impl TokenPattern {
    pub fn new(elements: Vec<PatternElement>) -> Result<Self, PatternError> {
        if elements.is_empty() {
            return Err(PatternError::Empty);
        }
        Ok(Self { elements })
    }

    /// Compiles a serialized pattern. All validation happens here.
    pub fn compile(specs: &[TokenPatternSpec]) -> Result<Self, PatternError> {
        let elements = specs
            .iter()
            .map(|spec| {
                Ok(PatternElement::new(
                    TokenTest::compile(spec)?,
                    Quantifier::parse(spec.op.as_deref())?,
                ))
            })
            .collect::<Result<Vec<_>, PatternError>>()?;
        Self::new(elements)
    }

    /// End of the longest non-empty match starting at `start`, if any.
    pub fn longest_match_at(&self, tokens: &[AnnotatedToken], start: usize) -> Option<usize> {
        let mut frontier = BTreeSet::from([start]);

        for element in &self.elements {
            let mut next = BTreeSet::new();
            for &pos in &frontier {
                let accepts = |p: usize| p < tokens.len() && element.test.matches(&tokens[p]);
                match element.quantifier {
                    Quantifier::One => {
                        if accepts(pos) {
                            next.insert(pos + 1);
                        }
                    }
                    Quantifier::Optional => {
                        next.insert(pos);
                        if accepts(pos) {
                            next.insert(pos + 1);
                        }
                    }
                    Quantifier::OneOrMore | Quantifier::ZeroOrMore => {
                        if element.quantifier == Quantifier::ZeroOrMore {
                            next.insert(pos);
                        }
                        let mut p = pos;
                        while accepts(p) {
                            p += 1;
                            next.insert(p);
                        }
                    }
                }
            }
            if next.is_empty() {
                return None;
            }
            frontier = next;
        }

        frontier.into_iter().next_back().filter(|&end| end > start)
    }
}

/// Scans left to right taking, at each position, the longest match among
/// `patterns`. A match consumes its tokens; no match advances one token.
/// The result is ordered and non-overlapping.
pub fn find_greedy(patterns: &[TokenPattern], tokens: &[AnnotatedToken]) -> Vec<Match> {
    let mut matches = Vec::new();
    let mut start = 0;
    while start < tokens.len() {
        let best = patterns
            .iter()
            .filter_map(|p| p.longest_match_at(tokens, start))
            .max();
        match best {
            Some(end) => {
                matches.push(Match { start, end });
                start = end;
            }
            None => start += 1,
        }
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(spec: &[(&str, Pos)]) -> Vec<AnnotatedToken> {
        let mut offset = 0;
        spec.iter()
            .map(|(text, pos)| {
                let token = AnnotatedToken::new(*text, *pos, text.to_lowercase(), offset);
                offset += text.len() + 1;
                token
            })
            .collect()
    }

    fn propn_at_propn() -> TokenPattern {
        TokenPattern::new(vec![
            TokenTest::pos(Pos::Propn).one_or_more(),
            TokenTest::lower("at").one(),
            TokenTest::pos(Pos::Propn).one_or_more(),
        ])
        .unwrap()
    }

    #[test]
    fn test_plus_is_greedy() {
        let toks = tokens(&[
            ("Jane", Pos::Propn),
            ("Doe", Pos::Propn),
            ("at", Pos::Adp),
            ("Acme", Pos::Propn),
            ("Corp", Pos::Propn),
        ]);
        assert_eq!(propn_at_propn().longest_match_at(&toks, 0), Some(5));
        assert_eq!(propn_at_propn().longest_match_at(&toks, 1), Some(5));
        assert_eq!(propn_at_propn().longest_match_at(&toks, 2), None);
    }

    #[test]
    fn test_backtracks_when_plus_overconsumes() {
        // NOUN+ NOUN: the plus must give back the last token.
        let pattern = TokenPattern::new(vec![
            TokenTest::pos(Pos::Noun).one_or_more(),
            TokenTest::pos(Pos::Noun).one(),
        ])
        .unwrap();
        let toks = tokens(&[("data", Pos::Noun), ("platform", Pos::Noun), ("team", Pos::Noun)]);
        assert_eq!(pattern.longest_match_at(&toks, 0), Some(3));
    }

    #[test]
    fn test_star_allows_zero_tokens_but_match_is_non_empty() {
        let pattern = TokenPattern::new(vec![
            TokenTest::lower("certified").one(),
            TokenTest::flag(Flag::IsAlpha, true).zero_or_more(),
        ])
        .unwrap();
        let toks = tokens(&[("Certified", Pos::Adj), ("2020", Pos::Num)]);
        assert_eq!(pattern.longest_match_at(&toks, 0), Some(1));

        let only_star =
            TokenPattern::new(vec![TokenTest::flag(Flag::IsAlpha, true).zero_or_more()]).unwrap();
        assert_eq!(only_star.longest_match_at(&toks, 1), None);
    }

    #[test]
    fn test_optional() {
        let pattern = TokenPattern::new(vec![
            TokenTest::lower("senior").optional(),
            TokenTest::lower("engineer").one(),
        ])
        .unwrap();
        let toks = tokens(&[("Senior", Pos::Adj), ("Engineer", Pos::Noun)]);
        assert_eq!(pattern.longest_match_at(&toks, 0), Some(2));
        assert_eq!(pattern.longest_match_at(&toks, 1), Some(2));
    }

    #[test]
    fn test_find_greedy_consumes_matched_tokens() {
        let toks = tokens(&[
            ("Jane", Pos::Propn),
            ("Doe", Pos::Propn),
            ("at", Pos::Adp),
            ("Acme", Pos::Propn),
            ("and", Pos::Cconj),
            ("Bob", Pos::Propn),
            ("at", Pos::Adp),
            ("Initech", Pos::Propn),
        ]);
        let found = find_greedy(&[propn_at_propn()], &toks);
        assert_eq!(
            found,
            vec![Match { start: 0, end: 4 }, Match { start: 5, end: 8 }]
        );
    }

    #[test]
    fn test_find_greedy_empty_tokens() {
        assert!(find_greedy(&[propn_at_propn()], &[]).is_empty());
    }

    #[test]
    fn test_compile_from_spec() {
        let specs: Vec<TokenPatternSpec> = serde_json::from_str(
            r#"[{"LOWER": {"IN": ["machine", "deep"]}}, {"LEMMA": "learning"}, {"POS": {"NOT_IN": ["PUNCT"]}, "OP": "?"}]"#,
        )
        .unwrap();
        let pattern = TokenPattern::compile(&specs).unwrap();
        let toks = tokens(&[("Deep", Pos::Adj), ("Learning", Pos::Noun), (".", Pos::Punct)]);
        assert_eq!(pattern.longest_match_at(&toks, 0), Some(2));
    }

    #[test]
    fn test_compile_rejects_bad_specs() {
        let bad_op: Vec<TokenPatternSpec> =
            serde_json::from_str(r#"[{"LOWER": "a", "OP": "!"}]"#).unwrap();
        assert!(matches!(
            TokenPattern::compile(&bad_op),
            Err(PatternError::UnsupportedOperator(_))
        ));

        let bad_pos: Vec<TokenPatternSpec> = serde_json::from_str(r#"[{"POS": "NOUNISH"}]"#).unwrap();
        assert!(matches!(
            TokenPattern::compile(&bad_pos),
            Err(PatternError::UnknownPos(_))
        ));

        let bad_regex: Vec<TokenPatternSpec> =
            serde_json::from_str(r#"[{"ORTH": {"REGEX": "("}}]"#).unwrap();
        assert!(matches!(
            TokenPattern::compile(&bad_regex),
            Err(PatternError::InvalidRegex { .. })
        ));

        assert!(matches!(TokenPattern::compile(&[]), Err(PatternError::Empty)));
    }
}
