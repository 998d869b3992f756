//! Pattern extractor: rule matches plus pipeline entity passthrough.
//!
//! Pure function of the annotated document: no I/O, no per-call state, never
//! fails. Each rule category is scanned independently over the full token
//! sequence, so a token may appear in matches of different categories but in
//! at most one match per category.

use crate::extraction::models::{Category, ExtractionResult};
use crate::extraction::rules::{default_rules, CategoryRule};
use crate::matcher::{find_greedy, PatternError};
use crate::nlp::AnnotatedDoc;

pub struct PatternExtractor {
    rules: Vec<CategoryRule>,
}

impl PatternExtractor {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self { rules }
    }

    pub fn with_default_rules() -> Result<Self, PatternError> {
        Ok(Self::new(default_rules()?))
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    pub fn extract(&self, doc: &AnnotatedDoc) -> ExtractionResult {
        let mut result = ExtractionResult::new();

        for entity in &doc.entities {
            if let Some(category) = Category::for_entity_label(&entity.label) {
                result.insert(category, entity.text.as_str());
            }
        }

        for rule in &self.rules {
            for found in find_greedy(&rule.patterns, &doc.tokens) {
                result.insert(rule.category, doc.span_text(found.start, found.end));
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::{AnnotatedToken, EntitySpan, Pos};

    /// Builds a document whose tokens are separated by single spaces.
    fn doc(spec: &[(&str, Pos)]) -> AnnotatedDoc {
        let mut text = String::new();
        let mut tokens = Vec::new();
        for (word, pos) in spec {
            if !text.is_empty() {
                text.push(' ');
            }
            tokens.push(AnnotatedToken::new(*word, *pos, word.to_lowercase(), text.len()));
            text.push_str(word);
        }
        AnnotatedDoc {
            text,
            tokens,
            entities: Vec::new(),
        }
    }

    fn extractor() -> PatternExtractor {
        PatternExtractor::with_default_rules().unwrap()
    }

    #[test]
    fn test_empty_document_yields_five_empty_sets() {
        let result = extractor().extract(&AnnotatedDoc::default());
        for category in Category::ALL {
            assert!(result.get(category).is_empty());
        }
        assert_eq!(result.iter().count(), 5);
    }

    #[test]
    fn test_proper_noun_at_proper_noun() {
        let d = doc(&[("Jane", Pos::Propn), ("at", Pos::Adp), ("Acme", Pos::Propn)]);
        let result = extractor().extract(&d);
        assert!(result.contains(Category::WorkExperience, "Jane at Acme"));
    }

    #[test]
    fn test_at_is_case_insensitive() {
        let d = doc(&[("Engineer", Pos::Propn), ("AT", Pos::Adp), ("Acme", Pos::Propn)]);
        let result = extractor().extract(&d);
        assert!(result.contains(Category::WorkExperience, "Engineer AT Acme"));
    }

    #[test]
    fn test_noun_preposition_proper_noun() {
        let d = doc(&[
            ("internship", Pos::Noun),
            ("with", Pos::Adp),
            ("Globex", Pos::Propn),
            ("Corporation", Pos::Propn),
        ]);
        let result = extractor().extract(&d);
        assert_eq!(
            result.get(Category::WorkExperience).iter().collect::<Vec<_>>(),
            vec!["internship with Globex Corporation"]
        );
    }

    #[test]
    fn test_verb_nouns_at_proper_noun() {
        let d = doc(&[
            ("Managed", Pos::Verb),
            ("data", Pos::Noun),
            ("engineers", Pos::Noun),
            ("at", Pos::Adp),
            ("Initech", Pos::Propn),
        ]);
        let result = extractor().extract(&d);
        assert!(result.contains(Category::WorkExperience, "Managed data engineers at Initech"));
        // The longer verb-led match consumes the run; no shorter duplicate from the noun rule.
        assert_eq!(result.get(Category::WorkExperience).len(), 1);
    }

    #[test]
    fn test_contact_info_email() {
        let d = doc(&[
            ("Email", Pos::Propn),
            (":", Pos::Punct),
            ("jane.doe@example.com", Pos::X),
        ]);
        let result = extractor().extract(&d);
        assert!(result.contains(Category::ContactInfo, "jane.doe@example.com"));
        assert_eq!(result.get(Category::ContactInfo).len(), 1);
    }

    #[test]
    fn test_certification_with_trailing_words() {
        let d = doc(&[
            ("Certified", Pos::Adj),
            ("Network", Pos::Propn),
            ("Engineer", Pos::Propn),
        ]);
        let result = extractor().extract(&d);
        assert!(result.contains(Category::Certification, "Certified Network Engineer"));
    }

    #[test]
    fn test_bare_certification_term_matches() {
        let d = doc(&[("certificate", Pos::Noun), ("2021", Pos::Num)]);
        let result = extractor().extract(&d);
        assert!(result.contains(Category::Certification, "certificate"));
    }

    #[test]
    fn test_overlapping_categories_are_both_kept() {
        let d = doc(&[
            ("Certified", Pos::Propn),
            ("Kubernetes", Pos::Propn),
            ("Administrator", Pos::Propn),
            ("at", Pos::Adp),
            ("Acme", Pos::Propn),
        ]);
        let result = extractor().extract(&d);
        assert!(result.contains(
            Category::WorkExperience,
            "Certified Kubernetes Administrator at Acme"
        ));
        assert!(result.contains(
            Category::Certification,
            "Certified Kubernetes Administrator at Acme"
        ));
    }

    #[test]
    fn test_person_and_skill_passthrough_deduplicates() {
        let mut d = doc(&[
            ("Jane", Pos::Propn),
            ("Doe", Pos::Propn),
            ("Jane", Pos::Propn),
            ("Doe", Pos::Propn),
            ("Rust", Pos::Propn),
        ]);
        d.entities = vec![
            d.entity("PERSON", 0, 2),
            d.entity("PERSON", 2, 4),
            d.entity("SKILL", 4, 5),
            EntitySpan {
                label: "ORG".to_string(),
                start: 4,
                end: 5,
                text: "Rust".to_string(),
            },
        ];
        let result = extractor().extract(&d);
        assert_eq!(
            result.get(Category::PersonName).iter().collect::<Vec<_>>(),
            vec!["Jane Doe"]
        );
        assert!(result.contains(Category::Skill, "Rust"));
        assert_eq!(result.total(), 2);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let d = doc(&[
            ("Jane", Pos::Propn),
            ("at", Pos::Adp),
            ("Acme", Pos::Propn),
            ("jane@acme.io", Pos::X),
            ("certification", Pos::Noun),
        ]);
        let ex = extractor();
        assert_eq!(ex.extract(&d), ex.extract(&d));
    }
}
