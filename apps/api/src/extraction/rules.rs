//! Built-in token-pattern rules, one group per matched category.

use crate::extraction::models::Category;
use crate::matcher::{Flag, PatternError, TokenPattern, TokenTest};
use crate::nlp::Pos;

pub const CERTIFICATION_TERMS: &[&str] = &["certified", "certificate", "certification"];

/// Alternative patterns scanned together for one category.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub category: Category,
    pub patterns: Vec<TokenPattern>,
}

/// Work experience, contact info and certification rules.
pub fn default_rules() -> Result<Vec<CategoryRule>, PatternError> {
    Ok(vec![
        CategoryRule {
            category: Category::WorkExperience,
            patterns: work_experience_patterns()?,
        },
        CategoryRule {
            category: Category::ContactInfo,
            patterns: vec![TokenPattern::new(vec![
                TokenTest::flag(Flag::LikeEmail, true).one()
            ])?],
        },
        CategoryRule {
            category: Category::Certification,
            // Zero trailing words is allowed, so a bare "Certified" matches.
            patterns: vec![TokenPattern::new(vec![
                TokenTest::lower_in(CERTIFICATION_TERMS).one(),
                TokenTest::flag(Flag::IsAlpha, true).zero_or_more(),
            ])?],
        },
    ])
}

fn work_experience_patterns() -> Result<Vec<TokenPattern>, PatternError> {
    Ok(vec![
        // Jane Doe at Acme Corp
        TokenPattern::new(vec![
            TokenTest::pos(Pos::Propn).one_or_more(),
            TokenTest::lower("at").one(),
            TokenTest::pos(Pos::Propn).one_or_more(),
        ])?,
        // engineer with Globex
        TokenPattern::new(vec![
            TokenTest::pos(Pos::Noun).one_or_more(),
            TokenTest::pos(Pos::Adp).one(),
            TokenTest::pos(Pos::Propn).one_or_more(),
        ])?,
        // managed engineers at Initech
        TokenPattern::new(vec![
            TokenTest::pos(Pos::Verb).one(),
            TokenTest::pos(Pos::Noun).one_or_more(),
            TokenTest::lower("at").one(),
            TokenTest::pos(Pos::Propn).one_or_more(),
        ])?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_matched_category_has_rules() {
        let rules = default_rules().unwrap();
        let categories: Vec<_> = rules.iter().map(|r| r.category).collect();
        assert_eq!(
            categories,
            vec![
                Category::WorkExperience,
                Category::ContactInfo,
                Category::Certification
            ]
        );
        assert_eq!(rules[0].patterns.len(), 3);
        assert!(rules.iter().all(|r| !r.patterns.is_empty()));
    }
}
