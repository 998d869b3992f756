//! In-process heuristic annotator.
//!
//! Deterministic stand-in for a statistical model, tuned for resume text:
//! - closed-class words come from fixed lexicons (ADP, DET, PRON, AUX, ...)
//! - capitalized words are PROPN unless they open a line/sentence as a known verb
//!   (resume bullets start with "Managed", "Led", "Built", ...)
//! - lowercase words are VERB/ADV/ADJ by lexicon or suffix, NOUN otherwise
//! - PERSON comes from the resume header line or a "Name:" field

use async_trait::async_trait;

use crate::nlp::tokenizer::{tokenize, Piece};
use crate::nlp::{
    AnnotatedDoc, AnnotatedToken, Annotator, AnnotatorError, Pos, LABEL_PERSON,
};

const ADPOSITIONS: &[&str] = &[
    "at", "in", "on", "for", "with", "of", "from", "to", "by", "into", "during", "under", "over",
    "via", "within", "across", "through", "about", "as", "per", "without", "between", "among",
    "after", "before", "since", "until", "throughout", "towards", "toward", "upon", "against",
    "alongside",
];

const DETERMINERS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "each", "every", "all", "both", "any",
    "some", "no", "another",
];

const PRONOUNS: &[&str] = &[
    "i", "me", "my", "mine", "we", "us", "our", "ours", "you", "your", "he", "him", "his", "she",
    "her", "they", "them", "their", "it", "its", "who", "whom", "which", "what", "myself",
    "ourselves",
];

const AUXILIARIES: &[&str] = &[
    "is", "am", "are", "was", "were", "be", "been", "being", "has", "have", "had", "do", "does",
    "did", "will", "would", "can", "could", "should", "may", "might", "must", "shall",
];

const COORDINATORS: &[&str] = &["and", "or", "but", "nor", "&"];

const SUBORDINATORS: &[&str] = &[
    "while", "because", "although", "though", "if", "whether", "when", "where", "whereas",
    "unless",
];

const PARTICLES: &[&str] = &["not", "n't", "'s"];

const ADVERBS: &[&str] = &[
    "also", "very", "currently", "then", "there", "here", "well", "now", "still", "often",
    "always", "never", "again", "together", "abroad", "remotely",
];

/// Base forms of verbs common in resume bullets. Inflected forms are resolved
/// against this list by `verb_lemma`.
const VERB_BASES: &[&str] = &[
    "achieve", "administer", "analyze", "architect", "assist", "automate", "build", "coach",
    "collaborate", "conduct", "configure", "contribute", "coordinate", "create", "debug",
    "define", "deliver", "deploy", "design", "develop", "direct", "drive", "earn",
    "establish", "execute", "facilitate", "found", "gain", "grow", "guide", "help", "hire",
    "implement", "improve", "increase", "integrate", "launch", "lead", "learn",
    "maintain", "manage", "mentor", "migrate", "monitor", "optimize", "organize", "oversee",
    "own", "partner", "plan", "present", "produce", "publish", "reduce", "refactor",
    "research", "review", "run", "scale", "serve", "ship", "spearhead", "streamline", "study",
    "supervise", "support", "teach", "test", "train", "use", "volunteer", "work", "write",
];

/// Irregular past forms that cannot be derived by suffix stripping.
const IRREGULAR_VERBS: &[(&str, &str)] = &[
    ("led", "lead"),
    ("built", "build"),
    ("ran", "run"),
    ("grew", "grow"),
    ("taught", "teach"),
    ("wrote", "write"),
    ("drove", "drive"),
    ("oversaw", "oversee"),
    ("began", "begin"),
    ("won", "win"),
    ("made", "make"),
    ("held", "hold"),
];

const ADJECTIVE_SUFFIXES: &[&str] = &["ive", "ous", "ful", "able", "ible", "ical", "less"];

/// Pure-Rust annotator. No external calls, fully deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicAnnotator;

#[async_trait]
impl Annotator for HeuristicAnnotator {
    fn backend(&self) -> &'static str {
        "heuristic"
    }

    async fn annotate(&self, text: &str) -> Result<AnnotatedDoc, AnnotatorError> {
        Ok(annotate_text(text))
    }
}

/// Synchronous core of `HeuristicAnnotator`.
pub fn annotate_text(text: &str) -> AnnotatedDoc {
    let pieces = tokenize(text);
    let tokens = pieces
        .iter()
        .enumerate()
        .map(|(i, piece)| {
            let opens_clause = i == 0 || opens_clause(&pieces[i - 1]);
            let (pos, lemma) = tag_piece(piece.text, opens_clause);
            AnnotatedToken::new(piece.text, pos, lemma, piece.start)
        })
        .collect();

    let mut doc = AnnotatedDoc {
        text: text.to_string(),
        tokens,
        entities: Vec::new(),
    };
    recognize_persons(&mut doc);
    doc
}

fn opens_clause(prev: &Piece<'_>) -> bool {
    prev.is_line_break()
        || matches!(prev.text, "." | "!" | "?" | ";" | ":" | "•" | "▪" | "●" | "-" | "–" | "—")
}

fn tag_piece(text: &str, opens_clause: bool) -> (Pos, String) {
    let lower = text.to_lowercase();

    if text.chars().all(char::is_whitespace) {
        return (Pos::Space, lower);
    }
    if text.contains('@') && text.contains('.') {
        return (Pos::X, lower);
    }
    if text.chars().all(crate::nlp::is_punct_char) {
        return (Pos::Punct, lower);
    }
    if text.chars().all(|c| !c.is_alphanumeric()) {
        return (Pos::Sym, lower);
    }
    if text.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return (Pos::Num, lower);
    }

    if let Some(pos) = closed_class(&lower) {
        return (pos, lower);
    }

    let capitalized = text.chars().next().is_some_and(char::is_uppercase);
    if capitalized {
        if opens_clause {
            if let Some(lemma) = verb_lemma(&lower) {
                return (Pos::Verb, lemma);
            }
        }
        return (Pos::Propn, lower);
    }

    // Bare lowercase bases ("research", "support") and -s forms read as nouns
    // mid-sentence; only past and progressive inflections count as verbs.
    if let Some(lemma) = verb_lemma(&lower) {
        if lemma != lower && !lower.ends_with('s') {
            return (Pos::Verb, lemma);
        }
    }
    if lower.len() > 4 && lower.ends_with("ly") {
        return (Pos::Adv, lower);
    }
    if lower.len() > 5 && ADJECTIVE_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        return (Pos::Adj, lower);
    }
    (Pos::Noun, noun_lemma(&lower))
}

fn closed_class(lower: &str) -> Option<Pos> {
    let lexicons: [(&[&str], Pos); 9] = [
        (ADPOSITIONS, Pos::Adp),
        (DETERMINERS, Pos::Det),
        (PRONOUNS, Pos::Pron),
        (AUXILIARIES, Pos::Aux),
        (COORDINATORS, Pos::Cconj),
        (SUBORDINATORS, Pos::Sconj),
        (PARTICLES, Pos::Part),
        (ADVERBS, Pos::Adv),
        (&["yes", "hello", "thanks"], Pos::Intj),
    ];
    lexicons
        .iter()
        .find(|(words, _)| words.contains(&lower))
        .map(|(_, pos)| *pos)
}

/// Resolves a lowercase word to a verb base form when it is a known verb
/// or an inflection of one.
pub fn verb_lemma(lower: &str) -> Option<String> {
    if VERB_BASES.contains(&lower) {
        return Some(lower.to_string());
    }
    if let Some((_, base)) = IRREGULAR_VERBS.iter().find(|(form, _)| *form == lower) {
        return Some(base.to_string());
    }

    let candidates = inflection_candidates(lower);
    candidates
        .into_iter()
        .find(|c| VERB_BASES.contains(&c.as_str()))
}

fn inflection_candidates(lower: &str) -> Vec<String> {
    let mut out = Vec::new();
    for suffix in ["ied", "ies"] {
        if let Some(stem) = lower.strip_suffix(suffix) {
            out.push(format!("{stem}y"));
        }
    }
    for suffix in ["ed", "ing", "es", "s"] {
        if let Some(stem) = lower.strip_suffix(suffix) {
            if stem.is_empty() {
                continue;
            }
            out.push(stem.to_string());
            out.push(format!("{stem}e"));
            // planned -> plan, running -> run
            let mut tail = stem.chars().rev();
            if let (Some(last), Some(before)) = (tail.next(), tail.next()) {
                if last == before {
                    out.push(stem[..stem.len() - last.len_utf8()].to_string());
                }
            }
        }
    }
    out
}

fn noun_lemma(lower: &str) -> String {
    if let Some(stem) = lower.strip_suffix("ies") {
        if stem.len() >= 2 {
            return format!("{stem}y");
        }
    }
    if lower.len() > 3
        && lower.ends_with('s')
        && !lower.ends_with("ss")
        && !lower.ends_with("us")
        && !lower.ends_with("is")
    {
        return lower[..lower.len() - 1].to_string();
    }
    lower.to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Person recognition
// ────────────────────────────────────────────────────────────────────────────

const MAX_NAME_TOKENS: usize = 4;

fn recognize_persons(doc: &mut AnnotatedDoc) {
    let mut spans = Vec::new();

    // Resumes open with the candidate's name on its own line.
    if let Some((start, end)) = first_line(doc) {
        if looks_like_name(&doc.tokens[start..end]) {
            spans.push((start, end));
        }
    }

    // "Name: Jane Doe"
    for i in 0..doc.tokens.len() {
        if doc.tokens[i].lower() != "name" {
            continue;
        }
        let Some(colon) = doc.tokens.get(i + 1) else {
            continue;
        };
        if colon.text != ":" {
            continue;
        }
        let start = i + 2;
        let mut end = start;
        while end < doc.tokens.len()
            && end - start < MAX_NAME_TOKENS
            && is_name_word(&doc.tokens[end])
        {
            end += 1;
        }
        if end - start >= 2 && !spans.iter().any(|&(s, e)| s < end && start < e) {
            spans.push((start, end));
        }
    }

    for (start, end) in spans {
        for token in &mut doc.tokens[start..end] {
            token.pos = Pos::Propn;
        }
        let span = doc.entity(LABEL_PERSON, start, end);
        doc.entities.push(span);
    }
    doc.entities.sort_by_key(|e| e.start);
}

/// Token range of the first line that has any non-space tokens.
fn first_line(doc: &AnnotatedDoc) -> Option<(usize, usize)> {
    let start = doc.tokens.iter().position(|t| t.pos != Pos::Space)?;
    let end = doc.tokens[start..]
        .iter()
        .position(|t| t.pos == Pos::Space)
        .map_or(doc.tokens.len(), |offset| start + offset);
    Some((start, end))
}

fn looks_like_name(tokens: &[AnnotatedToken]) -> bool {
    (2..=MAX_NAME_TOKENS).contains(&tokens.len()) && tokens.iter().all(is_name_word)
}

fn is_name_word(token: &AnnotatedToken) -> bool {
    let mut chars = token.text.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let rest: Vec<char> = chars.collect();
    first.is_uppercase()
        && token
            .text
            .chars()
            .all(|c| c.is_alphabetic() || c == '-' || c == '\'' || c == '’' || c == '.')
        && (rest.iter().all(|c| !c.is_uppercase()) || rest.iter().all(|c| !c.is_lowercase()))
        && closed_class(token.lower()).is_none()
        && verb_lemma(token.lower()).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(text: &str) -> Vec<(String, Pos)> {
        annotate_text(text)
            .tokens
            .into_iter()
            .map(|t| (t.text, t.pos))
            .collect()
    }

    fn pos_of(text: &str, word: &str) -> Pos {
        tags(text)
            .into_iter()
            .find(|(t, _)| t == word)
            .map(|(_, p)| p)
            .unwrap()
    }

    #[test]
    fn test_capitalized_words_are_proper_nouns() {
        let text = "Software engineer at Acme Corp";
        assert_eq!(pos_of(text, "Acme"), Pos::Propn);
        assert_eq!(pos_of(text, "Corp"), Pos::Propn);
        assert_eq!(pos_of(text, "at"), Pos::Adp);
        assert_eq!(pos_of(text, "engineer"), Pos::Noun);
    }

    #[test]
    fn test_bullet_opening_verb_is_tagged_verb() {
        let text = "• Managed engineers at Globex";
        assert_eq!(pos_of(text, "Managed"), Pos::Verb);
        assert_eq!(pos_of(text, "engineers"), Pos::Noun);
    }

    #[test]
    fn test_verb_lemma_handles_inflections() {
        assert_eq!(verb_lemma("managed").as_deref(), Some("manage"));
        assert_eq!(verb_lemma("worked").as_deref(), Some("work"));
        assert_eq!(verb_lemma("planned").as_deref(), Some("plan"));
        assert_eq!(verb_lemma("developing").as_deref(), Some("develop"));
        assert_eq!(verb_lemma("led").as_deref(), Some("lead"));
        assert_eq!(verb_lemma("studied").as_deref(), Some("study"));
        assert_eq!(verb_lemma("engineers"), None);
        assert_eq!(verb_lemma("team"), None);
    }

    #[test]
    fn test_inflections_of_multibyte_stems() {
        // U+4E79 encodes as E4 B9 B9: the last two bytes repeat
        assert_eq!(verb_lemma("\u{4E79}s"), None);
        assert_eq!(verb_lemma("\u{4E79}ed"), None);
        assert!(inflection_candidates("\u{4E79}\u{4E79}ing").contains(&"\u{4E79}".to_string()));
        assert!(!inflection_candidates("\u{4E79}ing").contains(&String::new()));

        let doc = annotate_text("Skills: \u{4E79}s and \u{4E79}ed");
        assert_eq!(pos_of("Skills: \u{4E79}s and \u{4E79}ed", "\u{4E79}s"), Pos::Noun);
        assert_eq!(doc.tokens.len(), 5);
    }

    #[test]
    fn test_lowercase_base_verb_reads_as_noun() {
        let text = "led research at Initech";
        assert_eq!(pos_of(text, "led"), Pos::Verb);
        assert_eq!(pos_of(text, "research"), Pos::Noun);
    }

    #[test]
    fn test_numbers_punct_and_emails() {
        let text = "Since 2019, reach me: jane@example.com";
        assert_eq!(pos_of(text, "2019"), Pos::Num);
        assert_eq!(pos_of(text, ","), Pos::Punct);
        assert_eq!(pos_of(text, "jane@example.com"), Pos::X);
    }

    #[test]
    fn test_header_line_is_person() {
        let doc = annotate_text("Jane Doe\nSoftware Engineer\njane@example.com");
        let persons: Vec<_> = doc.entities_labelled(LABEL_PERSON).collect();
        assert_eq!(persons.len(), 1);
        assert_eq!(persons[0].text, "Jane Doe");
    }

    #[test]
    fn test_header_line_with_other_words_is_not_person() {
        let doc = annotate_text("Curriculum vitae of the candidate\nJane Doe");
        assert_eq!(doc.entities_labelled(LABEL_PERSON).count(), 0);
    }

    #[test]
    fn test_name_field_is_person() {
        let doc = annotate_text("RESUME\nName: John Smith\nPhone: 555");
        let persons: Vec<_> = doc
            .entities_labelled(LABEL_PERSON)
            .map(|e| e.text.clone())
            .collect();
        assert_eq!(persons, vec!["John Smith".to_string()]);
    }

    #[test]
    fn test_line_breaks_are_space_tokens() {
        let doc = annotate_text("Acme Corp\nSkills");
        assert_eq!(doc.tokens[2].pos, Pos::Space);
        assert_eq!(doc.tokens[2].text, "\n");
    }

    #[test]
    fn test_leading_blank_lines_before_name() {
        let doc = annotate_text("\n\n  Jane Doe\nEngineer");
        let persons: Vec<_> = doc
            .entities_labelled(LABEL_PERSON)
            .map(|e| e.text.clone())
            .collect();
        assert_eq!(persons, vec!["Jane Doe".to_string()]);
    }

    #[test]
    fn test_empty_text() {
        let doc = annotate_text("");
        assert!(doc.tokens.is_empty());
        assert!(doc.entities.is_empty());
    }

    #[tokio::test]
    async fn test_annotator_trait_delegates() {
        let doc = HeuristicAnnotator.annotate("Jane Doe").await.unwrap();
        assert_eq!(doc.tokens.len(), 2);
        assert_eq!(HeuristicAnnotator.backend(), "heuristic");
    }
}
