//! Rule-based word tokenizer.
//!
//! Emails and URLs stay whole, hyphenated and dotted words (`full-stack`,
//! `Node.js`) stay whole, `C++`/`C#` keep their suffix, everything else that is
//! not whitespace becomes a single-character token. Whitespace runs that
//! contain a line break become their own token (tagged SPACE), so patterns do
//! not run across lines.

use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"[ \t\r]*\n\s*",
        r"|[A-Za-z0-9!#$%&'*+/=?^_`{|}~.-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)+",
        r"|(?:https?://|www\.)[^\s<>()]+[^\s<>().,;:]",
        r"|\d+(?:[.,:/-]\d+)*%?",
        r"|\p{L}[\p{L}\p{M}\p{N}]*(?:['’.-][\p{L}\p{M}\p{N}]+)*(?:\+\+|#)?",
        r"|\S",
    ))
    .expect("token regex is valid")
});

/// A token found in the source text. `start` is a byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece<'a> {
    pub text: &'a str,
    pub start: usize,
}

pub fn tokenize(text: &str) -> Vec<Piece<'_>> {
    TOKEN_PATTERN
        .find_iter(text)
        .map(|m| Piece {
            text: m.as_str(),
            start: m.start(),
        })
        .collect()
}

impl Piece<'_> {
    pub fn is_line_break(&self) -> bool {
        self.text.contains('\n')
    }
}
