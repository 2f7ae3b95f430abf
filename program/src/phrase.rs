//! Phrase scripts.
//!
//! A script is parsed under one of two grammars:
//!
//! - **Structured**: one `text;pause` pair per line. The pause is seconds
//!   of silence after the spoken text, written as `[0-9]+(\.[0-9]+)?`
//!   (`10`, `0.5`, `1.25`; not `.5`, `5.` or `1e3`) and at most
//!   [`MAX_PAUSE_SECS`]. The text must contain a letter or digit. Lines
//!   that do not have this shape are skipped and counted. A text of
//!   exactly `*` is a pure-silence directive.
//! - **Book**: free text cut into sentences by a [`SentenceSegmenter`];
//!   every sentence gets the pause configured in [`BookOptions`].
//!
//! Before matching, structured scripts are sanitized down to letters,
//! digits, whitespace, `*`, `;` and `.`, so stray punctuation cannot
//! corrupt the split.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::segment::{PunctuationSegmenter, SentenceSegmenter};

/// Separates spoken text from the pause value in structured scripts.
pub const SEPARATOR: char = ';';

/// Text of a unit that produces silence instead of speech.
pub const SILENCE_MARKER: &str = "*";

/// Longest pause a unit may carry, in seconds.
pub const MAX_PAUSE_SECS: f64 = 3600.0;

static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([^;]+?)\s*;\s*([0-9]+(?:\.[0-9]+)?)\s*$").expect("static regex")
});

/// Script grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// One `text;pause` per line.
    #[default]
    Structured,
    /// Free text split into sentences.
    Book,
}

/// What a unit renders to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Speech,
    Silence,
}

/// One speakable item, or a pure-silence directive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unit {
    /// Position in the script, starting at 0.
    pub index: usize,
    pub kind: UnitKind,
    /// Trimmed, non-empty text. [`SILENCE_MARKER`] for silence units.
    pub text: String,
    /// Seconds of silence after the unit. Never negative.
    pub pause: f64,
}

impl Unit {
    /// Returns true for a pure-silence directive.
    pub fn is_silence(&self) -> bool {
        self.kind == UnitKind::Silence
    }

    /// Returns the pause as a duration, or `None` if it is negative,
    /// not finite or longer than [`MAX_PAUSE_SECS`].
    pub fn pause_duration(&self) -> Option<Duration> {
        pause_duration(self.pause)
    }
}

/// Result of parsing a script.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseOutcome {
    pub units: Vec<Unit>,
    /// Non-blank structured lines that were dropped.
    pub skipped_lines: usize,
}

/// Error type for parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("script is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("invalid book options: {0}")]
    Options(String),
}

/// Pauses used in book mode.
#[derive(Debug, Clone, PartialEq)]
pub struct BookOptions {
    /// Pause after a sentence whose terminator has no entry in `punctuation`.
    pub default_pause: f64,
    /// Pause after a sentence, keyed by the punctuation that ended it.
    pub punctuation: BTreeMap<char, f64>,
}

impl Default for BookOptions {
    fn default() -> Self {
        Self {
            default_pause: 1.0,
            punctuation: BTreeMap::new(),
        }
    }
}

impl BookOptions {
    /// Short pauses on every punctuation mark: `!?:;,.()` each pause 0.1 s.
    pub fn punctuated() -> Self {
        Self {
            default_pause: 1.0,
            punctuation: "!?:;,.()".chars().map(|c| (c, 0.1)).collect(),
        }
    }

    fn pause_after(&self, terminator: Option<char>) -> f64 {
        terminator
            .and_then(|c| self.punctuation.get(&c).copied())
            .unwrap_or(self.default_pause)
    }

    fn validate(&self) -> Result<(), ParseError> {
        let valid = |p: f64| pause_duration(p).is_some();
        if !valid(self.default_pause) {
            return Err(ParseError::Options(format!(
                "default pause {} must be between 0 and {} seconds",
                self.default_pause, MAX_PAUSE_SECS
            )));
        }
        if let Some((c, p)) = self.punctuation.iter().find(|&(_, &p)| !valid(p)) {
            return Err(ParseError::Options(format!(
                "pause {} after {:?} must be between 0 and {} seconds",
                p, c, MAX_PAUSE_SECS
            )));
        }
        Ok(())
    }
}

/// Script parser with pluggable book-mode segmentation.
#[derive(Clone)]
pub struct Parser {
    book: BookOptions,
    segmenter: Arc<dyn SentenceSegmenter>,
}

impl Default for Parser {
    fn default() -> Self {
        Self {
            book: BookOptions::default(),
            segmenter: Arc::new(PunctuationSegmenter::default()),
        }
    }
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the book-mode pauses.
    pub fn book_options(mut self, options: BookOptions) -> Self {
        self.book = options;
        self
    }

    /// Replaces the book-mode sentence segmenter.
    pub fn segmenter(mut self, segmenter: Arc<dyn SentenceSegmenter>) -> Self {
        self.segmenter = segmenter;
        self
    }

    /// Parses `text` under `mode`.
    pub fn parse(&self, text: &str, mode: Mode) -> Result<ParseOutcome, ParseError> {
        let outcome = match mode {
            Mode::Structured => parse_structured(text),
            Mode::Book => self.parse_book(text)?,
        };
        debug!(
            ?mode,
            units = outcome.units.len(),
            skipped = outcome.skipped_lines,
            "parsed script"
        );
        Ok(outcome)
    }

    /// Parses raw script bytes, which must be UTF-8.
    pub fn parse_bytes(&self, data: &[u8], mode: Mode) -> Result<ParseOutcome, ParseError> {
        let text = std::str::from_utf8(data)?;
        self.parse(text, mode)
    }

    fn parse_book(&self, text: &str) -> Result<ParseOutcome, ParseError> {
        self.book.validate()?;

        let units = self
            .segmenter
            .segment(&flow_paragraphs(text))
            .into_iter()
            .filter(|s| s.text.chars().any(char::is_alphanumeric))
            .enumerate()
            .map(|(index, s)| Unit {
                index,
                kind: UnitKind::Speech,
                pause: self.book.pause_after(s.terminator),
                text: s.text.trim().to_string(),
            })
            .collect();

        Ok(ParseOutcome {
            units,
            skipped_lines: 0,
        })
    }
}

/// Parses `text` under `mode` with the default parser.
pub fn parse(text: &str, mode: Mode) -> Result<ParseOutcome, ParseError> {
    Parser::default().parse(text, mode)
}

/// Parses raw script bytes under `mode` with the default parser.
pub fn parse_bytes(data: &[u8], mode: Mode) -> Result<ParseOutcome, ParseError> {
    Parser::default().parse_bytes(data, mode)
}

/// Removes every character outside the structured-script allow-list.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|&c| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '*' | ';' | '.'))
        .collect()
}

fn parse_structured(text: &str) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();

    for (n, raw) in text.lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        let line = sanitize(raw);
        match match_line(&line) {
            Some((phrase, pause)) => {
                let kind = if phrase == SILENCE_MARKER {
                    UnitKind::Silence
                } else {
                    UnitKind::Speech
                };
                outcome.units.push(Unit {
                    index: outcome.units.len(),
                    kind,
                    text: phrase.to_string(),
                    pause,
                });
            }
            None => {
                debug!(line = n + 1, "skipping line");
                outcome.skipped_lines += 1;
            }
        }
    }
    outcome
}

/// Converts pause seconds to a duration within `0..=MAX_PAUSE_SECS`.
pub fn pause_duration(seconds: f64) -> Option<Duration> {
    if !(0.0..=MAX_PAUSE_SECS).contains(&seconds) {
        return None;
    }
    Duration::try_from_secs_f64(seconds).ok()
}

/// Matches one sanitized line, returning trimmed text and pause seconds.
/// Text without a letter or digit matches only as the silence marker.
fn match_line(line: &str) -> Option<(&str, f64)> {
    let caps = LINE_RE.captures(line)?;
    let phrase = caps.get(1)?.as_str().trim();
    if phrase != SILENCE_MARKER && !phrase.chars().any(char::is_alphanumeric) {
        return None;
    }
    let pause = caps.get(2)?.as_str().parse::<f64>().ok()?;
    pause_duration(pause).map(|_| (phrase, pause))
}

/// Joins wrapped lines into paragraphs; blank lines separate paragraphs
/// and become `\n` breaks.
fn flow_paragraphs(text: &str) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }
    paragraphs.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(outcome: &ParseOutcome) -> Vec<(&str, f64)> {
        outcome
            .units
            .iter()
            .map(|u| (u.text.as_str(), u.pause))
            .collect()
    }

    #[test]
    fn test_structured_basic() {
        let outcome = parse("Hello world;2\nGoodbye;0\n", Mode::Structured).unwrap();
        assert_eq!(pairs(&outcome), vec![("Hello world", 2.0), ("Goodbye", 0.0)]);
        assert_eq!(outcome.skipped_lines, 0);
        let indices: Vec<usize> = outcome.units.iter().map(|u| u.index).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_structured_sanitizes_noise() {
        let outcome = parse(" ^ & Hello ;  99 (\n", Mode::Structured).unwrap();
        assert_eq!(pairs(&outcome), vec![("Hello", 99.0)]);
        assert_eq!(outcome.units[0].kind, UnitKind::Speech);
    }

    #[test]
    fn test_structured_pause_grammar() {
        let script = "a;10\nb;0.5\nc;1.25\nd;05\ne;.5\nf;5.\ng;-1\nh;1e3\n";
        let outcome = parse(script, Mode::Structured).unwrap();
        assert_eq!(
            pairs(&outcome),
            vec![("a", 10.0), ("b", 0.5), ("c", 1.25), ("d", 5.0), ("g", 1.0)]
        );
        // The sign is stripped by sanitization, so "-1" reads as "1".
        assert_eq!(outcome.skipped_lines, 3);
    }

    #[test]
    fn test_structured_skips_malformed() {
        let script = "no separator here\n\n   \nTwo;seps;3\nOk;1\n;4\n   ;2\n";
        let outcome = parse(script, Mode::Structured).unwrap();
        assert_eq!(pairs(&outcome), vec![("Ok", 1.0)]);
        assert_eq!(outcome.units[0].index, 0);
        assert_eq!(outcome.skipped_lines, 4);
    }

    #[test]
    fn test_structured_silence_marker() {
        let outcome = parse("Breathe in;1\n*;5\n Breathe out ;0\n", Mode::Structured).unwrap();
        assert_eq!(outcome.units.len(), 3);
        assert!(outcome.units[1].is_silence());
        assert_eq!(outcome.units[1].pause_duration(), Some(Duration::from_secs(5)));
        assert!(!outcome.units[2].is_silence());
        assert_eq!(outcome.units[2].text, "Breathe out");
    }

    #[test]
    fn test_structured_skips_textless_phrases() {
        let script = "...;2\n**;1\n. ;3\n*;4\nHello.;1\n";
        let outcome = parse(script, Mode::Structured).unwrap();
        assert_eq!(pairs(&outcome), vec![("*", 4.0), ("Hello.", 1.0)]);
        assert!(outcome.units[0].is_silence());
        assert_eq!(outcome.units[1].kind, UnitKind::Speech);
        assert_eq!(outcome.skipped_lines, 3);
    }

    #[test]
    fn test_structured_pause_limit() {
        let script = "a;3600\nb;3600.5\n*;100000000000000000000\nc;1\n";
        let outcome = parse(script, Mode::Structured).unwrap();
        assert_eq!(pairs(&outcome), vec![("a", 3600.0), ("c", 1.0)]);
        assert_eq!(outcome.skipped_lines, 2);
        assert_eq!(outcome.units[1].index, 1);
    }

    #[test]
    fn test_pause_duration_bounds() {
        assert_eq!(pause_duration(0.25), Some(Duration::from_millis(250)));
        assert_eq!(pause_duration(MAX_PAUSE_SECS), Some(Duration::from_secs(3600)));
        assert_eq!(pause_duration(MAX_PAUSE_SECS + 1.0), None);
        assert_eq!(pause_duration(-0.5), None);
        assert_eq!(pause_duration(f64::NAN), None);
        assert_eq!(pause_duration(1e20), None);
    }

    #[test]
    fn test_structured_crlf() {
        let outcome = parse("One;1\r\nTwo;2\r\n", Mode::Structured).unwrap();
        assert_eq!(pairs(&outcome), vec![("One", 1.0), ("Two", 2.0)]);
    }

    #[test]
    fn test_structured_unicode_text() {
        let outcome = parse("Grüß dich;1\n", Mode::Structured).unwrap();
        assert_eq!(pairs(&outcome), vec![("Grüß dich", 1.0)]);
    }

    #[test]
    fn test_blank_input() {
        for mode in [Mode::Structured, Mode::Book] {
            let outcome = parse("  \n\n\t\n", mode).unwrap();
            assert!(outcome.units.is_empty());
            assert_eq!(outcome.skipped_lines, 0);
        }
    }

    #[test]
    fn test_parse_bytes_rejects_invalid_utf8() {
        let result = parse_bytes(&[b'H', b'i', 0xff, b';', b'1'], Mode::Structured);
        assert!(matches!(result, Err(ParseError::Encoding(_))));

        let outcome = parse_bytes("Hi;1".as_bytes(), Mode::Structured).unwrap();
        assert_eq!(outcome.units.len(), 1);
    }

    #[test]
    fn test_book_default_pause() {
        let text = "The sun rose.\nIt was warm! Birds sang";
        let outcome = parse(text, Mode::Book).unwrap();
        assert_eq!(
            pairs(&outcome),
            vec![("The sun rose", 1.0), ("It was warm", 1.0), ("Birds sang", 1.0)]
        );
    }

    #[test]
    fn test_book_punctuated_pauses() {
        let parser = Parser::new().book_options(BookOptions::punctuated());
        let outcome = parser.parse("Wait... what? Fine\n\nNext paragraph", Mode::Book).unwrap();
        assert_eq!(
            pairs(&outcome),
            vec![
                ("Wait", 0.1),
                ("what", 0.1),
                ("Fine", 1.0),
                ("Next paragraph", 1.0)
            ]
        );
    }

    #[test]
    fn test_book_rejects_negative_pause() {
        let parser = Parser::new().book_options(BookOptions {
            default_pause: -1.0,
            punctuation: BTreeMap::new(),
        });
        assert!(matches!(
            parser.parse("Hello.", Mode::Book),
            Err(ParseError::Options(_))
        ));
    }

    #[test]
    fn test_flow_paragraphs() {
        assert_eq!(
            flow_paragraphs("one\ntwo\n\n\nthree\n"),
            "one two\nthree"
        );
    }

    #[test]
    fn test_outcome_serializes() {
        let outcome = parse("*;2\nHi;1\n", Mode::Structured).unwrap();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["skipped_lines"], 0);
        assert_eq!(json["units"][0]["kind"], "silence");
        assert_eq!(json["units"][1]["text"], "Hi");
        assert_eq!(json["units"][1]["pause"], 1.0);
    }
}
