//! Sentence segmentation for book-mode scripts.

/// One sentence cut from free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// Sentence text without its terminating punctuation.
    pub text: String,
    /// The punctuation that ended the sentence, or `None` when the text
    /// ran out or the sentence was force-split at the length limit.
    pub terminator: Option<char>,
}

/// Interface for segmenting text into sentences.
pub trait SentenceSegmenter: Send + Sync {
    /// Segments `text` into sentences, in order.
    fn segment(&self, text: &str) -> Vec<Sentence>;
}

/// Default sentence segmenter that splits on punctuation.
#[derive(Debug, Clone)]
pub struct PunctuationSegmenter {
    /// Maximum number of characters allowed in each segment.
    /// If the text exceeds this limit, it will be split into multiple segments.
    /// Defaults to 256.
    pub max_chars_per_segment: usize,
}

impl Default for PunctuationSegmenter {
    fn default() -> Self {
        Self {
            max_chars_per_segment: 256,
        }
    }
}

impl PunctuationSegmenter {
    /// Creates a new segmenter with the specified max chars per segment.
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars_per_segment: max_chars.max(1),
        }
    }
}

impl SentenceSegmenter for PunctuationSegmenter {
    fn segment(&self, text: &str) -> Vec<Sentence> {
        let mut sentences = Vec::new();
        let mut rest = text;

        while !rest.is_empty() {
            let (end, terminator) = match find_sentence_boundary(rest, self.max_chars_per_segment) {
                Some(found) => found,
                None => (rest.len(), None),
            };
            let piece = &rest[..end];
            let body = match terminator {
                Some(c) => &piece[..piece.len() - c.len_utf8()],
                None => piece,
            };
            sentences.push(Sentence {
                text: body.trim().to_string(),
                terminator,
            });
            rest = &rest[end..];
        }
        sentences
    }
}

/// Finds the byte index just past the first sentence boundary in `s`, and
/// the boundary character. A forced split at `max_chars` has no terminator.
/// Returns None if no boundary is found.
fn find_sentence_boundary(s: &str, max_chars: usize) -> Option<(usize, Option<char>)> {
    let chars: Vec<char> = s.chars().collect();
    let byte_after = |i: usize| s.char_indices().nth(i + 1).map(|(idx, _)| idx).unwrap_or(s.len());

    for (i, &c) in chars.iter().enumerate().take(max_chars) {
        if is_sentence_boundary(c, i, &chars) {
            return Some((byte_after(i), Some(c)));
        }
    }

    // If we've exceeded max chars, force a split
    if chars.len() > max_chars {
        return Some((byte_after(max_chars - 1), None));
    }

    None
}

/// Checks if a character is a sentence boundary.
fn is_sentence_boundary(c: char, idx: usize, chars: &[char]) -> bool {
    let prev = if idx > 0 { chars[idx - 1] } else { ' ' };
    let next = if idx + 1 < chars.len() { chars[idx + 1] } else { ' ' };

    match c {
        // Handle decimal numbers and times (9.9, 10:15)
        '.' | ':' | ',' | '：' => !(next.is_ascii_digit() && prev.is_ascii_digit()),
        // Definite sentence boundaries
        '，' | '；' | '。' | '？' | '！' | '…' | '～' | '?' | '!' | '¿' | '¡' | ';' | '~' | '('
        | ')' | '\r' | '\n' | '„' | '・' => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(sentences: &[Sentence]) -> Vec<&str> {
        sentences.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_is_sentence_boundary() {
        let chars: Vec<char> = "Hello. World".chars().collect();
        assert!(is_sentence_boundary('.', 5, &chars));

        let chars: Vec<char> = "3.14".chars().collect();
        assert!(!is_sentence_boundary('.', 1, &chars)); // Decimal number

        let chars: Vec<char> = "10:30".chars().collect();
        assert!(!is_sentence_boundary(':', 2, &chars)); // Time
    }

    #[test]
    fn test_find_sentence_boundary() {
        assert_eq!(find_sentence_boundary("Hello. World", 256), Some((6, Some('.'))));
        assert_eq!(find_sentence_boundary("你好。世界", 256), Some((9, Some('。'))));
        assert_eq!(find_sentence_boundary("No boundary here", 256), None);
        assert_eq!(find_sentence_boundary("abcdef", 4), Some((4, None)));
    }

    #[test]
    fn test_segment_sentences() {
        let sentences = PunctuationSegmenter::default().segment("Hello there. How are you? Fine");
        assert_eq!(texts(&sentences), vec!["Hello there", "How are you", "Fine"]);
        assert_eq!(sentences[0].terminator, Some('.'));
        assert_eq!(sentences[1].terminator, Some('?'));
        assert_eq!(sentences[2].terminator, None);
    }

    #[test]
    fn test_segment_keeps_decimals() {
        let sentences = PunctuationSegmenter::default().segment("It costs 9.99 at 10:15.");
        assert_eq!(texts(&sentences), vec!["It costs 9.99 at 10:15"]);
    }

    #[test]
    fn test_segment_forced_split() {
        let sentences = PunctuationSegmenter::new(5).segment("abcdefghij");
        assert_eq!(texts(&sentences), vec!["abcde", "fghij"]);
        assert!(sentences.iter().all(|s| s.terminator.is_none()));
    }

    #[test]
    fn test_segment_empty() {
        assert!(PunctuationSegmenter::default().segment("").is_empty());
    }
}
