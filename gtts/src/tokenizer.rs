//! Splits text into request-sized chunks.
//!
//! The endpoint rejects long inputs, so text is first cut at punctuation
//! and each piece is then cut at whitespace until it fits
//! [`MAX_CHARS`]. Pieces with nothing speakable are dropped.

/// Maximum number of characters per request.
pub const MAX_CHARS: usize = 100;

/// Characters that always end a chunk.
const HARD_BREAKS: &[char] = &[
    '?', '!', '？', '！', '¡', '¿', '(', ')', '[', ']', '…', '‥', '،', ';', ':', '—', '。', '，',
    '、', '：', '；', '\n',
];

/// Splits `text` into chunks of at most `max_chars` characters.
pub fn tokenize(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    split_punctuation(text)
        .into_iter()
        .flat_map(|piece| minimize(piece, max_chars))
        .filter(|chunk| chunk.chars().any(char::is_alphanumeric))
        .collect()
}

/// Cuts at hard breaks, and at `.` or `,` when followed by whitespace or
/// the end of text (so "3.14" and "1,000" stay whole).
fn split_punctuation(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let soft = (c == '.' || c == ',')
            && chars.peek().is_none_or(|&(_, next)| next.is_whitespace());
        if soft || HARD_BREAKS.contains(&c) {
            pieces.push(text[start..i].trim());
            start = i + c.len_utf8();
        }
    }
    pieces.push(text[start..].trim());
    pieces.retain(|p| !p.is_empty());
    pieces
}

/// Cuts `piece` at the last space that keeps each part within
/// `max_chars`, or hard at `max_chars` when there is no space.
fn minimize(piece: &str, max_chars: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = piece.trim();

    while rest.chars().count() > max_chars {
        // Byte offset of the character just past the limit.
        let limit = rest
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let cut = if rest[limit..].starts_with(' ') {
            limit
        } else {
            match rest[..limit].rfind(' ') {
                Some(i) if i > 0 => i,
                _ => limit,
            }
        };
        out.push(rest[..cut].trim_end().to_string());
        rest = rest[cut..].trim_start();
    }
    if !rest.is_empty() {
        out.push(rest.to_string());
    }
    out
}
