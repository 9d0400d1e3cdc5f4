use once_cell::sync::Lazy;
use regex::Regex;

/// Abbreviations whose trailing period must not end a sentence.
///
/// Protection is a plain substring replacement, so the same character
/// sequence inside a longer token is protected too.
const PROTECTED_ABBREVIATIONS: &[&str] = &[
    "e.g.", "i.e.", "etc.", "vs.", "Mr.", "Mrs.", "Ms.", "Dr.", "Prof.", "St.",
];

const SENTINEL_OPEN: char = '\u{E000}';
const SENTINEL_CLOSE: char = '\u{E001}';

static RE_TERMINATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").unwrap());
static RE_LIST_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,3}\.$").unwrap());

/// Split a paragraph into sentences
///
/// A boundary is `.`, `!` or `?` followed by whitespace and then an uppercase
/// letter, a digit or `(`. The terminating punctuation stays with the sentence
/// it ends. A leading list number such as `1.` stays with the text after it.
/// Empty pieces are dropped.
pub fn split_sentences(paragraph: &str) -> Vec<String> {
    let protected = protect_abbreviations(paragraph);

    let mut sentences = Vec::new();
    let mut start = 0;

    for terminator in RE_TERMINATOR.find_iter(&protected) {
        let opens_sentence = protected[terminator.end()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_uppercase() || c.is_ascii_digit() || c == '(');

        let pending = protected[start..terminator.end()].trim();
        if opens_sentence && !RE_LIST_MARKER.is_match(pending) {
            push_sentence(&mut sentences, &protected[start..terminator.end()]);
            start = terminator.end();
        }
    }
    push_sentence(&mut sentences, &protected[start..]);

    sentences
}

fn push_sentence(sentences: &mut Vec<String>, piece: &str) {
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        sentences.push(restore_abbreviations(trimmed));
    }
}

fn sentinel(index: usize) -> String {
    format!("{SENTINEL_OPEN}{index}{SENTINEL_CLOSE}")
}

fn protect_abbreviations(text: &str) -> String {
    PROTECTED_ABBREVIATIONS
        .iter()
        .enumerate()
        .fold(text.to_string(), |acc, (index, abbreviation)| {
            acc.replace(abbreviation, &sentinel(index))
        })
}

fn restore_abbreviations(text: &str) -> String {
    if !text.contains(SENTINEL_OPEN) {
        return text.to_string();
    }

    PROTECTED_ABBREVIATIONS
        .iter()
        .enumerate()
        .fold(text.to_string(), |acc, (index, abbreviation)| {
            acc.replace(&sentinel(index), abbreviation)
        })
}
