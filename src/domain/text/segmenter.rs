use once_cell::sync::Lazy;
use regex::Regex;

/// `- `, `* `, `• `, `3. ` or `3) ` at the start of a (trimmed) line
static RE_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:[-*•]|\d+[.)])\s").unwrap());

/// Split normalized text into paragraphs
///
/// Blank lines end a paragraph. Bullet and numbered-list lines always stand
/// alone. Wrapped lines are joined with a single space, except that a word
/// hyphenated across a line break is glued back together.
pub fn segment_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut buffer = String::new();

    for raw_line in text.lines() {
        let line = raw_line.trim();

        if line.is_empty() {
            flush(&mut buffer, &mut paragraphs);
            continue;
        }

        if is_bullet(line) {
            flush(&mut buffer, &mut paragraphs);
            paragraphs.push(line.to_string());
            continue;
        }

        append_line(&mut buffer, line);
    }

    flush(&mut buffer, &mut paragraphs);
    paragraphs
}

/// Paragraphs joined by blank lines, the shape handed to text cleaners
pub fn flatten(paragraphs: &[String]) -> String {
    paragraphs.join("\n\n")
}

pub fn is_bullet(line: &str) -> bool {
    RE_BULLET.is_match(line)
}

fn append_line(buffer: &mut String, line: &str) {
    if buffer.is_empty() {
        buffer.push_str(line);
        return;
    }

    let starts_with_letter = line.chars().next().is_some_and(char::is_alphabetic);
    if starts_with_letter && ends_with_hyphenated_word(buffer) {
        buffer.pop();
        buffer.push_str(line);
    } else {
        buffer.push(' ');
        buffer.push_str(line);
    }
}

fn ends_with_hyphenated_word(buffer: &str) -> bool {
    let mut tail = buffer.chars().rev();
    matches!(
        (tail.next(), tail.next()),
        (Some('-'), Some(before)) if before.is_alphabetic()
    )
}

fn flush(buffer: &mut String, paragraphs: &mut Vec<String>) {
    if !buffer.is_empty() {
        paragraphs.push(std::mem::take(buffer));
    }
}
