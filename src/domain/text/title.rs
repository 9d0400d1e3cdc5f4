use std::path::Path;

pub const UNTITLED_ARTICLE: &str = "Untitled Article";

const MAX_TITLE_WORDS: usize = 16;
const ALL_CAPS_RATIO: f32 = 0.9;
const MAX_EXTERNAL_TITLE_CHARS: usize = 200;

/// Pick a title from the first block of non-blank lines.
///
/// The first line of that block wins when it has at most 16 words and is not
/// shouting (over 90% of its letters uppercase). Otherwise the filename stem is
/// used, then [`UNTITLED_ARTICLE`].
pub fn resolve_title(normalized_text: &str, filename: Option<&str>) -> String {
    if let Some(candidate) = first_block_line(normalized_text) {
        if candidate.split_whitespace().count() <= MAX_TITLE_WORDS && !is_all_caps_ish(candidate) {
            return candidate.to_string();
        }
    }

    filename_title(filename).unwrap_or_else(|| UNTITLED_ARTICLE.to_string())
}

/// Accept a title proposed by an external extractor, or fall back to the
/// heuristic when the proposal is empty, an error message or too long.
pub fn accept_external_title(
    proposed: Option<&str>,
    normalized_text: &str,
    filename: Option<&str>,
) -> String {
    match proposed.map(str::trim) {
        Some(title)
            if !title.is_empty()
                && !title.starts_with("Error")
                && title.chars().count() <= MAX_EXTERNAL_TITLE_CHARS =>
        {
            title.to_string()
        }
        _ => resolve_title(normalized_text, filename),
    }
}

fn first_block_line(text: &str) -> Option<&str> {
    text.lines()
        .map(str::trim)
        .skip_while(|line| line.is_empty())
        .take_while(|line| !line.is_empty())
        .next()
}

fn is_all_caps_ish(line: &str) -> bool {
    let (letters, upper) = line
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(letters, upper), c| {
            (letters + 1, upper + usize::from(c.is_uppercase()))
        });

    letters > 0 && (upper as f32 / letters as f32) > ALL_CAPS_RATIO
}

fn filename_title(filename: Option<&str>) -> Option<String> {
    let stem = Path::new(filename?).file_stem()?.to_str()?.trim();
    (!stem.is_empty()).then(|| stem.to_string())
}
