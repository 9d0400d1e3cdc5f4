use once_cell::sync::Lazy;
use regex::Regex;

/// Any run of two or more whitespace characters other than a newline
static RE_HORIZONTAL_WS_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]{2,}").unwrap());

/// Normalize raw extracted text before segmentation
///
/// - `\r\n` and lone `\r` become `\n`
/// - non-breaking spaces become ordinary spaces
/// - runs of horizontal whitespace collapse to a single space
///
/// Line structure is preserved; joining wrapped lines is the segmenter's job.
pub fn normalize(raw: &str) -> String {
    let unified = raw
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\u{00A0}', " ");

    RE_HORIZONTAL_WS_RUN.replace_all(&unified, " ").into_owned()
}
