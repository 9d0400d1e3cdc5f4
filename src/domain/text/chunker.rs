use serde::{Deserialize, Serialize};

use super::sentence::split_sentences;

/// Default character budget for one synthesis unit
pub const DEFAULT_CHUNK_CHAR_LIMIT: usize = 1400;

/// A bounded span of text scheduled as one synthesis job.
///
/// `index` is 1-based and follows source document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub index: usize,
}

/// Pack the sentences of each paragraph into chunks of at most `limit`
/// characters.
///
/// Chunks never span paragraphs. A sentence longer than `limit` becomes a
/// chunk of its own and is never split.
pub fn chunk_paragraphs(paragraphs: &[String], limit: usize) -> Vec<Chunk> {
    let limit = limit.max(1);
    let mut texts = Vec::new();

    for paragraph in paragraphs {
        pack_sentences(split_sentences(paragraph), limit, &mut texts);
    }

    texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| Chunk { text, index: i + 1 })
        .collect()
}

fn pack_sentences(sentences: Vec<String>, limit: usize, out: &mut Vec<String>) {
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in sentences {
        let len = sentence.chars().count();

        if len > limit {
            flush(&mut current, &mut current_len, out);
            out.push(sentence);
            continue;
        }

        if current.is_empty() {
            current = sentence;
            current_len = len;
        } else if current_len + 1 + len <= limit {
            current.push(' ');
            current.push_str(&sentence);
            current_len += 1 + len;
        } else {
            flush(&mut current, &mut current_len, out);
            current = sentence;
            current_len = len;
        }
    }

    flush(&mut current, &mut current_len, out);
}

fn flush(current: &mut String, current_len: &mut usize, out: &mut Vec<String>) {
    if !current.is_empty() {
        out.push(std::mem::take(current));
        *current_len = 0;
    }
}
