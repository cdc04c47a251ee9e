//! Splits a conversation's full text into ordered chunks sized for
//! embedding (§4.4). Pure, synchronous, no I/O.

/// One text slice, before tagging/embedding attaches the rest of a
/// [`jarvis_core::types::Chunk`]'s fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChunk {
    pub text: String,
    pub index: i32,
}

/// Segment `full_text` into chunks targeting `min_chars..=max_chars`,
/// splitting at paragraph boundaries first and falling back to sentence
/// boundaries when a single paragraph exceeds `max_chars`. Empty or
/// whitespace-only input yields zero chunks. The concatenation of the
/// returned chunk texts (with separators elided) contains every
/// non-whitespace character of `full_text`, in order.
pub fn chunk_text(full_text: &str, min_chars: usize, max_chars: usize) -> Vec<RawChunk> {
    if full_text.trim().is_empty() {
        return Vec::new();
    }

    let paragraphs: Vec<&str> = full_text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let mut units: Vec<&str> = Vec::new();
    for para in paragraphs {
        if para.len() > max_chars {
            units.extend(split_into_sentences(para));
        } else {
            units.push(para);
        }
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for unit in units {
        if current.is_empty() {
            current.push_str(unit);
            continue;
        }

        if current.len() + 1 + unit.len() <= max_chars {
            current.push(' ');
            current.push_str(unit);
        } else if current.len() >= min_chars {
            chunks.push(std::mem::take(&mut current));
            current.push_str(unit);
        } else {
            // Below the target minimum: keep growing past max_chars rather
            // than emit an undersized chunk.
            current.push(' ');
            current.push_str(unit);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    let total = chunks.len() as i32;
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, text)| RawChunk { text, index: i as i32 })
        .take(total as usize)
        .collect()
}

fn split_into_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if matches!(b, b'.' | b'!' | b'?') {
            let end = i + 1;
            let candidate = text[start..end].trim();
            if !candidate.is_empty() {
                out.push(candidate);
            }
            start = end;
        }
    }
    if start < text.len() {
        let tail = text[start..].trim();
        if !tail.is_empty() {
            out.push(tail);
        }
    }
    if out.is_empty() {
        out.push(text);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn non_whitespace(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_text("   \n\n  ", 500, 1500).is_empty());
    }

    #[test]
    fn chunk_coverage_preserves_every_non_whitespace_char() {
        let text = "Paragraph one with some content here that is long enough.\n\n\
                     Paragraph two continues the discussion with further detail.\n\n\
                     Paragraph three wraps things up nicely at the end.";
        let chunks = chunk_text(text, 10, 1500);
        let reconstructed: String = chunks.iter().map(|c| non_whitespace(&c.text)).collect();
        assert_eq!(reconstructed, non_whitespace(text));
    }

    #[test]
    fn indices_are_sequential_and_total_is_consistent() {
        let text = "a".repeat(2000);
        let chunks = chunk_text(&text, 100, 500);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, i as i32);
        }
        assert!(chunks.len() > 1);
    }

    #[test]
    fn oversized_paragraph_is_split_at_sentences() {
        let sentence = "This is a reasonably long sentence about a topic. ";
        let text = sentence.repeat(60);
        let chunks = chunk_text(&text, 200, 600);
        assert!(chunks.iter().all(|c| c.text.len() <= 900));
    }
}
