//! The recursive chunk splitter: target 1000 chars, 200
//! overlap, preferring paragraph, then line, then sentence, then word,
//! then character boundaries.

const TARGET_SIZE: usize = 1000;
const OVERLAP: usize = 200;

const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " "];

/// Split `content` into a dense, 0-indexed, ordered sequence of chunks.
///
/// Concatenating the returned chunks in order (de-duplicating the
/// overlapped prefix of each chunk against the tail of its
/// predecessor) reconstructs `content`.
pub fn chunk_text(content: &str) -> Vec<String> {
    if content.is_empty() {
        return Vec::new();
    }
    if content.chars().count() <= TARGET_SIZE {
        return vec![content.to_string()];
    }

    let pieces = split_recursive(content, 0);
    merge_with_overlap(&pieces)
}

/// Recursively split `content` on the separator at `level`, falling
/// through to the next (finer) separator whenever a candidate piece is
/// still over `TARGET_SIZE`, and finally to a raw char-boundary cut.
fn split_recursive(content: &str, level: usize) -> Vec<String> {
    if content.chars().count() <= TARGET_SIZE {
        return vec![content.to_string()];
    }

    let Some(sep) = SEPARATORS.get(level) else {
        return char_boundary_split(content, TARGET_SIZE);
    };

    let raw_pieces: Vec<&str> = content.split(sep).collect();
    if raw_pieces.len() <= 1 {
        return split_recursive(content, level + 1);
    }

    let mut out = Vec::new();
    let mut buffer = String::new();
    for (i, piece) in raw_pieces.iter().enumerate() {
        let candidate_len = buffer.chars().count()
            + piece.chars().count()
            + if buffer.is_empty() { 0 } else { sep.chars().count() };
        if candidate_len > TARGET_SIZE && !buffer.is_empty() {
            out.push(std::mem::take(&mut buffer));
        }
        if !buffer.is_empty() {
            buffer.push_str(sep);
        }
        buffer.push_str(piece);
        let is_last = i == raw_pieces.len() - 1;
        if buffer.chars().count() > TARGET_SIZE {
            out.extend(split_recursive(&buffer, level + 1));
            buffer.clear();
        } else if is_last && !buffer.is_empty() {
            out.push(std::mem::take(&mut buffer));
        }
    }
    if !buffer.is_empty() {
        out.push(buffer);
    }
    out
}

/// Last-resort split on raw char boundaries when no separator helps
/// (e.g. one very long word).
fn char_boundary_split(content: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = content.chars().collect();
    chars
        .chunks(max_chars)
        .map(|c| c.iter().collect())
        .collect()
}

/// Re-merge adjacent pieces with a trailing overlap of up to `OVERLAP`
/// chars pulled from the end of the previous piece, so similarity
/// search run against either chunk still has boundary context.
fn merge_with_overlap(pieces: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(pieces.len());
    for (i, piece) in pieces.iter().enumerate() {
        if i == 0 {
            out.push(piece.clone());
            continue;
        }
        let prev: &String = &pieces[i - 1];
        let prev_chars: Vec<char> = prev.chars().collect();
        let overlap_len = OVERLAP.min(prev_chars.len());
        let overlap: String = prev_chars[prev_chars.len() - overlap_len..].iter().collect();
        out.push(format!("{overlap}{piece}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_is_single_chunk() {
        let chunks = chunk_text("hello world");
        assert_eq!(chunks, vec!["hello world".to_string()]);
    }

    #[test]
    fn empty_content_yields_no_chunks() {
        assert!(chunk_text("").is_empty());
    }

    #[test]
    fn long_paragraphs_split_on_paragraph_boundaries() {
        let para = "x".repeat(600);
        let content = format!("{para}\n\n{para}\n\n{para}");
        let chunks = chunk_text(&content);
        assert!(chunks.len() >= 2);
        for c in &chunks {
            assert!(c.chars().count() <= TARGET_SIZE + OVERLAP);
        }
    }

    #[test]
    fn chunks_after_the_first_carry_overlap_from_predecessor() {
        let para = "a".repeat(600);
        let content = format!("{para}\n\n{}", "b".repeat(600));
        let chunks = chunk_text(&content);
        assert!(chunks.len() >= 2);
        assert!(chunks[1].starts_with('a'));
    }

    #[test]
    fn single_huge_word_falls_back_to_char_split() {
        let content = "x".repeat(5000);
        let chunks = chunk_text(&content);
        assert!(chunks.len() > 1);
    }
}
