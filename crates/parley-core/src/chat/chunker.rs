//! Re-chunking of model output into bounded pieces for the client.

/// Split `text` into consecutive pieces of at most `size` characters.
///
/// Splits on character boundaries, never inside a UTF-8 sequence, and keeps
/// every character (newlines included), so the pieces concatenate back to
/// `text`. Empty input yields no pieces. A `size` of zero is treated as one.
pub fn split_chunks(text: &str, size: usize) -> impl Iterator<Item = &str> {
    let size = size.max(1);
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let end = rest
            .char_indices()
            .nth(size)
            .map_or(rest.len(), |(idx, _)| idx);
        let (head, tail) = rest.split_at(end);
        rest = tail;
        Some(head)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(text: &str, size: usize) -> Vec<&str> {
        split_chunks(text, size).collect()
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        assert!(chunks("", 50).is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        assert_eq!(chunks("Hello", 50), vec!["Hello"]);
    }

    #[test]
    fn test_splits_at_size() {
        let text = "a".repeat(120);
        let out = chunks(&text, 50);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].len(), 50);
        assert_eq!(out[1].len(), 50);
        assert_eq!(out[2].len(), 20);
    }

    #[test]
    fn test_exact_multiple_has_no_empty_tail() {
        assert_eq!(chunks("abcdef", 3), vec!["abc", "def"]);
    }

    #[test]
    fn test_multibyte_characters_not_split() {
        let text = "héllo wörld ✓✓✓";
        let out = chunks(text, 4);
        for chunk in &out {
            assert!(chunk.chars().count() <= 4);
        }
        assert_eq!(out.concat(), text);
    }

    #[test]
    fn test_newlines_preserved() {
        let text = "line one\nline two\n\nline four";
        assert_eq!(chunks(text, 5).concat(), text);
    }

    #[test]
    fn test_zero_size_treated_as_one() {
        assert_eq!(chunks("ab", 0), vec!["a", "b"]);
    }
}
