//! Character-budget chunker for the refinement stage.
//!
//! The language model gets at most `budget` characters per call.  Splits
//! prefer the paragraph break nearest the budget, then a sentence break,
//! then any whitespace, and only hard-cut mid-word when a piece contains no
//! usable boundary at all.  The chunks are an exact partition of the input:
//! concatenating them reproduces it byte for byte.

/// Split `text` into pieces of at most `budget` characters each.
///
/// Budgets are counted in characters, not bytes, so multi-byte scripts are
/// never cut inside a scalar value.
pub fn split_for_refinement(text: &str, budget: usize) -> Vec<String> {
    let budget = budget.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        // Byte offset of the character just past the budget; `None` means
        // the remainder fits in one chunk.
        let window_end = match rest.char_indices().nth(budget) {
            Some((idx, _)) => idx,
            None => {
                chunks.push(rest.to_string());
                break;
            }
        };

        let window = &rest[..window_end];
        let cut = split_point(window).unwrap_or(window_end);
        chunks.push(window[..cut].to_string());
        rest = &rest[cut..];
    }

    chunks
}

/// Best byte offset to cut a full window at, or `None` when the window
/// contains no boundary and must be hard-cut.
///
/// Boundary preference, each taken at its last occurrence in the window:
/// paragraph break (`\n\n`) > sentence end (`.`/`!`/`?` followed by
/// whitespace) > any whitespace.  The boundary characters stay with the
/// chunk that precedes the cut.
fn split_point(window: &str) -> Option<usize> {
    let mut paragraph = None;
    let mut sentence = None;
    let mut whitespace = None;
    let mut prev: Option<char> = None;

    for (idx, ch) in window.char_indices() {
        let after = idx + ch.len_utf8();
        if ch == '\n' && prev == Some('\n') {
            paragraph = Some(after);
        }
        if ch.is_whitespace() {
            if matches!(prev, Some('.') | Some('!') | Some('?')) {
                sentence = Some(after);
            }
            whitespace = Some(after);
        }
        prev = Some(ch);
    }

    paragraph.or(sentence).or(whitespace)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn max_chars(chunks: &[String]) -> usize {
        chunks.iter().map(|c| c.chars().count()).max().unwrap_or(0)
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = split_for_refinement("hello world", 2000);
        assert_eq!(chunks, vec!["hello world".to_string()]);
    }

    #[test]
    fn concatenation_reconstructs_the_input() {
        let text = "First paragraph with some sentences. A second one!\n\n\
                    Second paragraph. It keeps going and going with more words.\n\n\
                    Third paragraph is here too.";
        let chunks = split_for_refinement(text, 60);
        assert_eq!(chunks.concat(), text);
        assert!(chunks.len() > 1);
    }

    #[test]
    fn no_chunk_exceeds_the_budget() {
        let text = "word ".repeat(500);
        let chunks = split_for_refinement(&text, 73);
        assert!(max_chars(&chunks) <= 73);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn paragraph_breaks_are_preferred() {
        let text = "Alpha beta gamma.\n\nDelta epsilon zeta. Eta theta.";
        let chunks = split_for_refinement(text, 30);
        // The first cut lands just after the paragraph break, not at the
        // whitespace nearest the budget.
        assert_eq!(chunks[0], "Alpha beta gamma.\n\n");
    }

    #[test]
    fn sentence_breaks_are_used_when_no_paragraph_fits() {
        let text = "One sentence here. Another sentence there. And a third one.";
        let chunks = split_for_refinement(text, 30);
        assert_eq!(chunks[0], "One sentence here. ");
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn unbroken_text_is_hard_cut_at_the_budget() {
        let text = "a".repeat(250);
        let chunks = split_for_refinement(&text, 100);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 100);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn budgets_count_characters_not_bytes() {
        // Thai text: 3 bytes per character, no spaces.
        let text = "ทดสอบ".repeat(50);
        let chunks = split_for_refinement(&text, 40);
        assert!(max_chars(&chunks) <= 40);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(split_for_refinement("", 100).is_empty());
    }
}
