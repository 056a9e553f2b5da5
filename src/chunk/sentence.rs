//! Sentence-level chunker for the synthesis stage.
//!
//! The TTS runtime performs best on sentence-sized utterances: very short
//! units waste inference round-trips on tiny audio buffers, and units are
//! therefore merged with their neighbours up to `max_len` characters.  A
//! unit never ends mid-sentence — a single sentence longer than `max_len`
//! is passed through intact.

/// Split `text` into sentence-level synthesis units of roughly `max_len`
/// characters.
///
/// Whitespace is normalised first (runs collapse to a single space), then
/// the text is split at sentence-terminal punctuation runs (`.`, `!`, `?`),
/// keeping the terminator with its sentence.  Adjacent short sentences are
/// merged while the combined unit stays within `max_len`.
pub fn split_sentences(text: &str, max_len: usize) -> Vec<String> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return Vec::new();
    }
    merge_units(sentence_units(&normalized), max_len.max(1))
}

/// Append a terminal `.` when a unit lacks sentence-ending punctuation —
/// the synthesis runtime produces flat prosody on unterminated text.
pub fn ensure_sentence_end(text: &str) -> String {
    let trimmed = text.trim_end();
    if trimmed.ends_with(['.', '!', '?', ';', ':']) {
        trimmed.to_string()
    } else {
        format!("{trimmed}.")
    }
}

fn is_terminator(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?')
}

/// Split at terminator runs, keeping each run attached to its sentence.
fn sentence_units(text: &str) -> Vec<String> {
    let mut units = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        current.push(ch);
        // End of a terminator run ("..." counts as one boundary).
        if is_terminator(ch) && !chars.peek().copied().is_some_and(is_terminator) {
            let unit = current.trim();
            if !unit.is_empty() {
                units.push(unit.to_string());
            }
            current.clear();
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        units.push(tail.to_string());
    }
    units
}

/// Greedily merge neighbouring sentences while the unit stays under
/// `max_len` characters.
fn merge_units(units: Vec<String>, max_len: usize) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    let mut current = String::new();

    for unit in units {
        if current.is_empty() {
            current = unit;
        } else if current.chars().count() + 1 + unit.chars().count() <= max_len {
            current.push(' ');
            current.push_str(&unit);
        } else {
            merged.push(std::mem::replace(&mut current, unit));
        }
    }
    if !current.is_empty() {
        merged.push(current);
    }
    merged
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
