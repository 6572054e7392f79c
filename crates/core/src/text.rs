//! Text truncation for product cards and meta tags.
//!
//! All lengths count characters, not bytes, so Indonesian and other non-ASCII
//! descriptions are never cut mid-codepoint.

/// Shorten `text` to at most `max_chars` characters plus `suffix`.
///
/// If the cut lands inside a word and there is a space in the last 20% of the
/// kept text, the cut moves back to that space.
#[must_use]
pub fn truncate_text(text: &str, max_chars: usize, suffix: &str) -> String {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };

    let (head, _) = text.split_at(cut);
    let kept = match head.rfind(' ') {
        Some(space) if head.split_at(space).0.chars().count() * 5 > max_chars * 4 => {
            head.split_at(space).0
        }
        _ => head,
    };

    format!("{kept}{suffix}")
}

/// Keep the first `max_words` whitespace-separated words.
#[must_use]
pub fn truncate_words(text: &str, max_words: usize, suffix: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return text.to_string();
    }

    let kept = words.iter().take(max_words).copied().collect::<Vec<_>>().join(" ");
    format!("{kept}{suffix}")
}

/// Whether [`truncate_text`] would shorten `text`.
#[must_use]
pub fn needs_truncation(text: &str, max_chars: usize) -> bool {
    text.chars().nth(max_chars).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_unchanged() {
        assert_eq!(truncate_text("Meja jati", 20, "..."), "Meja jati");
        assert_eq!(truncate_text("exactly10!", 10, "..."), "exactly10!");
    }

    #[test]
    fn test_cuts_back_to_late_space() {
        // Cut at 20 chars gives "Meja makan jati soli"; the last space is at
        // 15 chars, which is not beyond 80% (16), so the hard cut stays.
        assert_eq!(
            truncate_text("Meja makan jati solid ukiran Jepara", 20, "..."),
            "Meja makan jati soli..."
        );
        // Last space at 17 chars is beyond 80% of 20.
        assert_eq!(
            truncate_text("Kursi rotan alami premium", 20, "..."),
            "Kursi rotan alami..."
        );
    }

    #[test]
    fn test_multibyte_safe() {
        assert_eq!(truncate_text("ééééé", 3, "…"), "ééé…");
    }

    #[test]
    fn test_truncate_words() {
        assert_eq!(truncate_words("satu dua tiga empat", 2, "..."), "satu dua...");
        assert_eq!(truncate_words("satu dua", 2, "..."), "satu dua");
    }

    #[test]
    fn test_needs_truncation() {
        assert!(needs_truncation("abcdef", 5));
        assert!(!needs_truncation("abcde", 5));
        assert!(!needs_truncation("", 0));
    }
}
