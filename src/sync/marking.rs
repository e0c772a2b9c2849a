//! Completion-marker protocol
//!
//! Whether a piece of persisted text already carries a translation is decided
//! solely by the presence of [`COMPLETION_MARK`]. Two layouts exist:
//!
//! - title/inline: `"{translated} ⚐ {original}"`, the tail is the original
//!   text so it can be restored on revert;
//! - translation child: `"{translated} ⚐ {length:04}"`, the tail is the
//!   character count of the source block, used to notice edits.
//!
//! All building and parsing of marked text goes through this module. Builders
//! strip the marker out of translated text so a tail is always unambiguous.

/// Sentinel flagging text that carries a translation artifact.
pub const COMPLETION_MARK: char = '⚐';

/// Upper bound on one stored text run, in characters.
pub const MAX_TEXT_LENGTH: usize = 2000;

/// Translation state derived from persisted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkState {
    Untranslated,
    Translated,
}

pub fn mark_state(text: &str) -> MarkState {
    if has_mark(text) {
        MarkState::Translated
    } else {
        MarkState::Untranslated
    }
}

pub fn has_mark(text: &str) -> bool {
    text.contains(COMPLETION_MARK)
}

/// Run inserted between an inline node's original runs and its translation.
pub fn separator() -> String {
    format!(" {} ", COMPLETION_MARK)
}

/// Original text of a title/inline layout, or `None` when unmarked.
pub fn split_revert(text: &str) -> Option<String> {
    text.split_once(COMPLETION_MARK)
        .map(|(_, original)| original.trim().to_string())
}

/// `"{translated} ⚐ {original}"`, with the translated part cut so the whole
/// text stays within [`MAX_TEXT_LENGTH`].
pub fn build_create_mark(translated: &str, original: &str) -> String {
    fit_with_suffix(translated, &format!(" {} {}", COMPLETION_MARK, original))
}

/// `"{translated} ⚐ {length:04}"`. The suffix is never cut, so the length
/// can always be parsed back.
pub fn build_container_mark(translated: &str, original_length: usize) -> String {
    fit_with_suffix(
        translated,
        &format!(" {} {:04}", COMPLETION_MARK, original_length),
    )
}

/// Translated prefix and embedded source length of a translation child.
///
/// Returns `None` when the text is unmarked or its tail is not a number.
pub fn parse_container_mark(text: &str) -> Option<(String, usize)> {
    let (prefix, tail) = text.rsplit_once(COMPLETION_MARK)?;
    let length = tail.trim().parse().ok()?;
    Some((prefix.trim_end().to_string(), length))
}

/// Length used for fingerprints and caps.
pub fn text_length(text: &str) -> usize {
    text.chars().count()
}

/// First `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Translated text made safe to store next to a marker.
pub fn sanitize_translation(translated: &str) -> String {
    translated.replace(COMPLETION_MARK, "")
}

fn fit_with_suffix(translated: &str, suffix: &str) -> String {
    let translated = sanitize_translation(translated);
    let budget = MAX_TEXT_LENGTH.saturating_sub(text_length(suffix));
    let mut text = truncate_chars(&translated, budget).to_string();
    text.push_str(suffix);
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_state() {
        assert_eq!(mark_state("plain"), MarkState::Untranslated);
        assert_eq!(mark_state("Hola ⚐ Hello"), MarkState::Translated);
        assert!(has_mark("x ⚐ 0001"));
        assert!(!has_mark(""));
    }

    #[test]
    fn test_build_create_mark() {
        assert_eq!(build_create_mark("Hola", "Hello"), "Hola ⚐ Hello");
    }

    #[test]
    fn test_split_revert() {
        assert_eq!(split_revert("Hola ⚐ Hello").as_deref(), Some("Hello"));
        assert_eq!(split_revert("Hola ⚐   Hello world  ").as_deref(), Some("Hello world"));
        assert_eq!(split_revert("Hello"), None);
    }

    #[test]
    fn test_create_then_revert_restores_original() {
        for original in ["Hello", "안녕하세요", "a - b / c", "Title: with ⚑ other flags"] {
            let marked = build_create_mark("whatever", original);
            assert_eq!(split_revert(&marked).as_deref(), Some(original));
        }
    }

    #[test]
    fn test_build_container_mark_pads_length() {
        assert_eq!(build_container_mark("Hola", 5), "Hola ⚐ 0005");
        assert_eq!(build_container_mark("Hola", 1234), "Hola ⚐ 1234");
        assert_eq!(build_container_mark("Hola", 12345), "Hola ⚐ 12345");
    }

    #[test]
    fn test_parse_container_mark() {
        assert_eq!(
            parse_container_mark("Hola mundo ⚐ 0011"),
            Some(("Hola mundo".to_string(), 11))
        );
        assert_eq!(parse_container_mark("no marker"), None);
        assert_eq!(parse_container_mark("Hola ⚐ abc"), None);
    }

    #[test]
    fn test_container_mark_truncates_translation_to_cap() {
        let translated = "가".repeat(3000);
        let text = build_container_mark(&translated, 42);
        assert_eq!(text_length(&text), MAX_TEXT_LENGTH);
        assert!(text.ends_with(" ⚐ 0042"));
        assert_eq!(parse_container_mark(&text).map(|(_, n)| n), Some(42));
    }

    #[test]
    fn test_create_mark_keeps_original_intact_when_truncating() {
        let original = "o".repeat(100);
        let text = build_create_mark(&"t".repeat(5000), &original);
        assert_eq!(text_length(&text), MAX_TEXT_LENGTH);
        assert_eq!(split_revert(&text), Some(original));
    }

    #[test]
    fn test_short_text_is_not_padded() {
        let text = build_container_mark("short", 5);
        assert!(text_length(&text) < MAX_TEXT_LENGTH);
    }

    #[test]
    fn test_marker_in_translation_is_stripped() {
        let text = build_container_mark("a ⚐ b", 3);
        assert_eq!(text.matches(COMPLETION_MARK).count(), 1);
        assert_eq!(parse_container_mark(&text).map(|(_, n)| n), Some(3));
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
        assert_eq!(truncate_chars("hi", 0), "");
    }
}
