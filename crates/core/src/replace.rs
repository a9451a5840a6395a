//! Whole-word replacement of `old` by `new` inside a message.
//!
//! A whole-word match sits between Unicode word boundaries (`\b`), so a
//! combining mark or any other word character next to it rules it out. Every
//! non-overlapping match is replaced, scanning left to right.

use regex::{NoExpand, Regex};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReplaceMode {
    /// `old` is matched literally and `new` is inserted as-is.
    #[default]
    Literal,
    /// `old` is compiled as a regular expression between `\b` anchors and
    /// `new` may reference capture groups (`$1`). Metacharacters typed by the
    /// user change what matches.
    Pattern,
}

#[derive(Debug, Error)]
pub enum ReplaceError {
    #[error("`{pattern}` is not a valid pattern: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub fn replace_whole_word(
    target: &str,
    old: &str,
    new: &str,
    mode: ReplaceMode,
) -> Result<String, ReplaceError> {
    if old.is_empty() {
        return Ok(target.to_owned());
    }

    let replaced = match mode {
        ReplaceMode::Literal => {
            whole_word(&regex::escape(old), old)?.replace_all(target, NoExpand(new)).into_owned()
        }
        ReplaceMode::Pattern => whole_word(old, old)?.replace_all(target, new).into_owned(),
    };
    Ok(replaced)
}

fn whole_word(pattern: &str, old: &str) -> Result<Regex, ReplaceError> {
    Regex::new(&format!(r"\b({pattern})\b"))
        .map_err(|source| ReplaceError::InvalidPattern { pattern: old.to_owned(), source })
}

#[cfg(test)]
mod tests {
    use super::{replace_whole_word, ReplaceError, ReplaceMode};

    fn literal(target: &str, old: &str, new: &str) -> String {
        replace_whole_word(target, old, new, ReplaceMode::Literal).expect("literal replace")
    }

    #[test]
    fn leaves_partial_words_untouched() {
        assert_eq!(
            literal("what if I typ the word typical", "typ", "type"),
            "what if I type the word typical"
        );
    }

    #[test]
    fn replaces_every_whole_word_occurrence() {
        assert_eq!(literal("bee or not bee, bees", "bee", "be"), "be or not be, bees");
    }

    #[test]
    fn matches_at_string_edges_and_punctuation() {
        assert_eq!(literal("bee", "bee", "be"), "be");
        assert_eq!(literal("(bee).", "bee", "be"), "(be).");
        assert_eq!(literal("message to bee replaced", "bee", "be"), "message to be replaced");
    }

    #[test]
    fn underscore_counts_as_a_word_character() {
        assert_eq!(literal("my_bee bee", "bee", "be"), "my_bee be");
    }

    #[test]
    fn rejected_match_does_not_hide_a_later_one() {
        assert_eq!(literal("aa a", "a", "b"), "aa b");
        assert_eq!(literal("xbee bee", "bee", "be"), "xbee be");
    }

    #[test]
    fn metacharacters_are_literal_by_default() {
        assert_eq!(literal("costs 1.5 or 105", "1.5", "2"), "costs 2 or 105");
        assert_eq!(literal("a+b and aab", "a+b", "sum"), "sum and aab");
        assert_eq!(literal("price $1", "price", "$2"), "$2 $1");
    }

    #[test]
    fn non_ascii_letters_bound_words() {
        assert_eq!(literal("café caf", "caf", "cafe"), "café cafe");
    }

    #[test]
    fn combining_marks_belong_to_the_word() {
        assert_eq!(literal("cafe\u{301} cafe", "cafe", "tea"), "cafe\u{301} tea");
        assert_eq!(
            replace_whole_word("cafe\u{301} cafe", "cafe", "tea", ReplaceMode::Pattern)
                .expect("pattern replace"),
            literal("cafe\u{301} cafe", "cafe", "tea")
        );
    }

    #[test]
    fn is_idempotent_when_new_does_not_contain_old() {
        let cases = [
            ("message to bee replaced", "bee", "be"),
            ("what if I typ the word typical", "typ", "type"),
            ("one two one", "one", "three"),
        ];
        for (target, old, new) in cases {
            let once = literal(target, old, new);
            assert_eq!(literal(&once, old, new), once, "case `{target}`");
        }
    }

    #[test]
    fn no_match_returns_the_input() {
        assert_eq!(literal("nothing here", "bee", "be"), "nothing here");
    }

    #[test]
    fn pattern_mode_interprets_metacharacters() {
        let replaced =
            replace_whole_word("costs 105 or 1.5", "1.5", "2", ReplaceMode::Pattern).expect("ok");
        assert_eq!(replaced, "costs 2 or 2");
    }

    #[test]
    fn pattern_mode_reports_invalid_patterns() {
        let error = replace_whole_word("text", "(", "x", ReplaceMode::Pattern)
            .expect_err("unbalanced group should not compile");
        assert!(matches!(error, ReplaceError::InvalidPattern { ref pattern, .. } if pattern == "("));
    }
}
