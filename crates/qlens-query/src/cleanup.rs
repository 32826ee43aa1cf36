//! Pre-tokenization cleanup of the raw query text.
//!
//! Two reversible transforms run before the lexer sees the input, each
//! recorded in [`CleanupFlags`] so the fixer can reconstruct the original
//! text later:
//!
//! - one leading `~` header is stripped;
//! - stray question marks are stripped, so a pasted "what is x?" does not
//!   silently become a wildcard search. `\?` opts back in and survives, as
//!   do question marks inside quoted phrases.

use crate::parsed::CleanupFlags;

/// The raw input after cleanup, plus what was done to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Cleaned {
    /// The working text handed to the lexer. Node offsets index this.
    pub text: String,
    /// Which transforms actually fired.
    pub flags: CleanupFlags,
}

/// Applies the cleanup transforms to `raw`.
pub(crate) fn clean(raw: &str) -> Cleaned {
    let mut flags = CleanupFlags::default();

    let rest = match raw.strip_prefix('~') {
        Some(stripped) => {
            flags.tilde_header = true;
            stripped
        }
        None => raw,
    };

    let mut text = String::with_capacity(rest.len());
    let mut escaped = false;
    let mut in_quotes = false;
    for ch in rest.chars() {
        if escaped {
            text.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' => {
                text.push(ch);
                escaped = true;
            }
            '"' => {
                in_quotes = !in_quotes;
                text.push(ch);
            }
            '?' if !in_quotes => {
                flags.stripped_question_marks = true;
            }
            _ => text.push(ch),
        }
    }

    Cleaned { text, flags }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_untouched() {
        let cleaned = clean("foo bar");
        assert_eq!(cleaned.text, "foo bar");
        assert_eq!(cleaned.flags, CleanupFlags::default());
    }

    #[test]
    fn leading_tilde_is_stripped_once() {
        let cleaned = clean("~~foo");
        assert_eq!(cleaned.text, "~foo");
        assert!(cleaned.flags.tilde_header);
        assert!(!cleaned.flags.stripped_question_marks);
    }

    #[test]
    fn stray_question_marks_are_stripped() {
        let cleaned = clean("what is rust?");
        assert_eq!(cleaned.text, "what is rust");
        assert!(cleaned.flags.stripped_question_marks);
    }

    #[test]
    fn escaped_question_mark_survives() {
        let cleaned = clean(r"fo\?o bar?");
        assert_eq!(cleaned.text, r"fo\?o bar");
        assert!(cleaned.flags.stripped_question_marks);
    }

    #[test]
    fn quoted_question_mark_survives() {
        let cleaned = clean("\"what?\" when?");
        assert_eq!(cleaned.text, "\"what?\" when");
        assert!(cleaned.flags.stripped_question_marks);
    }

    #[test]
    fn escaped_backslash_does_not_protect() {
        // `\\` is a literal backslash; the `?` after it is still stray.
        let cleaned = clean(r"foo\\? bar");
        assert_eq!(cleaned.text, r"foo\\ bar");
        assert!(cleaned.flags.stripped_question_marks);
    }

    #[test]
    fn tilde_not_at_start_is_kept() {
        let cleaned = clean("foo~");
        assert_eq!(cleaned.text, "foo~");
        assert!(!cleaned.flags.tilde_header);
    }
}
