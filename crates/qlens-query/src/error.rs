//! Parse-time structural errors.
//!
//! Ordinary malformed input never errors — it degrades to a best-effort
//! tree plus warnings. The only failures are structural limits, and those
//! carry enough position context to show the user where the query went
//! over.

use std::{error::Error, fmt};

/// What structural limit a query exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The query is longer than the configured maximum.
    TooLong {
        /// Query length in characters.
        length: usize,
        /// Configured maximum length in characters.
        limit: usize,
    },
    /// Groups nest deeper than the configured maximum.
    TooDeep {
        /// Configured maximum nesting depth.
        limit: usize,
    },
}

/// A query exceeded a structural limit.
///
/// This is the only error category expected to reach an end user; its
/// display names the limit and points at the offending position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParseError {
    /// Which limit was exceeded.
    pub kind: ParseErrorKind,
    /// Byte offset into the query where the limit was crossed.
    pub position: usize,
    /// The query text (working text for depth errors, raw for length).
    pub query: String,
}

impl QueryParseError {
    /// Creates a maximum-length error.
    pub(crate) fn too_long(query: &str, length: usize, limit: usize) -> Self {
        // Point at the first character past the limit.
        let position = query
            .char_indices()
            .nth(limit)
            .map_or(query.len(), |(idx, _)| idx);
        Self {
            kind: ParseErrorKind::TooLong { length, limit },
            position,
            query: query.to_string(),
        }
    }

    /// Creates a maximum-depth error at `position`.
    pub(crate) fn too_deep(query: &str, position: usize, limit: usize) -> Self {
        Self {
            kind: ParseErrorKind::TooDeep { limit },
            position,
            query: query.to_string(),
        }
    }

    /// The part of the query from the offending position onward, shortened
    /// for display.
    pub fn offending_fragment(&self) -> &str {
        let rest = &self.query[self.position.min(self.query.len())..];
        match rest.char_indices().nth(20) {
            Some((idx, _)) => &rest[..idx],
            None => rest,
        }
    }
}

impl fmt::Display for QueryParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParseErrorKind::TooLong { length, limit } => {
                write!(
                    f,
                    "query is too long ({length} characters, limit {limit}); text past the limit starts at {:?}",
                    self.offending_fragment()
                )
            }
            ParseErrorKind::TooDeep { limit } => {
                writeln!(f, "query groups nest too deeply (limit {limit})")?;
                writeln!(f, "  {}", self.query)?;
                write!(f, "  {}^", " ".repeat(self.position.min(self.query.len())))
            }
        }
    }
}

impl Error for QueryParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_long_reports_fragment() {
        let query = "abcdef";
        let err = QueryParseError::too_long(query, 6, 3);
        assert_eq!(err.position, 3);
        assert_eq!(err.offending_fragment(), "def");
        let display = err.to_string();
        assert!(display.contains("limit 3"));
        assert!(display.contains("def"));
    }

    #[test]
    fn too_deep_points_at_position() {
        let err = QueryParseError::too_deep("((((a))))", 3, 2);
        let display = err.to_string();
        assert!(display.contains("nest too deeply"));
        assert!(display.contains("   ^"));
    }

    #[test]
    fn too_long_position_is_char_aligned() {
        // Multi-byte characters must not split the fragment mid-codepoint.
        let query = "ééééé";
        let err = QueryParseError::too_long(query, 5, 2);
        assert_eq!(err.offending_fragment(), "ééé");
    }
}
