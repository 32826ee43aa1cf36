//! The parse result: root node, query text, warnings, and cleanup flags.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use serde::Serialize;

use crate::ast::{QueryNode, Span};

/// Identity of one `parse` call.
///
/// Ids come from a process-wide counter and are never reused, so keying a
/// cache on them cannot leak state across unrelated queries — even two
/// parses of the same text get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct QueryId(u64);

static NEXT_QUERY_ID: AtomicU64 = AtomicU64::new(0);

impl QueryId {
    /// Allocates the next id.
    pub(crate) fn next() -> Self {
        Self(NEXT_QUERY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A non-fatal problem the parser worked around.
///
/// Warnings never stop a parse; they mark the result as suspect for
/// consumers that care (the classifier labels any warned query `bogus`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseWarning {
    /// A phrase quote was never closed; the phrase runs to end of input.
    UnbalancedQuotes {
        /// Range of the repaired phrase.
        span: Span,
    },
    /// A `+`/`-`/`!` operator had nothing to apply to and was dropped.
    DanglingOperator {
        /// Range of the dropped operator.
        span: Span,
    },
    /// An `OR` had no expression on one side and was dropped.
    StrayOr {
        /// Range of the dropped `OR`.
        span: Span,
    },
    /// A parenthesis had no match and was dropped.
    UnmatchedParen {
        /// Range of the dropped parenthesis.
        span: Span,
    },
}

impl ParseWarning {
    /// Range of the input the warning refers to.
    pub fn span(&self) -> Span {
        match self {
            Self::UnbalancedQuotes { span }
            | Self::DanglingOperator { span }
            | Self::StrayOr { span }
            | Self::UnmatchedParen { span } => *span,
        }
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnbalancedQuotes { span } => {
                write!(f, "unclosed quote at offset {}", span.start)
            }
            Self::DanglingOperator { span } => {
                write!(f, "operator at offset {} has nothing to apply to", span.start)
            }
            Self::StrayOr { span } => {
                write!(f, "OR at offset {} is missing an operand", span.start)
            }
            Self::UnmatchedParen { span } => {
                write!(f, "unmatched parenthesis at offset {}", span.start)
            }
        }
    }
}

/// Reversible textual transforms the parser silently applied to the raw
/// input before tokenizing.
///
/// These are the only transforms whose traces matter downstream: the fixer
/// needs them to reconstruct the user's query text exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupFlags {
    /// A leading `~` header was stripped.
    pub tilde_header: bool,
    /// Stray question marks were stripped.
    pub stripped_question_marks: bool,
}

/// The result of parsing one query string.
///
/// Immutable after construction: visitors read the tree, never mutate it.
/// Node offsets index [`ParsedQuery::query`], the working text left after
/// cleanup (so a stripped `~` header is *not* part of it).
#[derive(Debug, Clone, Serialize)]
pub struct ParsedQuery {
    /// Identity of this parse.
    id: QueryId,
    /// Root of the tree.
    root: QueryNode,
    /// The working query text node offsets index into.
    query: String,
    /// Problems the parser worked around.
    warnings: Vec<ParseWarning>,
    /// Cleanup transforms applied before tokenizing.
    cleanups: CleanupFlags,
}

impl ParsedQuery {
    /// Assembles a parse result and assigns it a fresh identity.
    pub(crate) fn new(
        root: QueryNode,
        query: String,
        warnings: Vec<ParseWarning>,
        cleanups: CleanupFlags,
    ) -> Self {
        Self {
            id: QueryId::next(),
            root,
            query,
            warnings,
            cleanups,
        }
    }

    /// Identity of this parse.
    pub fn id(&self) -> QueryId {
        self.id
    }

    /// Root of the tree.
    pub fn root(&self) -> &QueryNode {
        &self.root
    }

    /// The working query text node offsets index into.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Problems the parser worked around.
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    /// Cleanup transforms applied before tokenizing.
    pub fn cleanups(&self) -> CleanupFlags {
        self.cleanups
    }
}
