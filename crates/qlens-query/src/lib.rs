//! Search-query parsing and AST for qlens.
//!
//! This crate turns a free-text search query into a typed tree and lets
//! analyses walk that tree through a visitor protocol:
//!
//! - **Words**: `rust errors` - a run of plain words
//! - **Phrases**: `"error handling"` - exact sequences, with `~N` slop and
//!   `~` stem markers
//! - **Negation**: `-deprecated` - clauses that must NOT match
//! - **OR**: `rust OR golang` - alternatives
//! - **Grouping**: `(a b) OR (c d)` - precedence control
//! - **Keywords**: `intitle:guide` - pluggable `key:value` operators
//! - **Fuzzy/prefix/wildcard**: `rust~1`, `rust*`, `ru*t`
//!
//! Parsing is deliberately forgiving: stray operators, unmatched quotes and
//! parentheses degrade to warnings on the [`ParsedQuery`], and only
//! structural limits (length, nesting depth) fail with a
//! [`QueryParseError`]. The finished tree never contains a negated node;
//! negation is resolved into `MUST_NOT` clauses during parsing.
//!
//! # Example
//!
//! ```
//! use qlens_query::{parse, QueryNode};
//!
//! let parsed = parse("intitle:guide (rust OR golang) -deprecated").unwrap();
//! assert!(matches!(parsed.root(), QueryNode::Boolean(_)));
//! assert!(parsed.warnings().is_empty());
//! ```

#![warn(missing_docs)]

mod ast;
mod cleanup;
mod error;
mod keyword;
mod lexer;
mod parsed;
mod parser;
mod visit;

pub use ast::{
    BooleanClause, BooleanNode, EmptyNode, FuzzyNode, InvalidOccur, KeywordNode,
    NamespaceHeaderNode, Occur, PhraseNode, PhrasePrefixNode, PrefixNode, QueryNode, Span,
    WildcardNode, WordsNode,
};
pub use error::{ParseErrorKind, QueryParseError};
pub use keyword::{FeatureId, KeywordTable};
pub use parsed::{CleanupFlags, ParseWarning, ParsedQuery, QueryId};
pub use parser::{ParseOptions, parse, parse_with};
pub use visit::{KeywordNodeVisitor, LeafState, LeafVisitor, QueryVisitor};
