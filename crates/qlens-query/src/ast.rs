//! Query abstract syntax tree.
//!
//! Represents parsed search queries before compilation to a backend search
//! engine. The tree is immutable after construction: the parser builds it,
//! analyses walk it through the visitor protocol in [`crate::visit`].

use std::fmt;

use serde::Serialize;

use crate::keyword::FeatureId;

/// A half-open byte range `[start, end)` into the query text a node was
/// parsed from.
///
/// Offsets always index the *working* query text stored on
/// [`crate::ParsedQuery`] (the raw input after cleanup transforms), so a
/// node's original source text is exactly `&query[span.start..span.end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl Span {
    /// Creates a span covering `start..end`.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length of the covered text in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True if the span covers no text.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True if `other` lies entirely within this span.
    pub fn contains(&self, other: Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Boolean requirement attached to a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Occur {
    /// The clause must match.
    Must,
    /// The clause must not match.
    MustNot,
    /// The clause is optional and only affects ranking.
    Should,
}

impl fmt::Display for Occur {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Must => "MUST",
            Self::MustNot => "MUST_NOT",
            Self::Should => "SHOULD",
        };
        write!(f, "{name}")
    }
}

/// Error returned when parsing an [`Occur`] from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidOccur {
    /// The rejected input.
    pub value: String,
}

impl fmt::Display for InvalidOccur {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid occur value {:?} (expected MUST, MUST_NOT, or SHOULD)",
            self.value
        )
    }
}

impl std::error::Error for InvalidOccur {}

impl std::str::FromStr for Occur {
    type Err = InvalidOccur;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "MUST" => Ok(Self::Must),
            "MUST_NOT" => Ok(Self::MustNot),
            "SHOULD" => Ok(Self::Should),
            other => Err(InvalidOccur {
                value: other.to_string(),
            }),
        }
    }
}

/// A run of plain words with no operators, e.g. `foo bar`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordsNode {
    /// Source range of the run.
    pub span: Span,
    /// The run text exactly as written.
    pub text: String,
}

/// A quoted phrase, e.g. `"foo bar"`, `"foo bar"~2`, or `"foo bar"~`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhraseNode {
    /// Source range including quotes and any suffix.
    pub span: Span,
    /// The phrase content with escapes resolved.
    pub text: String,
    /// True if the phrase carries the stem marker (`"..."~`).
    pub stem: bool,
    /// Phrase slop; -1 when unset.
    pub slop: i32,
    /// True if the closing quote was missing and the parser repaired it.
    pub unbalanced: bool,
}

/// A quoted phrase whose last word is a prefix, e.g. `"foo bar*"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhrasePrefixNode {
    /// Source range including quotes.
    pub span: Span,
    /// The phrase content with the trailing `*` removed.
    pub text: String,
}

/// A fuzzy term, e.g. `foo~` or `foo~1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FuzzyNode {
    /// Source range including the fuzziness suffix.
    pub span: Span,
    /// The term without the suffix.
    pub term: String,
    /// Maximum edit distance.
    pub distance: u8,
}

/// A prefix term, e.g. `foo*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrefixNode {
    /// Source range including the trailing `*`.
    pub span: Span,
    /// The prefix without the trailing `*`.
    pub term: String,
}

/// A wildcard term, e.g. `f*o` or `fo\?`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WildcardNode {
    /// Source range of the pattern.
    pub span: Span,
    /// The pattern exactly as written, escapes included.
    pub pattern: String,
}

/// The absence of any query content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmptyNode {
    /// Source range (always empty).
    pub span: Span,
}

/// A keyword-feature application, e.g. `intitle:foo` or `incategory:"x y"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordNode {
    /// Source range from the key through the end of the value.
    pub span: Span,
    /// Identity of the keyword feature that recognized this expression.
    pub feature: FeatureId,
    /// The key as written, without the colon.
    pub key: String,
    /// The value delimiter: `"` for quoted values, empty for bare ones.
    pub delimiter: String,
    /// The value exactly as written, without delimiters.
    pub value: String,
}

/// A namespace header, e.g. `all:` or `1,2:`.
///
/// Reserved: the parser never produces this variant today, but visitors must
/// account for it so that enabling it later is a compile-time-visible change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceHeaderNode {
    /// Source range of the header.
    pub span: Span,
    /// Numeric namespaces the query is restricted to.
    pub namespaces: Vec<u32>,
}

/// One clause of a [`BooleanNode`]: a node plus its boolean requirement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BooleanClause {
    /// The boolean requirement on the inner node.
    pub occur: Occur,
    /// True if the user wrote the operator rather than it being implied.
    pub explicit: bool,
    /// The wrapped node.
    pub node: QueryNode,
}

impl BooleanClause {
    /// Creates a clause wrapping `node`.
    pub fn new(occur: Occur, explicit: bool, node: QueryNode) -> Self {
        Self {
            occur,
            explicit,
            node,
        }
    }

    /// Dispatches this clause to the visitor's clause method.
    pub fn accept<V: crate::visit::QueryVisitor + ?Sized>(&self, visitor: &mut V) {
        visitor.visit_clause(self);
    }
}

/// An ordered sequence of boolean clauses.
///
/// Clause order is source order; it drives classification depth and fixer
/// tie-breaking, so it must never be re-sorted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BooleanNode {
    /// Source range covering all clauses.
    pub span: Span,
    /// The clauses in source order.
    pub clauses: Vec<BooleanClause>,
}

/// A parsed query node.
///
/// This is a closed set: every visitor implements one method per variant, so
/// adding a variant breaks every visitor at compile time rather than at
/// runtime. Negation is *not* representable here; the parser resolves it into
/// [`Occur::MustNot`] clauses before the tree is handed out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum QueryNode {
    /// A run of plain words.
    Words(WordsNode),
    /// A quoted phrase.
    Phrase(PhraseNode),
    /// A quoted phrase ending in a prefix.
    PhrasePrefix(PhrasePrefixNode),
    /// A fuzzy term.
    Fuzzy(FuzzyNode),
    /// A prefix term.
    Prefix(PrefixNode),
    /// A wildcard term.
    Wildcard(WildcardNode),
    /// Nothing here.
    Empty(EmptyNode),
    /// A keyword-feature application.
    Keyword(KeywordNode),
    /// A namespace header (reserved, never produced today).
    NamespaceHeader(NamespaceHeaderNode),
    /// Boolean composition of clauses.
    Boolean(BooleanNode),
}

impl QueryNode {
    /// Source range of this node.
    pub fn span(&self) -> Span {
        match self {
            Self::Words(node) => node.span,
            Self::Phrase(node) => node.span,
            Self::PhrasePrefix(node) => node.span,
            Self::Fuzzy(node) => node.span,
            Self::Prefix(node) => node.span,
            Self::Wildcard(node) => node.span,
            Self::Empty(node) => node.span,
            Self::Keyword(node) => node.span,
            Self::NamespaceHeader(node) => node.span,
            Self::Boolean(node) => node.span,
        }
    }

    /// Dispatches to exactly one visitor method, chosen by this node's
    /// variant.
    pub fn accept<V: crate::visit::QueryVisitor + ?Sized>(&self, visitor: &mut V) {
        match self {
            Self::Words(node) => visitor.visit_words(node),
            Self::Phrase(node) => visitor.visit_phrase(node),
            Self::PhrasePrefix(node) => visitor.visit_phrase_prefix(node),
            Self::Fuzzy(node) => visitor.visit_fuzzy(node),
            Self::Prefix(node) => visitor.visit_prefix(node),
            Self::Wildcard(node) => visitor.visit_wildcard(node),
            Self::Empty(node) => visitor.visit_empty(node),
            Self::Keyword(node) => visitor.visit_keyword(node),
            Self::NamespaceHeader(node) => visitor.visit_namespace_header(node),
            Self::Boolean(node) => visitor.visit_boolean(node),
        }
    }

    /// Formats the node as a tree structure with the given indentation level.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        match self {
            Self::Words(node) => writeln!(f, "{prefix}Words({:?})", node.text),
            Self::Phrase(node) => {
                write!(f, "{prefix}Phrase({:?}", node.text)?;
                if node.stem {
                    write!(f, ", stem")?;
                }
                if node.slop >= 0 {
                    write!(f, ", slop={}", node.slop)?;
                }
                if node.unbalanced {
                    write!(f, ", unbalanced")?;
                }
                writeln!(f, ")")
            }
            Self::PhrasePrefix(node) => writeln!(f, "{prefix}PhrasePrefix({:?})", node.text),
            Self::Fuzzy(node) => writeln!(f, "{prefix}Fuzzy({:?}, {})", node.term, node.distance),
            Self::Prefix(node) => writeln!(f, "{prefix}Prefix({:?})", node.term),
            Self::Wildcard(node) => writeln!(f, "{prefix}Wildcard({:?})", node.pattern),
            Self::Empty(_) => writeln!(f, "{prefix}Empty"),
            Self::Keyword(node) => writeln!(
                f,
                "{prefix}Keyword({}:{}{}{})",
                node.key, node.delimiter, node.value, node.delimiter
            ),
            Self::NamespaceHeader(node) => {
                writeln!(f, "{prefix}NamespaceHeader({:?})", node.namespaces)
            }
            Self::Boolean(node) => {
                writeln!(f, "{prefix}Boolean")?;
                for clause in &node.clauses {
                    let marker = if clause.explicit { "!" } else { "" };
                    writeln!(f, "{prefix}  {}{marker}", clause.occur)?;
                    clause.node.fmt_tree(f, indent + 2)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn words(start: usize, end: usize, text: &str) -> QueryNode {
        QueryNode::Words(WordsNode {
            span: Span::new(start, end),
            text: text.to_string(),
        })
    }

    #[test]
    fn occur_from_str_roundtrip() {
        for occur in [Occur::Must, Occur::MustNot, Occur::Should] {
            assert_eq!(Occur::from_str(&occur.to_string()).unwrap(), occur);
        }
    }

    #[test]
    fn occur_from_str_rejects_unknown() {
        let err = Occur::from_str("FILTER").unwrap_err();
        assert_eq!(err.value, "FILTER");
        assert!(err.to_string().contains("invalid occur"));
    }

    #[test]
    fn span_containment() {
        let outer = Span::new(0, 10);
        assert!(outer.contains(Span::new(2, 5)));
        assert!(outer.contains(outer));
        assert!(!outer.contains(Span::new(5, 11)));
    }

    #[test]
    fn display_renders_boolean_tree() {
        let tree = QueryNode::Boolean(BooleanNode {
            span: Span::new(0, 8),
            clauses: vec![
                BooleanClause::new(Occur::MustNot, true, words(1, 4, "foo")),
                BooleanClause::new(Occur::Must, false, words(5, 8, "bar")),
            ],
        });

        let rendered = tree.to_string();
        assert!(rendered.contains("Boolean"));
        assert!(rendered.contains("MUST_NOT!"));
        assert!(rendered.contains("Words(\"foo\")"));
        assert!(rendered.contains("MUST\n"));
    }

    #[test]
    fn display_renders_phrase_modifiers() {
        let node = QueryNode::Phrase(PhraseNode {
            span: Span::new(0, 11),
            text: "foo bar".to_string(),
            stem: false,
            slop: 2,
            unbalanced: false,
        });
        assert!(node.to_string().contains("slop=2"));
    }
}
