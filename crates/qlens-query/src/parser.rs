//! Query parser.
//!
//! Builds a query tree from a token stream using recursive descent.
//!
//! # Grammar
//!
//! ```text
//! query   → or_seq
//! or_seq  → seq ("OR" seq)*
//! seq     → item*
//! item    → ("+" | "-" | "!") primary | words_run | primary
//! primary → WORD | PHRASE | FUZZY | PREFIX | WILDCARD | KEYWORD | "(" or_seq ")"
//! ```
//!
//! Negation never survives parsing as a node: a `-`/`!` operator becomes a
//! `MUST_NOT` clause on the spot, so the finished tree has no negated
//! variant for a visitor to trip over.
//!
//! Malformed input (stray operators, unmatched parentheses, a dangling `OR`)
//! degrades to warnings and a best-effort tree. The only hard failures are
//! the structural limits in [`ParseOptions`].

use crate::{
    ast::{
        BooleanClause, BooleanNode, EmptyNode, FuzzyNode, KeywordNode, Occur, PhraseNode,
        PhrasePrefixNode, PrefixNode, QueryNode, Span, WildcardNode, WordsNode,
    },
    cleanup,
    error::QueryParseError,
    keyword::KeywordTable,
    lexer::{self, Token, TokenKind},
    parsed::{ParseWarning, ParsedQuery},
};

/// Structural limits and keyword features for one parse.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Maximum query length in characters; longer input fails the parse.
    pub max_query_length: usize,
    /// Maximum group nesting depth; deeper input fails the parse.
    pub max_depth: usize,
    /// Keyword features the lexer recognizes.
    pub keywords: KeywordTable,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_query_length: 300,
            max_depth: 10,
            keywords: KeywordTable::builtin(),
        }
    }
}

/// Parses a raw query with default options.
pub fn parse(raw: &str) -> Result<ParsedQuery, QueryParseError> {
    parse_with(raw, &ParseOptions::default())
}

/// Parses a raw query with the given options.
pub fn parse_with(raw: &str, options: &ParseOptions) -> Result<ParsedQuery, QueryParseError> {
    let length = raw.chars().count();
    if length > options.max_query_length {
        return Err(QueryParseError::too_long(
            raw,
            length,
            options.max_query_length,
        ));
    }

    let cleaned = cleanup::clean(raw);
    let (tokens, warnings) = lexer::tokenize(&cleaned.text, &options.keywords);
    let parser = Parser {
        tokens,
        position: 0,
        query: &cleaned.text,
        max_depth: options.max_depth,
        warnings,
    };
    let (root, warnings) = parser.parse()?;
    Ok(ParsedQuery::new(root, cleaned.text, warnings, cleaned.flags))
}

/// One clause-to-be: a node plus the occur its operator (or absence of one)
/// implies.
struct Item {
    /// The boolean requirement.
    occur: Occur,
    /// True if the user wrote the operator.
    explicit: bool,
    /// The wrapped node.
    node: QueryNode,
}

/// Recursive descent parser over the token stream.
struct Parser<'a> {
    /// Token stream to parse.
    tokens: Vec<Token>,
    /// Current position in the token stream.
    position: usize,
    /// The working query text, for word-run slicing and error context.
    query: &'a str,
    /// Maximum group nesting depth.
    max_depth: usize,
    /// Warnings accumulated so far (seeded by the lexer).
    warnings: Vec<ParseWarning>,
}

impl Parser<'_> {
    /// Parses the token stream into a root node.
    fn parse(mut self) -> Result<(QueryNode, Vec<ParseWarning>), QueryParseError> {
        let root = self
            .parse_or_seq(0)?
            .unwrap_or_else(|| QueryNode::Empty(EmptyNode { span: Span::new(0, 0) }));
        Ok((root, self.warnings))
    }

    /// Parses: or_seq → seq ("OR" seq)*
    ///
    /// At nesting depth 0 this consumes the whole stream; inside a group it
    /// stops before the closing parenthesis.
    fn parse_or_seq(&mut self, depth: usize) -> Result<Option<QueryNode>, QueryParseError> {
        let mut arms = Vec::new();

        loop {
            let items = self.parse_seq(depth)?;
            let arm = collapse_seq(items);
            let had_arm = arm.is_some();
            if let Some(node) = arm {
                arms.push(node);
            }

            let or_span = match self.peek() {
                Some(token) if matches!(token.kind, TokenKind::Or) => token.span,
                _ => break,
            };
            self.advance();
            if !had_arm {
                self.warnings.push(ParseWarning::StrayOr { span: or_span });
            }
            if self.at_seq_end(depth) {
                self.warnings.push(ParseWarning::StrayOr { span: or_span });
                break;
            }
        }

        Ok(match arms.len() {
            0 => None,
            1 => arms.pop(),
            _ => {
                let clauses: Vec<BooleanClause> = arms
                    .into_iter()
                    .map(|node| BooleanClause::new(Occur::Should, true, node))
                    .collect();
                Some(QueryNode::Boolean(BooleanNode {
                    span: envelope(&clauses),
                    clauses,
                }))
            }
        })
    }

    /// Parses: seq → item*, stopping before `OR`, end of input, or (inside
    /// a group) the closing parenthesis.
    fn parse_seq(&mut self, depth: usize) -> Result<Vec<Item>, QueryParseError> {
        let mut items = Vec::new();

        loop {
            let Some(token) = self.peek() else { break };
            let span = token.span;
            match token.kind {
                TokenKind::Or => break,
                TokenKind::RParen => {
                    if depth > 0 {
                        break;
                    }
                    self.warnings.push(ParseWarning::UnmatchedParen { span });
                    self.advance();
                }
                TokenKind::Plus | TokenKind::Minus => self.parse_operator_item(depth, &mut items)?,
                TokenKind::Word(_) => {
                    let node = self.parse_words_run();
                    items.push(Item {
                        occur: Occur::Must,
                        explicit: false,
                        node,
                    });
                }
                _ => {
                    if let Some(node) = self.parse_primary(depth)? {
                        items.push(Item {
                            occur: Occur::Must,
                            explicit: false,
                            node,
                        });
                    }
                }
            }
        }

        Ok(items)
    }

    /// Parses an operator chain followed by a primary.
    ///
    /// Only the last operator of a chain applies; the others are dangling.
    /// An operator with nothing after it is dangling too.
    fn parse_operator_item(
        &mut self,
        depth: usize,
        items: &mut Vec<Item>,
    ) -> Result<(), QueryParseError> {
        let (mut occur, mut op_span) = self.read_operator();
        while matches!(
            self.peek().map(|token| &token.kind),
            Some(TokenKind::Plus | TokenKind::Minus)
        ) {
            self.warnings.push(ParseWarning::DanglingOperator { span: op_span });
            (occur, op_span) = self.read_operator();
        }

        match self.parse_primary(depth)? {
            Some(node) => items.push(Item {
                occur,
                explicit: true,
                node,
            }),
            None => self.warnings.push(ParseWarning::DanglingOperator { span: op_span }),
        }
        Ok(())
    }

    /// Consumes the operator token at the current position.
    fn read_operator(&mut self) -> (Occur, Span) {
        let token = &self.tokens[self.position];
        let occur = match token.kind {
            TokenKind::Plus => Occur::Must,
            _ => Occur::MustNot,
        };
        let span = token.span;
        self.advance();
        (occur, span)
    }

    /// Parses a single primary, or returns `None` at a sequence boundary.
    fn parse_primary(&mut self, depth: usize) -> Result<Option<QueryNode>, QueryParseError> {
        let Some(token) = self.peek() else {
            return Ok(None);
        };
        let span = token.span;

        let node = match token.kind.clone() {
            TokenKind::Word(text) => {
                self.advance();
                QueryNode::Words(WordsNode { span, text })
            }
            TokenKind::Phrase {
                text,
                stem,
                slop,
                unbalanced,
                prefix,
            } => {
                self.advance();
                if prefix {
                    QueryNode::PhrasePrefix(PhrasePrefixNode { span, text })
                } else {
                    QueryNode::Phrase(PhraseNode {
                        span,
                        text,
                        stem,
                        slop,
                        unbalanced,
                    })
                }
            }
            TokenKind::Fuzzy { term, distance } => {
                self.advance();
                QueryNode::Fuzzy(FuzzyNode {
                    span,
                    term,
                    distance,
                })
            }
            TokenKind::Prefix { term } => {
                self.advance();
                QueryNode::Prefix(PrefixNode { span, term })
            }
            TokenKind::Wildcard { pattern } => {
                self.advance();
                QueryNode::Wildcard(WildcardNode { span, pattern })
            }
            TokenKind::Keyword {
                feature,
                key,
                delimiter,
                value,
            } => {
                self.advance();
                QueryNode::Keyword(KeywordNode {
                    span,
                    feature,
                    key,
                    delimiter,
                    value,
                })
            }
            TokenKind::LParen => return self.parse_group(depth, span),
            TokenKind::Plus | TokenKind::Minus | TokenKind::Or | TokenKind::RParen => {
                return Ok(None);
            }
        };

        Ok(Some(node))
    }

    /// Parses a parenthesized group, consuming the surrounding parentheses.
    fn parse_group(
        &mut self,
        depth: usize,
        open_span: Span,
    ) -> Result<Option<QueryNode>, QueryParseError> {
        if depth + 1 > self.max_depth {
            return Err(QueryParseError::too_deep(
                self.query,
                open_span.start,
                self.max_depth,
            ));
        }
        self.advance(); // consume (

        let inner = self.parse_or_seq(depth + 1)?;

        if matches!(
            self.peek().map(|token| &token.kind),
            Some(TokenKind::RParen)
        ) {
            self.advance();
        } else {
            self.warnings
                .push(ParseWarning::UnmatchedParen { span: open_span });
        }

        Ok(inner)
    }

    /// Merges consecutive word tokens into a single words run.
    ///
    /// The run text is the raw query slice spanning first to last word, so
    /// inner whitespace survives exactly as written.
    fn parse_words_run(&mut self) -> QueryNode {
        let first = self.tokens[self.position].span;
        let mut end = first.end;
        self.advance();

        while let Some(token) = self.peek() {
            if !matches!(token.kind, TokenKind::Word(_)) {
                break;
            }
            end = token.span.end;
            self.advance();
        }

        let span = Span::new(first.start, end);
        QueryNode::Words(WordsNode {
            span,
            text: self.query[span.start..span.end].to_string(),
        })
    }

    /// True if the current position ends a sequence at this depth.
    fn at_seq_end(&self, depth: usize) -> bool {
        match self.peek() {
            None => true,
            Some(token) => depth > 0 && matches!(token.kind, TokenKind::RParen),
        }
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    /// Advances past the current token.
    fn advance(&mut self) {
        self.position += 1;
    }
}

/// Collapses a parsed sequence into a node.
///
/// A single implicit item is its own root (no boolean wrapper), which is
/// what keeps `foo bar` and `"foo bar"` at depth zero.
fn collapse_seq(items: Vec<Item>) -> Option<QueryNode> {
    match items.len() {
        0 => None,
        1 if !items[0].explicit && items[0].occur == Occur::Must => {
            items.into_iter().next().map(|item| item.node)
        }
        _ => {
            let clauses: Vec<BooleanClause> = items
                .into_iter()
                .map(|item| BooleanClause::new(item.occur, item.explicit, item.node))
                .collect();
            Some(QueryNode::Boolean(BooleanNode {
                span: envelope(&clauses),
                clauses,
            }))
        }
    }
}

/// Span covering all clauses of a boolean node.
fn envelope(clauses: &[BooleanClause]) -> Span {
    let start = clauses.first().map_or(0, |clause| clause.node.span().start);
    let end = clauses.last().map_or(0, |clause| clause.node.span().end);
    Span::new(start, end)
}
