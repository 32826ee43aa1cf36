//! Locating and splicing the fixable span of a query.
//!
//! A "fixable" span is the one stretch of plain text in a query that a
//! spelling corrector may safely replace: the longest word run (or bare
//! `intitle:` value) that needs no re-escaping. [`QueryFixer`] finds it in
//! a single traversal and can splice a replacement back into the original
//! query text byte-for-byte, re-adding the stripped `~` header and keyword
//! prefix as needed.
//!
//! Anything that would make reconstruction lossy disqualifies the whole
//! query: phrases, fuzzy/prefix/wildcard terms, explicit operators, and
//! negation of anything but a clean keyword. A query that both kept an
//! escaped `?` inside a wildcard and had stray `?` stripped is also
//! unfixable, because the stripped characters cannot be put back.

use std::collections::HashMap;

use qlens_query::{
    BooleanClause, FuzzyNode, KeywordNode, LeafState, LeafVisitor, Occur, ParsedQuery, PhraseNode,
    PhrasePrefixNode, PrefixNode, QueryId, QueryNode, Span, WildcardNode, WordsNode,
};
use thiserror::Error;

/// Errors from misusing the fixer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FixError {
    /// `fix` was called before `fixable_part` ever ran the scan.
    #[error("fix() called before fixable_part(); run the scan first")]
    ScanRequired,
}

/// A replacement for the fixable span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replacement<'a> {
    /// Plain text; the surrounding query text passes through untouched.
    Plain(&'a str),
    /// HTML-safe text; the surrounding query text is HTML-escaped so the
    /// whole result stays safe to embed.
    Html(&'a str),
}

/// The reconstructed query, in the same wrapping mode as the replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixedQuery {
    /// Plain reconstruction.
    Plain(String),
    /// HTML-escaped reconstruction.
    Html(String),
}

impl FixedQuery {
    /// The reconstructed text, whichever mode it is in.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Plain(text) | Self::Html(text) => text,
        }
    }
}

/// The best fixable span found by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate {
    /// Range of the replaced text in the working query (for keyword
    /// candidates this covers the key and colon too).
    span: Span,
    /// The replaceable text itself.
    text: String,
    /// The keyword key to re-emit in front of the replacement, if the
    /// candidate is a keyword value.
    keyword: Option<String>,
}

/// Scan state: the traversal runs once, lazily.
#[derive(Debug, Clone)]
enum Scan {
    /// No traversal yet; `fix` refuses to run.
    Pending,
    /// Traversal done, with the surviving candidate if any.
    Done(Option<Candidate>),
}

/// Finds the fixable span of one parsed query and splices replacements.
///
/// An instance is tied to the query it was created for; the traversal runs
/// on the first [`QueryFixer::fixable_part`] call and its outcome is kept
/// for the lifetime of the instance.
pub struct QueryFixer<'q> {
    /// The query under inspection.
    query: &'q ParsedQuery,
    /// Cached traversal outcome.
    scan: Scan,
}

impl<'q> QueryFixer<'q> {
    /// Creates a fixer for `query`. No traversal happens yet.
    pub fn new(query: &'q ParsedQuery) -> Self {
        Self {
            query,
            scan: Scan::Pending,
        }
    }

    /// Returns the fixable text, scanning the tree on the first call.
    pub fn fixable_part(&mut self) -> Option<&str> {
        if matches!(self.scan, Scan::Pending) {
            self.scan = Scan::Done(run_scan(self.query));
        }
        match &self.scan {
            Scan::Done(Some(candidate)) => Some(candidate.text.as_str()),
            _ => None,
        }
    }

    /// Splices `replacement` into the query in place of the fixable span.
    ///
    /// Requires [`QueryFixer::fixable_part`] to have run first; returns
    /// `Ok(None)` when the query has no fixable span. The replacement has
    /// the characters `` ~ ? * " \ `` backslash-escaped in both modes; in
    /// [`Replacement::Html`] mode the untouched prefix and suffix are
    /// HTML-escaped as well.
    pub fn fix(&self, replacement: Replacement<'_>) -> Result<Option<FixedQuery>, FixError> {
        let Scan::Done(outcome) = &self.scan else {
            return Err(FixError::ScanRequired);
        };
        let Some(candidate) = outcome else {
            return Ok(None);
        };

        let query = self.query.query();
        let mut prefix = String::new();
        if self.query.cleanups().tilde_header {
            prefix.push('~');
        }
        prefix.push_str(&query[..candidate.span.start]);
        if let Some(key) = &candidate.keyword {
            prefix.push_str(key);
            prefix.push(':');
        }
        let suffix = &query[candidate.span.end..];

        Ok(Some(match replacement {
            Replacement::Plain(text) => {
                FixedQuery::Plain(format!("{prefix}{}{suffix}", escape_query_text(text)))
            }
            Replacement::Html(text) => FixedQuery::Html(format!(
                "{}{}{}",
                escape_html(&prefix),
                escape_query_text(text),
                escape_html(suffix)
            )),
        }))
    }
}

/// Bounded memo of scan outcomes, keyed by query identity.
///
/// For batch jobs that revisit the same parsed queries, this skips repeat
/// traversals. It is an optimization only: a cache-produced fixer behaves
/// exactly like a fresh one whose scan already ran. When the bound is
/// exceeded the whole map is dropped at once; queries parse fast enough
/// that partial eviction is not worth the bookkeeping.
///
/// The cache is not synchronized. Share it behind a lock or give each
/// thread its own; the owner decides.
pub struct FixerCache {
    /// Entry bound; exceeding it clears the map.
    capacity: usize,
    /// Scan outcomes by query identity.
    scans: HashMap<QueryId, Option<Candidate>>,
}

impl FixerCache {
    /// Creates a cache bounded to `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            scans: HashMap::new(),
        }
    }

    /// Returns a fixer for `query`, scanning at most once per query
    /// identity.
    pub fn fixer<'q>(&mut self, query: &'q ParsedQuery) -> QueryFixer<'q> {
        if let Some(outcome) = self.scans.get(&query.id()) {
            return QueryFixer {
                query,
                scan: Scan::Done(outcome.clone()),
            };
        }

        let outcome = run_scan(query);
        if self.scans.len() >= self.capacity {
            self.scans.clear();
        }
        self.scans.insert(query.id(), outcome.clone());
        QueryFixer {
            query,
            scan: Scan::Done(outcome),
        }
    }

    /// Number of memoized scans.
    pub fn len(&self) -> usize {
        self.scans.len()
    }

    /// True if nothing is memoized.
    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }
}

impl Default for FixerCache {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Runs the candidate scan over a query.
fn run_scan(query: &ParsedQuery) -> Option<Candidate> {
    let mut scan = CandidateScan::default();
    query.root().accept(&mut scan);

    if scan.is_complex {
        return None;
    }
    if scan.has_qmark_wildcard && query.cleanups().stripped_question_marks {
        return None;
    }
    scan.candidate
}

/// Accumulator for one candidate scan.
#[derive(Default)]
struct CandidateScan {
    /// Shared leaf-visitor bookkeeping (no occur exclusions).
    state: LeafState,
    /// Best candidate so far.
    candidate: Option<Candidate>,
    /// Size of the best candidate: characters for word runs, raw bytes for
    /// keyword values. The differing metrics are longstanding behavior;
    /// unifying them would reorder candidates in deployed queries.
    current_size: usize,
    /// Saw a wildcard whose pattern contains a literal `?`.
    has_qmark_wildcard: bool,
    /// Saw something that makes reconstruction unsafe.
    is_complex: bool,
}

impl LeafVisitor for CandidateScan {
    fn state(&self) -> &LeafState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut LeafState {
        &mut self.state
    }

    fn visit_clause(&mut self, clause: &BooleanClause) {
        if clause.explicit {
            self.is_complex = true;
        }
        if clause.occur == Occur::MustNot {
            // Negating a keyword with a clean value is still reconstructible;
            // negating anything else is not.
            let clean_keyword = matches!(
                &clause.node,
                QueryNode::Keyword(node) if !contains_unsafe(&node.value)
            );
            if !clean_keyword {
                self.is_complex = true;
            }
        }
        self.walk_clause(clause);
    }

    fn visit_words(&mut self, node: &WordsNode) {
        if self.negated() {
            return;
        }
        let size = node.text.chars().count();
        if size > self.current_size && !contains_unsafe(&node.text) {
            self.current_size = size;
            self.candidate = Some(Candidate {
                span: node.span,
                text: node.text.clone(),
                keyword: None,
            });
        }
    }

    fn visit_phrase(&mut self, _node: &PhraseNode) {
        self.is_complex = true;
    }

    fn visit_phrase_prefix(&mut self, _node: &PhrasePrefixNode) {
        self.is_complex = true;
    }

    fn visit_fuzzy(&mut self, _node: &FuzzyNode) {
        self.is_complex = true;
    }

    fn visit_prefix(&mut self, _node: &PrefixNode) {
        self.is_complex = true;
    }

    fn visit_wildcard(&mut self, node: &WildcardNode) {
        self.is_complex = true;
        if node.pattern.contains('?') {
            self.has_qmark_wildcard = true;
        }
    }

    fn visit_keyword(&mut self, node: &KeywordNode) {
        if node.key != "intitle" || !node.delimiter.is_empty() || self.negated() {
            return;
        }
        let size = node.value.len();
        if size > self.current_size && !contains_unsafe(&node.value) {
            self.current_size = size;
            self.candidate = Some(Candidate {
                span: node.span,
                text: node.value.clone(),
                keyword: Some(node.key.clone()),
            });
        }
    }
}

/// True if `text` contains a character that would need re-escaping.
fn contains_unsafe(text: &str) -> bool {
    text.contains(['*', '?', '"', '\\'])
}

/// Backslash-escapes the query metacharacters in a replacement.
fn escape_query_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '~' | '?' | '*' | '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Minimal HTML entity escaping for prefix/suffix text in wrapped mode.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
