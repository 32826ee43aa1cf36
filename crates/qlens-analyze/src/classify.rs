//! Shape classification of parsed queries.
//!
//! [`BasicQueryClassifier`] labels a query from a single traversal of its
//! tree: is it a plain bag of words, a simple phrase, a mix, or something
//! that uses operators and therefore counts as complex. Parse warnings add
//! a `bogus_query` label independently of shape.

use std::{collections::BTreeSet, fmt};

use qlens_query::{
    BooleanClause, BooleanNode, FuzzyNode, KeywordNode, LeafState, LeafVisitor, Occur, ParsedQuery,
    PhraseNode, PhrasePrefixNode, PrefixNode, WildcardNode, WordsNode,
};
use serde::Serialize;

use crate::registry::Classifier;

/// A classification label.
///
/// The label strings are stable and suitable for external reporting; at
/// most one of the four shape labels applies to a query, while
/// [`QueryClass::BogusQuery`] can co-occur with any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryClass {
    /// Only plain word runs, no operators, no nesting.
    SimpleBagOfWords,
    /// Exactly a simple phrase, nothing else.
    SimplePhraseQuery,
    /// Word runs plus simple phrases, one level deep.
    BagOfWordsWithPhraseQuery,
    /// Anything using operators, keywords, or advanced term syntax.
    ComplexQuery,
    /// The parser had to warn about something while producing the tree.
    BogusQuery,
}

impl QueryClass {
    /// All labels, in order.
    pub const ALL: [Self; 5] = [
        Self::SimpleBagOfWords,
        Self::SimplePhraseQuery,
        Self::BagOfWordsWithPhraseQuery,
        Self::ComplexQuery,
        Self::BogusQuery,
    ];

    /// The stable label string.
    pub fn label(self) -> &'static str {
        match self {
            Self::SimpleBagOfWords => "simple_bag_of_words",
            Self::SimplePhraseQuery => "simple_phrase_query",
            Self::BagOfWordsWithPhraseQuery => "bag_of_words_with_phrase_query",
            Self::ComplexQuery => "complex_query",
            Self::BogusQuery => "bogus_query",
        }
    }
}

impl fmt::Display for QueryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accumulator for one classification traversal.
///
/// Fresh per [`BasicQueryClassifier::classify`] call, so classifier
/// instances can be reused across queries without leaking state.
#[derive(Default)]
struct ShapeScan {
    /// Shared leaf-visitor bookkeeping (no occur exclusions).
    state: LeafState,
    /// Saw at least one word run.
    has_words: bool,
    /// Saw at least one simple (unmodified, balanced) phrase.
    has_simple_phrase: bool,
    /// Saw anything that makes the query complex.
    has_complex: bool,
    /// Current clause nesting depth.
    depth: u32,
    /// Deepest clause nesting seen.
    max_depth: u32,
}

impl LeafVisitor for ShapeScan {
    fn state(&self) -> &LeafState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut LeafState {
        &mut self.state
    }

    fn visit_boolean(&mut self, node: &BooleanNode) {
        for clause in &node.clauses {
            // `has_complex` only ever goes false -> true, so stopping early
            // cannot change the outcome, just the cost.
            if self.has_complex {
                break;
            }
            self.visit_clause(clause);
        }
    }

    fn visit_clause(&mut self, clause: &BooleanClause) {
        if clause.explicit || clause.occur == Occur::MustNot {
            self.has_complex = true;
        }
        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
        self.walk_clause(clause);
        self.depth -= 1;
    }

    fn visit_words(&mut self, _node: &WordsNode) {
        self.has_words = true;
    }

    fn visit_phrase(&mut self, node: &PhraseNode) {
        if node.stem || node.slop >= 0 {
            self.has_complex = true;
        } else if !node.unbalanced {
            // An unbalanced phrase is a parser repair, not something the
            // user wrote; it counts as neither simple nor complex.
            self.has_simple_phrase = true;
        }
    }

    fn visit_phrase_prefix(&mut self, _node: &PhrasePrefixNode) {
        self.has_complex = true;
    }

    fn visit_fuzzy(&mut self, _node: &FuzzyNode) {
        self.has_complex = true;
    }

    fn visit_prefix(&mut self, _node: &PrefixNode) {
        self.has_complex = true;
    }

    fn visit_wildcard(&mut self, _node: &WildcardNode) {
        self.has_complex = true;
    }

    fn visit_keyword(&mut self, _node: &KeywordNode) {
        self.has_complex = true;
    }
}

/// Labels a query from its tree shape and parse warnings.
///
/// Instances carry no state between calls; one instance can classify any
/// number of queries, one at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicQueryClassifier;

impl BasicQueryClassifier {
    /// Name this classifier is registered under.
    pub const NAME: &'static str = "basic";

    /// Classifies one query.
    pub fn classify(&self, query: &ParsedQuery) -> BTreeSet<QueryClass> {
        let mut classes = BTreeSet::new();
        if !query.warnings().is_empty() {
            classes.insert(QueryClass::BogusQuery);
        }

        let mut scan = ShapeScan::default();
        query.root().accept(&mut scan);

        let shape = if scan.has_complex {
            Some(QueryClass::ComplexQuery)
        } else if scan.max_depth == 0 && scan.has_words && !scan.has_simple_phrase {
            Some(QueryClass::SimpleBagOfWords)
        } else if scan.max_depth == 0 && !scan.has_words && scan.has_simple_phrase {
            Some(QueryClass::SimplePhraseQuery)
        } else if scan.max_depth == 1 && scan.has_words && scan.has_simple_phrase {
            Some(QueryClass::BagOfWordsWithPhraseQuery)
        } else {
            None
        };
        classes.extend(shape);
        classes
    }
}

impl Classifier for BasicQueryClassifier {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn classes(&self) -> Vec<String> {
        QueryClass::ALL
            .iter()
            .map(|class| class.label().to_string())
            .collect()
    }

    fn classify(&self, query: &ParsedQuery) -> BTreeSet<String> {
        Self::classify(self, query)
            .into_iter()
            .map(|class| class.label().to_string())
            .collect()
    }
}
