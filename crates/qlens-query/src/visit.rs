//! Visitor protocol for query trees.
//!
//! [`QueryVisitor`] is the full protocol: one required method per node
//! variant, dispatched through [`crate::ast::QueryNode::accept`]. Because
//! every method is required, adding a node variant is a compile error in
//! every visitor rather than a runtime surprise.
//!
//! Most analyses only care about leaf nodes and want the boolean plumbing
//! (occur exclusion, negation tracking) handled once. [`LeafVisitor`] does
//! exactly that: implement it instead of `QueryVisitor`, override only the
//! leaf hooks you need, and the blanket impl supplies the rest.
//! [`KeywordNodeVisitor`] narrows further to analyses that only react to
//! keyword nodes from a chosen set of features.

use crate::{
    ast::{
        BooleanClause, BooleanNode, EmptyNode, FuzzyNode, KeywordNode, NamespaceHeaderNode, Occur,
        PhraseNode, PhrasePrefixNode, PrefixNode, WildcardNode, WordsNode,
    },
    keyword::FeatureId,
};

/// The full visitor protocol: one method per node variant plus the clause
/// method.
///
/// `visit_namespace_header` exists because the variant is representable, but
/// a tree that actually reaches it indicates an upstream contract violation;
/// implementations are expected to fail loudly rather than degrade silently.
pub trait QueryVisitor {
    /// Visits a run of plain words.
    fn visit_words(&mut self, node: &WordsNode);
    /// Visits a quoted phrase.
    fn visit_phrase(&mut self, node: &PhraseNode);
    /// Visits a phrase prefix.
    fn visit_phrase_prefix(&mut self, node: &PhrasePrefixNode);
    /// Visits a fuzzy term.
    fn visit_fuzzy(&mut self, node: &FuzzyNode);
    /// Visits a prefix term.
    fn visit_prefix(&mut self, node: &PrefixNode);
    /// Visits a wildcard term.
    fn visit_wildcard(&mut self, node: &WildcardNode);
    /// Visits an empty query.
    fn visit_empty(&mut self, node: &EmptyNode);
    /// Visits a keyword-feature application.
    fn visit_keyword(&mut self, node: &KeywordNode);
    /// Visits a namespace header. Never produced by the parser today.
    fn visit_namespace_header(&mut self, node: &NamespaceHeaderNode);
    /// Visits a boolean composition.
    fn visit_boolean(&mut self, node: &BooleanNode);
    /// Visits one clause of a boolean composition.
    fn visit_clause(&mut self, clause: &BooleanClause);
}

/// Traversal bookkeeping shared by every [`LeafVisitor`]: the set of occur
/// values whose clauses are skipped entirely, and whether the traversal is
/// currently inside a `MUST_NOT` branch.
#[derive(Debug, Clone, Default)]
pub struct LeafState {
    /// Clauses with these occur values are skipped, subtree included.
    excluded: Vec<Occur>,
    /// True while visiting the inside of a `MUST_NOT` clause.
    in_negation: bool,
}

impl LeafState {
    /// State that visits every clause.
    pub fn new() -> Self {
        Self::default()
    }

    /// State that skips clauses whose occur value is in `occurs`.
    pub fn excluding(occurs: &[Occur]) -> Self {
        Self {
            excluded: occurs.to_vec(),
            in_negation: false,
        }
    }

    /// True if clauses with this occur value are skipped.
    pub fn excludes(&self, occur: Occur) -> bool {
        self.excluded.contains(&occur)
    }

    /// True while the traversal is inside a negated branch.
    pub fn in_negation(&self) -> bool {
        self.in_negation
    }

    /// Sets the negation flag. Only the clause plumbing touches this.
    pub(crate) fn set_negation(&mut self, value: bool) {
        self.in_negation = value;
    }
}

/// A visitor that only cares about leaf nodes.
///
/// Implementors embed a [`LeafState`] and expose it through the two state
/// accessors; every other method has a default. The clause plumbing skips
/// excluded occur values (the whole subtree, not just the top node) and
/// tracks negation so leaf hooks can ask [`LeafVisitor::negated`]. A type
/// that overrides [`LeafVisitor::visit_clause`] or
/// [`LeafVisitor::visit_boolean`] must route the clause through
/// [`LeafVisitor::walk_clause`] to keep that bookkeeping intact.
pub trait LeafVisitor {
    /// Read access to the shared traversal state.
    fn state(&self) -> &LeafState;

    /// Write access to the shared traversal state.
    fn state_mut(&mut self) -> &mut LeafState;

    /// True while the traversal is inside a `MUST_NOT` branch.
    fn negated(&self) -> bool {
        self.state().in_negation()
    }

    /// Visits each clause of a boolean composition, in source order.
    fn visit_boolean(&mut self, node: &BooleanNode)
    where
        Self: Sized,
    {
        for clause in &node.clauses {
            self.visit_clause(clause);
        }
    }

    /// Visits one clause. Defaults to the shared plumbing.
    fn visit_clause(&mut self, clause: &BooleanClause)
    where
        Self: Sized,
    {
        self.walk_clause(clause);
    }

    /// Occur-exclusion and negation bookkeeping for one clause.
    ///
    /// Excluded clauses are skipped without descending. For `MUST_NOT`
    /// clauses the negation flag is raised for the inner visit and restored
    /// to its prior value afterwards, so nested negation stays balanced.
    fn walk_clause(&mut self, clause: &BooleanClause)
    where
        Self: Sized,
    {
        if self.state().excludes(clause.occur) {
            return;
        }
        if clause.occur == Occur::MustNot {
            let prior = self.state().in_negation();
            self.state_mut().set_negation(true);
            clause.node.accept(self);
            self.state_mut().set_negation(prior);
        } else {
            clause.node.accept(self);
        }
    }

    /// Visits a run of plain words.
    fn visit_words(&mut self, _node: &WordsNode) {}
    /// Visits a quoted phrase.
    fn visit_phrase(&mut self, _node: &PhraseNode) {}
    /// Visits a phrase prefix.
    fn visit_phrase_prefix(&mut self, _node: &PhrasePrefixNode) {}
    /// Visits a fuzzy term.
    fn visit_fuzzy(&mut self, _node: &FuzzyNode) {}
    /// Visits a prefix term.
    fn visit_prefix(&mut self, _node: &PrefixNode) {}
    /// Visits a wildcard term.
    fn visit_wildcard(&mut self, _node: &WildcardNode) {}
    /// Visits an empty query.
    fn visit_empty(&mut self, _node: &EmptyNode) {}
    /// Visits a keyword-feature application.
    fn visit_keyword(&mut self, _node: &KeywordNode) {}
}

impl<V: LeafVisitor> QueryVisitor for V {
    fn visit_words(&mut self, node: &WordsNode) {
        LeafVisitor::visit_words(self, node);
    }

    fn visit_phrase(&mut self, node: &PhraseNode) {
        LeafVisitor::visit_phrase(self, node);
    }

    fn visit_phrase_prefix(&mut self, node: &PhrasePrefixNode) {
        LeafVisitor::visit_phrase_prefix(self, node);
    }

    fn visit_fuzzy(&mut self, node: &FuzzyNode) {
        LeafVisitor::visit_fuzzy(self, node);
    }

    fn visit_prefix(&mut self, node: &PrefixNode) {
        LeafVisitor::visit_prefix(self, node);
    }

    fn visit_wildcard(&mut self, node: &WildcardNode) {
        LeafVisitor::visit_wildcard(self, node);
    }

    fn visit_empty(&mut self, node: &EmptyNode) {
        LeafVisitor::visit_empty(self, node);
    }

    fn visit_keyword(&mut self, node: &KeywordNode) {
        LeafVisitor::visit_keyword(self, node);
    }

    fn visit_namespace_header(&mut self, node: &NamespaceHeaderNode) {
        panic!("namespace header reached a leaf visitor; the parser never emits one: {node:?}");
    }

    fn visit_boolean(&mut self, node: &BooleanNode) {
        LeafVisitor::visit_boolean(self, node);
    }

    fn visit_clause(&mut self, clause: &BooleanClause) {
        LeafVisitor::visit_clause(self, clause);
    }
}

/// A [`LeafVisitor`] whose only extension point is "what to do with a
/// matching keyword node".
///
/// Every non-keyword leaf method is finalized to a no-op; keyword nodes are
/// filtered against [`KeywordNodeVisitor::accepted`] before the
/// [`KeywordNodeVisitor::do_visit_keyword`] hook runs. An empty accepted set
/// matches every feature.
pub trait KeywordNodeVisitor {
    /// Read access to the shared traversal state.
    fn state(&self) -> &LeafState;

    /// Write access to the shared traversal state.
    fn state_mut(&mut self) -> &mut LeafState;

    /// Keyword features this visitor reacts to. Empty accepts all.
    fn accepted(&self) -> &[FeatureId];

    /// Called for each keyword node whose feature is accepted.
    fn do_visit_keyword(&mut self, node: &KeywordNode);
}

impl<K: KeywordNodeVisitor> LeafVisitor for K {
    fn state(&self) -> &LeafState {
        KeywordNodeVisitor::state(self)
    }

    fn state_mut(&mut self) -> &mut LeafState {
        KeywordNodeVisitor::state_mut(self)
    }

    fn visit_keyword(&mut self, node: &KeywordNode) {
        if self.accepted().is_empty() || self.accepted().contains(&node.feature) {
            self.do_visit_keyword(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;

    fn words(text: &str) -> QueryNode {
        QueryNode::Words(WordsNode {
            span: Span::new(0, text.len()),
            text: text.to_string(),
        })
    }

    fn keyword(key: &str, value: &str) -> QueryNode {
        QueryNode::Keyword(KeywordNode {
            span: Span::new(0, key.len() + 1 + value.len()),
            feature: FeatureId::of(key),
            key: key.to_string(),
            delimiter: String::new(),
            value: value.to_string(),
        })
    }

    fn boolean(clauses: Vec<BooleanClause>) -> QueryNode {
        QueryNode::Boolean(BooleanNode {
            span: Span::new(0, 0),
            clauses,
        })
    }

    /// Counts leaf visits and records the negation flag seen at each word.
    #[derive(Default)]
    struct Recorder {
        state: LeafState,
        visited: Vec<(String, bool)>,
    }

    impl Recorder {
        fn excluding(occurs: &[Occur]) -> Self {
            Self {
                state: LeafState::excluding(occurs),
                visited: Vec::new(),
            }
        }
    }

    impl LeafVisitor for Recorder {
        fn state(&self) -> &LeafState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut LeafState {
            &mut self.state
        }

        fn visit_words(&mut self, node: &WordsNode) {
            let negated = self.negated();
            self.visited.push((node.text.clone(), negated));
        }
    }

    #[test]
    fn excluded_occur_skips_entire_subtree() {
        // MUST_NOT wraps a nested boolean whose leaves must not be seen.
        let tree = boolean(vec![
            BooleanClause::new(Occur::Must, false, words("keep")),
            BooleanClause::new(
                Occur::MustNot,
                true,
                boolean(vec![
                    BooleanClause::new(Occur::Must, false, words("drop-a")),
                    BooleanClause::new(Occur::Must, false, words("drop-b")),
                ]),
            ),
        ]);

        let mut recorder = Recorder::excluding(&[Occur::MustNot]);
        tree.accept(&mut recorder);

        assert_eq!(recorder.visited, vec![("keep".to_string(), false)]);
    }

    #[test]
    fn negation_flag_tracks_must_not_branches() {
        let tree = boolean(vec![
            BooleanClause::new(Occur::Must, false, words("plain")),
            BooleanClause::new(
                Occur::MustNot,
                true,
                boolean(vec![
                    BooleanClause::new(Occur::Must, false, words("inner")),
                    BooleanClause::new(Occur::MustNot, true, words("double")),
                ]),
            ),
            BooleanClause::new(Occur::Should, false, words("after")),
        ]);

        let mut recorder = Recorder::default();
        tree.accept(&mut recorder);

        assert_eq!(
            recorder.visited,
            vec![
                ("plain".to_string(), false),
                ("inner".to_string(), true),
                ("double".to_string(), true),
                ("after".to_string(), false),
            ]
        );
        assert!(!recorder.negated(), "flag must be restored after the visit");
    }

    #[test]
    #[should_panic(expected = "namespace header reached a leaf visitor")]
    fn namespace_header_fails_loudly() {
        let node = QueryNode::NamespaceHeader(NamespaceHeaderNode {
            span: Span::new(0, 0),
            namespaces: vec![0],
        });
        let mut recorder = Recorder::default();
        node.accept(&mut recorder);
    }

    /// Collects values of accepted keyword nodes.
    struct KeywordCollector {
        state: LeafState,
        accepted: Vec<FeatureId>,
        seen: Vec<String>,
    }

    impl KeywordCollector {
        fn accepting(accepted: Vec<FeatureId>) -> Self {
            Self {
                state: LeafState::new(),
                accepted,
                seen: Vec::new(),
            }
        }
    }

    impl KeywordNodeVisitor for KeywordCollector {
        fn state(&self) -> &LeafState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut LeafState {
            &mut self.state
        }

        fn accepted(&self) -> &[FeatureId] {
            &self.accepted
        }

        fn do_visit_keyword(&mut self, node: &KeywordNode) {
            self.seen.push(node.value.clone());
        }
    }

    #[test]
    fn keyword_visitor_filters_by_feature() {
        let tree = boolean(vec![
            BooleanClause::new(Occur::Must, false, keyword("intitle", "foo")),
            BooleanClause::new(Occur::Must, false, keyword("insource", "bar")),
            BooleanClause::new(Occur::Must, false, words("plain")),
        ]);

        let mut only_intitle = KeywordCollector::accepting(vec![FeatureId::of("intitle")]);
        tree.accept(&mut only_intitle);
        assert_eq!(only_intitle.seen, vec!["foo".to_string()]);

        let mut all = KeywordCollector::accepting(Vec::new());
        tree.accept(&mut all);
        assert_eq!(all.seen, vec!["foo".to_string(), "bar".to_string()]);
    }
}
