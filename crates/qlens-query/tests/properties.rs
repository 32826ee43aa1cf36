//! Property tests for the parser and the visitor plumbing.

// Integration tests live outside cfg(test) by design
#![allow(clippy::tests_outside_test_module)]

use proptest::prelude::*;
use qlens_query::{
    BooleanClause, BooleanNode, LeafState, LeafVisitor, Occur, PhraseNode, QueryNode, Span,
    WordsNode, parse,
};

/// Leaf visitor that records every word it sees with the negation flag.
#[derive(Default)]
struct Recorder {
    state: LeafState,
    seen: Vec<(String, bool)>,
}

impl Recorder {
    fn excluding(occurs: &[Occur]) -> Self {
        Self {
            state: LeafState::excluding(occurs),
            seen: Vec::new(),
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
        self.seen.push((node.text.clone(), negated));
    }
}

fn occur_strategy() -> impl Strategy<Value = Occur> {
    prop_oneof![
        Just(Occur::Must),
        Just(Occur::MustNot),
        Just(Occur::Should),
    ]
}

/// Arbitrary trees with nested boolean structure and word/phrase leaves.
fn tree_strategy() -> impl Strategy<Value = QueryNode> {
    let leaf = prop_oneof![
        "[a-z]{1,8}".prop_map(|text| {
            QueryNode::Words(WordsNode {
                span: Span::new(0, 0),
                text,
            })
        }),
        "[a-z ]{1,12}".prop_map(|text| {
            QueryNode::Phrase(PhraseNode {
                span: Span::new(0, 0),
                text,
                stem: false,
                slop: -1,
                unbalanced: false,
            })
        }),
    ];

    leaf.prop_recursive(4, 48, 4, |inner| {
        prop::collection::vec((occur_strategy(), any::<bool>(), inner), 1..4).prop_map(|entries| {
            let clauses = entries
                .into_iter()
                .map(|(occur, explicit, node)| BooleanClause::new(occur, explicit, node))
                .collect();
            QueryNode::Boolean(BooleanNode {
                span: Span::new(0, 0),
                clauses,
            })
        })
    })
}

/// Checks that sibling spans are ordered and children stay inside parents.
fn assert_spans_nest(node: &QueryNode) {
    if let QueryNode::Boolean(inner) = node {
        let mut previous_end = inner.span.start;
        for clause in &inner.clauses {
            let span = clause.node.span();
            assert!(inner.span.contains(span), "child span escapes its parent");
            assert!(span.start >= previous_end, "sibling spans overlap");
            previous_end = span.end;
            assert_spans_nest(&clause.node);
        }
    }
}

proptest! {
    /// The negation flag returns to its pre-visit value after any tree, no
    /// matter how MUST_NOT clauses nest.
    #[test]
    fn negation_stays_balanced(tree in tree_strategy()) {
        let mut recorder = Recorder::default();
        tree.accept(&mut recorder);
        prop_assert!(!recorder.negated());
    }

    /// Excluding MUST_NOT hides every leaf under a MUST_NOT clause, however
    /// deep, and what remains is never flagged negated.
    #[test]
    fn excluding_must_not_skips_whole_subtrees(tree in tree_strategy()) {
        let mut everything = Recorder::default();
        tree.accept(&mut everything);

        let mut filtered = Recorder::excluding(&[Occur::MustNot]);
        tree.accept(&mut filtered);

        let outside_negation: Vec<_> = everything
            .seen
            .iter()
            .filter(|(_, negated)| !negated)
            .cloned()
            .collect();
        prop_assert_eq!(filtered.seen, outside_negation);
    }

    /// Arbitrary query-shaped input parses without panicking, the resulting
    /// tree traverses cleanly, and offsets stay well-nested.
    #[test]
    fn parse_is_total_over_query_text(input in r#"[a-z~?*"\\()!+: -]{0,40}"#) {
        let Ok(parsed) = parse(&input) else {
            // Only structural limits may fail, and 40 chars is under all of
            // them unless nesting runs deep; that error is still a clean one.
            return Ok(());
        };
        assert_spans_nest(parsed.root());

        let mut recorder = Recorder::default();
        parsed.root().accept(&mut recorder);
        prop_assert!(!recorder.negated());
    }
}
