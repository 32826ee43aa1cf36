//! Keyword-feature identities and the table the lexer resolves keys against.
//!
//! Keyword features themselves (what `intitle:` actually *does* against an
//! index) live outside this crate; here they are opaque identities attached
//! to the [`crate::ast::KeywordNode`]s they produced, so analyses can filter
//! by feature without interpreting it.

use std::collections::BTreeMap;

use serde::Serialize;

/// Opaque, comparable identity of a keyword feature.
///
/// Two nodes produced by the same feature carry equal `FeatureId`s. Analyses
/// compare these for identity only; nothing else about the feature is
/// visible through the AST.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FeatureId(String);

impl FeatureId {
    /// Returns the identity for the feature registered under `name`.
    pub fn of(name: &str) -> Self {
        Self(name.to_string())
    }

    /// The feature's registered name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

/// The set of keyword features the lexer recognizes.
///
/// A word of the form `key:value` only becomes a keyword node when `key` is
/// present in this table; otherwise it stays an ordinary word.
#[derive(Debug, Clone)]
pub struct KeywordTable {
    /// Registered features, keyed by the key text that triggers them.
    features: BTreeMap<String, FeatureId>,
}

impl KeywordTable {
    /// Creates a table with no registered features.
    pub fn empty() -> Self {
        Self {
            features: BTreeMap::new(),
        }
    }

    /// Creates the table of built-in keyword features.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        for name in ["intitle", "incategory", "insource"] {
            table.add(name);
        }
        table
    }

    /// Registers a feature under `name`, returning its identity.
    ///
    /// Registering the same name twice is idempotent.
    pub fn add(&mut self, name: &str) -> FeatureId {
        self.features
            .entry(name.to_string())
            .or_insert_with(|| FeatureId::of(name))
            .clone()
    }

    /// Looks up the feature registered for `key`, if any.
    pub fn lookup(&self, key: &str) -> Option<&FeatureId> {
        self.features.get(key)
    }

    /// Names of all registered features, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::builtin()
    }
}
