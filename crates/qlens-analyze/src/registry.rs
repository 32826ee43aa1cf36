//! Name-keyed registry of query classifiers.
//!
//! The registry is assembled once — built-in classifier first, then any
//! extensions — and freezes itself before it is handed out, so lookups can
//! be shared across threads without locking. Every label a classifier can
//! produce is claimed exclusively at registration time; two classifiers
//! reporting the same label would make their output ambiguous.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use qlens_query::ParsedQuery;
use thiserror::Error;

use crate::classify::BasicQueryClassifier;

/// A query classifier usable through the registry.
pub trait Classifier: Send + Sync {
    /// Name the classifier is registered under.
    fn name(&self) -> &str;

    /// Every label this classifier can produce.
    fn classes(&self) -> Vec<String>;

    /// Classifies one query.
    fn classify(&self, query: &ParsedQuery) -> BTreeSet<String>;
}

impl std::fmt::Debug for dyn Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("name", &self.name())
            .finish()
    }
}

/// Errors from building or querying the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Registration was attempted after the registry froze.
    #[error("classifier registry is frozen; register classifiers at construction time")]
    Frozen,

    /// A classifier with this name already exists.
    #[error("classifier {name:?} is already registered")]
    DuplicateName {
        /// The contested name.
        name: String,
    },

    /// A label is already claimed by another classifier.
    #[error("class label {label:?} is already claimed by classifier {owner:?}")]
    DuplicateLabel {
        /// The contested label.
        label: String,
        /// Name of the classifier that claimed it first.
        owner: String,
    },

    /// A classifier declared no labels at all.
    #[error("classifier {name:?} declares no class labels")]
    NoClasses {
        /// Name of the offending classifier.
        name: String,
    },

    /// No classifier is registered under this name.
    #[error("unknown classifier: {name:?}")]
    UnknownClassifier {
        /// The requested name.
        name: String,
    },
}

/// Frozen name-to-classifier map.
#[derive(Clone, Debug)]
pub struct ClassifierRegistry {
    /// Registered classifiers by name.
    classifiers: BTreeMap<String, Arc<dyn Classifier>>,
    /// Which classifier claimed each label.
    claims: BTreeMap<String, String>,
    /// Set once construction finishes; registration fails afterwards.
    frozen: bool,
}

impl ClassifierRegistry {
    /// Builds a registry holding only the built-in classifier.
    pub fn new() -> Self {
        match Self::with_extensions(|_| Ok(())) {
            Ok(registry) => registry,
            Err(_) => unreachable!("built-in classifier registration is conflict-free"),
        }
    }

    /// Builds a registry, letting `extend` register additional classifiers
    /// before the registry freezes.
    ///
    /// The built-in classifier is registered first, so extensions cannot
    /// claim its name or labels.
    pub fn with_extensions(
        extend: impl FnOnce(&mut Self) -> Result<(), RegistryError>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self {
            classifiers: BTreeMap::new(),
            claims: BTreeMap::new(),
            frozen: false,
        };
        registry.register(Arc::new(BasicQueryClassifier))?;
        extend(&mut registry)?;
        registry.frozen = true;
        Ok(registry)
    }

    /// Registers a classifier.
    pub fn register(&mut self, classifier: Arc<dyn Classifier>) -> Result<(), RegistryError> {
        if self.frozen {
            return Err(RegistryError::Frozen);
        }

        let name = classifier.name().to_string();
        if self.classifiers.contains_key(&name) {
            return Err(RegistryError::DuplicateName { name });
        }

        let classes = classifier.classes();
        if classes.is_empty() {
            return Err(RegistryError::NoClasses { name });
        }
        for label in &classes {
            if let Some(owner) = self.claims.get(label) {
                return Err(RegistryError::DuplicateLabel {
                    label: label.clone(),
                    owner: owner.clone(),
                });
            }
        }

        for label in classes {
            self.claims.insert(label, name.clone());
        }
        self.classifiers.insert(name, classifier);
        Ok(())
    }

    /// Registers a plain function as a classifier.
    ///
    /// `classes` is the full label set the function may return; it must not
    /// be empty.
    pub fn register_fn(
        &mut self,
        name: impl Into<String>,
        classes: Vec<String>,
        func: impl Fn(&ParsedQuery) -> BTreeSet<String> + Send + Sync + 'static,
    ) -> Result<(), RegistryError> {
        self.register(Arc::new(FnClassifier {
            name: name.into(),
            classes,
            func: Box::new(func),
        }))
    }

    /// Looks up a classifier by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Classifier>, RegistryError> {
        self.classifiers
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownClassifier {
                name: name.to_string(),
            })
    }

    /// Names of all registered classifiers, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classifiers.keys().map(String::as_str)
    }

    /// True once construction has completed.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}

impl Default for ClassifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Adapter wrapping a plain function into the classifier contract.
struct FnClassifier {
    /// Registered name.
    name: String,
    /// Labels the function promises to stay within.
    classes: Vec<String>,
    /// The classification function.
    func: Box<dyn Fn(&ParsedQuery) -> BTreeSet<String> + Send + Sync>,
}

impl Classifier for FnClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn classes(&self) -> Vec<String> {
        self.classes.clone()
    }

    fn classify(&self, query: &ParsedQuery) -> BTreeSet<String> {
        (self.func)(query)
    }
}

#[cfg(test)]
mod tests {
    use qlens_query::parse;

    use super::*;

    fn long_query_classifier(registry: &mut ClassifierRegistry) -> Result<(), RegistryError> {
        registry.register_fn("length", vec!["long_query".to_string()], |query| {
            if query.query().len() > 20 {
                BTreeSet::from(["long_query".to_string()])
            } else {
                BTreeSet::new()
            }
        })
    }

    #[test]
    fn builtin_is_always_present() {
        let registry = ClassifierRegistry::new();
        assert!(registry.is_frozen());
        let basic = registry.get(BasicQueryClassifier::NAME).unwrap();
        let labels = basic.classify(&parse("foo bar").unwrap());
        assert_eq!(labels, BTreeSet::from(["simple_bag_of_words".to_string()]));
    }

    #[test]
    fn unknown_name_fails() {
        let registry = ClassifierRegistry::new();
        let err = registry.get("nope").unwrap_err();
        assert!(matches!(err, RegistryError::UnknownClassifier { .. }));
    }

    #[test]
    fn registration_after_freeze_fails() {
        let mut registry = ClassifierRegistry::new();
        let err = long_query_classifier(&mut registry).unwrap_err();
        assert!(matches!(err, RegistryError::Frozen));
    }

    #[test]
    fn extensions_register_before_freeze() {
        let registry = ClassifierRegistry::with_extensions(long_query_classifier).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["basic", "length"]);

        let length = registry.get("length").unwrap();
        let labels = length.classify(&parse("a rather long query indeed").unwrap());
        assert_eq!(labels, BTreeSet::from(["long_query".to_string()]));
    }

    #[test]
    fn duplicate_label_is_rejected() {
        let err = ClassifierRegistry::with_extensions(|registry| {
            registry.register_fn("rival", vec!["complex_query".to_string()], |_| BTreeSet::new())
        })
        .unwrap_err();
        assert!(
            matches!(err, RegistryError::DuplicateLabel { label, owner }
                if label == "complex_query" && owner == "basic")
        );
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let err = ClassifierRegistry::with_extensions(|registry| {
            registry.register_fn("basic", vec!["other".to_string()], |_| BTreeSet::new())
        })
        .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName { name } if name == "basic"));
    }

    #[test]
    fn empty_label_list_is_rejected() {
        let err = ClassifierRegistry::with_extensions(|registry| {
            registry.register_fn("hollow", Vec::new(), |_| BTreeSet::new())
        })
        .unwrap_err();
        assert!(matches!(err, RegistryError::NoClasses { name } if name == "hollow"));
    }

    #[test]
    fn frozen_registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClassifierRegistry>();
    }
}
