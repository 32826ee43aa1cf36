//! Query analysis for qlens: classification and typo-fix support.
//!
//! This crate consumes the trees produced by `qlens-query` and answers two
//! questions about a query:
//!
//! - **What shape is it?** [`BasicQueryClassifier`] labels a query from one
//!   traversal (bag of words, simple phrase, mixed, complex, bogus), and
//!   [`ClassifierRegistry`] holds it alongside any extension classifiers
//!   behind stable names.
//! - **What part of it can a spell-checker touch?** [`QueryFixer`] finds
//!   the longest safely-replaceable span and splices corrections back into
//!   the original text, escaping exactly what needs escaping.
//!
//! # Example
//!
//! ```
//! use qlens_analyze::{BasicQueryClassifier, QueryClass, QueryFixer, Replacement};
//! use qlens_query::parse;
//!
//! let parsed = parse("foo bar").unwrap();
//!
//! let classes = BasicQueryClassifier.classify(&parsed);
//! assert!(classes.contains(&QueryClass::SimpleBagOfWords));
//!
//! let mut fixer = QueryFixer::new(&parsed);
//! assert_eq!(fixer.fixable_part(), Some("foo bar"));
//! ```

#![warn(missing_docs)]

mod classify;
mod fixer;
mod registry;

pub use classify::{BasicQueryClassifier, QueryClass};
pub use fixer::{FixError, FixedQuery, FixerCache, QueryFixer, Replacement};
pub use registry::{Classifier, ClassifierRegistry, RegistryError};
