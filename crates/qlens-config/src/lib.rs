//! Configuration system for qlens.
//!
//! qlens uses TOML configuration files named `.qlens.toml`. Configuration
//! is resolved by walking up the directory tree from the current working
//! directory, collecting any `.qlens.toml` files found, then loading
//! `~/.qlens.toml` as the global config with lowest precedence. Scalar
//! settings from closer files win; extra keyword lists accumulate across
//! files.
//!
//! Unusable values (a zero limit) fall back to their defaults with a
//! warning rather than failing the load, so a bad config never takes the
//! tool down.

#![warn(missing_docs)]

mod discovery;
mod error;
mod parse;

use std::{fmt, path::Path};

pub use discovery::{CONFIG_FILENAME, discover_config_files, global_config_path};
pub use error::ConfigError;
pub use parse::{RawConfig, RawFixer, RawKeywords, RawLimits, parse_config_file, parse_config_str};

/// Parser limit settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum query length in characters.
    pub max_query_length: usize,
    /// Maximum group nesting depth.
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_query_length: 300,
            max_depth: 10,
        }
    }
}

/// Fixer cache settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixerSettings {
    /// Entry bound of the per-query fixer cache.
    pub cache_size: usize,
}

impl Default for FixerSettings {
    fn default() -> Self {
        Self { cache_size: 64 }
    }
}

/// Keyword feature settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSettings {
    /// Extra keyword names recognized beyond the built-ins.
    pub extra: Vec<String>,
}

/// Fully resolved configuration after merging all discovered files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Parser limits.
    pub limits: Limits,
    /// Fixer cache settings.
    pub fixer: FixerSettings,
    /// Keyword feature settings.
    pub keywords: KeywordSettings,
}

/// A tolerated configuration problem, reported but not fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A limit was zero and fell back to its default.
    ZeroLimit {
        /// The setting's kebab-case name.
        setting: &'static str,
        /// The default that was used instead.
        fallback: usize,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroLimit { setting, fallback } => {
                write!(f, "{setting} must be positive; using default {fallback}")
            }
        }
    }
}

impl Config {
    /// Loads configuration by discovering and merging all relevant
    /// `.qlens.toml` files.
    ///
    /// Returns the default configuration when no files exist.
    pub fn load(cwd: &Path) -> Result<(Self, Vec<ConfigWarning>), ConfigError> {
        let mut files = discover_config_files(cwd);
        if let Some(global) = global_config_path() {
            if global.is_file() && !files.contains(&global) {
                files.push(global);
            }
        }
        Self::load_from_files(&files)
    }

    /// Loads configuration from a specific list of config file paths,
    /// ordered highest-precedence first.
    pub fn load_from_files(
        files: &[std::path::PathBuf],
    ) -> Result<(Self, Vec<ConfigWarning>), ConfigError> {
        // Apply lowest precedence first so closer files overwrite.
        let mut merged = RawConfig::default();
        for path in files.iter().rev() {
            let raw = parse_config_file(path)?;
            merge_raw(&mut merged, raw);
        }
        Ok(resolve(merged))
    }
}

/// Overlays `next` (higher precedence) onto `base`.
fn merge_raw(base: &mut RawConfig, next: RawConfig) {
    if next.limits.max_query_length.is_some() {
        base.limits.max_query_length = next.limits.max_query_length;
    }
    if next.limits.max_depth.is_some() {
        base.limits.max_depth = next.limits.max_depth;
    }
    if next.fixer.cache_size.is_some() {
        base.fixer.cache_size = next.fixer.cache_size;
    }
    for keyword in next.keywords.extra {
        if !base.keywords.extra.contains(&keyword) {
            base.keywords.extra.push(keyword);
        }
    }
}

/// Turns merged raw settings into a validated [`Config`].
fn resolve(raw: RawConfig) -> (Config, Vec<ConfigWarning>) {
    let mut warnings = Vec::new();
    let defaults = Limits::default();

    let max_query_length = match raw.limits.max_query_length {
        Some(0) => {
            warnings.push(ConfigWarning::ZeroLimit {
                setting: "max-query-length",
                fallback: defaults.max_query_length,
            });
            defaults.max_query_length
        }
        Some(value) => value,
        None => defaults.max_query_length,
    };

    let max_depth = match raw.limits.max_depth {
        Some(0) => {
            warnings.push(ConfigWarning::ZeroLimit {
                setting: "max-depth",
                fallback: defaults.max_depth,
            });
            defaults.max_depth
        }
        Some(value) => value,
        None => defaults.max_depth,
    };

    let config = Config {
        limits: Limits {
            max_query_length,
            max_depth,
        },
        fixer: FixerSettings {
            cache_size: raw
                .fixer
                .cache_size
                .unwrap_or(FixerSettings::default().cache_size),
        },
        keywords: KeywordSettings {
            extra: raw.keywords.extra,
        },
    };
    (config, warnings)
}
