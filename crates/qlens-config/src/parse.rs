//! Raw TOML configuration structures.

use std::{fs, path::Path};

use serde::Deserialize;

use crate::error::ConfigError;

/// One `.qlens.toml` file, fields optional so partial files merge cleanly.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawConfig {
    /// `[limits]` section.
    #[serde(default)]
    pub limits: RawLimits,
    /// `[fixer]` section.
    #[serde(default)]
    pub fixer: RawFixer,
    /// `[keywords]` section.
    #[serde(default)]
    pub keywords: RawKeywords,
}

/// Parser limit settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawLimits {
    /// Maximum query length in characters.
    pub max_query_length: Option<usize>,
    /// Maximum group nesting depth.
    pub max_depth: Option<usize>,
}

/// Fixer cache settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawFixer {
    /// Entry bound of the per-query fixer cache.
    pub cache_size: Option<usize>,
}

/// Keyword feature settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawKeywords {
    /// Extra keyword names to recognize beyond the built-ins.
    #[serde(default)]
    pub extra: Vec<String>,
}

/// Parses a configuration file from disk.
pub fn parse_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_str(&contents, path)
}

/// Parses configuration from a TOML string.
pub fn parse_config_str(contents: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(contents: &str) -> RawConfig {
        parse_config_str(contents, Path::new("test.toml")).unwrap()
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let raw = parse("");
        assert_eq!(raw.limits.max_query_length, None);
        assert_eq!(raw.limits.max_depth, None);
        assert_eq!(raw.fixer.cache_size, None);
        assert!(raw.keywords.extra.is_empty());
    }

    #[test]
    fn full_file_parses() {
        let raw = parse(
            r#"
            [limits]
            max-query-length = 500
            max-depth = 5

            [fixer]
            cache-size = 16

            [keywords]
            extra = ["inlang", "subpageof"]
            "#,
        );
        assert_eq!(raw.limits.max_query_length, Some(500));
        assert_eq!(raw.limits.max_depth, Some(5));
        assert_eq!(raw.fixer.cache_size, Some(16));
        assert_eq!(raw.keywords.extra, vec!["inlang", "subpageof"]);
    }

    #[test]
    fn partial_sections_parse() {
        let raw = parse("[limits]\nmax-depth = 3\n");
        assert_eq!(raw.limits.max_depth, Some(3));
        assert_eq!(raw.limits.max_query_length, None);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let err = parse_config_str("[limits\n", Path::new("bad.toml")).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn wrong_type_is_an_error() {
        let err =
            parse_config_str("[limits]\nmax-depth = \"deep\"\n", Path::new("bad.toml"))
                .unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
    }
}
