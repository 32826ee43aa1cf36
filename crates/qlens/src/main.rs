//! Command-line interface for the qlens query analysis toolkit.

use std::{env, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use qlens_analyze::{ClassifierRegistry, FixedQuery, QueryFixer, Replacement};
use qlens_config::{Config, ConfigWarning};
use qlens_query::{
    CleanupFlags, ParseOptions, ParseWarning, ParsedQuery, QueryNode, parse_with,
};
use serde::Serialize;

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "qlens")]
#[command(about = "Inspect, classify, and fix search queries")]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported `qlens` subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Parse a query and print its tree
    Parse {
        /// The query to parse
        #[arg(allow_hyphen_values = true)]
        query: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Classify a query
    Classify {
        /// The query to classify
        #[arg(allow_hyphen_values = true)]
        query: String,

        /// Classifier to run [default: basic]
        #[arg(long)]
        classifier: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Find the fixable part of a query and splice in a replacement
    Fix {
        /// The query to fix
        #[arg(allow_hyphen_values = true)]
        query: String,

        /// Replacement text for the fixable part
        #[arg(allow_hyphen_values = true)]
        replacement: String,

        /// HTML-escape the surrounding query text in the output
        #[arg(long)]
        html: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    run(&cli.command)
}

/// Dispatches the parsed command line.
fn run(command: &Commands) -> ExitCode {
    let options = match load_parse_options() {
        Ok(options) => options,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let query_text = match command {
        Commands::Parse { query, .. }
        | Commands::Classify { query, .. }
        | Commands::Fix { query, .. } => query,
    };
    let parsed = match parse_with(query_text, &options) {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    match command {
        Commands::Parse { json, .. } => cmd_parse(&parsed, *json),
        Commands::Classify {
            classifier, json, ..
        } => cmd_classify(&parsed, classifier.as_deref(), *json),
        Commands::Fix {
            replacement,
            html,
            json,
            ..
        } => cmd_fix(&parsed, replacement, *html, *json),
    }
}

/// Loads configuration and turns it into parse options.
///
/// Configuration problems that have a safe fallback are reported to stderr
/// and do not stop the run.
fn load_parse_options() -> Result<ParseOptions, qlens_config::ConfigError> {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let (config, warnings) = Config::load(&cwd)?;
    for warning in &warnings {
        report_config_warning(warning);
    }

    let mut options = ParseOptions {
        max_query_length: config.limits.max_query_length,
        max_depth: config.limits.max_depth,
        ..ParseOptions::default()
    };
    for keyword in &config.keywords.extra {
        options.keywords.add(keyword);
    }
    Ok(options)
}

/// Prints one configuration warning.
fn report_config_warning(warning: &ConfigWarning) {
    eprintln!("warning: {warning}");
}

/// JSON payload for `qlens parse`.
#[derive(Serialize)]
struct ParseReport<'a> {
    /// The working query text.
    query: &'a str,
    /// Cleanup transforms the parser applied.
    cleanups: CleanupFlags,
    /// Parse warnings.
    warnings: &'a [ParseWarning],
    /// The query tree.
    root: &'a QueryNode,
}

/// Implements `qlens parse`.
fn cmd_parse(parsed: &ParsedQuery, json: bool) -> ExitCode {
    if json {
        return emit_json(&ParseReport {
            query: parsed.query(),
            cleanups: parsed.cleanups(),
            warnings: parsed.warnings(),
            root: parsed.root(),
        });
    }

    print!("{}", parsed.root());
    let cleanups = parsed.cleanups();
    if cleanups.tilde_header {
        println!("cleanup: stripped leading ~ header");
    }
    if cleanups.stripped_question_marks {
        println!("cleanup: stripped stray question marks");
    }
    for warning in parsed.warnings() {
        println!("warning: {warning}");
    }
    ExitCode::SUCCESS
}

/// Implements `qlens classify`.
fn cmd_classify(parsed: &ParsedQuery, classifier: Option<&str>, json: bool) -> ExitCode {
    let registry = ClassifierRegistry::new();
    let classifier = match registry.get(classifier.unwrap_or("basic")) {
        Ok(classifier) => classifier,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let classes = classifier.classify(parsed);
    if json {
        return emit_json(&classes);
    }
    if classes.is_empty() {
        println!("no labels");
    }
    for class in classes {
        println!("{class}");
    }
    ExitCode::SUCCESS
}

/// JSON payload for `qlens fix`.
#[derive(Serialize)]
struct FixReport<'a> {
    /// The fixable span's text, if any.
    fixable: Option<&'a str>,
    /// The reconstructed query, if a fix applied.
    fixed: Option<&'a str>,
}

/// Implements `qlens fix`.
fn cmd_fix(parsed: &ParsedQuery, replacement: &str, html: bool, json: bool) -> ExitCode {
    let mut fixer = QueryFixer::new(parsed);
    let fixable = fixer.fixable_part().map(str::to_string);

    let wrapped = if html {
        Replacement::Html(replacement)
    } else {
        Replacement::Plain(replacement)
    };
    let fixed = match fixer.fix(wrapped) {
        Ok(fixed) => fixed,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    if json {
        return emit_json(&FixReport {
            fixable: fixable.as_deref(),
            fixed: fixed.as_ref().map(FixedQuery::as_str),
        });
    }

    match fixed {
        Some(fixed) => println!("{}", fixed.as_str()),
        None => println!("query has no fixable part"),
    }
    ExitCode::SUCCESS
}

/// Serializes a value as pretty JSON to stdout.
fn emit_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(rendered) => {
            println!("{rendered}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
