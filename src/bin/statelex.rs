//! Command-line interface for statelex
//! Tokenizes a file with a bundled language or a YAML/JSON rule table and prints the tokens.
//!
//! Usage:
//!   statelex `<path>` [--language `<name>`] [--format `<format>`]   - Tokenize with a bundled language
//!   statelex `<path>` --table `<table.yaml>`                       - Tokenize with a rule table file
//!   statelex --list-languages                                    - List bundled languages
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use clap::{Arg, ArgAction, ArgMatches, Command};
use statelex::languages;
use statelex::lexer::{
    format_tokens, ConfigurationError, FormatError, OutputFormat, RuleTable, RunOptions,
};
use statelex_config::{Loader, StatelexConfig};
use std::path::Path;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
enum CliError {
    #[error("cannot read '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] statelex_config::Error),

    #[error("rule table error: {0}")]
    Table(#[from] ConfigurationError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("unknown language '{0}' (see --list-languages)")]
    UnknownLanguage(String),

    #[error("no language is associated with '{0}'; pass --language or --table")]
    NoLanguage(String),
}

fn main() {
    let matches = Command::new("statelex")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Tokenize source files with state-machine regex rule tables")
        .arg_required_else_help(true)
        .arg(
            Arg::new("path")
                .help("Path to the file to tokenize")
                .required_unless_present("list-languages")
                .index(1),
        )
        .arg(
            Arg::new("language")
                .long("language")
                .short('l')
                .help("Bundled language name or alias (default: chosen by file name)")
                .conflicts_with("table"),
        )
        .arg(
            Arg::new("table")
                .long("table")
                .short('t')
                .help("Rule table file (.yaml, .yml or .json)"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Output format: simple, raw or json (default from configuration)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Configuration file layered over the built-in defaults"),
        )
        .arg(
            Arg::new("list-languages")
                .long("list-languages")
                .help("List bundled languages")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    if matches.get_flag("list-languages") {
        handle_list_languages_command();
        return;
    }

    let path = matches
        .get_one::<String>("path")
        .expect("path is required unless listing languages");
    match run(&matches, path) {
        Ok(output) => print!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(matches: &ArgMatches, path: &str) -> Result<String, CliError> {
    let config = load_config(matches)?;
    let format: OutputFormat = config.output.format.parse()?;

    let table = resolve_table(matches, path)?;
    let table = table.with_run_options(RunOptions {
        reset_on_newline: config
            .tokenizer
            .reset_on_newline
            .unwrap_or(table.options().run.reset_on_newline),
        max_stack_depth: config.tokenizer.max_stack_depth,
        max_delegate_depth: config.tokenizer.max_delegate_depth,
    });

    let source = read(path)?;
    debug!(path = %path, table = %table.name(), bytes = source.len(), "tokenizing");
    Ok(format_tokens(table.tokenize(&source), &source, format)?)
}

fn load_config(matches: &ArgMatches) -> Result<StatelexConfig, CliError> {
    let mut loader = Loader::new();
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    if let Some(format) = matches.get_one::<String>("format") {
        loader = loader.set_override("output.format", format.as_str())?;
    }
    Ok(loader.build()?)
}

/// Picks the rule table: an explicit table file, then `--language`, then the file name.
fn resolve_table(matches: &ArgMatches, path: &str) -> Result<RuleTable, CliError> {
    if let Some(table_path) = matches.get_one::<String>("table") {
        let definition = read(table_path)?;
        let is_json = Path::new(table_path)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let table = if is_json {
            RuleTable::from_json(&definition)?
        } else {
            RuleTable::from_yaml(&definition)?
        };
        return Ok(table);
    }

    let language = match matches.get_one::<String>("language") {
        Some(name) => {
            languages::by_name(name).ok_or_else(|| CliError::UnknownLanguage(name.clone()))?
        }
        None => {
            languages::for_filename(path).ok_or_else(|| CliError::NoLanguage(path.to_string()))?
        }
    };
    Ok(language.table().clone())
}

fn read(path: &str) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_string(),
        source,
    })
}

/// Handle the --list-languages flag
fn handle_list_languages_command() {
    println!("Bundled languages:\n");
    for language in languages::all() {
        println!("  {}", language.name);
        println!(
            "    aliases: {}  files: {}",
            language.aliases.join(", "),
            language.filenames.join(", ")
        );
    }
}
