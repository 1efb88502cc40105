//! Swiftlite checker
//!
//! A front end for a Swift-inspired language subset: every source file is
//! analyzed by several independent pipelines and their diagnostics are
//! reconciled into confirmed and advisory findings.

mod consensus;
mod frontend;
mod types;
mod utils;

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Parser as ClapParser, Subcommand};
use serde_json::json;

use consensus::{ConsensusEngine, ConsensusRecord, ConsensusReport, PipelineConfig};
use frontend::Lexer;
use utils::{Category, Error, Result};

/// Swiftlite checker
#[derive(ClapParser, Debug)]
#[command(name = "slc")]
#[command(version = "0.1.0")]
#[command(about = "Swiftlite checker - multi-pipeline analysis for a Swift-inspired subset")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input source file (checked when no subcommand is given)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Also print advisory findings (below-quorum)
    #[arg(long, global = true)]
    advisory: bool,

    /// Emit machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Pipeline to run, as NAME or NAME:strict (repeatable).
    /// Defaults to alpha, beta and gamma:strict.
    #[arg(long = "pipeline", value_name = "SPEC", global = true)]
    pipelines: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a source file and report consensus findings
    Check {
        /// Input source file
        input: PathBuf,
    },
    /// Print the token stream of a source file
    Tokens {
        /// Input source file
        input: PathBuf,
    },
    /// Print version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Some(Commands::Check { input }) => check_file(input, &cli),
        Some(Commands::Tokens { input }) => print_tokens(input, &cli),
        Some(Commands::Version) => {
            println!("slc 0.1.0");
            println!("Swiftlite checker");
            Ok(0)
        }
        None => {
            if let Some(input) = cli.input.clone() {
                check_file(&input, &cli)
            } else {
                eprintln!("Error: No input file specified");
                eprintln!("Usage: slc <FILE> or slc check <FILE>");
                process::exit(2);
            }
        }
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    }
}

/// Build the engine from --pipeline specs, or the default three pipelines.
fn build_engine(specs: &[String]) -> Result<ConsensusEngine> {
    if specs.is_empty() {
        return Ok(ConsensusEngine::default());
    }
    let mut configs = Vec::new();
    for spec in specs {
        let config = match spec.split_once(':') {
            None => PipelineConfig::new(spec.clone()),
            Some((name, "strict")) => PipelineConfig::strict(name),
            Some(_) => return Err(Error::UnknownPipeline(spec.clone())),
        };
        configs.push(config);
    }
    Ok(ConsensusEngine::new(configs))
}

/// Analyze one file. Exit code 1 when any finding is confirmed.
fn check_file(input: &PathBuf, cli: &Cli) -> Result<i32> {
    let source = fs::read_to_string(input)?;
    let engine = build_engine(&cli.pipelines)?;
    let report = engine.analyze(&source);

    if cli.json {
        let out = json!({
            "file": input.display().to_string(),
            "pipelines": engine.pipeline_names(),
            "confirmed": report.confirmed,
            "advisory": report.advisory,
            // Reference pipeline's stream, for downstream token display
            "tokens": report.tokens,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_text_report(input, &report, engine.pipeline_names().len(), cli.advisory);
    }

    Ok(if report.has_confirmed() { 1 } else { 0 })
}

fn print_text_report(input: &PathBuf, report: &ConsensusReport, pipelines: usize, advisory: bool) {
    println!("Checking: {}", input.display());

    for record in &report.confirmed {
        print_record(record, pipelines);
    }

    if advisory {
        for record in &report.advisory {
            println!("advisory:");
            print_record(record, pipelines);
        }
    }

    if report.confirmed.is_empty() && report.advisory.is_empty() {
        println!("✅ No errors found");
        return;
    }

    println!(
        "{} confirmed ({} lexical, {} syntactic, {} semantic), {} advisory{}",
        report.confirmed.len(),
        report.confirmed_count(Category::Lexical),
        report.confirmed_count(Category::Syntactic),
        report.confirmed_count(Category::Semantic),
        report.advisory.len(),
        if !advisory && !report.advisory.is_empty() {
            " (use --advisory to show)"
        } else {
            ""
        }
    );
}

fn print_record(record: &ConsensusRecord, pipelines: usize) {
    println!(
        "line {} [{}]: {} ({}/{} pipelines)",
        record.line,
        record.category,
        record.message,
        record.pipelines.len(),
        pipelines
    );
}

/// Tokenize one file with the reference lexer and print the stream.
fn print_tokens(input: &PathBuf, cli: &Cli) -> Result<i32> {
    let source = fs::read_to_string(input)?;
    let (tokens, diagnostics) = Lexer::new(&source).tokenize();

    if cli.json {
        let out = json!({
            "file": input.display().to_string(),
            "tokens": tokens,
            "diagnostics": diagnostics,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for token in &tokens {
            if token.kind == frontend::TokenKind::Eof {
                continue;
            }
            println!(
                "{:>5}  {:<18} {}",
                token.line,
                token.kind.name(),
                token.kind.lexeme()
            );
        }
        for diagnostic in &diagnostics {
            eprintln!("{}", diagnostic);
        }
    }

    Ok(if diagnostics.is_empty() { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["slc", "check", "input.sw", "--json", "--advisory"])
            .expect("flags are global");
        assert!(cli.json);
        assert!(cli.advisory);
        assert!(matches!(cli.command, Some(Commands::Check { .. })));
    }

    #[test]
    fn test_pipeline_flag_parses_after_subcommand() {
        let cli = Cli::try_parse_from(["slc", "tokens", "input.sw", "--pipeline", "solo:strict"])
            .expect("--pipeline is global");
        assert_eq!(cli.pipelines, vec!["solo:strict".to_string()]);
    }

    #[test]
    fn test_build_engine_specs() {
        let engine =
            build_engine(&["a".to_string(), "b:strict".to_string()]).expect("valid specs");
        assert_eq!(engine.pipeline_names(), vec!["a", "b"]);

        assert!(build_engine(&["c:fuzzy".to_string()]).is_err());

        let default = build_engine(&[]).expect("default engine");
        assert_eq!(default.pipeline_names(), vec!["alpha", "beta", "gamma"]);
    }
}
