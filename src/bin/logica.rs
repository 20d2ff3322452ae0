//! logica: command-line front end
//!
//! Runs the propositional-logic operations against the configured model and
//! prints the results as JSON.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use logica::{Config, Failure, GenerationConfig, LogicaBuilder, PromptService};

/// Propositional-logic assistant
#[derive(Parser)]
#[command(name = "logica")]
#[command(version)]
#[command(about = "Translate, tabulate and simplify propositional logic with a language model")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "LOGICA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Translate a natural-language sentence into a formula
    Translate {
        /// Sentence (or omit to read from stdin)
        sentence: Option<String>,
    },

    /// Build the truth table of a formula
    TruthTable {
        /// Formula (or omit to read from stdin)
        formula: Option<String>,
    },

    /// Simplify a formula step by step
    Simplify {
        /// Formula (or omit to read from stdin)
        formula: Option<String>,
    },

    /// Check whether two formulas are logically equivalent
    Equivalence {
        /// First formula
        a: String,
        /// Second formula
        b: String,
    },

    /// Send a raw prompt and print the decoded JSON payload
    Prompt {
        /// Prompt text (or omit to read from stdin)
        text: Option<String>,
        /// Ask the model for JSON output
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    let service = LogicaBuilder::from_config(&config).build()?;

    let code = run(&service, args.command).await?;
    service.shutdown();
    Ok(code)
}

async fn run(
    service: &PromptService,
    command: Command,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match command {
        Command::Translate { sentence } => {
            let sentence = resolve_text(sentence, "translate")?;
            print_outcome(service.translate(&sentence).await)
        }
        Command::TruthTable { formula } => {
            let formula = resolve_text(formula, "truth-table")?;
            print_outcome(service.truth_table(&formula).await)
        }
        Command::Simplify { formula } => {
            let formula = resolve_text(formula, "simplify")?;
            print_outcome(service.simplify(&formula).await)
        }
        Command::Equivalence { a, b } => print_outcome(service.check_equivalence(&a, &b).await),
        Command::Prompt { text, json } => {
            let text = resolve_text(text, "prompt")?;
            let overrides = GenerationConfig::new().json_output(json);
            match service.prompt(&text, Some(&overrides)).await {
                Ok(payload) => {
                    println!("{}", serde_json::to_string_pretty(&payload)?);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("error: {}", e.user_message());
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

fn print_outcome<T: Serialize>(
    outcome: Result<T, Failure>,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match outcome {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            eprintln!("error ({}): {}", failure.kind, failure.message);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Take input from the argument, stdin, or both (argument first).
fn resolve_text(arg: Option<String>, command: &str) -> Result<String, Box<dyn std::error::Error>> {
    let stdin_is_pipe = !io::stdin().is_terminal();
    let stdin_text = if stdin_is_pipe {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        let trimmed = buf.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    } else {
        None
    };

    match (arg, stdin_text) {
        (Some(a), Some(s)) => Ok(format!("{a}\n\n{s}")),
        (Some(a), None) => Ok(a),
        (None, Some(s)) => Ok(s),
        (None, None) => {
            Err(format!("{command}: no input provided (pass text as argument or via stdin)").into())
        }
    }
}
