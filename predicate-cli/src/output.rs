use colored::*;
use predicate_grammar::{Predicate, PredicateError};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read {origin}: {source}")]
    Read {
        origin: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Predicate(#[from] PredicateError),
    #[error("no value at `{path}`")]
    NothingPicked { path: String },
    #[error("failed to render output: {0}")]
    Render(#[from] serde_json::Error),
    #[error(transparent)]
    Core(#[from] predicate_core::CoreError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub fn print_accepted(origin: &str, predicate: &Predicate) -> Result<(), CliError> {
    eprintln!(
        "{} {} (depth {}, {} field paths)",
        "✔ valid predicate:".green().bold(),
        origin.bold(),
        predicate.depth(),
        predicate.field_paths().len()
    );
    println!("{}", serde_json::to_string_pretty(predicate)?);
    Ok(())
}

pub fn print_rejected(origin: &str, err: &PredicateError) {
    eprintln!("{} {}", "✘ invalid predicate:".red().bold(), origin.bold());
    match (err.path(), err.violation()) {
        (Some(path), Some(reason)) => {
            eprintln!("  at   {}", path.yellow());
            eprintln!("  why  {reason}");
        }
        _ => eprintln!("  {err}"),
    }
}

pub fn print_picked(value: &Value) -> Result<(), CliError> {
    match value {
        Value::String(text) => println!("{text}"),
        other => println!("{}", serde_json::to_string_pretty(other)?),
    }
    Ok(())
}
