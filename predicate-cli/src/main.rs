use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use predicate_core::config::load_config;
use predicate_core::logging::init_tracing;
use predicate_grammar::{
    parse_document, pick, PredicateApiBuilder, ServiceConfig, Validator, ValidatorOptions,
};
use tracing::info;

mod output;

use output::{print_accepted, print_picked, print_rejected, CliError};

#[derive(Parser)]
#[command(name = "entity-predicate")]
#[command(about = "Validate entity selection predicates", long_about = None)]
struct Cli {
    #[arg(long, global = true, env = "PREDICATE_LOG")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a document is a well-formed predicate
    Validate(ValidateArgs),
    /// Print the property at a dotted path of a JSON or YAML document
    Pick(PickArgs),
    /// Serve the HTTP validation API
    Serve(ServeArgs),
    /// Show version information
    Version,
}

#[derive(Args)]
struct ValidateArgs {
    /// Predicate document; reads stdin when omitted or `-`
    file: Option<PathBuf>,
    /// Deepest nesting accepted (defaults to PREDICATE_MAX_DEPTH)
    #[arg(long, value_parser = parse_max_depth)]
    max_depth: Option<usize>,
}

#[derive(Args)]
struct PickArgs {
    file: PathBuf,
    /// Property path such as `metadata.name` or `relations[0].targetRef`
    path: String,
}

#[derive(Args)]
struct ServeArgs {
    /// Address to bind (defaults to PREDICATE_BIND)
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let config = load_config()?;
    let level = cli.log_level.as_deref().or(config.log_level.as_deref());
    init_tracing(Some(level.unwrap_or("warn")))?;

    match cli.command {
        Commands::Validate(args) => {
            let options = ValidatorOptions {
                max_depth: args.max_depth.unwrap_or(config.max_depth),
            };
            validate(args.file.as_deref(), Validator::new(options))
        }
        Commands::Pick(args) => pick_property(&args.file, &args.path),
        Commands::Serve(args) => {
            let mut service = ServiceConfig::from(&config);
            if let Some(bind) = args.bind {
                service.bind_address = bind;
            }
            let validator = Validator::new(ValidatorOptions::from(&config));
            let shutdown = PredicateApiBuilder::new(validator).serve(service).await?;
            tokio::signal::ctrl_c()
                .await
                .map_err(|err| CliError::Other(err.into()))?;
            info!("shutting down predicate service");
            let _ = shutdown.send(());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Version => {
            println!("entity-predicate v{}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn validate(file: Option<&Path>, validator: Validator) -> Result<ExitCode, CliError> {
    let origin = match file {
        Some(path) if path != Path::new("-") => path.display().to_string(),
        _ => "<stdin>".to_string(),
    };
    let raw = read_source(file)?;
    let document = parse_document(&raw, Path::new(&origin))?;

    match validator.validate(&document) {
        Ok(predicate) => {
            print_accepted(&origin, &predicate)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            print_rejected(&origin, &err);
            Ok(ExitCode::from(2))
        }
    }
}

fn pick_property(file: &Path, path: &str) -> Result<ExitCode, CliError> {
    let raw = read_source(Some(file))?;
    let document = parse_document(&raw, file)?;
    match pick(&document, path) {
        Some(value) => {
            print_picked(value)?;
            Ok(ExitCode::SUCCESS)
        }
        None => Err(CliError::NothingPicked {
            path: format!("{}:{}", file.display(), path),
        }),
    }
}

fn parse_max_depth(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(depth) if depth > 0 => Ok(depth),
        Ok(_) => Err("depth must be at least 1".to_string()),
        Err(err) => Err(err.to_string()),
    }
}

fn read_source(file: Option<&Path>) -> Result<String, CliError> {
    match file {
        Some(path) if path != Path::new("-") => {
            std::fs::read_to_string(path).map_err(|source| CliError::Read {
                origin: path.display().to_string(),
                source,
            })
        }
        _ => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .map_err(|source| CliError::Read {
                    origin: "<stdin>".to_string(),
                    source,
                })?;
            Ok(raw)
        }
    }
}
