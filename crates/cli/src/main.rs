#![forbid(unsafe_code)]

mod store;
mod subject;

use clap::Parser;
use frontend::{compile, CompileError, RegistrationError, Type};
use interp::{run, EvalError, ExtensionResolver, Value};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use store::{SimulatedStore, StoreResolver};
use subject::{demo_registry, demo_subject, from_json, SubjectError, USER_SHAPE};
use thiserror::Error;

/// Evaluate an authorization condition against a user subject.
#[derive(Debug, Parser)]
#[command(name = "condeval", version)]
struct Args {
    /// Condition, e.g. `subject.multiFactorAuthAge() <= 3600u`
    expr: String,

    /// JSON file with the subject; defaults to the built-in demo user
    #[arg(long)]
    subject: Option<PathBuf>,

    /// Age in seconds reported by the simulated multi-factor auth store
    #[arg(long, default_value_t = 1000)]
    mfa_age: u64,

    /// Simulate an unreachable multi-factor auth store
    #[arg(long)]
    mfa_unavailable: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Message(String),
    #[error("registration error: {0}")]
    Registration(#[from] RegistrationError),
    #[error("invalid subject: {0}")]
    Subject(#[from] SubjectError),
    #[error("{}", .0)]
    Compile(#[from] CompileError),
}

/// Result of a completed evaluation. Evaluation errors are a decision too:
/// they deny.
#[derive(Debug)]
enum Outcome {
    Value(Value),
    Failed(EvalError),
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match execute(&args) {
        Ok(Outcome::Value(value)) => {
            println!("{value}");
            if let Some(allowed) = value.as_bool() {
                println!("{}", if allowed { "allow" } else { "deny" });
            }
            ExitCode::SUCCESS
        }
        Ok(Outcome::Failed(err)) => {
            eprintln!("evaluation error: {err}");
            println!("deny");
            ExitCode::from(1)
        }
        Err(CliError::Compile(err)) => {
            eprintln!("{}", err.render(&args.expr));
            ExitCode::from(2)
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(2)
        }
    }
}

fn execute(args: &Args) -> Result<Outcome, CliError> {
    let registry = demo_registry()?;
    let subject = match &args.subject {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| CliError::Message(format!("read {}: {e}", path.display())))?;
            let json: serde_json::Value = serde_json::from_str(&text)
                .map_err(|e| CliError::Message(format!("parse {}: {e}", path.display())))?;
            from_json(&registry, &Type::named(USER_SHAPE), &json)?
        }
        None => demo_subject(),
    };
    let store = if args.mfa_unavailable {
        SimulatedStore::unavailable()
    } else {
        SimulatedStore::new(args.mfa_age)
    };
    evaluate(&registry, &args.expr, &subject, &StoreResolver::new(store))
}

fn evaluate<R: ExtensionResolver>(
    registry: &frontend::SealedRegistry,
    source: &str,
    subject: &Value,
    resolver: &R,
) -> Result<Outcome, CliError> {
    let program = compile(registry, source, USER_SHAPE)?;
    tracing::info!(result_type = %program.result_type(), "compiled condition");
    Ok(match run(&program, subject, resolver) {
        Ok(value) => Outcome::Value(value),
        Err(err) => {
            tracing::warn!(error = %err, "evaluation failed; denying");
            Outcome::Failed(err)
        }
    })
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}
