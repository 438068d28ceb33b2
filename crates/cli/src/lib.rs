//! Command-line front end for `overgen-core`.
//!
//! Loads a generation document from disk, applies flag overrides, and writes
//! the emitted module to stdout or a file.

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

pub mod diff;
pub mod generate;

#[derive(Parser, Debug)]
#[command(
    name = "overgen",
    version,
    about = "Generate typed Python @overload stubs from a key to type mapping"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate overloads from a configuration file
    Generate(generate::GenerateArgs),
}

/// Parse `args` (program name first) and run the selected command.
///
/// Returns the process exit code.
pub fn run_cli(args: Vec<String>) -> i32 {
    match Cli::try_parse_from(args) {
        Ok(cli) => match cli.command {
            Some(Commands::Generate(args)) => {
                init_tracing();
                generate::run(args)
            }
            None => {
                let mut cmd = Cli::command();
                let _ = cmd.print_help();
                println!();
                0
            }
        },
        Err(e) => {
            let code = e.exit_code();
            let _ = e.print();
            code
        }
    }
}

/// Run a command body, printing its error and mapping the outcome to an exit code.
pub(crate) fn run_command<F>(f: F) -> i32
where
    F: FnOnce() -> Result<(), String>,
{
    match f() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

fn init_tracing() {
    // OVERGEN_LOG is either a plain level ("debug") applied to overgen's own
    // crates, or a full filter spec like "overgen_core=trace"
    let filter = match std::env::var("OVERGEN_LOG") {
        Ok(level) if is_plain_level(&level) => {
            format!("overgen_core={level},overgen_cli={level}")
        }
        Ok(spec) => spec,
        Err(_) => "overgen_core=warn,overgen_cli=warn".to_string(),
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}
