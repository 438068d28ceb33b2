//! `overgen generate`: render a configuration file to Python source.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use overgen_core::{GenerationDocument, TypeDescriptor};
use tracing::{debug, info};

use crate::diff::{ColorChoice, unified_diff};
use crate::run_command;

/// Arguments of the `generate` command.
#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Configuration file (.toml or .json)
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: PathBuf,

    /// Write the generated module here instead of stdout
    #[arg(long, short = 'o', value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Exit with status 1 and print a diff if the output file is out of date
    #[arg(long, requires = "out")]
    pub check: bool,

    /// Color the `--check` diff: auto, always or never
    #[arg(long, value_enum, value_name = "WHEN", default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Override generator.function_name
    #[arg(long, value_name = "NAME")]
    pub function_name: Option<String>,

    /// Override generator.key_param
    #[arg(long, value_name = "NAME")]
    pub key_param: Option<String>,

    /// Emit `async def` declarations
    #[arg(long = "async")]
    pub is_async: bool,

    /// Emit module-level functions without a `self` receiver
    #[arg(long)]
    pub no_self: bool,

    /// Override generator.return_type_fallback
    #[arg(long, value_name = "TYPE")]
    pub fallback: Option<String>,
}

/// Run the command and return its exit code.
pub fn run(args: GenerateArgs) -> i32 {
    run_command(|| run_inner(args))
}

fn run_inner(args: GenerateArgs) -> Result<(), String> {
    let mut document = load_document(&args.config)?;
    apply_overrides(&mut document, &args);

    let code = overgen_core::generate(&document)
        .map_err(|err| format!("Failed to generate overloads: {err}"))?;

    match (&args.out, args.check) {
        (Some(out), true) => check_output(out, &code, args.color.enabled()),
        (Some(out), false) => write_output(out, &code),
        (None, _) => {
            print!("{code}");
            Ok(())
        }
    }
}

/// Read and parse a generation document, choosing the format by extension.
pub fn load_document(path: &Path) -> Result<GenerationDocument, String> {
    let source = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read {}: {err}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let parsed = match extension.as_deref() {
        Some("toml") => GenerationDocument::from_toml_str(&source),
        Some("json") => GenerationDocument::from_json_str(&source),
        _ => {
            return Err(format!(
                "Unsupported configuration format for {} (expected .toml or .json)",
                path.display()
            ));
        }
    };

    debug!(path = %path.display(), "Loaded generation document.");
    parsed.map_err(|err| format!("Invalid configuration {}: {err}", path.display()))
}

/// Apply command-line overrides on top of the file's generator options.
pub fn apply_overrides(document: &mut GenerationDocument, args: &GenerateArgs) {
    let generator = &mut document.generator;
    if let Some(name) = &args.function_name {
        generator.function_name.clone_from(name);
    }
    if let Some(key_param) = &args.key_param {
        generator.key_param.clone_from(key_param);
    }
    if args.is_async {
        generator.is_async = true;
    }
    if args.no_self {
        generator.has_self = false;
    }
    if let Some(fallback) = &args.fallback {
        generator.return_type_fallback = TypeDescriptor::Text(fallback.clone());
    }
}

fn write_output(path: &Path, code: &str) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|err| format!("Failed to create {}: {err}", parent.display()))?;
    }
    fs::write(path, code).map_err(|err| format!("Failed to write {}: {err}", path.display()))?;
    info!(path = %path.display(), bytes = code.len(), "Wrote generated overloads.");
    Ok(())
}

fn check_output(path: &Path, code: &str, color: bool) -> Result<(), String> {
    let existing = match fs::read_to_string(path) {
        Ok(existing) => existing,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(format!("{} does not exist; run without --check", path.display()));
        }
        Err(err) => return Err(format!("Failed to read {}: {err}", path.display())),
    };

    let name = path.display().to_string();
    match unified_diff(&name, &existing, code, color) {
        None => {
            info!(path = %name, "Generated overloads are up to date.");
            Ok(())
        }
        Some(diff) => {
            print!("{diff}");
            Err(format!("{name} is out of date; rerun without --check"))
        }
    }
}
