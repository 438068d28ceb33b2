//! `overgen` binary entry point.

fn main() {
    std::process::exit(overgen_cli::run_cli(std::env::args().collect()));
}
