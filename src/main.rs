use brook::config::{self, Config};
use brook::diagnostic::report_diagnostics;
use brook::stdlib::Host;
use brook::{EXIT_IO, run_source};

use yansi::Paint;

use std::fs;
use std::process;

fn main() {
    config::init_tracing();
    let config = Config::from_env();
    if !config.color {
        yansi::disable();
    }

    let args: Vec<String> = std::env::args().collect();

    // a missing script prints usage but still exits 0
    let Some(path) = args.get(1) else {
        print_usage();
        return;
    };

    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{} could not read '{}': {}", "error:".red().bold(), path, e);
            process::exit(EXIT_IO);
        }
    };

    let outcome = run_source(&source, &config, Host::stdio());
    report_diagnostics(path, &source, &outcome.diagnostics, config.color);
    process::exit(outcome.exit_code());
}

fn print_usage() {
    println!("{} brook <script.brk>", "Usage:".bold());
    println!();
    println!("Environment:");
    println!(
        "  BROOK_MAX_CALL_DEPTH   Nested call limit (default {})",
        config::DEFAULT_MAX_CALL_DEPTH
    );
    println!("  NO_COLOR               Disable coloured output");
    println!("  RUST_LOG               Enable tracing, e.g. RUST_LOG=brook=debug");
}
