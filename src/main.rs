use std::process::ExitCode;

use log::{LevelFilter, error, warn};
use shade::cli;

fn main() -> ExitCode {
    let parsed = match cli::parse(std::env::args().skip(1)) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("error: {e}");
            eprint!("{}", cli::usage());
            return ExitCode::FAILURE;
        }
    };

    // RUST_LOG still wins over the verbosity flag.
    let level = if parsed.config.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    for arg in &parsed.ignored {
        warn!("Ignoring extra argument '{}'", arg);
    }

    match shade::run(parsed.config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}
