mod cli;
mod codegen;
mod config;
mod emit;
mod error;
mod files;
mod logging;
mod module;
mod paths;

use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = match cli::parse_from(env::args_os()) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("error: could not install logger: {}", e);
        return ExitCode::FAILURE;
    }

    let result = cli.into_config().and_then(emit::run);
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
