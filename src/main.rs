mod app;
mod cli;
mod config;
mod consts;
mod error;
mod integrity;
mod output;
mod pipeline;
mod session;
mod utils;

use std::process::ExitCode;

use clap::Parser;

use cli::Cli;
use config::Config;
use utils::init_logging;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug, cli.quiet);

    // An explicitly named config must load; the default locations are best effort
    let config = match &cli.config {
        Some(path) => match Config::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => Config::load(),
    };
    let cli = cli.with_config(&config);

    match app::run(&cli, &config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
