//! Asset Tracking - Main Entry Point

mod cli;
mod config;
mod constants;
mod error;
mod logic;
mod store;

use clap::Parser;

fn main() {
    dotenvy::dotenv().ok();
    let args = cli::Cli::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    log::debug!(
        "starting {} v{}",
        constants::APP_NAME,
        constants::APP_VERSION
    );

    if let Err(e) = cli::run(args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
