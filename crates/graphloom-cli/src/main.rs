mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use graphloom::config::loader::load_config;
use output::print_error;

fn main() {
    if let Err(e) = run() {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
        config.validate().map_err(anyhow::Error::msg)?;
    }
    graphloom::telemetry::init_tracing(&config.logging.level);

    match &cli.command {
        Commands::Sdl(args) => commands::sdl(args, &config)?,
        Commands::Check(args) => commands::check(args, &config)?,
        Commands::Rules(args) => commands::rules(args, &config)?,
        Commands::Authorize(args) => commands::authorize(args, &config)?,
    }
    Ok(())
}
