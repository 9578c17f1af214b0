use anyhow::Result;
use clap::Parser;

use dotdensity::cli::{Cli, Commands};
use dotdensity::commands;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match &cli.command {
        Commands::Dots(args) => commands::dots(args),
        Commands::Supplement(args) => commands::supplement(args),
        Commands::Render(args) => commands::render(args),
    }
}
