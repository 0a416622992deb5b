mod cli;
mod ops;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Save { no_overwrite } => {
            ops::do_save(&ops::Target::from_cli(&cli)?, *no_overwrite)?;
        }
        Commands::Restore => {
            ops::do_restore(&ops::Target::from_cli(&cli)?)?;
        }
        Commands::Delete => {
            ops::do_delete(&ops::Target::from_cli(&cli)?)?;
        }
        Commands::Status { json } => {
            ops::do_status(&ops::Target::from_cli(&cli)?, *json)?;
        }
        Commands::Version => {
            ops::do_version();
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
