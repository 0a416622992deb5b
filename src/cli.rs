use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// dbsnapshot: point-in-time snapshots of a SQL Server database
#[derive(Parser, Debug)]
#[command(
    name = "dbsnapshot",
    version,
    about = "Save, restore and delete point-in-time database snapshots.",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// ADO.NET connection string (e.g., "Server=tcp:localhost,1433;User Id=sa;Pooling=false")
    #[arg(
        short = 'c',
        long = "connection",
        env = "DBSNAPSHOT_CONNECTION",
        hide_env_values = true
    )]
    pub connection: Option<String>,

    /// Name of the database to snapshot
    #[arg(short = 'd', long = "database", env = "DBSNAPSHOT_DATABASE")]
    pub database: Option<String>,

    /// Directory holding the .dbsnapshot work directory (defaults to current directory)
    #[arg(short = 'w', long = "work-root", env = "DBSNAPSHOT_WORK_ROOT")]
    pub work_root: Option<PathBuf>,

    /// Prompt for the connection password instead of reading it from the connection string
    #[arg(long)]
    pub ask_password: bool,

    /// Increase log verbosity
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Back up the database into the work directory
    Save {
        /// Fail instead of replacing an existing snapshot
        #[arg(long)]
        no_overwrite: bool,
    },

    /// Restore the database from the saved snapshot (requires Pooling=false)
    Restore,

    /// Delete the saved snapshot and its work directory
    Delete,

    /// Show whether a snapshot exists
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print CLI version
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_save_with_globals() {
        let cli = Cli::try_parse_from([
            "dbsnapshot",
            "-c",
            "Server=x;Pooling=false",
            "-d",
            "Sales",
            "save",
            "--no-overwrite",
        ])
        .unwrap();
        assert_eq!(cli.database.as_deref(), Some("Sales"));
        assert!(matches!(cli.command, Commands::Save { no_overwrite: true }));
    }

    #[test]
    fn counts_verbosity() {
        let cli = Cli::try_parse_from(["dbsnapshot", "-vv", "status", "--json"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Status { json: true }));
    }

    #[test]
    fn verifies_command_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
