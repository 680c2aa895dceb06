//! SheetStore CLI
//!
//! Command-line tools for SheetStore datastore maintenance.
//!
//! # Commands
//!
//! - `inspect` - Display users and worksheet counts
//! - `list` - List a user's worksheets
//! - `export` / `import` - Move worksheets through archive files
//! - `verify-archive` - Check an archive file
//! - `history` - Print a user's history
//! - `users` - Print the user directory
//! - `wipe` - Delete all data

mod commands;
mod error;

use clap::{Parser, Subcommand, ValueEnum};
use error::CliError;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// SheetStore command-line datastore tools.
#[derive(Parser)]
#[command(name = "sheetstore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the datastore directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for reporting commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Display users and worksheet counts
    Inspect {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// List a user's worksheets
    List {
        /// Owner of the worksheets
        user: String,

        /// Only list under this subpath (e.g. projects/2024)
        #[arg(short, long)]
        subpath: Option<String>,

        /// Do not descend into nested subpaths
        #[arg(long)]
        shallow: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Export a worksheet to an archive file
    Export {
        /// Owner of the worksheet
        user: String,

        /// Worksheet id
        id: u64,

        /// Archive file to write
        file: PathBuf,

        /// Title to record in the archive instead of the stored one
        #[arg(short, long)]
        title: Option<String>,

        /// Subpath the worksheet lives under
        #[arg(short, long)]
        subpath: Option<String>,
    },

    /// Import an archive file as a new worksheet
    Import {
        /// Owner of the new worksheet
        user: String,

        /// Id of the new worksheet
        id: u64,

        /// Archive file to read
        file: PathBuf,

        /// Subpath to place the worksheet under
        #[arg(short, long)]
        subpath: Option<String>,
    },

    /// Validate an archive file and print its metadata
    VerifyArchive {
        /// Archive file to check
        file: PathBuf,
    },

    /// Print a user's history
    History {
        /// User whose history to print
        user: String,

        /// Only print the newest N entries
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Print the user directory
    Users {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Delete every user, record and worksheet
    Wipe {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or(CliError::MissingPath("inspect"))?;
            commands::inspect::run(&path, format)?;
        }
        Commands::List {
            user,
            subpath,
            shallow,
            format,
        } => {
            let path = cli.path.ok_or(CliError::MissingPath("list"))?;
            commands::list::run(&path, &user, subpath.as_deref(), shallow, format)?;
        }
        Commands::Export {
            user,
            id,
            file,
            title,
            subpath,
        } => {
            let path = cli.path.ok_or(CliError::MissingPath("export"))?;
            let ident = commands::parse_ident(&user, id, subpath.as_deref())?;
            commands::archive::export(&path, &ident, &file, title.as_deref())?;
        }
        Commands::Import {
            user,
            id,
            file,
            subpath,
        } => {
            let path = cli.path.ok_or(CliError::MissingPath("import"))?;
            let ident = commands::parse_ident(&user, id, subpath.as_deref())?;
            commands::archive::import(&path, &ident, &file)?;
        }
        Commands::VerifyArchive { file } => {
            commands::archive::verify(&file)?;
        }
        Commands::History { user, limit } => {
            let path = cli.path.ok_or(CliError::MissingPath("history"))?;
            commands::history::run(&path, &user, limit)?;
        }
        Commands::Users { format } => {
            let path = cli.path.ok_or(CliError::MissingPath("users"))?;
            commands::users::run(&path, format)?;
        }
        Commands::Wipe { yes } => {
            let path = cli.path.ok_or(CliError::MissingPath("wipe"))?;
            commands::wipe::run(&path, yes)?;
        }
        Commands::Version => {
            println!("SheetStore CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("SheetStore Core v{}", sheetstore_core::VERSION);
        }
    }

    Ok(())
}
