use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// article: Operator tool for versioned article documents.
///
/// Check which schema version a document is at, list the migration steps
/// this build knows, and run the startup migration by hand.
#[derive(Parser)]
#[command(name = "article", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the document's version and which steps would run.
    Status {
        /// Path to the JSON document.
        file: PathBuf,
    },

    /// Migrate the document to the current version in place.
    Migrate {
        /// Path to the JSON document.
        file: PathBuf,

        /// Write indented JSON instead of the compact form.
        #[arg(long)]
        pretty: bool,

        /// Copy the previous content to `<file>.bak` before replacing it.
        #[arg(long)]
        backup: bool,

        /// Report what would happen without writing anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// List the registered migration steps.
    Steps,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("warn,article_cli=info,article_store=info,article_migrate=info")
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = match cli.command {
        Commands::Status { file } => commands::status(&file),
        Commands::Migrate {
            file,
            pretty,
            backup,
            dry_run,
        } => commands::migrate(&file, pretty, backup, dry_run),
        Commands::Steps => commands::steps(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
