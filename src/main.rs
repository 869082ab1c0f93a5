use anyhow::Result;
use clap::{Parser, Subcommand};

use std::path::PathBuf;
use std::process::ExitCode;

mod align;
mod commands;
mod logging;

use commands::{ListKind, OutputFormat};

#[derive(Parser)]
#[command(
    name = "autoledger",
    version,
    about = "Check ledger journals and apply their automatic transactions",
    long_about = "Parses ledger-style journals, resolves elided posting amounts, \
                  and shows the postings that automatic transactions (`= /regex/` \
                  rules) derive from the postings they match."
)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a journal and report transactions that cannot be built
    Check {
        /// Journal file
        journal: PathBuf,
    },

    /// Show the postings derived by automatic transactions
    Derive {
        /// Journal file
        journal: PathBuf,
        /// Definition file holding the rules; defaults to the journal's own
        #[arg(long, env = "AUTOLEDGER_RULES")]
        rules: Option<PathBuf>,
        /// Column at which decimal points of derived amounts line up
        #[arg(long, env = "AUTOLEDGER_DOT_COLUMN", default_value_t = align::DEFAULT_DOT_COLUMN)]
        dot_column: usize,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Line up posting amounts on their decimal point
    Align {
        /// Journal file
        journal: PathBuf,
        #[arg(long, env = "AUTOLEDGER_DOT_COLUMN", default_value_t = align::DEFAULT_DOT_COLUMN)]
        dot_column: usize,
        /// Rewrite the file instead of printing the result
        #[arg(short, long)]
        write: bool,
    },

    /// List what a file declares with its commands
    List {
        #[arg(value_enum)]
        kind: ListKind,
        /// Journal or definition file
        file: PathBuf,
        /// Only names containing this text, ignoring case
        #[arg(short, long)]
        search: Option<String>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init_tracing(&cli.log_level);

    match cli.command {
        Commands::Check { journal } => commands::check(&journal),
        Commands::Derive {
            journal,
            rules,
            dot_column,
            format,
        } => commands::derive(&journal, rules.as_deref(), dot_column, format),
        Commands::Align {
            journal,
            dot_column,
            write,
        } => commands::align(&journal, dot_column, write),
        Commands::List { kind, file, search } => commands::list(kind, &file, search.as_deref()),
    }
}
