//! CLI tool for pagezip archive operations.

mod commands;
mod exit_codes;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Self-extracting web page archive tool
#[derive(Parser)]
#[command(name = "pagezip")]
#[command(author, version, about = "Self-extracting web page archive tool", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    /// Suppress informational output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack a captured page into a page archive (alias: a)
    #[command(alias = "a")]
    Pack {
        /// Serialized page (JSON)
        page: PathBuf,

        /// Archive file to create
        #[arg(short = 'o', long)]
        output: PathBuf,

        /// Embed the page's visible text in the shell
        #[arg(long)]
        insert_text_body: bool,

        /// Deflate level (0-9)
        #[arg(short = 'l', long, default_value = "6")]
        level: u32,

        /// URL recorded on the root document entry
        #[arg(long)]
        url: Option<String>,
    },

    /// List archive contents (alias: l)
    #[command(alias = "l")]
    List {
        /// Archive file to list
        archive: PathBuf,
    },

    /// Extract raw entries (alias: x)
    #[command(alias = "x")]
    Extract {
        /// Archive file to extract
        archive: PathBuf,

        /// Output directory
        #[arg(short = 'o', long, default_value = ".")]
        output: PathBuf,
    },

    /// Rebuild the archived page as a standalone document
    Open {
        /// Archive file to open
        archive: PathBuf,

        /// Document to write
        #[arg(short = 'o', long, default_value = "index.html")]
        output: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.quiet { "error" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let exit_code = match cli.command {
        Commands::Pack {
            page,
            output,
            insert_text_body,
            level,
            url,
        } => commands::pack(&commands::PackConfig {
            page_path: &page,
            archive_path: &output,
            insert_text_body,
            level,
            url,
            format: cli.format,
            quiet: cli.quiet,
        }),

        Commands::List { archive } => commands::list(&archive, cli.format),

        Commands::Extract { archive, output } => {
            commands::extract(&archive, &output, cli.format, cli.quiet)
        }

        Commands::Open { archive, output } => {
            commands::open(&archive, &output, cli.format, cli.quiet)
        }
    };

    std::process::exit(exit_code.code());
}
