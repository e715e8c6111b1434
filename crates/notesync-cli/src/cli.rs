use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "notesync")]
#[command(about = "Nextcloud Notes from the command line, with an offline cache")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the JSON config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding the local note cache
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Work offline: save locally without contacting the server
    #[arg(short = 'n', long, global = true)]
    pub nosync: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List notes, optionally filtered by a search
    List {
        /// Treat the search as a regular expression
        #[arg(short, long)]
        regex: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Search terms
        terms: Vec<String>,
    },
    /// Print one note, or every note matching a search
    Dump {
        /// Note key
        #[arg(short, long)]
        key: Option<String>,
        /// Treat the search as a regular expression
        #[arg(short, long)]
        regex: bool,
        /// Search terms
        terms: Vec<String>,
    },
    /// Create a new note from arguments, stdin (`-`) or the editor
    #[command(alias = "new")]
    Create {
        /// Note content
        content: Vec<String>,
    },
    /// Import notes from JSON (one object or an array of objects)
    Import {
        /// JSON file, or `-` for stdin
        #[arg(value_name = "PATH")]
        source: Option<PathBuf>,
    },
    /// Export notes
    Export {
        /// Export a single note
        #[arg(short, long)]
        key: Option<String>,
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Treat the search as a regular expression
        #[arg(short, long)]
        regex: bool,
        /// Search terms
        terms: Vec<String>,
    },
    /// Edit a note in $VISUAL / $EDITOR
    Edit {
        /// Note key
        #[arg(short, long)]
        key: String,
    },
    /// Delete a note
    Delete {
        /// Note key
        #[arg(short, long)]
        key: String,
    },
    /// Mark a note as favorite
    Favorite {
        /// Note key
        #[arg(short, long)]
        key: String,
    },
    /// Clear a note's favorite mark
    Unfavorite {
        /// Note key
        #[arg(short, long)]
        key: String,
    },
    /// Read or change a note's category
    Cat {
        #[command(subcommand)]
        command: CategoryCommands,
    },
    /// Sync the local cache with the server
    Sync,
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Print the category
    Get {
        /// Note key
        #[arg(short, long)]
        key: String,
    },
    /// Set the category (stored lower-cased)
    Set {
        /// Note key
        #[arg(short, long)]
        key: String,
        /// New category
        category: String,
    },
    /// Remove the category
    Rm {
        /// Note key
        #[arg(short, long)]
        key: String,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl From<ExportFormat> for notesync_core::export::ExportFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Json => Self::Json,
            ExportFormat::Markdown => Self::Markdown,
        }
    }
}
