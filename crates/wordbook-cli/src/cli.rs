use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wordbook")]
#[command(about = "Offline-first vocabulary notebook")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// User whose wordbook to open (falls back to WORDBOOK_USER)
    #[arg(long, global = true, value_name = "ID")]
    pub user: Option<String>,

    /// Directory holding the per-user databases
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a word, translating it first when online
    #[command(alias = "new")]
    Add {
        /// Headword to add
        headword: String,
        /// Part of speech (repeatable)
        #[arg(long = "pos", value_name = "TAG")]
        parts_of_speech: Vec<String>,
        /// Translated meaning (repeatable)
        #[arg(long = "meaning", value_name = "TEXT")]
        meanings: Vec<String>,
        /// Store the word without asking the translation service
        #[arg(long)]
        no_translate: bool,
    },
    /// List all words alphabetically
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the most recently changed words
    Recent {
        /// Number of words to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search headwords (case-insensitive substring)
    Search {
        /// Search query
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one word in full
    Show {
        /// Entry ID or headword
        entry: String,
    },
    /// Edit a word
    Edit {
        /// Entry ID or headword
        entry: String,
        /// New headword
        #[arg(long)]
        headword: Option<String>,
        /// Replace parts of speech (repeatable)
        #[arg(long = "pos", value_name = "TAG")]
        parts_of_speech: Vec<String>,
        /// Replace translated meanings (repeatable)
        #[arg(long = "meaning", value_name = "TEXT")]
        meanings: Vec<String>,
    },
    /// Delete a word
    Delete {
        /// Entry ID or headword
        entry: String,
    },
    /// Push queued changes to the server
    Sync,
    /// Translate words that were added offline
    Translate,
    /// Show queued work and last sync
    Status,
    /// Delete every word and queued change for this user
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}
