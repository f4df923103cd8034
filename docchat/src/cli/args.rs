//! CLI argument definitions.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// docchat - ask questions about your PDF collections from the terminal
#[derive(Parser, Debug)]
#[command(name = "docchat")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Backend base URL [default: http://localhost:8000]
    #[arg(long, global = true, value_name = "URL")]
    pub backend: Option<String>,

    /// File the session token is persisted in [default: ~/.docchat/session]
    #[arg(long, global = true, value_name = "PATH")]
    pub session_file: Option<PathBuf>,

    /// Keep the session in memory only (nothing is written to disk)
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to execute (defaults to `chat`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and persist the session
    Login {
        /// Username (prompted if omitted)
        #[arg(short, long)]
        username: Option<String>,

        /// Read the password from stdin instead of prompting
        #[arg(long)]
        password_stdin: bool,
    },

    /// Forget the persisted session
    Logout,

    /// Show whether the persisted session is still valid
    Status,

    /// Check that the backend is reachable
    Ping,

    /// List collections
    Collections,

    /// Upload a PDF into a collection
    Upload {
        /// PDF file to upload
        file: PathBuf,

        /// Collection to add the document to
        #[arg(short, long)]
        collection: String,
    },

    /// Ask a single question
    Ask {
        /// Collection to ask against
        #[arg(short, long)]
        collection: String,

        /// The question
        #[arg(trailing_var_arg = true, required = true)]
        question: Vec<String>,
    },

    /// Check whether a name is acceptable as a collection name
    CheckName {
        /// Proposed collection name
        name: String,
    },

    /// Interactive chat session
    Chat {
        /// Collection to select on start
        #[arg(short, long)]
        collection: Option<String>,
    },
}
