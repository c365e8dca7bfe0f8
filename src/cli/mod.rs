// Command-line interface

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "kitchen")]
#[command(about = "Kitchen Assistant - find the best recipe for the ingredients you have", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the recipe index from the corpus and save it
    Build {
        /// Recipe corpus (CSV with name, ingredients, instructions columns)
        #[arg(short, long, env = "CORPUS_PATH")]
        corpus: Option<PathBuf>,

        /// Directory to save the index into
        #[arg(short, long, env = "INDEX_DIR")]
        index_dir: Option<PathBuf>,
    },

    /// Ask for a recipe
    Ask {
        /// Ingredients or a cooking question, e.g. "chicken, onion, tomato"
        query: String,

        /// Ask a running server instead of loading the index locally
        #[arg(long)]
        server: Option<String>,

        /// Ask the server configured by EXTERNAL_URL (or HOST and PORT)
        #[arg(long, conflicts_with = "server")]
        remote: bool,
    },

    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long, env = "HOST")]
        host: Option<String>,
    },

    /// Manage user accounts
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// Export all accounts to CSV
    Export {
        /// Output CSV file
        #[arg(short, long, env = "USERS_CSV_PATH")]
        output: Option<PathBuf>,
    },
}
