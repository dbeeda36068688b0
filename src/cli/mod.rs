//! CLI module - Command-line interface for Tsundoku
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Tsundoku - personal anime and manga tracker
#[derive(Parser)]
#[command(name = "tsundoku")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    #[command(alias = "daemon", alias = "web")]
    Serve,

    /// Create default config file
    Init,

    /// Search the catalog
    #[command(alias = "s")]
    Search {
        /// anime or manga
        kind: String,
        /// Search query
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Show the catalog ranking
    Top {
        /// anime or manga
        kind: String,
        /// Number of titles to show
        #[arg(long, default_value = "10")]
        limit: u32,
    },

    /// Show catalog details for a title
    #[command(alias = "i")]
    Info {
        /// anime or manga
        kind: String,
        /// MAL ID
        id: i32,
    },

    /// List a user's entries
    #[command(alias = "ls", alias = "l")]
    List {
        /// Account email
        email: String,
        /// Only anime or only manga
        #[arg(long)]
        kind: Option<String>,
        /// Status word, e.g. WATCHING or PLAN_TO_READ
        #[arg(long)]
        status: Option<String>,
    },

    /// Manage accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create an already verified account and print its API key
    Create {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
    },
    /// Print the API key of an account
    ApiKey {
        /// Account email
        email: String,
    },
}

pub use commands::*;
