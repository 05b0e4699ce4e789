//! CLI module for the Financbase workflow service

pub mod serve;

use clap::{Parser, Subcommand};

/// Financbase Workflows - workflow editing and management API
#[derive(Parser)]
#[command(name = "financbase-workflows")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the API server
    Serve,
}
