use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::model::TestState;

#[derive(Parser)]
#[command(name = "testdeck")]
#[command(about = "A TUI for filtering, running, and summarizing .NET tests")]
#[command(version)]
pub struct Cli {
    /// Path to a solution file, project file, or directory containing one
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Write logs to this file (the TUI logs nowhere otherwise)
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Preload outcomes from an existing TRX file
    #[arg(long, value_name = "TRX", global = true)]
    pub results: Option<PathBuf>,

    /// Initial search text
    #[arg(long, value_name = "TEXT", global = true)]
    pub filter: Option<String>,

    /// Initial result filter: all, passed, failed, skipped, notrun
    #[arg(long, value_name = "STATE", global = true)]
    pub state: Option<TestState>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Print each assembly's filtered tests and summary
    List,
    /// Run every assembly without the TUI
    Run,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    pub fn is_headless(&self) -> bool {
        self.command.is_some()
    }
}
