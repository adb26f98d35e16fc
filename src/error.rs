use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("No test projects found in {0}")]
    NoTestProjects(PathBuf),

    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to run dotnet: {0}")]
    DotnetExecution(String),

    #[error("Failed to parse TRX file: {0}")]
    TrxParse(String),

    #[error("A test run is already in progress")]
    RunInProgress,

    #[error("Duplicate test name: {0}")]
    DuplicateTest(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid test state: {0}")]
    InvalidState(String),

    #[error("Test run task failed: {0}")]
    RunnerTask(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DeckError>;
