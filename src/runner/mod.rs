//! Test execution seam: the controller hands a snapshot of its tests to a
//! [`TestRunner`] and receives outcomes back through a [`ResultSink`].

mod discovery;
mod executor;

use std::future::Future;

use tokio::sync::mpsc;

use crate::error::Result;
use crate::model::{TestCase, TestState};
use crate::parser::TestResult;

pub use discovery::discover_assemblies;
pub use executor::DotnetRunner;

/// A single outcome reported by a runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultUpdate {
    pub unique_name: String,
    pub state: TestState,
    pub duration_ms: Option<u64>,
    pub error_message: Option<String>,
}

impl ResultUpdate {
    pub fn new(unique_name: impl Into<String>, state: TestState) -> Self {
        Self {
            unique_name: unique_name.into(),
            state,
            duration_ms: None,
            error_message: None,
        }
    }
}

impl From<TestResult> for ResultUpdate {
    fn from(result: TestResult) -> Self {
        Self {
            unique_name: result.test_name,
            state: result.state,
            duration_ms: Some(result.duration_ms),
            error_message: result.error_message,
        }
    }
}

/// Sending half of a controller's result channel.
#[derive(Debug, Clone)]
pub struct ResultSink {
    tx: mpsc::UnboundedSender<ResultUpdate>,
}

impl ResultSink {
    pub fn new(tx: mpsc::UnboundedSender<ResultUpdate>) -> Self {
        Self { tx }
    }

    /// Returns false once the receiving controller is gone.
    pub fn report(&self, update: ResultUpdate) -> bool {
        self.tx.send(update).is_ok()
    }
}

/// Executes tests and reports their outcomes.
///
/// The returned future runs on a spawned task; it must not assume it runs on
/// the controller's context and communicates only through `sink`.
pub trait TestRunner: Send + Sync + 'static {
    fn run(&self, tests: Vec<TestCase>, sink: ResultSink) -> impl Future<Output = Result<()>> + Send;
}
