use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{ResultSink, ResultUpdate, TestRunner};
use crate::config::RunnerConfig;
use crate::error::{DeckError, Result};
use crate::model::{TestCase, TestState};
use crate::parser::parse_trx;

/// Runs a test project with `dotnet test` and reports results from the
/// console log as they stream, then from the TRX file once the run ends.
#[derive(Debug, Clone)]
pub struct DotnetRunner {
    dotnet: String,
    project_path: PathBuf,
    no_build: bool,
    extra_args: Vec<String>,
}

impl DotnetRunner {
    pub fn new(project_path: &Path, config: &RunnerConfig) -> Self {
        Self {
            dotnet: config.dotnet.clone(),
            project_path: project_path.to_path_buf(),
            no_build: config.no_build,
            extra_args: config.extra_args.clone(),
        }
    }

    fn trx_path(&self) -> PathBuf {
        let stem = self
            .project_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "tests".to_string());
        // projects sharing a stem may run at the same time
        let mut hasher = DefaultHasher::new();
        self.project_path.hash(&mut hasher);
        std::env::temp_dir().join(format!(
            "testdeck-{}-{}-{:016x}.trx",
            std::process::id(),
            stem,
            hasher.finish()
        ))
    }

    fn command(&self, trx_path: &Path) -> Command {
        let project_dir = self.project_path.parent().unwrap_or(Path::new("."));
        let mut cmd = Command::new(&self.dotnet);
        cmd.arg("test");
        if self.no_build {
            cmd.arg("--no-build");
        }
        cmd.args([
            "--logger",
            &format!("trx;LogFileName={}", trx_path.display()),
            "--logger",
            "console;verbosity=normal",
        ]);
        cmd.args(&self.extra_args)
            .arg(&self.project_path)
            .current_dir(project_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

impl TestRunner for DotnetRunner {
    async fn run(&self, tests: Vec<TestCase>, sink: ResultSink) -> Result<()> {
        let trx_path = self.trx_path();
        // Remove any stale file
        let _ = tokio::fs::remove_file(&trx_path).await;

        info!(project = %self.project_path.display(), tests = tests.len(), "starting dotnet test");
        let mut child = self
            .command(&trx_path)
            .spawn()
            .map_err(|e| DeckError::DotnetExecution(format!("Failed to start dotnet: {}", e)))?;

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).split(b'\n');
            loop {
                match lines.next_segment().await {
                    Ok(Some(bytes)) => {
                        let line = String::from_utf8_lossy(&bytes);
                        if let Some(update) = parse_progress_line(&line) {
                            sink.report(update);
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        // progress is best effort, the TRX file is authoritative
                        warn!(error = %e, "stopped reading dotnet output");
                        break;
                    }
                }
            }
        }

        let status = child.wait().await?;

        let content = match tokio::fs::read_to_string(&trx_path).await {
            Ok(content) => content,
            Err(_) => {
                // dotnet test failed before producing results
                return Err(DeckError::DotnetExecution(format!(
                    "dotnet test did not produce results. Exit code: {}",
                    status.code().unwrap_or(-1)
                )));
            }
        };
        let _ = tokio::fs::remove_file(&trx_path).await;

        let results = parse_trx(&content)?;
        let known: HashSet<&str> = tests.iter().map(|t| t.unique_name.as_str()).collect();
        for result in results {
            if !known.contains(result.test_name.as_str()) {
                debug!(test = %result.test_name, "result for a test that was not discovered");
            }
            sink.report(result.into());
        }

        info!(project = %self.project_path.display(), success = status.success(), "dotnet test finished");
        Ok(())
    }
}

/// Parse a console logger line such as `  Passed NS.Class.Method [12 ms]`.
fn parse_progress_line(line: &str) -> Option<ResultUpdate> {
    let (outcome, rest) = line.trim().split_once(' ')?;
    let state = match outcome {
        "Passed" => TestState::Passed,
        "Failed" => TestState::Failed,
        "Skipped" => TestState::Skipped,
        _ => return None,
    };
    let name = match rest.rfind(" [") {
        Some(bracket) if rest.ends_with(']') => &rest[..bracket],
        _ => rest,
    };
    let name = name.trim();
    // summary lines look like "Passed!  - Failed: 0, Passed: 3 ..."
    if name.is_empty() || name.starts_with('-') {
        return None;
    }
    Some(ResultUpdate::new(name, state))
}
