mod app;
mod busy;
mod cli;
mod config;
mod controller;
mod debounce;
mod error;
mod launcher;
mod model;
mod observable;
mod parser;
mod runner;
mod summary;
mod ui;
mod view;

use std::env;
use std::fs::File;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use app::Session;
use cli::{Cli, Command};
use config::Config;
use controller::TestCollectionController;
use error::Result;
use launcher::SystemLauncher;
use model::TestState;
use parser::{load_trx, TestResult};
use runner::{discover_assemblies, DotnetRunner, ResultUpdate};
use ui::DeckState;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    if let Err(e) = init_logging(&cli) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "testdeck failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// The TUI owns the terminal, so it logs only when given a file.
fn init_logging(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if let Some(path) = &cli.log_file {
        let file = File::create(path)?;
        let _ = builder.with_ansi(false).with_writer(Mutex::new(file)).try_init();
    } else if cli.is_headless() {
        let _ = builder.with_writer(std::io::stderr).try_init();
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let cwd = env::current_dir()?;
    let start = cli.path.clone().unwrap_or_else(|| cwd.clone());
    let config = Config::load(&cwd);

    let preload = cli.results.as_deref().map(load_trx).transpose()?;
    let assemblies = discover_assemblies(&config.runner.dotnet, &start).await?;

    let mut controllers = Vec::with_capacity(assemblies.len());
    let mut runners = Vec::with_capacity(assemblies.len());
    for assembly in assemblies {
        runners.push(Arc::new(DotnetRunner::new(&assembly.path, &config.runner)));
        let mut controller = TestCollectionController::new(
            &assembly.path.to_string_lossy(),
            assembly.tests,
            config.filter.debounce(),
        )?;
        if let Some(results) = &preload {
            preload_results(&mut controller, results);
        }
        if let Some(search) = &cli.filter {
            controller.set_search_text(search.clone());
        }
        if let Some(state) = cli.state {
            controller.set_result_filter(state);
        }
        controller.flush_filter();
        controllers.push(controller);
    }

    match cli.command {
        None => {
            let state = DeckState::new(controllers);
            let session = Session::new(runners, config.links.docs.clone());
            app::run(state, session, &SystemLauncher).await?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::List) => {
            print_assemblies(&controllers);
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Run) => Ok(run_headless(controllers, runners).await),
    }
}

fn preload_results(controller: &mut TestCollectionController, results: &[TestResult]) {
    let applied = results
        .iter()
        .filter(|r| controller.apply_result(ResultUpdate::from((*r).clone())))
        .count();
    info!(assembly = %controller.display_name(), applied, "preloaded results");
}

fn print_assemblies(controllers: &[TestCollectionController]) {
    if controllers.is_empty() {
        println!("No test projects found.");
        return;
    }
    for controller in controllers {
        println!(
            "\n{} ({}/{} tests)",
            controller.display_name(),
            controller.visible_len(),
            controller.tests().len()
        );
        for test in controller.visible_tests() {
            println!("  [{}] {}", test.result(), test.unique_name);
        }
        println!("  {}", controller.summary().text);
    }
}

async fn run_headless(
    mut controllers: Vec<TestCollectionController>,
    runners: Vec<Arc<DotnetRunner>>,
) -> ExitCode {
    let mut failed = false;
    for (controller, runner) in controllers.iter_mut().zip(runners) {
        println!("Running {}...", controller.display_name());
        if let Err(e) = controller.run_to_completion(runner).await {
            error!(assembly = %controller.display_name(), error = %e, "run failed");
            eprintln!("{}: {}", controller.display_name(), e);
            failed = true;
        }
        failed |= controller
            .tests()
            .iter()
            .any(|t| t.result() == TestState::Failed);
        println!("{}: {}", controller.display_name(), controller.summary().text);
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
