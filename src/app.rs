use std::io;
use std::sync::Arc;

use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::future::select_all;
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::controller::TestCollectionController;
use crate::error::{DeckError, Result};
use crate::launcher::UrlLauncher;
use crate::runner::TestRunner;
use crate::ui::{self, DeckState, InputMode};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
}

/// Runners and in-flight runs, one runner per assembly in `DeckState` order.
pub struct Session<R> {
    runners: Vec<Arc<R>>,
    runs: Vec<(usize, JoinHandle<Result<()>>)>,
    docs_url: String,
}

impl<R: TestRunner> Session<R> {
    pub fn new(runners: Vec<Arc<R>>, docs_url: impl Into<String>) -> Self {
        Self {
            runners,
            runs: Vec::new(),
            docs_url: docs_url.into(),
        }
    }

    pub fn running(&self) -> usize {
        self.runs.len()
    }

    /// Wait for any in-flight run to end and return its assembly index and
    /// outcome. Never resolves while nothing runs. Cancel-safe.
    pub async fn next_finished(&mut self) -> (usize, Result<()>) {
        if self.runs.is_empty() {
            return std::future::pending().await;
        }
        let (joined, position, _) = select_all(self.runs.iter_mut().map(|(_, handle)| handle)).await;
        let (assembly, _) = self.runs.swap_remove(position);
        let outcome = joined.unwrap_or_else(|e| Err(DeckError::RunnerTask(e.to_string())));
        (assembly, outcome)
    }
}

/// Put a finished run's outcome in the status bar.
pub fn report_run(state: &mut DeckState, assembly: usize, outcome: Result<()>) {
    let name = state
        .controllers
        .get(assembly)
        .map(|c| c.display_name().to_string())
        .unwrap_or_default();
    state.status = match outcome {
        Ok(()) => format!("{}: run finished", name),
        Err(e) => format!("{}: {}", name, e),
    };
}

/// Wait for the next debounced filter or runner result on any assembly.
async fn next_controller_event(controllers: &mut [TestCollectionController]) {
    if controllers.is_empty() {
        return std::future::pending().await;
    }
    select_all(controllers.iter_mut().map(|c| Box::pin(c.next_event()))).await;
}

pub async fn run<R: TestRunner>(
    mut state: DeckState,
    mut session: Session<R>,
    launcher: &dyn UrlLauncher,
) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut state, &mut session, launcher).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    for (_, handle) in session.runs.drain(..) {
        handle.abort();
    }
    result
}

async fn event_loop<R: TestRunner>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut DeckState,
    session: &mut Session<R>,
    launcher: &dyn UrlLauncher,
) -> io::Result<()> {
    let mut events = EventStream::new();
    loop {
        state.clamp_selection();
        terminal.draw(|f| ui::draw(f, &mut *state))?;

        tokio::select! {
            event = events.next() => match event {
                None => return Ok(()),
                Some(Err(e)) => return Err(e),
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    if handle_key(state, session, launcher, key.code) == KeyAction::Quit {
                        return Ok(());
                    }
                }
                Some(Ok(_)) => {}
            },
            _ = next_controller_event(&mut state.controllers) => {}
            (assembly, outcome) = session.next_finished() => report_run(state, assembly, outcome),
        }
    }
}

pub fn handle_key<R: TestRunner>(
    state: &mut DeckState,
    session: &mut Session<R>,
    launcher: &dyn UrlLauncher,
    code: KeyCode,
) -> KeyAction {
    if state.input_mode == InputMode::Search {
        handle_search_key(state, code);
        return KeyAction::Continue;
    }

    match code {
        KeyCode::Char('q') => return KeyAction::Quit,
        KeyCode::Char('/') => state.input_mode = InputMode::Search,
        KeyCode::Char('f') => {
            if let Some(controller) = state.active_controller_mut() {
                let next = controller.result_filter().next_filter();
                controller.set_result_filter(next);
            }
        }
        KeyCode::Char('r') => start_run(state, session),
        KeyCode::Char('o') => {
            state.status = match launcher.open(&session.docs_url) {
                Ok(()) => format!("Opened {}", session.docs_url),
                Err(e) => {
                    warn!(error = %e, "could not open link");
                    e.to_string()
                }
            };
        }
        KeyCode::Tab => state.next_assembly(),
        KeyCode::BackTab => state.previous_assembly(),
        KeyCode::Down => state.move_selection(1),
        KeyCode::Up => state.move_selection(-1),
        _ => {}
    }
    KeyAction::Continue
}

fn handle_search_key(state: &mut DeckState, code: KeyCode) {
    match code {
        KeyCode::Esc => state.input_mode = InputMode::Normal,
        KeyCode::Enter => {
            state.input_mode = InputMode::Normal;
            if let Some(controller) = state.active_controller_mut() {
                controller.flush_filter();
            }
            state.clamp_selection();
        }
        KeyCode::Backspace => {
            if let Some(controller) = state.active_controller_mut() {
                let mut text = controller.search_text().to_string();
                text.pop();
                controller.set_search_text(text);
            }
        }
        KeyCode::Char(c) => {
            if let Some(controller) = state.active_controller_mut() {
                let text = format!("{}{}", controller.search_text(), c);
                controller.set_search_text(text);
            }
        }
        _ => {}
    }
}

fn start_run<R: TestRunner>(state: &mut DeckState, session: &mut Session<R>) {
    let Some(index) = state.active_index() else {
        return;
    };
    let Some(runner) = session.runners.get(index) else {
        state.status = "No runner for this assembly".to_string();
        return;
    };
    let controller = &state.controllers[index];
    match controller.run_tests(Arc::clone(runner)) {
        Ok(handle) => {
            info!(assembly = %controller.display_name(), "run requested");
            state.status = format!("{}: running {} tests", controller.display_name(), controller.tests().len());
            session.runs.push((index, handle));
        }
        Err(DeckError::RunInProgress) => {
            state.status = format!("{}: a run is already in progress", controller.display_name());
        }
        Err(e) => state.status = e.to_string(),
    }
}
