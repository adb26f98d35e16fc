use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, ListState, Paragraph},
    Frame,
};

use crate::controller::TestCollectionController;
use crate::model::{TestCase, TestState};
use crate::ui::assemblies::AssemblyList;
use crate::ui::test_result::TestResultPane;
use crate::ui::tests::TestList;
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
}

pub struct DeckState {
    pub controllers: Vec<TestCollectionController>,
    pub assembly_state: ListState,
    pub test_state: ListState,
    pub theme: Theme,
    pub input_mode: InputMode,
    pub status: String,
}

impl DeckState {
    pub fn new(controllers: Vec<TestCollectionController>) -> Self {
        let mut assembly_state = ListState::default();
        if !controllers.is_empty() {
            assembly_state.select(Some(0));
        }
        let mut state = Self {
            controllers,
            assembly_state,
            test_state: ListState::default(),
            theme: Theme::default(),
            input_mode: InputMode::Normal,
            status: String::new(),
        };
        state.clamp_selection();
        state
    }

    pub fn active_index(&self) -> Option<usize> {
        self.assembly_state
            .selected()
            .filter(|&i| i < self.controllers.len())
    }

    pub fn active_controller(&self) -> Option<&TestCollectionController> {
        self.active_index().map(|i| &self.controllers[i])
    }

    pub fn active_controller_mut(&mut self) -> Option<&mut TestCollectionController> {
        self.active_index().map(move |i| &mut self.controllers[i])
    }

    pub fn next_assembly(&mut self) {
        if self.controllers.is_empty() {
            return;
        }
        let next = self.active_index().map_or(0, |i| (i + 1) % self.controllers.len());
        self.assembly_state.select(Some(next));
        self.test_state.select(None);
        self.clamp_selection();
    }

    pub fn previous_assembly(&mut self) {
        if self.controllers.is_empty() {
            return;
        }
        let len = self.controllers.len();
        let previous = self.active_index().map_or(0, |i| (i + len - 1) % len);
        self.assembly_state.select(Some(previous));
        self.test_state.select(None);
        self.clamp_selection();
    }

    /// Move the test cursor by `delta` rows, stopping at either end.
    pub fn move_selection(&mut self, delta: isize) {
        let len = self.active_controller().map_or(0, |c| c.visible_len());
        if len == 0 {
            self.test_state.select(None);
            return;
        }
        let current = self.test_state.selected().unwrap_or(0) as isize;
        let target = (current + delta).clamp(0, len as isize - 1);
        self.test_state.select(Some(target as usize));
    }

    /// Keep the test cursor inside the visible rows after the view changed.
    pub fn clamp_selection(&mut self) {
        let len = self.active_controller().map_or(0, |c| c.visible_len());
        match (len, self.test_state.selected()) {
            (0, _) => self.test_state.select(None),
            (_, None) => self.test_state.select(Some(0)),
            (len, Some(i)) if i >= len => self.test_state.select(Some(len - 1)),
            _ => {}
        }
    }

    pub fn selected_test(&self) -> Option<&TestCase> {
        let controller = self.active_controller()?;
        controller.visible_test(self.test_state.selected()?)
    }

    pub fn any_busy(&self) -> bool {
        self.controllers.iter().any(|c| c.is_busy())
    }
}

pub fn draw(frame: &mut Frame, state: &mut DeckState) {
    frame.render_widget(
        Block::default().style(Style::default().bg(state.theme.bg)),
        frame.area(),
    );

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    frame.render_widget(search_bar(state), main_chunks[0]);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(40),
            Constraint::Percentage(35),
        ])
        .split(main_chunks[1]);

    let assembly_list = AssemblyList::new(&state.controllers, &state.theme);
    frame.render_stateful_widget(assembly_list, chunks[0], &mut state.assembly_state);

    if let Some(controller) = state.active_index().map(|i| &state.controllers[i]) {
        let test_list = TestList::new(
            controller.visible_tests(),
            controller.tests().len(),
            controller.applied_filter(),
            &state.theme,
            state.input_mode == InputMode::Normal,
        );
        frame.render_stateful_widget(test_list, chunks[1], &mut state.test_state);
    } else {
        let empty = Paragraph::new("No assemblies.").block(
            Block::default()
                .borders(Borders::ALL)
                .title("Tests")
                .border_style(Style::default().fg(state.theme.border)),
        );
        frame.render_widget(empty, chunks[1]);
    }

    let result_pane = TestResultPane::new(state.selected_test(), &state.theme);
    frame.render_widget(result_pane, chunks[2]);

    frame.render_widget(status_bar(state), main_chunks[2]);
}

fn search_bar(state: &DeckState) -> Paragraph<'_> {
    let theme = &state.theme;
    let (search, result_filter, pending) = state
        .active_controller()
        .map(|c| (c.search_text(), c.result_filter(), c.filter_pending()))
        .unwrap_or(("", TestState::All, false));

    let mut spans = vec![
        Span::styled("Search: ", Style::default().fg(theme.border)),
        Span::styled(search.to_string(), Style::default().fg(theme.fg)),
    ];
    if state.input_mode == InputMode::Search {
        spans.push(Span::styled("_", Style::default().fg(theme.highlight)));
    }
    spans.push(Span::styled("   State: ", Style::default().fg(theme.border)));
    spans.push(Span::styled(
        result_filter.to_string(),
        theme.state_style(result_filter),
    ));
    if pending {
        spans.push(Span::styled(" ...", Style::default().fg(theme.border)));
    }

    let border_style = if state.input_mode == InputMode::Search {
        Style::default().fg(theme.highlight)
    } else {
        Style::default().fg(theme.border)
    };
    Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Filter")
            .border_style(border_style),
    )
}

fn status_bar(state: &DeckState) -> Paragraph<'_> {
    let text = match state.input_mode {
        InputMode::Search => "Enter/Esc:done  Backspace:delete".to_string(),
        InputMode::Normal => {
            let hints = [
                "q:quit",
                "r:run",
                "/:search",
                "f:state",
                "Tab:assembly",
                "o:docs",
            ]
            .join("  ");
            let running = if state.any_busy() { "[RUNNING] " } else { "" };
            if state.status.is_empty() {
                format!("{}{}", running, hints)
            } else {
                format!("{}{} | {}", running, hints, state.status)
            }
        }
    };
    Paragraph::new(text).style(Style::default().fg(state.theme.fg).add_modifier(Modifier::DIM))
}
