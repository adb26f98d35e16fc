use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::model::{TestCase, TestState};
use crate::ui::tests::format_duration;
use crate::ui::theme::Theme;

/// Details of the selected test: names, outcome, duration and failure text.
pub struct TestResultPane<'a> {
    test: Option<&'a TestCase>,
    theme: &'a Theme,
}

impl<'a> TestResultPane<'a> {
    pub fn new(test: Option<&'a TestCase>, theme: &'a Theme) -> Self {
        Self { test, theme }
    }

    fn status_text(&self, state: TestState) -> (&'static str, Style) {
        let label = match state {
            TestState::NotRun | TestState::All => "NOT RUN",
            TestState::Passed => "PASSED",
            TestState::Failed => "FAILED",
            TestState::Skipped => "SKIPPED",
        };
        (label, self.theme.state_style(state).add_modifier(Modifier::BOLD))
    }
}

impl Widget for TestResultPane<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Test Result ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border));

        let inner = block.inner(area);
        block.render(area, buf);

        match self.test {
            None => {
                let text = Paragraph::new("No test selected.")
                    .style(Style::default().fg(self.theme.fg));
                text.render(inner, buf);
            }
            Some(test) => {
                let mut lines: Vec<Line> = Vec::new();

                lines.push(Line::from(vec![
                    Span::styled("Test: ", Style::default().fg(self.theme.border)),
                    Span::styled(
                        test.display_name.as_str(),
                        Style::default()
                            .fg(self.theme.fg)
                            .add_modifier(Modifier::BOLD),
                    ),
                ]));
                lines.push(Line::from(vec![
                    Span::styled("Name: ", Style::default().fg(self.theme.border)),
                    Span::styled(
                        test.unique_name.as_str(),
                        Style::default()
                            .fg(self.theme.fg)
                            .add_modifier(Modifier::BOLD),
                    ),
                ]));

                let (status_text, status_style) = self.status_text(test.result());
                lines.push(Line::from(vec![
                    Span::styled("Status: ", Style::default().fg(self.theme.border)),
                    Span::styled(status_text, status_style),
                ]));

                if let Some(duration_ms) = test.duration_ms {
                    let duration_str = format_duration(duration_ms);
                    lines.push(Line::from(vec![
                        Span::styled("Duration: ", Style::default().fg(self.theme.border)),
                        Span::styled(duration_str, Style::default().fg(self.theme.fg)),
                    ]));
                }

                // Error message / stack trace
                if let Some(ref error) = test.error_message {
                    lines.push(Line::from(""));
                    lines.push(Line::from(Span::styled(
                        "Error:",
                        Style::default()
                            .fg(self.theme.failed)
                            .add_modifier(Modifier::BOLD),
                    )));

                    // Split error message into lines
                    for line in error.lines() {
                        lines.push(Line::from(Span::styled(
                            line.to_string(),
                            Style::default().fg(self.theme.fg),
                        )));
                    }
                }

                let text = Paragraph::new(lines).wrap(Wrap { trim: false });
                text.render(inner, buf);
            }
        }
    }
}
