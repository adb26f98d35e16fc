use ratatui::style::{Color, Modifier, Style};

use crate::model::TestState;
use crate::summary::ColorClass;

pub struct Theme {
    pub bg: Color,
    pub fg: Color,
    pub highlight: Color,
    pub border: Color,
    pub passed: Color,
    pub failed: Color,
    pub skipped: Color,
    pub neutral: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            bg: Color::Black,
            fg: Color::Rgb(255, 191, 0),        // Amber
            highlight: Color::Rgb(255, 215, 0), // Gold
            border: Color::Rgb(139, 119, 42),   // Dark gold
            passed: Color::Green,
            failed: Color::Red,
            skipped: Color::DarkGray,
            neutral: Color::Rgb(255, 127, 0), // Orange
        }
    }
}

impl Theme {
    pub fn summary_color(&self, color: ColorClass) -> Color {
        match color {
            ColorClass::Neutral => self.neutral,
            ColorClass::Success => self.passed,
            ColorClass::Failure => self.failed,
        }
    }

    pub fn state_style(&self, state: TestState) -> Style {
        match state {
            TestState::NotRun | TestState::All => Style::default().fg(self.fg),
            TestState::Passed => Style::default().fg(self.passed),
            TestState::Failed => Style::default().fg(self.failed).add_modifier(Modifier::BOLD),
            TestState::Skipped => Style::default().fg(self.skipped),
        }
    }
}
