use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, StatefulWidget},
};

use crate::controller::TestCollectionController;
use crate::ui::theme::Theme;

/// One row per assembly: its name and the summary of all its tests.
pub struct AssemblyList<'a> {
    controllers: &'a [TestCollectionController],
    theme: &'a Theme,
}

impl<'a> AssemblyList<'a> {
    pub fn new(controllers: &'a [TestCollectionController], theme: &'a Theme) -> Self {
        Self { controllers, theme }
    }

    fn item(&self, controller: &'a TestCollectionController) -> ListItem<'a> {
        let summary = controller.summary();
        let mut name = vec![Span::styled(
            controller.display_name(),
            Style::default().fg(self.theme.fg),
        )];
        if controller.is_busy() {
            name.push(Span::styled(" *", Style::default().fg(self.theme.highlight)));
        }
        let summary_line = Line::from(Span::styled(
            format!("  {}", summary.text),
            Style::default().fg(self.theme.summary_color(summary.color)),
        ));
        ListItem::new(vec![Line::from(name), summary_line])
    }
}

impl StatefulWidget for AssemblyList<'_> {
    type State = ListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let items: Vec<ListItem> = self
            .controllers
            .iter()
            .map(|controller| self.item(controller))
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Assemblies")
                    .border_style(Style::default().fg(self.theme.border)),
            )
            .style(Style::default().fg(self.theme.fg))
            .highlight_style(Style::default().add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");

        StatefulWidget::render(list, area, buf, state);
    }
}
