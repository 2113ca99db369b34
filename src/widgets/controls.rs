use crate::Tab;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Paragraph, Widget},
};

const DATA_CONTROLS: &[(&str, &str)] = &[
    ("/", "Search"),
    ("←→", "Column"),
    ("s", "Sort"),
    ("r", "Refresh"),
    ("t", "Theme"),
    ("Tab", "Chart"),
    ("q", "Quit"),
];

const CHART_CONTROLS: &[(&str, &str)] = &[
    ("o", "Open"),
    ("t", "Theme"),
    ("Tab", "Data"),
    ("q", "Quit"),
];

const SEARCH_CONTROLS: &[(&str, &str)] = &[
    ("Enter", "Done"),
    ("Esc", "Done"),
    ("^U", "Clear"),
];

pub struct Controls {
    pub controls: &'static [(&'static str, &'static str)],
    pub query_active: bool,
    pub key_color: Color,
    pub bg: Color,
}

impl Controls {
    pub fn for_tab(tab: Tab) -> Self {
        let controls = match tab {
            Tab::Data => DATA_CONTROLS,
            Tab::Chart => CHART_CONTROLS,
        };
        Self {
            controls,
            query_active: false,
            key_color: Color::Reset,
            bg: Color::DarkGray,
        }
    }

    /// While searching only the search keys are shown
    pub fn with_query_active(mut self, query_active: bool) -> Self {
        self.query_active = query_active;
        if query_active {
            self.controls = SEARCH_CONTROLS;
        }
        self
    }

    pub fn with_colors(mut self, key_color: Color, bg: Color) -> Self {
        self.key_color = key_color;
        self.bg = bg;
        self
    }
}

impl Widget for &Controls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut constraints = self.controls.iter().fold(vec![], |mut acc, (key, action)| {
            acc.push(Constraint::Length(key.chars().count() as u16 + 2));
            acc.push(Constraint::Length(action.chars().count() as u16 + 1));
            acc
        });
        constraints.push(Constraint::Fill(1)); // Fill the remaining space

        let layout = Layout::new(Direction::Horizontal, constraints).split(area);

        // iterate over the controls and render them
        for (i, (key, action)) in self.controls.iter().enumerate() {
            let j = i * 2;
            Paragraph::new(*key)
                .style(
                    Style::default()
                        .fg(self.key_color)
                        .add_modifier(Modifier::BOLD),
                )
                .centered()
                .render(layout[j], buf);
            Paragraph::new(*action)
                .style(Style::default().bg(self.bg))
                .render(layout[j + 1], buf);
        }

        Paragraph::new("")
            .style(Style::default().bg(self.bg))
            .render(layout[self.controls.len() * 2], buf);
    }
}
