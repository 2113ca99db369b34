use crate::chart::ChartWidget;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

/// Chart tab body: the chart's settings and the link that opens it
pub struct ChartPanel<'a> {
    chart: Option<&'a ChartWidget>,
    label_color: Color,
    dimmed_color: Color,
}

impl<'a> ChartPanel<'a> {
    pub fn new(chart: Option<&'a ChartWidget>) -> Self {
        Self {
            chart,
            label_color: Color::Cyan,
            dimmed_color: Color::DarkGray,
        }
    }

    pub fn with_colors(mut self, label_color: Color, dimmed_color: Color) -> Self {
        self.label_color = label_color;
        self.dimmed_color = dimmed_color;
        self
    }
}

impl Widget for ChartPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).title("Live Chart");
        let Some(chart) = self.chart else {
            Paragraph::new("Chart not loaded")
                .style(Style::default().fg(self.dimmed_color))
                .block(block)
                .render(area, buf);
            return;
        };

        let label_style = Style::default()
            .fg(self.label_color)
            .add_modifier(Modifier::BOLD);
        let mut lines: Vec<Line> = chart
            .settings()
            .into_iter()
            .map(|(label, value)| {
                Line::from(vec![
                    Span::styled(format!("{:<10}", label), label_style),
                    Span::raw(value),
                ])
            })
            .collect();
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            chart.url(),
            Style::default().add_modifier(Modifier::UNDERLINED),
        )));
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Press o to open the chart in your browser",
            Style::default().fg(self.dimmed_color),
        )));

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
