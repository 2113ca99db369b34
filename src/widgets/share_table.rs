use crate::table::ShareTable;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Row, StatefulWidget, Table, TableState},
};

/// Widest a column is allowed to grow before its cells are clipped
const MAX_COLUMN_WIDTH: u16 = 40;

/// Renders the visible rows of a [`ShareTable`] with sort indicators in the header
pub struct ShareTableView<'a> {
    table: &'a ShareTable,
    selected_column: usize,
    header_fg: Color,
    header_bg: Color,
    selected_bg: Color,
    alternate_row_bg: Option<Color>,
    indicator_fg: Color,
    column_spacing: u16,
}

impl<'a> ShareTableView<'a> {
    pub fn new(table: &'a ShareTable, selected_column: usize) -> Self {
        Self {
            table,
            selected_column,
            header_fg: Color::White,
            header_bg: Color::Reset,
            selected_bg: Color::Reset,
            alternate_row_bg: None,
            indicator_fg: Color::Yellow,
            column_spacing: 2,
        }
    }

    pub fn with_header_style(mut self, fg: Color, bg: Color) -> Self {
        self.header_fg = fg;
        self.header_bg = bg;
        self
    }

    pub fn with_selected_bg(mut self, bg: Color) -> Self {
        self.selected_bg = bg;
        self
    }

    pub fn with_alternate_row_bg(mut self, bg: Option<Color>) -> Self {
        self.alternate_row_bg = bg;
        self
    }

    pub fn with_indicator_color(mut self, fg: Color) -> Self {
        self.indicator_fg = fg;
        self
    }

    /// Column widths fitted to the header (plus indicator) and every row, visible or not,
    /// so filtering does not make columns jump.
    pub fn column_widths(&self) -> Vec<u16> {
        let columns = self.table.column_count();
        let mut widths: Vec<u16> = (0..columns)
            .map(|c| {
                self.table
                    .headers
                    .get(c)
                    .map(|h| h.chars().count() as u16 + 2)
                    .unwrap_or(2)
            })
            .collect();
        for row in &self.table.rows {
            for (c, width) in widths.iter_mut().enumerate() {
                *width = (*width).max(row.cell(c).chars().count() as u16);
            }
        }
        widths
            .into_iter()
            .map(|w| w.min(MAX_COLUMN_WIDTH))
            .collect()
    }

    fn header(&self) -> Row<'a> {
        let header_style = if self.header_bg == Color::Reset {
            Style::default().fg(self.header_fg)
        } else {
            Style::default().bg(self.header_bg).fg(self.header_fg)
        };
        let cells: Vec<Cell> = (0..self.table.column_count())
            .map(|c| {
                let name = self.table.headers.get(c).cloned().unwrap_or_default();
                let mut name_style = Style::default().add_modifier(Modifier::BOLD);
                if c == self.selected_column {
                    name_style = name_style.add_modifier(Modifier::REVERSED);
                }
                Cell::from(Line::from(vec![
                    Span::styled(name, name_style),
                    Span::raw(" "),
                    Span::styled(
                        self.table.indicator(c).symbol(),
                        Style::default().fg(self.indicator_fg),
                    ),
                ]))
            })
            .collect();
        Row::new(cells).style(header_style)
    }
}

impl StatefulWidget for ShareTableView<'_> {
    type State = TableState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let columns = self.table.column_count();
        let rows: Vec<Row> = self
            .table
            .visible_rows()
            .enumerate()
            .map(|(i, row)| {
                let cells: Vec<Cell> = (0..columns)
                    .map(|c| Cell::from(row.cell(c).to_string()))
                    .collect();
                let style = match self.alternate_row_bg {
                    Some(bg) if i % 2 == 1 => Style::default().bg(bg),
                    _ => Style::default(),
                };
                Row::new(cells).style(style)
            })
            .collect();

        let widths: Vec<Constraint> = self
            .column_widths()
            .into_iter()
            .map(Constraint::Length)
            .collect();

        let highlight = if self.selected_bg == Color::Reset {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default().bg(self.selected_bg)
        };

        StatefulWidget::render(
            Table::new(rows, widths)
                .column_spacing(self.column_spacing)
                .header(self.header())
                .row_highlight_style(highlight),
            area,
            buf,
            state,
        );
    }
}
