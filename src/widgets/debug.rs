use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Paragraph, Widget},
};

/// Operational counters shown on the bottom line with --debug
#[derive(Debug, Default)]
pub struct DebugState {
    pub enabled: bool,
    pub num_events: usize,
    pub num_frames: usize,
    pub num_keys: usize,
    pub last_key: Option<String>,
}

impl DebugState {
    pub fn on_key(&mut self, event: &KeyEvent) {
        self.num_keys += 1;
        let key = match event.code {
            KeyCode::Char(c) => c.to_string(),
            code => format!("{:?}", code),
        };
        self.last_key = Some(if event.modifiers.contains(KeyModifiers::CONTROL) {
            format!("Ctrl-{}", key)
        } else {
            key
        });
    }
}

impl Widget for &DebugState {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let text = format!(
            "events: {}  frames: {}  keys: {}  last key: {}",
            self.num_events,
            self.num_frames,
            self.num_keys,
            self.last_key.as_deref().unwrap_or("-")
        );
        Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .render(area, buf);
    }
}
