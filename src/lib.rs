use chrono::{DateTime, Local};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::sync::{mpsc::Sender, Arc};

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, StatefulWidget, TableState, Tabs};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

pub mod cache;
pub mod chart;
pub mod classify;
pub mod config;
pub mod natural;
pub mod source;
pub mod table;
pub mod widgets;

pub use cache::CacheManager;
pub use chart::ChartWidget;
pub use classify::{classify_column, parse_number, ClassifierPolicy, ColumnKind};
pub use config::{
    rgb_to_256_color, rgb_to_basic_ansi, AppConfig, ChartConfig, ColorParser, ConfigManager,
    Theme, ThemeConfig, ThemeMode,
};
pub use dsetui_cli::Args;
pub use natural::{locale_compare, natural_compare};
pub use source::{parse_share_table, FileSource, HttpSource, LoadError, SourceOptions, TableSource};
pub use table::{
    filter_visibility, sort_order, Row, ShareTable, SortDirection, SortIndicator, SortState,
    TableError, TableSettings,
};

use widgets::chart::ChartPanel;
use widgets::controls::Controls;
use widgets::debug::DebugState;
use widgets::share_table::ShareTableView;

/// Application name used for cache directory and other app-specific paths
pub const APP_NAME: &str = "dsetui";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Data,
    Chart,
}

impl Tab {
    pub const ALL: [Tab; 2] = [Tab::Data, Tab::Chart];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Data => "DSE Data",
            Self::Chart => "Chart",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Data => Self::Chart,
            Self::Chart => Self::Data,
        }
    }

    fn index(&self) -> usize {
        match self {
            Self::Data => 0,
            Self::Chart => 1,
        }
    }
}

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Fetch,
    DoFetch, // Internal event to actually start the fetch after the loading indicator is drawn
    Loaded(Result<ShareTable, String>),
    Sort(usize),                 // Header activation
    DoSort(usize, SortDirection), // Internal event to sort after the loading indicator is drawn
    Search(String),
    ToggleTheme,
    SwitchTab(Tab),
    Refresh,
    OpenChart,
    Resize(u16, u16), // resized (width, height)
    Exit,
    Crash(String),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Normal,
    Searching,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LoadingState {
    #[default]
    Idle,
    Loading {
        message: String,
    },
}

impl LoadingState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadingState::Loading { .. })
    }
}

/// Pick the starting theme: CLI, then the saved toggle, then config, then the terminal.
pub fn resolve_theme_mode(
    cli: Option<ThemeMode>,
    cache: &CacheManager,
    config: &ThemeConfig,
) -> ThemeMode {
    cli.or_else(|| cache.load_theme_preference())
        .or_else(|| config.fixed_mode())
        .unwrap_or_else(ThemeMode::detect)
}

pub struct App {
    table: Option<ShareTable>,
    table_message: Option<String>, // Shown in place of the table after a failed load
    pub sort_state: SortState,
    pub active_tab: Tab,
    pub input_mode: InputMode,
    query: String,
    selected_column: usize,
    table_state: TableState,
    events: Sender<AppEvent>,
    source: Arc<dyn TableSource>,
    settings: TableSettings,
    theme_mode: ThemeMode,
    theme: Theme,
    theme_config: ThemeConfig,
    chart_config: ChartConfig,
    chart: Option<ChartWidget>,
    loading_state: LoadingState,
    last_updated: Option<DateTime<Local>>,
    status: Option<String>,
    cache: CacheManager,
    debug: DebugState,
}

impl App {
    pub fn send_event(&mut self, event: AppEvent) -> Result<()> {
        self.events.send(event)?;
        Ok(())
    }

    pub fn new(events: Sender<AppEvent>, source: Arc<dyn TableSource>) -> App {
        let cache = CacheManager::new(APP_NAME).unwrap_or_else(|e| {
            log::warn!("Could not initialize cache manager: {}", e);
            CacheManager {
                cache_dir: std::env::temp_dir().join(APP_NAME),
            }
        });
        let config = AppConfig::default();
        let mode = resolve_theme_mode(None, &cache, &config.theme);
        Self::new_with_config(events, source, &config, cache, mode)
    }

    pub fn new_with_config(
        events: Sender<AppEvent>,
        source: Arc<dyn TableSource>,
        config: &AppConfig,
        cache: CacheManager,
        theme_mode: ThemeMode,
    ) -> App {
        let theme = Self::build_theme(&config.theme, theme_mode);
        App {
            table: None,
            table_message: None,
            sort_state: SortState::default(),
            active_tab: Tab::Data,
            input_mode: InputMode::Normal,
            query: String::new(),
            selected_column: 0,
            table_state: TableState::default(),
            events,
            source,
            settings: TableSettings::default(),
            theme_mode,
            theme,
            theme_config: config.theme.clone(),
            chart_config: config.chart.clone(),
            chart: None,
            loading_state: LoadingState::Idle,
            last_updated: None,
            status: None,
            cache,
            debug: DebugState::default(),
        }
    }

    fn build_theme(config: &ThemeConfig, mode: ThemeMode) -> Theme {
        Theme::from_config(config, mode).unwrap_or_else(|e| {
            log::warn!("Failed to create {} theme: {}. Using fallback.", mode, e);
            Theme {
                mode,
                colors: std::collections::HashMap::new(),
            }
        })
    }

    pub fn enable_debug(&mut self) {
        self.debug.enabled = true;
    }

    pub fn table(&self) -> Option<&ShareTable> {
        self.table.as_ref()
    }

    pub fn table_message(&self) -> Option<&str> {
        self.table_message.as_deref()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn selected_column(&self) -> usize {
        self.selected_column
    }

    pub fn theme_mode(&self) -> ThemeMode {
        self.theme_mode
    }

    pub fn chart(&self) -> Option<&ChartWidget> {
        self.chart.as_ref()
    }

    pub fn loading_state(&self) -> &LoadingState {
        &self.loading_state
    }

    /// Last error or notice shown in the status line
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        self.last_updated
    }

    /// Get a color from the theme by name
    fn color(&self, name: &str) -> ratatui::style::Color {
        self.theme.get(name)
    }

    fn column_count(&self) -> usize {
        self.table.as_ref().map(|t| t.column_count()).unwrap_or(0)
    }

    fn visible_count(&self) -> usize {
        self.table.as_ref().map(|t| t.visible_count()).unwrap_or(0)
    }

    /// Keep the row cursor inside the visible rows
    fn reset_row_selection(&mut self) {
        if self.visible_count() > 0 {
            self.table_state.select(Some(0));
        } else {
            self.table_state.select(None);
        }
        *self.table_state.offset_mut() = 0;
    }

    fn scroll_rows(&mut self, delta: isize) {
        let count = self.visible_count();
        if count == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, count as isize - 1);
        self.table_state.select(Some(next as usize));
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        if event.kind != KeyEventKind::Press {
            return None;
        }
        self.debug.on_key(event);

        if event.code == KeyCode::Char('c') && event.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(AppEvent::Exit);
        }

        if self.input_mode == InputMode::Searching {
            return self.search_key(event);
        }

        match event.code {
            KeyCode::Char('q') => Some(AppEvent::Exit),
            KeyCode::Char('/') if self.active_tab == Tab::Data => {
                self.input_mode = InputMode::Searching;
                None
            }
            KeyCode::Tab => Some(AppEvent::SwitchTab(self.active_tab.next())),
            KeyCode::Char('1') => Some(AppEvent::SwitchTab(Tab::Data)),
            KeyCode::Char('2') => Some(AppEvent::SwitchTab(Tab::Chart)),
            KeyCode::Char('t') => Some(AppEvent::ToggleTheme),
            KeyCode::Char('r') => Some(AppEvent::Refresh),
            KeyCode::Char('o') if self.active_tab == Tab::Chart => Some(AppEvent::OpenChart),
            _ if self.active_tab == Tab::Data => self.table_key(event),
            _ => None,
        }
    }

    fn table_key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        match event.code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.selected_column = self.selected_column.saturating_sub(1);
                None
            }
            KeyCode::Right | KeyCode::Char('l') => {
                let last = self.column_count().saturating_sub(1);
                self.selected_column = (self.selected_column + 1).min(last);
                None
            }
            KeyCode::Enter | KeyCode::Char('s') => {
                if self.column_count() > 0 {
                    Some(AppEvent::Sort(self.selected_column))
                } else {
                    None
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll_rows(1);
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll_rows(-1);
                None
            }
            KeyCode::PageDown => {
                self.scroll_rows(20);
                None
            }
            KeyCode::PageUp => {
                self.scroll_rows(-20);
                None
            }
            KeyCode::Home => {
                self.scroll_rows(isize::MIN / 2);
                None
            }
            KeyCode::End => {
                self.scroll_rows(isize::MAX / 2);
                None
            }
            _ => None,
        }
    }

    fn search_key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        match event.code {
            KeyCode::Enter | KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                None
            }
            KeyCode::Char('u') if event.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(AppEvent::Search(String::new()))
            }
            KeyCode::Backspace => {
                let mut query = self.query.clone();
                query.pop();
                Some(AppEvent::Search(query))
            }
            KeyCode::Char(c) if !event.modifiers.contains(KeyModifiers::CONTROL) => {
                let mut query = self.query.clone();
                query.push(c);
                Some(AppEvent::Search(query))
            }
            _ => None,
        }
    }

    fn start_fetch(&mut self) {
        let source = Arc::clone(&self.source);
        let events = self.events.clone();
        log::info!("Fetching share table from {}", source.describe());
        std::thread::spawn(move || {
            let result = source.fetch().map_err(|e| e.to_string());
            if events.send(AppEvent::Loaded(result)).is_err() {
                log::debug!("Fetch finished after the event loop exited");
            }
        });
    }

    fn install_table(&mut self, table: &ShareTable) {
        let mut table = table.clone();
        table.filter(&self.query, &self.settings);
        log::info!(
            "Loaded {} rows ({} columns)",
            table.rows.len(),
            table.column_count()
        );
        self.selected_column = self
            .selected_column
            .min(table.column_count().saturating_sub(1));
        self.table = Some(table);
        self.table_message = None;
        self.last_updated = Some(Local::now());
        self.reset_row_selection();
    }

    fn toggle_theme(&mut self) {
        self.theme_mode = self.theme_mode.toggle();
        self.theme = Self::build_theme(&self.theme_config, self.theme_mode);
        log::debug!("Theme switched to {}", self.theme_mode);
        if let Err(e) = self.cache.save_theme_preference(self.theme_mode) {
            log::warn!("Could not save theme preference: {}", e);
        }
    }

    fn switch_tab(&mut self, tab: Tab) -> Option<AppEvent> {
        if tab == self.active_tab {
            return None;
        }
        self.active_tab = tab;
        self.input_mode = InputMode::Normal;
        match tab {
            Tab::Data => Some(AppEvent::Fetch),
            Tab::Chart => {
                if self.chart.is_none() {
                    let chart = ChartWidget::new(&self.chart_config, self.theme_mode);
                    if self.chart_config.open_in_browser {
                        self.open_chart(&chart);
                    }
                    self.chart = Some(chart);
                }
                None
            }
        }
    }

    fn open_chart(&mut self, chart: &ChartWidget) {
        if let Err(e) = chart.open() {
            log::warn!("{}", e);
            self.status = Some(e.to_string());
        }
    }

    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        self.debug.num_events += 1;
        log::trace!("Event {:?}", event);
        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::Fetch => {
                // Set loading state first, then trigger a render before actually fetching
                self.loading_state = LoadingState::Loading {
                    message: "Loading share prices".to_string(),
                };
                Some(AppEvent::DoFetch)
            }
            AppEvent::DoFetch => {
                self.start_fetch();
                None
            }
            AppEvent::Loaded(Ok(table)) => {
                self.loading_state = LoadingState::Idle;
                self.install_table(table);
                None
            }
            AppEvent::Loaded(Err(message)) => {
                self.loading_state = LoadingState::Idle;
                log::warn!("Load failed: {}", message);
                self.table = None;
                self.table_message = Some(message.clone());
                self.reset_row_selection();
                None
            }
            AppEvent::Sort(column) => {
                self.table.as_ref()?;
                self.sort_state = self.sort_state.activate(*column);
                self.loading_state = LoadingState::Loading {
                    message: "Sorting".to_string(),
                };
                Some(AppEvent::DoSort(*column, self.sort_state.direction))
            }
            AppEvent::DoSort(column, direction) => {
                self.loading_state = LoadingState::Idle;
                if let Some(table) = &mut self.table {
                    match table.sort(*column, *direction, &self.settings) {
                        Ok(()) => {
                            log::debug!("Sorted by column {} {}", column, direction);
                            self.status = None;
                        }
                        Err(e) => {
                            log::warn!("Sort failed: {}", e);
                            self.status = Some(e.to_string());
                        }
                    }
                }
                None
            }
            AppEvent::Search(query) => {
                self.query = query.clone();
                if let Some(table) = &mut self.table {
                    table.filter(query, &self.settings);
                }
                self.reset_row_selection();
                None
            }
            AppEvent::ToggleTheme => {
                self.toggle_theme();
                None
            }
            AppEvent::SwitchTab(tab) => self.switch_tab(*tab),
            AppEvent::Refresh => {
                self.query.clear();
                self.input_mode = InputMode::Normal;
                Some(AppEvent::Fetch)
            }
            AppEvent::OpenChart => {
                if let Some(chart) = self.chart.clone() {
                    self.open_chart(&chart);
                }
                None
            }
            AppEvent::Resize(_cols, _rows) => None,
            AppEvent::Exit | AppEvent::Crash(_) => None,
        }
    }

    fn render_loading(message: &str, area: Rect, buf: &mut Buffer, style: Style) {
        let width = (message.chars().count() as u16 + 6).min(area.width);
        let height = 3u16.min(area.height);
        let popup = Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + (area.height - height) / 2,
            width,
            height,
        };
        Clear.render(popup, buf);
        Paragraph::new(format!("{}…", message))
            .style(style)
            .centered()
            .block(Block::default().borders(Borders::ALL).title("Loading"))
            .render(popup, buf);
    }

    fn render_data_tab(&mut self, area: Rect, buf: &mut Buffer) {
        let header_fg = self.color("table_header");
        let header_bg = self.color("table_header_bg");
        let selected_bg = self.color("table_selected");
        let alternate_bg = self.theme.get_optional("alternate_row");
        let indicator = self.color("sort_indicator");
        let text_secondary = self.color("text_secondary");
        let error = self.color("error");

        match &self.table {
            Some(table) if table.visible_count() > 0 => {
                let view = ShareTableView::new(table, self.selected_column)
                    .with_header_style(header_fg, header_bg)
                    .with_selected_bg(selected_bg)
                    .with_alternate_row_bg(alternate_bg)
                    .with_indicator_color(indicator);
                StatefulWidget::render(view, area, buf, &mut self.table_state);
            }
            Some(table) if !table.rows.is_empty() => {
                Paragraph::new(format!("No trading code matches \"{}\"", self.query))
                    .style(Style::default().fg(text_secondary))
                    .centered()
                    .render(area, buf);
            }
            Some(_) => {
                Paragraph::new("The table is empty")
                    .style(Style::default().fg(text_secondary))
                    .centered()
                    .render(area, buf);
            }
            None => {
                let (text, style) = match &self.table_message {
                    Some(message) => (message.as_str(), Style::default().fg(error)),
                    None => ("No data loaded", Style::default().fg(text_secondary)),
                };
                Paragraph::new(text).style(style).centered().render(area, buf);
            }
        }
    }

    fn status_line(&self) -> Line<'_> {
        if let Some(status) = &self.status {
            return Line::from(Span::styled(
                status.as_str(),
                Style::default().fg(self.color("error")),
            ));
        }
        let mut parts = Vec::new();
        if let Some(table) = &self.table {
            parts.push(format!(
                "{} of {} rows",
                table.visible_count(),
                table.rows.len()
            ));
        }
        if let Some(updated) = self.last_updated {
            parts.push(format!("updated {}", updated.format("%H:%M:%S")));
        }
        parts.push(self.source.describe());
        Line::from(Span::styled(
            parts.join(" · "),
            Style::default().fg(self.color("text_secondary")),
        ))
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.debug.num_frames += 1;

        // Set background color for the entire application area
        let background_color = self.color("background");
        Block::default()
            .style(Style::default().bg(background_color))
            .render(area, buf);

        let show_search = self.active_tab == Tab::Data
            && (self.input_mode == InputMode::Searching || !self.query.is_empty());

        let mut constraints = vec![Constraint::Length(1)]; // Tabs
        if show_search {
            constraints.push(Constraint::Length(1));
        }
        constraints.push(Constraint::Fill(1));
        constraints.push(Constraint::Length(1)); // Status
        constraints.push(Constraint::Length(1)); // Controls
        if self.debug.enabled {
            constraints.push(Constraint::Length(1));
        }
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        // Tabs on the left, theme icon on the right
        let tab_active = self.color("tab_active");
        let tab_inactive = self.color("tab_inactive");
        let tab_bar = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Fill(1), Constraint::Length(4)])
            .split(layout[0]);
        let titles = Tab::ALL
            .iter()
            .enumerate()
            .map(|(i, tab)| format!("{} {}", i + 1, tab.title()));
        Tabs::new(titles)
            .select(self.active_tab.index())
            .style(Style::default().fg(tab_inactive))
            .highlight_style(
                Style::default()
                    .fg(tab_active)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            )
            .render(tab_bar[0], buf);
        Paragraph::new(self.theme_mode.icon())
            .right_aligned()
            .render(tab_bar[1], buf);

        let mut next = 1;
        if show_search {
            let primary = self.color("primary");
            let cursor = if self.input_mode == InputMode::Searching {
                "█"
            } else {
                ""
            };
            Line::from(vec![
                Span::styled("Search: ", Style::default().fg(primary).add_modifier(Modifier::BOLD)),
                Span::raw(self.query.clone()),
                Span::styled(cursor, Style::default().fg(primary)),
            ])
            .render(layout[next], buf);
            next += 1;
        }

        let main_area = layout[next];
        match self.active_tab {
            Tab::Data => self.render_data_tab(main_area, buf),
            Tab::Chart => {
                ChartPanel::new(self.chart.as_ref())
                    .with_colors(self.color("primary"), self.color("text_secondary"))
                    .render(main_area, buf);
            }
        }
        if let LoadingState::Loading { message } = &self.loading_state {
            let style = Style::default().fg(self.color("loading"));
            App::render_loading(message, main_area, buf, style);
        }

        self.status_line().render(layout[next + 1], buf);

        let controls = Controls::for_tab(self.active_tab)
            .with_query_active(self.input_mode == InputMode::Searching)
            .with_colors(self.color("secondary"), self.color("controls_bg"));
        (&controls).render(layout[next + 2], buf);

        if self.debug.enabled {
            (&self.debug).render(layout[next + 3], buf);
        }
    }
}
