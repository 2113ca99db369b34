use color_eyre::eyre::eyre;
use color_eyre::Result;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use supports_color::Stream;

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get path to a specific config file
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    /// Ensure the config directory exists
    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Generate default configuration template as a string
    pub fn generate_default_config(&self) -> String {
        DEFAULT_CONFIG_TEMPLATE.to_string()
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }

    /// Load the user's config.toml from this directory, or defaults when absent
    pub fn load_config(&self) -> Result<AppConfig> {
        let config_path = self.config_path("config.toml");

        if !config_path.exists() {
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub source: SourceConfig,
    pub performance: PerformanceConfig,
    pub theme: ThemeConfig,
    pub chart: ChartConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    /// Prefix the page URL is appended to; empty string disables the proxy
    pub proxy: Option<String>,
    pub table_selector: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub event_poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// "light", "dark", or "auto" (detect from the terminal)
    pub mode: String,
    /// Overrides for the built-in light palette, keyed by color name
    pub light: BTreeMap<String, String>,
    /// Overrides for the built-in dark palette, keyed by color name
    pub dark: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub symbol: String,
    pub interval: String,
    pub range: String,
    pub timezone: String,
    pub locale: String,
    pub hide_volume: bool,
    /// Open the chart in the browser as soon as the chart tab is first shown
    pub open_in_browser: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            source: SourceConfig::default(),
            performance: PerformanceConfig::default(),
            theme: ThemeConfig::default(),
            chart: ChartConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: "https://www.dsebd.org/latest_share_price_scroll_l.php".to_string(),
            proxy: Some("https://corsproxy.io/?".to_string()),
            table_selector: "table.shares-table".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            event_poll_interval_ms: 25,
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            mode: "auto".to_string(),
            light: BTreeMap::new(),
            dark: BTreeMap::new(),
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            symbol: "FXOpen:XAUUSD".to_string(),
            interval: "1".to_string(),
            range: "1D".to_string(),
            timezone: "Asia/Dhaka".to_string(),
            locale: "en".to_string(),
            hide_volume: true,
            open_in_browser: false,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

// Configuration loading and merging
impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        let config_manager = ConfigManager::new(app_name)?;
        Self::load_from(&config_manager)
    }

    /// Load configuration from a specific config directory
    pub fn load_from(config_manager: &ConfigManager) -> Result<Self> {
        let mut config = AppConfig::default();
        config.merge(config_manager.load_config()?);
        config.validate()?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.source.merge(other.source);
        self.performance.merge(other.performance);
        self.theme.merge(other.theme);
        self.chart.merge(other.chart);
        self.debug.merge(other.debug);
    }

    /// Apply the debug and logging command-line overrides
    pub fn apply_args(&mut self, args: &crate::Args) {
        if args.debug {
            self.debug.enabled = true;
        }
        if let Some(log_file) = &args.log_file {
            self.debug.log_file = Some(log_file.clone());
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        if self.source.url.trim().is_empty() {
            return Err(eyre!("source.url must not be empty"));
        }

        if self.source.timeout_secs == 0 {
            return Err(eyre!("timeout_secs must be greater than 0"));
        }

        if self.performance.event_poll_interval_ms == 0 {
            return Err(eyre!("event_poll_interval_ms must be greater than 0"));
        }

        match self.theme.mode.as_str() {
            "light" | "dark" | "auto" => {}
            _ => {
                return Err(eyre!(
                    "Invalid theme mode: {}. Must be 'light', 'dark', or 'auto'",
                    self.theme.mode
                ))
            }
        }

        self.debug
            .log_level
            .parse::<log::LevelFilter>()
            .map_err(|_| {
                eyre!(
                    "Invalid log_level: {}. Must be one of off, error, warn, info, debug, trace",
                    self.debug.log_level
                )
            })?;

        // Palettes must only name known colors, and every value must parse
        let parser = ColorParser::new();
        for (mode, overrides) in [
            (ThemeMode::Light, &self.theme.light),
            (ThemeMode::Dark, &self.theme.dark),
        ] {
            for (name, value) in overrides {
                if !mode.palette().iter().any(|(known, _)| known == name) {
                    return Err(eyre!("Unknown color '{}' in [theme.{}]", name, mode));
                }
                parser
                    .parse(value)
                    .map_err(|e| eyre!("Invalid color value for '{}': {}", name, e))?;
            }
        }

        Ok(())
    }
}

// Merge implementations for each config section
impl SourceConfig {
    pub fn merge(&mut self, other: Self) {
        let default = SourceConfig::default();
        if other.url != default.url {
            self.url = other.url;
        }
        if other.proxy != default.proxy {
            self.proxy = other.proxy;
        }
        if other.table_selector != default.table_selector {
            self.table_selector = other.table_selector;
        }
        if other.timeout_secs != default.timeout_secs {
            self.timeout_secs = other.timeout_secs;
        }
    }
}

impl PerformanceConfig {
    pub fn merge(&mut self, other: Self) {
        let default = PerformanceConfig::default();
        if other.event_poll_interval_ms != default.event_poll_interval_ms {
            self.event_poll_interval_ms = other.event_poll_interval_ms;
        }
    }
}

impl ThemeConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ThemeConfig::default();
        if other.mode != default.mode {
            self.mode = other.mode;
        }
        self.light.extend(other.light);
        self.dark.extend(other.dark);
    }

    /// Mode fixed by config, or None for "auto"
    pub fn fixed_mode(&self) -> Option<ThemeMode> {
        self.mode.parse().ok()
    }
}

impl ChartConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ChartConfig::default();
        if other.symbol != default.symbol {
            self.symbol = other.symbol;
        }
        if other.interval != default.interval {
            self.interval = other.interval;
        }
        if other.range != default.range {
            self.range = other.range;
        }
        if other.timezone != default.timezone {
            self.timezone = other.timezone;
        }
        if other.locale != default.locale {
            self.locale = other.locale;
        }
        if other.hide_volume != default.hide_volume {
            self.hide_volume = other.hide_volume;
        }
        if other.open_in_browser != default.open_in_browser {
            self.open_in_browser = other.open_in_browser;
        }
    }
}

impl DebugConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DebugConfig::default();
        if other.enabled != default.enabled {
            self.enabled = other.enabled;
        }
        if other.log_level != default.log_level {
            self.log_level = other.log_level;
        }
        if other.log_file.is_some() {
            self.log_file = other.log_file;
        }
    }
}

/// Light or dark color scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    #[default]
    Dark,
}

impl ThemeMode {
    pub fn toggle(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Light => "☀️",
            Self::Dark => "🌙",
        }
    }

    /// Built-in colors for this mode
    pub fn palette(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Light => LIGHT_PALETTE,
            Self::Dark => DARK_PALETTE,
        }
    }

    /// Guess the terminal background from COLORFGBG ("fg;bg").
    ///
    /// Background colors 7 and 9-15 are light; anything else, or an unset
    /// variable, is treated as dark.
    pub fn detect() -> Self {
        Self::from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
    }

    pub fn from_colorfgbg(value: Option<&str>) -> Self {
        let bg = value
            .and_then(|v| v.rsplit(';').next())
            .and_then(|bg| bg.trim().parse::<u8>().ok());
        match bg {
            Some(7) | Some(9..=15) => Self::Light,
            _ => Self::Dark,
        }
    }
}

impl From<dsetui_cli::ThemeArg> for ThemeMode {
    fn from(arg: dsetui_cli::ThemeArg) -> Self {
        match arg {
            dsetui_cli::ThemeArg::Light => Self::Light,
            dsetui_cli::ThemeArg::Dark => Self::Dark,
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("Unknown theme: {}", other)),
        }
    }
}

const DARK_PALETTE: &[(&str, &str)] = &[
    ("primary", "cyan"),
    ("secondary", "yellow"),
    ("success", "green"),
    ("error", "red"),
    ("dimmed", "dark_gray"),
    ("background", "black"),
    ("text_primary", "white"),
    ("text_secondary", "dark_gray"),
    ("controls_bg", "indexed(236)"),
    ("table_header", "white"),
    ("table_header_bg", "indexed(238)"),
    ("table_selected", "indexed(24)"),
    ("alternate_row", "indexed(234)"),
    ("sort_indicator", "yellow"),
    ("tab_active", "cyan"),
    ("tab_inactive", "dark_gray"),
    ("loading", "yellow"),
];

const LIGHT_PALETTE: &[(&str, &str)] = &[
    ("primary", "blue"),
    ("secondary", "magenta"),
    ("success", "green"),
    ("error", "#cc0000"),
    ("dimmed", "gray"),
    ("background", "white"),
    ("text_primary", "black"),
    ("text_secondary", "gray"),
    ("controls_bg", "indexed(253)"),
    ("table_header", "black"),
    ("table_header_bg", "indexed(252)"),
    ("table_selected", "indexed(153)"),
    ("alternate_row", "indexed(255)"),
    ("sort_indicator", "blue"),
    ("tab_active", "blue"),
    ("tab_inactive", "gray"),
    ("loading", "magenta"),
];

/// Color parser with terminal capability detection
pub struct ColorParser {
    supports_true_color: bool,
    supports_256: bool,
    no_color: bool,
}

impl ColorParser {
    /// Create a new ColorParser with automatic terminal capability detection
    pub fn new() -> Self {
        let no_color = std::env::var("NO_COLOR").is_ok();
        let support = supports_color::on(Stream::Stdout);

        Self {
            supports_true_color: support.as_ref().map(|s| s.has_16m).unwrap_or(false),
            supports_256: support.as_ref().map(|s| s.has_256).unwrap_or(false),
            no_color,
        }
    }

    /// Parse a color string (hex, indexed or named) and convert to appropriate terminal color
    pub fn parse(&self, s: &str) -> Result<Color> {
        let trimmed = s.trim();

        // Validate first so NO_COLOR does not hide config mistakes
        let color = self.parse_color(trimmed)?;
        if self.no_color {
            return Ok(Color::Reset);
        }
        Ok(color)
    }

    fn parse_color(&self, trimmed: &str) -> Result<Color> {
        // Hex format: "#ff0000" or "#FF0000" (6-character hex)
        if trimmed.starts_with('#') {
            let (r, g, b) = parse_hex(trimmed)?;
            return Ok(self.convert_rgb_to_terminal_color(r, g, b));
        }

        // Indexed colors: "indexed(236)" for explicit 256-color palette
        let lower = trimmed.to_lowercase();
        if lower.starts_with("indexed(") && lower.ends_with(')') {
            let num_str = &trimmed[8..trimmed.len() - 1];
            let num = num_str.trim().parse::<u8>().map_err(|_| {
                eyre!(
                    "Invalid indexed color: '{}'. Expected format: indexed(0-255)",
                    trimmed
                )
            })?;
            return Ok(Color::Indexed(num));
        }

        match lower.as_str() {
            // Basic ANSI colors
            "black" => Ok(Color::Black),
            "red" => Ok(Color::Red),
            "green" => Ok(Color::Green),
            "yellow" => Ok(Color::Yellow),
            "blue" => Ok(Color::Blue),
            "magenta" => Ok(Color::Magenta),
            "cyan" => Ok(Color::Cyan),
            "white" => Ok(Color::White),

            // Bright variants (256-color palette)
            "bright_black" | "bright black" => Ok(Color::Indexed(8)),
            "bright_red" | "bright red" => Ok(Color::Indexed(9)),
            "bright_green" | "bright green" => Ok(Color::Indexed(10)),
            "bright_yellow" | "bright yellow" => Ok(Color::Indexed(11)),
            "bright_blue" | "bright blue" => Ok(Color::Indexed(12)),
            "bright_magenta" | "bright magenta" => Ok(Color::Indexed(13)),
            "bright_cyan" | "bright cyan" => Ok(Color::Indexed(14)),
            "bright_white" | "bright white" => Ok(Color::Indexed(15)),

            // Gray aliases
            "gray" | "grey" => Ok(Color::Indexed(8)),
            "dark_gray" | "dark gray" | "dark_grey" | "dark grey" => Ok(Color::Indexed(8)),
            "light_gray" | "light gray" | "light_grey" | "light grey" => Ok(Color::Indexed(7)),

            "reset" | "default" | "none" => Ok(Color::Reset),

            _ => Err(eyre!(
                "Unknown color name: '{}'. Supported: basic ANSI colors (red, blue, etc.), \
                 bright variants (bright_red, etc.), indexed(n), or hex colors (#ff0000)",
                trimmed
            )),
        }
    }

    /// Convert RGB values to appropriate terminal color based on capabilities
    fn convert_rgb_to_terminal_color(&self, r: u8, g: u8, b: u8) -> Color {
        if self.supports_true_color {
            Color::Rgb(r, g, b)
        } else if self.supports_256 {
            Color::Indexed(rgb_to_256_color(r, g, b))
        } else {
            rgb_to_basic_ansi(r, g, b)
        }
    }
}

impl Default for ColorParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse hex color string (#ff0000) to RGB components
fn parse_hex(s: &str) -> Result<(u8, u8, u8)> {
    if !s.starts_with('#') || s.len() != 7 || !s.is_ascii() {
        return Err(eyre!(
            "Invalid hex color format: '{}'. Expected format: #rrggbb",
            s
        ));
    }

    let r = u8::from_str_radix(&s[1..3], 16)
        .map_err(|_| eyre!("Invalid red component in hex color: {}", s))?;
    let g = u8::from_str_radix(&s[3..5], 16)
        .map_err(|_| eyre!("Invalid green component in hex color: {}", s))?;
    let b = u8::from_str_radix(&s[5..7], 16)
        .map_err(|_| eyre!("Invalid blue component in hex color: {}", s))?;

    Ok((r, g, b))
}

/// Convert RGB to nearest 256-color palette index
/// Uses standard xterm 256-color palette
pub fn rgb_to_256_color(r: u8, g: u8, b: u8) -> u8 {
    // Check if it's a gray shade (r ≈ g ≈ b)
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 10 {
        // Map to grayscale ramp (232-255)
        let gray = (r as u16 + g as u16 + b as u16) / 3;
        if gray < 8 {
            return 16; // Black
        } else if gray > 247 {
            return 231; // White
        } else {
            return 232 + ((gray - 8) * 24 / 240) as u8;
        }
    }

    // Map to 6x6x6 color cube (16-231)
    let r_idx = (r as u16 * 5 / 255) as u8;
    let g_idx = (g as u16 * 5 / 255) as u8;
    let b_idx = (b as u16 * 5 / 255) as u8;

    16 + 36 * r_idx + 6 * g_idx + b_idx
}

/// Convert RGB to nearest basic ANSI color (8 colors)
pub fn rgb_to_basic_ansi(r: u8, g: u8, b: u8) -> Color {
    let r_bright = r > 128;
    let g_bright = g > 128;
    let b_bright = b > 128;

    // Check for grayscale
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 30 {
        let avg = (r as u16 + g as u16 + b as u16) / 3;
        return if avg < 64 { Color::Black } else { Color::White };
    }

    match (r_bright, g_bright, b_bright) {
        (false, false, false) => Color::Black,
        (true, false, false) => Color::Red,
        (false, true, false) => Color::Green,
        (true, true, false) => Color::Yellow,
        (false, false, true) => Color::Blue,
        (true, false, true) => Color::Magenta,
        (false, true, true) => Color::Cyan,
        (true, true, true) => Color::White,
    }
}

/// Theme containing parsed colors ready for use
#[derive(Debug, Clone)]
pub struct Theme {
    pub mode: ThemeMode,
    pub colors: HashMap<String, Color>,
}

impl Theme {
    /// Build the theme for `mode`: built-in palette first, then config overrides
    pub fn from_config(config: &ThemeConfig, mode: ThemeMode) -> Result<Self> {
        let parser = ColorParser::new();
        let overrides = match mode {
            ThemeMode::Light => &config.light,
            ThemeMode::Dark => &config.dark,
        };

        let mut colors = HashMap::new();
        for (name, default) in mode.palette() {
            let value = overrides.get(*name).map(String::as_str).unwrap_or(default);
            let color = parser
                .parse(value)
                .map_err(|e| eyre!("Invalid color value for '{}': {}", name, e))?;
            colors.insert(name.to_string(), color);
        }

        Ok(Self { mode, colors })
    }

    /// Get a color by name, returns Reset if not found
    pub fn get(&self, name: &str) -> Color {
        self.colors.get(name).copied().unwrap_or(Color::Reset)
    }

    /// Get a color by name, returns None if not found
    pub fn get_optional(&self, name: &str) -> Option<Color> {
        self.colors.get(name).copied()
    }
}

// Default configuration template
const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");
