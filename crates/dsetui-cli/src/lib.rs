//! Shared CLI definitions for dsetui.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser, ValueEnum};

/// Color theme to start with (overrides the saved preference and config)
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ThemeArg {
    /// Light background palette
    Light,
    /// Dark background palette
    Dark,
}

/// Command-line arguments for dsetui
#[derive(Clone, Parser, Debug, Default)]
#[command(
    name = "dsetui",
    version,
    about = "Dhaka Stock Exchange share prices in the terminal",
    long_about = include_str!("../long_about.txt")
)]
pub struct Args {
    /// Page to scrape the share table from (overrides config [source] url)
    #[arg(long = "url", value_name = "URL")]
    pub url: Option<String>,

    /// Proxy prefix the page URL is appended to (overrides config [source] proxy)
    #[arg(long = "proxy", value_name = "URL", conflicts_with = "no_proxy")]
    pub proxy: Option<String>,

    /// Request the page directly instead of through the proxy
    #[arg(long = "no-proxy", action)]
    pub no_proxy: bool,

    /// Load the table from a saved copy of the page instead of the network
    #[arg(long = "file", value_name = "PATH")]
    pub file: Option<std::path::PathBuf>,

    /// CSS selector of the share table (default: table.shares-table)
    #[arg(long = "selector", value_name = "SELECTOR")]
    pub selector: Option<String>,

    /// Request timeout in seconds (default: 30)
    #[arg(long = "timeout", value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Start with this theme instead of the saved one
    #[arg(long = "theme", value_enum)]
    pub theme: Option<ThemeArg>,

    /// Enable debug mode to show operational information and write a log file
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Write log output to this file (default with --debug: cache directory)
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<std::path::PathBuf>,

    /// Generate default configuration file at ~/.config/dsetui/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,

    /// Clear all cache data (saved theme, log) and exit
    #[arg(long = "clear-cache", action)]
    pub clear_cache: bool,
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

/// Render command-line options as markdown.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    let usage = cmd.render_usage();
    out.push_str(&usage.to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let mut parts = Vec::new();
        if let Some(s) = arg.get_short() {
            parts.push(format!("-{s}"));
        }
        if let Some(l) = arg.get_long() {
            parts.push(format!("--{l}"));
        }
        let op = parts.join(", ");
        let placeholder: String = if arg.get_action().takes_values() {
            arg.get_value_names()
                .map(|names| {
                    names
                        .iter()
                        .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default()
        } else {
            String::new()
        };
        let option_str = if placeholder.is_empty() {
            op
        } else {
            format!("{op} {placeholder}")
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}
