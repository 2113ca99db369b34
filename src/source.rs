//! Where the share table comes from.
//!
//! A [`TableSource`] produces a fresh [`ShareTable`] on every call. The
//! network source requests the price page (optionally through a proxy
//! prefix); the file source reads a saved copy of the same page. Both hand
//! the HTML to [`parse_share_table`].

use crate::config::AppConfig;
use crate::table::ShareTable;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use thiserror::Error;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+").expect("BUG: hardcoded whitespace pattern is invalid")
});

static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("BUG: hardcoded CSS selector 'tr' is invalid"));

static HEADER_CELL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th").expect("BUG: hardcoded CSS selector 'th' is invalid"));

static DATA_CELL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("td, th").expect("BUG: hardcoded CSS selector 'td, th' is invalid")
});

static TD_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("BUG: hardcoded CSS selector 'td' is invalid"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("Table not found")]
    TableNotFound,
    #[error("Invalid table selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// Something that can produce the share table on demand.
pub trait TableSource: Send + Sync {
    fn fetch(&self) -> Result<ShareTable>;

    /// Short human-readable description (shown in the status bar and log)
    fn describe(&self) -> String;
}

/// Fetches the price page over HTTP
#[derive(Debug, Clone)]
pub struct HttpSource {
    pub url: String,
    pub proxy: Option<String>,
    pub selector: String,
    pub timeout: Duration,
}

impl HttpSource {
    /// The URL actually requested: the page URL appended to the proxy prefix
    pub fn request_url(&self) -> String {
        match &self.proxy {
            Some(proxy) => format!("{}{}", proxy, self.url),
            None => self.url.clone(),
        }
    }
}

impl TableSource for HttpSource {
    fn fetch(&self) -> Result<ShareTable> {
        let url = self.request_url();
        log::info!("Requesting {}", url);
        let response = ureq::get(&url).timeout(self.timeout).call().map_err(|e| {
            eyre!("Failed to load data. Check the URL and your connection: {}", e)
        })?;
        let status = response.status();
        if status >= 400 {
            return Err(eyre!(
                "Failed to load data: server returned {} {}",
                status,
                response.status_text()
            ));
        }
        let body = response
            .into_string()
            .map_err(|e| eyre!("Failed to load data while reading the response: {}", e))?;
        log::debug!("Received {} bytes from {}", body.len(), url);
        Ok(parse_share_table(&body, &self.selector)?)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Reads a saved copy of the price page
#[derive(Debug, Clone)]
pub struct FileSource {
    pub path: PathBuf,
    pub selector: String,
}

impl TableSource for FileSource {
    fn fetch(&self) -> Result<ShareTable> {
        let html = std::fs::read_to_string(&self.path).map_err(|e| {
            eyre!(
                "Failed to load data from {}: {}",
                self.path.display(),
                e
            )
        })?;
        Ok(parse_share_table(&html, &self.selector)?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Where to load the table from, after CLI overrides are applied to config
#[derive(Debug, Clone, Default)]
pub struct SourceOptions {
    pub url: String,
    pub proxy: Option<String>,
    pub file: Option<PathBuf>,
    pub selector: String,
    pub timeout_secs: u64,
}

impl SourceOptions {
    /// Create SourceOptions from CLI args and config, with CLI args taking precedence
    pub fn from_args_and_config(args: &crate::Args, config: &AppConfig) -> Self {
        let proxy = if args.no_proxy {
            None
        } else {
            args.proxy.clone().or_else(|| config.source.proxy.clone())
        };
        Self {
            url: args.url.clone().unwrap_or_else(|| config.source.url.clone()),
            proxy: proxy.filter(|p| !p.is_empty()),
            file: args.file.clone(),
            selector: args
                .selector
                .clone()
                .unwrap_or_else(|| config.source.table_selector.clone()),
            timeout_secs: args.timeout.unwrap_or(config.source.timeout_secs),
        }
    }

    /// Build the source these options describe
    pub fn build(&self) -> Result<Arc<dyn TableSource>> {
        // Reject a bad selector up front rather than on every fetch
        compile_selector(&self.selector)?;
        if self.timeout_secs == 0 {
            return Err(eyre!("timeout must be greater than 0"));
        }
        match &self.file {
            Some(path) => Ok(Arc::new(FileSource {
                path: path.clone(),
                selector: self.selector.clone(),
            })),
            None => Ok(Arc::new(HttpSource {
                url: self.url.clone(),
                proxy: self.proxy.clone(),
                selector: self.selector.clone(),
                timeout: Duration::from_secs(self.timeout_secs),
            })),
        }
    }
}

fn compile_selector(selector: &str) -> std::result::Result<Selector, LoadError> {
    Selector::parse(selector).map_err(|e| LoadError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Element text, trimmed, with internal whitespace collapsed
fn cell_text(el: ElementRef<'_>) -> String {
    let raw: String = el.text().collect();
    WHITESPACE.replace_all(raw.trim(), " ").into_owned()
}

/// Extract the first table matching `selector` from a page.
///
/// Header texts come from the first row made of `th` cells; every row with at
/// least one `td` becomes a data row.
pub fn parse_share_table(html: &str, selector: &str) -> std::result::Result<ShareTable, LoadError> {
    let table_selector = compile_selector(selector)?;
    let document = Html::parse_document(html);
    let table = document
        .select(&table_selector)
        .next()
        .ok_or(LoadError::TableNotFound)?;

    let mut headers = Vec::new();
    let mut rows = Vec::new();
    for tr in table.select(&ROW_SELECTOR) {
        if tr.select(&TD_SELECTOR).next().is_some() {
            rows.push(tr.select(&DATA_CELL_SELECTOR).map(cell_text).collect());
        } else if headers.is_empty() {
            headers = tr.select(&HEADER_CELL_SELECTOR).map(cell_text).collect();
        }
    }

    Ok(ShareTable::new(headers, rows))
}
