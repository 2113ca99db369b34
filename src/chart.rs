//! Live price chart, shown through the chart provider's web page.

use crate::config::{ChartConfig, ThemeMode};
use color_eyre::eyre::eyre;
use color_eyre::Result;

const CHART_BASE_URL: &str = "https://www.tradingview.com/chart/";

/// A configured chart. Created once; the theme is fixed at creation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartWidget {
    pub config: ChartConfig,
    theme: ThemeMode,
}

impl ChartWidget {
    pub fn new(config: &ChartConfig, theme: ThemeMode) -> Self {
        log::info!(
            "Creating chart widget for {} ({} theme)",
            config.symbol,
            theme
        );
        Self {
            config: config.clone(),
            theme,
        }
    }

    /// Theme the chart was created with
    pub fn theme(&self) -> ThemeMode {
        self.theme
    }

    pub fn url(&self) -> String {
        format!(
            "{}?symbol={}&interval={}&theme={}",
            CHART_BASE_URL,
            urlencoding::encode(&self.config.symbol),
            urlencoding::encode(&self.config.interval),
            self.theme
        )
    }

    /// Settings as label/value pairs, in display order
    pub fn settings(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Symbol", self.config.symbol.clone()),
            ("Interval", self.config.interval.clone()),
            ("Range", self.config.range.clone()),
            ("Timezone", self.config.timezone.clone()),
            ("Locale", self.config.locale.clone()),
            (
                "Volume",
                if self.config.hide_volume {
                    "hidden".to_string()
                } else {
                    "shown".to_string()
                },
            ),
            ("Theme", self.theme.to_string()),
        ]
    }

    /// Open the chart in the default browser
    pub fn open(&self) -> Result<()> {
        let url = self.url();
        log::info!("Opening chart {}", url);
        open::that(&url).map_err(|e| eyre!("Could not open browser for {}: {}", url, e))
    }
}
