#![allow(dead_code)]

use color_eyre::eyre::eyre;
use dsetui::{
    App, AppConfig, AppEvent, CacheManager, ShareTable, TableSource, ThemeMode,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// The three-row table used throughout the docs
pub fn sample_table() -> ShareTable {
    ShareTable::new(
        vec!["#".into(), "TRADING CODE".into(), "LTP".into()],
        vec![
            vec!["1".into(), "Zeta".into(), "10".into()],
            vec!["2".into(), "Alpha2".into(), "9".into()],
            vec!["3".into(), "Alpha10".into(), "20".into()],
        ],
    )
}

pub fn names(table: &ShareTable) -> Vec<String> {
    table.rows.iter().map(|r| r.cell(1).to_string()).collect()
}

pub fn visible_names(table: &ShareTable) -> Vec<String> {
    table.visible_rows().map(|r| r.cell(1).to_string()).collect()
}

/// Source that hands out a fixed result and counts fetches
pub struct FixtureSource {
    result: Result<ShareTable, String>,
    pub fetches: Arc<AtomicUsize>,
}

impl FixtureSource {
    pub fn ok(table: ShareTable) -> Self {
        Self {
            result: Ok(table),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl TableSource for FixtureSource {
    fn fetch(&self) -> color_eyre::Result<ShareTable> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.result.clone().map_err(|e| eyre!(e))
    }

    fn describe(&self) -> String {
        "fixture".to_string()
    }
}

pub struct TestApp {
    pub app: App,
    pub rx: Receiver<AppEvent>,
    pub fetches: Arc<AtomicUsize>,
    pub cache_dir: TempDir,
}

pub fn test_app(source: FixtureSource) -> TestApp {
    test_app_with_config(source, AppConfig::default())
}

pub fn test_app_with_config(source: FixtureSource, config: AppConfig) -> TestApp {
    let cache_dir = TempDir::new().expect("Failed to create temp dir");
    let cache = CacheManager::with_dir(cache_dir.path().to_path_buf());
    let (tx, rx) = mpsc::channel();
    let fetches = Arc::clone(&source.fetches);
    let app = App::new_with_config(tx, Arc::new(source), &config, cache, ThemeMode::Dark);
    TestApp {
        app,
        rx,
        fetches,
        cache_dir,
    }
}

impl TestApp {
    /// Feed an event and every follow-up event it returns through the app, like the main loop does
    pub fn dispatch(&mut self, event: AppEvent) {
        let mut next = self.app.event(&event);
        while let Some(event) = next {
            next = self.app.event(&event);
        }
    }

    /// Wait for the background fetch and hand its result to the app
    pub fn finish_fetch(&mut self) {
        let event = self
            .rx
            .recv_timeout(Duration::from_secs(5))
            .expect("fetch did not complete");
        assert!(matches!(event, AppEvent::Loaded(_)));
        self.app.event(&event);
    }

    pub fn load(&mut self) {
        self.dispatch(AppEvent::Fetch);
        self.finish_fetch();
    }
}
