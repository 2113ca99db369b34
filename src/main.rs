use clap::Parser;
use color_eyre::Result;
use dsetui::{
    resolve_theme_mode, App, AppConfig, AppEvent, Args, CacheManager, ConfigManager,
    SourceOptions, ThemeMode, APP_NAME,
};
use ratatui::DefaultTerminal;
use simplelog::{Config, LevelFilter, WriteLogger};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::Duration;

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(
    mut terminal: DefaultTerminal,
    mut app: App,
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
    poll_interval: Duration,
) -> Result<()> {
    render(&mut terminal, &mut app)?;
    tx.send(AppEvent::Fetch)?;

    loop {
        if crossterm::event::poll(poll_interval)? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => {
                    if key.is_press() {
                        tx.send(AppEvent::Key(key))?
                    }
                }
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        let updated = match rx.recv_timeout(Duration::from_millis(0)) {
            Ok(event) => {
                match event {
                    AppEvent::Exit => break,
                    AppEvent::Crash(msg) => {
                        return Err(color_eyre::eyre::eyre!(msg));
                    }
                    event => {
                        if let Some(event) = app.event(&event) {
                            tx.send(event)?;
                        }
                    }
                }
                true
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => false,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        };

        if updated {
            render(&mut terminal, &mut app)?;
        }
    }
    Ok(())
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        let config_manager = ConfigManager::new(APP_NAME)?;
        match config_manager.write_default_config(args.force) {
            Ok(path) => {
                println!("Configuration written to {}", path.display());
                return Ok(Some(()));
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    if args.clear_cache {
        match CacheManager::new(APP_NAME) {
            Ok(cache) => {
                if let Err(e) = cache.clear_all() {
                    eprintln!("Error clearing cache: {}", e);
                    std::process::exit(1);
                }
                println!("Cache cleared successfully");
                return Ok(Some(()));
            }
            Err(_e) => {
                println!("No cache to clear");
                return Ok(Some(()));
            }
        }
    }

    Ok(None)
}

/// Send log output to a file; the terminal belongs to the UI
fn init_logging(config: &AppConfig, cache: &CacheManager) -> Result<Option<PathBuf>> {
    let path = match &config.debug.log_file {
        Some(path) => path.clone(),
        None if config.debug.enabled => {
            cache.ensure_cache_dir()?;
            cache.cache_file(dsetui::cache::LOG_FILE)
        }
        None => return Ok(None),
    };
    let level: LevelFilter = config
        .debug
        .log_level
        .parse()
        .unwrap_or(LevelFilter::Info);
    let file = std::fs::File::create(&path)?;
    WriteLogger::init(level, Config::default(), file)?;
    Ok(Some(path))
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    let mut config = match AppConfig::load(APP_NAME) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    };
    config.apply_args(&args);

    let cache = CacheManager::new(APP_NAME).unwrap_or_else(|e| {
        eprintln!("Warning: Could not initialize cache manager: {}", e);
        CacheManager::with_dir(std::env::temp_dir().join(APP_NAME))
    });

    match init_logging(&config, &cache) {
        Ok(Some(path)) => log::info!(
            "{} {} logging to {}",
            APP_NAME,
            env!("CARGO_PKG_VERSION"),
            path.display()
        ),
        Ok(None) => {}
        Err(e) => eprintln!("Warning: Could not set up logging: {}", e),
    }

    let source = match SourceOptions::from_args_and_config(&args, &config).build() {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let theme_mode = resolve_theme_mode(args.theme.map(ThemeMode::from), &cache, &config.theme);
    let poll_interval = Duration::from_millis(config.performance.event_poll_interval_ms);

    let (tx, rx) = channel::<AppEvent>();
    let mut app = App::new_with_config(tx.clone(), source, &config, cache, theme_mode);
    if config.debug.enabled {
        app.enable_debug();
    }

    let terminal = ratatui::init();
    let result = run(terminal, app, tx, rx, poll_interval);
    ratatui::restore();
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
