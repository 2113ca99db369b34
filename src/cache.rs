use crate::config::ThemeMode;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use fs2::FileExt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Registry of known cache files
const CACHE_FILES: &[&str] = &[THEME_FILE, LOG_FILE];

/// Last theme the user toggled to
const THEME_FILE: &str = "theme";

/// Default log file when debug logging is enabled
pub const LOG_FILE: &str = "dsetui.log";

/// Manages cache directory and cache file operations
#[derive(Clone)]
pub struct CacheManager {
    pub(crate) cache_dir: PathBuf,
}

impl CacheManager {
    /// Create a CacheManager with a custom cache directory (primarily for testing)
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Create a new CacheManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| color_eyre::eyre::eyre!("Could not determine cache directory"))?
            .join(app_name);

        Ok(Self { cache_dir })
    }

    /// Get the cache directory path
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Get path to a specific cache file
    pub fn cache_file(&self, filename: &str) -> PathBuf {
        self.cache_dir.join(filename)
    }

    /// Ensure the cache directory exists
    pub fn ensure_cache_dir(&self) -> Result<()> {
        if !self.cache_dir.exists() {
            fs::create_dir_all(&self.cache_dir)?;
        }
        Ok(())
    }

    /// Clear all registered cache files
    pub fn clear_all(&self) -> Result<()> {
        for filename in CACHE_FILES {
            let file_path = self.cache_file(filename);
            if file_path.exists() {
                if let Err(e) = fs::remove_file(&file_path) {
                    log::warn!("Could not remove cache file {}: {}", filename, e);
                }
            }
        }

        Ok(())
    }

    /// Saved theme, if one was saved and is still readable.
    ///
    /// A missing or unreadable file is not an error; the caller falls back
    /// to config or terminal detection.
    pub fn load_theme_preference(&self) -> Option<ThemeMode> {
        let path = self.cache_file(THEME_FILE);
        match fs::read_to_string(&path) {
            Ok(content) => match content.trim().parse() {
                Ok(mode) => Some(mode),
                Err(e) => {
                    log::warn!("Ignoring saved theme in {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("Could not read saved theme: {}", e);
                None
            }
        }
    }

    pub fn save_theme_preference(&self, mode: ThemeMode) -> Result<()> {
        self.ensure_cache_dir()?;

        // Truncate only once the lock is held
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.cache_file(THEME_FILE))?;
        FileExt::try_lock_exclusive(&file)
            .map_err(|e| eyre!("Could not lock theme file: {}", e))?;

        file.set_len(0)?;
        writeln!(file, "{}", mode)?;
        file.flush()?;
        FileExt::unlock(&file)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_preference_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::with_dir(dir.path().join("nested"));
        assert_eq!(cache.load_theme_preference(), None);

        cache.save_theme_preference(ThemeMode::Light).unwrap();
        assert_eq!(cache.load_theme_preference(), Some(ThemeMode::Light));
        cache.save_theme_preference(ThemeMode::Dark).unwrap();
        assert_eq!(cache.load_theme_preference(), Some(ThemeMode::Dark));
    }

    #[test]
    fn test_shorter_preference_replaces_longer_one() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::with_dir(dir.path().to_path_buf());
        cache.save_theme_preference(ThemeMode::Light).unwrap();
        cache.save_theme_preference(ThemeMode::Dark).unwrap();
        assert_eq!(
            fs::read_to_string(cache.cache_file(THEME_FILE)).unwrap(),
            "dark\n"
        );
    }

    #[test]
    fn test_preference_not_written_while_locked() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::with_dir(dir.path().to_path_buf());
        cache.save_theme_preference(ThemeMode::Light).unwrap();

        let held = fs::File::open(cache.cache_file(THEME_FILE)).unwrap();
        FileExt::lock_exclusive(&held).unwrap();
        assert!(cache.save_theme_preference(ThemeMode::Dark).is_err());
        FileExt::unlock(&held).unwrap();

        assert_eq!(cache.load_theme_preference(), Some(ThemeMode::Light));
    }

    #[test]
    fn test_garbage_preference_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::with_dir(dir.path().to_path_buf());
        fs::write(cache.cache_file(THEME_FILE), "purple\n").unwrap();
        assert_eq!(cache.load_theme_preference(), None);
    }

    #[test]
    fn test_clear_all_removes_registered_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::with_dir(dir.path().to_path_buf());
        cache.save_theme_preference(ThemeMode::Light).unwrap();
        fs::write(cache.cache_file(LOG_FILE), "log").unwrap();
        fs::write(cache.cache_file("unrelated"), "keep").unwrap();

        cache.clear_all().unwrap();
        assert!(!cache.cache_file(THEME_FILE).exists());
        assert!(!cache.cache_file(LOG_FILE).exists());
        assert!(cache.cache_file("unrelated").exists());
    }
}
