//! Locating and loading the layout configuration.
//!
//! Without `--config`, the configuration lives in the platform-specific
//! config folder:
//! - macOS: ~/Library/Application Support/org.matchview.matchview/
//! - Windows: %APPDATA%/matchview/matchview/config/
//! - Linux: ~/.config/matchview/

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use matchview_layout::{ConfigError, LayoutConfig, load_config};

const APP_QUALIFIER: &str = "org";
const APP_ORG: &str = "matchview";
const APP_NAME: &str = "matchview";
const CONFIG_FILENAME: &str = "layout.toml";

/// Default configuration file path, if the platform has a config folder.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

/// Loads `path`, falling back to defaults only when the file does not exist.
///
/// A file that exists but cannot be read or parsed is an error, so it is
/// never silently replaced.
pub fn load_or_default(path: &Path) -> Result<LayoutConfig, ConfigError> {
    match load_config(path) {
        Ok(config) => Ok(config),
        Err(ConfigError::Io(error)) if error.kind() == ErrorKind::NotFound => {
            tracing::info!("No layout config at {:?}, using defaults", path);
            Ok(LayoutConfig::default())
        }
        Err(error) => Err(error),
    }
}

/// Effective configuration and the path it belongs to.
///
/// An explicit path must load; the default path may be missing but must be
/// valid when present.
pub fn resolve_config(explicit: Option<&Path>) -> Result<(LayoutConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        let config = load_config(path)
            .with_context(|| format!("load layout config {}", path.display()))?;
        return Ok((config, Some(path.to_path_buf())));
    }
    match default_config_path() {
        Some(path) => {
            let config = load_or_default(&path)
                .with_context(|| format!("load layout config {}", path.display()))?;
            Ok((config, Some(path)))
        }
        None => {
            tracing::warn!("Could not determine config path, using defaults");
            Ok((LayoutConfig::default(), None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_ends_with_file_name() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with(CONFIG_FILENAME));
        }
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = load_or_default(&dir.path().join("layout.toml")).expect("defaults");
        assert_eq!(config, LayoutConfig::default());
    }

    #[test]
    fn invalid_file_is_reported_and_kept() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("layout.toml");
        std::fs::write(&path, "[grid\nwidth = ").expect("write file");
        assert!(matches!(load_or_default(&path), Err(ConfigError::Parse(_))));
        let content = std::fs::read_to_string(&path).expect("read file");
        assert_eq!(content, "[grid\nwidth = ");
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("absent.toml");
        assert!(resolve_config(Some(&missing)).is_err());

        let path = dir.path().join("layout.toml");
        std::fs::write(&path, "[view]\npage_size = 3\n").expect("write file");
        let (config, resolved) = resolve_config(Some(&path)).expect("load config");
        assert_eq!(config.view.page_size, 3);
        assert_eq!(resolved, Some(path));
    }
}
