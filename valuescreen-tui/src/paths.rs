//! Config file discovery shared by both binaries.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use valuescreen_core::config::{ScreenConfig, DEFAULT_CONFIG_FILE};

/// `<user config dir>/valuescreen/valuescreen.toml`.
pub fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("valuescreen")
        .join(DEFAULT_CONFIG_FILE)
}

/// The config file that would be used, if any: `explicit` when given,
/// then `./valuescreen.toml`, then the user config path.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    [PathBuf::from(DEFAULT_CONFIG_FILE), user_config_path()]
        .into_iter()
        .find(|p| p.is_file())
}

/// Load the resolved config, or built-in defaults when no file exists.
/// An explicit path that cannot be read is an error.
pub fn load_config(explicit: Option<&Path>) -> Result<ScreenConfig> {
    match resolve_config_path(explicit) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            ScreenConfig::from_file(&path)
                .with_context(|| format!("loading config {}", path.display()))
        }
        None => Ok(ScreenConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_path_ends_with_file_name() {
        let path = user_config_path();
        assert!(path.ends_with("valuescreen/valuescreen.toml"));
    }

    #[test]
    fn explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[pipeline]\noutput_dir = \"out\"\n").unwrap();

        assert_eq!(resolve_config_path(Some(&path)), Some(path.clone()));
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.pipeline.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
