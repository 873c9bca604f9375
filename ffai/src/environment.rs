use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "ffai";
pub const CONFIG_FILE: &str = "config.toml";
pub const LOG_FILE: &str = "ffai.log";

pub fn get_config_file(name: &str) -> Result<PathBuf> {
    let xdg_dir =
        xdg::BaseDirectories::with_prefix(APP_NAME).context("failed get xdg directory")?;
    xdg_dir.place_config_file(name).context("failed get path")
}

pub fn get_data_file(name: &str) -> Result<PathBuf> {
    let xdg_dir =
        xdg::BaseDirectories::with_prefix(APP_NAME).context("failed get xdg directory")?;
    xdg_dir.place_data_file(name).context("failed get path")
}

/// `$XDG_DATA_HOME/ffai`, created on demand.
pub fn default_data_dir() -> Result<PathBuf> {
    let log = get_data_file(LOG_FILE)?;
    log.parent()
        .map(Path::to_path_buf)
        .context("data file has no parent directory")
}

/// Expand a leading `~` and environment references in a configured path.
pub fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(raw).as_ref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_paths_are_unchanged() {
        assert_eq!(expand_path("/var/lib/ffai"), PathBuf::from("/var/lib/ffai"));
        assert_eq!(expand_path("relative/dir"), PathBuf::from("relative/dir"));
    }

    #[test]
    fn tilde_is_expanded() {
        let expanded = expand_path("~/ffai-data");
        assert!(!expanded.starts_with("~"));
        assert!(expanded.ends_with("ffai-data"));
    }
}
