// src/core/paths.rs

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::constants::{CONFIG_FILENAME, HIDDEN_CONFIG_FILENAME};

/// Result of the configuration file search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSearch {
    Found(PathBuf),
    NotFound,
    /// Both `litr.toml` and `.litr.toml` exist in the same directory.
    Duplicate(PathBuf),
}

/// Searches for the configuration file starting at the current working
/// directory, walking toward the filesystem root, then falling back to
/// the user's home directory.
pub fn find_config_file() -> Result<ConfigSearch> {
    let cwd = env::current_dir().context("Cannot determine the current working directory")?;
    Ok(search_from(&cwd))
}

pub fn search_from(cwd: &Path) -> ConfigSearch {
    let mut directory = cwd.to_path_buf();

    loop {
        log::trace!("Searching configuration file in: {}", directory.display());
        match find_in(&directory) {
            ConfigSearch::NotFound => {}
            found => return found,
        }

        match directory.parent() {
            Some(parent) => directory = parent.to_path_buf(),
            None => break,
        }
    }

    if let Some(home) = dirs::home_dir() {
        log::trace!("Searching configuration file in user home: {}", home.display());
        return find_in(&home);
    }

    ConfigSearch::NotFound
}

fn find_in(directory: &Path) -> ConfigSearch {
    let file_path = directory.join(CONFIG_FILENAME);
    let hidden_file_path = directory.join(HIDDEN_CONFIG_FILENAME);

    let file_exists = file_path.is_file();
    let hidden_file_exists = hidden_file_path.is_file();

    if file_exists && hidden_file_exists {
        return ConfigSearch::Duplicate(directory.to_path_buf());
    }
    if file_exists {
        return ConfigSearch::Found(file_path);
    }
    if hidden_file_exists {
        return ConfigSearch::Found(hidden_file_path);
    }

    ConfigSearch::NotFound
}
