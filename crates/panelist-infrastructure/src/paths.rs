//! Unified path management for panelist data files.
//!
//! All transcripts live under the platform config directory so the CLI and
//! any other frontend agree on where a session's data is.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/panelist/          # Config directory
//! └── transcripts/             # One TOML file per session
//!     ├── default_session.toml
//!     └── <session-id>.toml
//! ```

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for panelist.
pub struct PanelistPaths;

impl PanelistPaths {
    /// Returns the panelist configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: e.g. `~/.config/panelist/`
    /// - `Err(PathError::ConfigDirNotFound)`: could not determine directory
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("panelist"))
            .ok_or(PathError::ConfigDirNotFound)
    }
}
