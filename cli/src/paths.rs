//! Path utilities for apg.

use std::io;
use std::path::PathBuf;

/// Default base configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".apg";

/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Provides access to the apg directory structure.
#[derive(Debug, Clone)]
pub struct Paths {
    /// User's home directory.
    pub home_dir: PathBuf,
}

impl Paths {
    /// Creates a new Paths instance rooted at the user's home directory.
    pub fn new() -> io::Result<Self> {
        let home_dir = dirs::home_dir().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "could not find home directory")
        })?;
        Ok(Self { home_dir })
    }

    /// Creates a Paths instance rooted at `home`.
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self {
            home_dir: home.into(),
        }
    }

    /// Returns the base directory (~/.apg).
    pub fn base_dir(&self) -> PathBuf {
        self.home_dir.join(DEFAULT_BASE_DIR)
    }

    /// Returns the config file path (~/.apg/config.yaml).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir().join(DEFAULT_CONFIG_FILE)
    }

    /// Creates the base directory if it doesn't exist.
    pub fn ensure_base_dir(&self) -> io::Result<()> {
        std::fs::create_dir_all(self.base_dir())
    }
}
