//! Application paths management.

use directories::ProjectDirs;
use std::path::PathBuf;

/// Platform-specific locations vox reads from.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
}

impl AppPaths {
    /// Create paths using platform-specific directories.
    pub fn new() -> Option<Self> {
        let proj_dirs = ProjectDirs::from("com", "vox", "vox")?;
        let config_dir = proj_dirs.config_dir().to_path_buf();

        Some(Self {
            config_file: config_dir.join("config.toml"),
            config_dir,
        })
    }

    /// Create the config directory.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config_dir)
    }

    /// Check if `vox init` has been run.
    pub fn is_initialized(&self) -> bool {
        self.config_file.exists()
    }
}
