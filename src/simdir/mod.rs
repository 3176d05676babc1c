//! Entry point for a simulation directory.

pub mod scanner;

pub use scanner::{DirectoryScanner, ScanOptions, ScannedFiles};

use crate::horizons::HorizonsDir;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

/// A simulation directory scanned once at open time.
#[derive(Debug, Clone)]
pub struct SimDir {
    root: PathBuf,
    options: ScanOptions,
    files: ScannedFiles,
}

impl SimDir {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, ScanOptions::default())
    }

    pub fn open_with(path: impl AsRef<Path>, options: ScanOptions) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        let files = DirectoryScanner::new(options.clone())?.scan(&root)?;
        if files.is_empty() {
            tracing::warn!("No horizon output found under {}", root.display());
        } else {
            tracing::info!(
                "Opened {} ({} horizon files)",
                root.display(),
                files.file_count()
            );
        }
        Ok(Self {
            root,
            options,
            files,
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    pub fn files(&self) -> &ScannedFiles {
        &self.files
    }

    /// Parses the diagnostics and QLM output. Shape files are read lazily
    /// by [`crate::horizons::Horizon::shape_at_iteration`].
    pub fn horizons(&self) -> Result<HorizonsDir> {
        HorizonsDir::from_files(&self.files)
    }
}
