use crate::utils::error::{HorizonError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_DEPTH: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanOptions {
    pub max_depth: usize,
    pub ignored_dirs: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            ignored_dirs: ["SIMFACTORY", "report", "movies", "tmp", "cache"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Horizon finder output found under a simulation directory, grouped by
/// finder and index. Every path list is sorted, so restarts appear in
/// order.
#[derive(Debug, Clone, Default)]
pub struct ScannedFiles {
    /// `BH_diagnostics.ah<N>.gp`, keyed by `N`.
    pub ah_diagnostics: BTreeMap<usize, Vec<PathBuf>>,
    /// `h.t<it>.ah<N>.gp`, keyed by `N` then `it`.
    pub ah_shapes: BTreeMap<usize, BTreeMap<u64, Vec<PathBuf>>>,
    /// QuasiLocalMeasures scalar output.
    pub qlm_files: Vec<PathBuf>,
}

impl ScannedFiles {
    pub fn is_empty(&self) -> bool {
        self.ah_diagnostics.is_empty() && self.ah_shapes.is_empty() && self.qlm_files.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.ah_diagnostics.values().map(Vec::len).sum::<usize>()
            + self
                .ah_shapes
                .values()
                .flat_map(|by_it| by_it.values())
                .map(Vec::len)
                .sum::<usize>()
            + self.qlm_files.len()
    }

    fn sort(&mut self) {
        for paths in self.ah_diagnostics.values_mut() {
            paths.sort();
        }
        for by_iteration in self.ah_shapes.values_mut() {
            for paths in by_iteration.values_mut() {
                paths.sort();
            }
        }
        self.qlm_files.sort();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    AhDiagnostics { ah: usize },
    AhShape { ah: usize, iteration: u64 },
    QlmScalars,
}

pub struct DirectoryScanner {
    options: ScanOptions,
    diagnostics_re: Regex,
    shape_re: Regex,
    qlm_re: Regex,
}

impl DirectoryScanner {
    pub fn new(options: ScanOptions) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| HorizonError::ConfigError {
                message: format!("Invalid file pattern {}: {}", pattern, e),
            })
        };
        Ok(Self {
            options,
            diagnostics_re: compile(r"^BH_diagnostics\.ah(\d+)\.gp$")?,
            shape_re: compile(r"^h\.t(\d+)\.ah(\d+)\.gp$")?,
            qlm_re: compile(r"(?i)^quasilocalmeasures-qlm_.*\.asc$")?,
        })
    }

    pub fn classify(&self, file_name: &str) -> Option<FileKind> {
        if let Some(caps) = self.diagnostics_re.captures(file_name) {
            let ah = caps[1].parse().ok()?;
            return Some(FileKind::AhDiagnostics { ah });
        }
        if let Some(caps) = self.shape_re.captures(file_name) {
            let iteration = caps[1].parse().ok()?;
            let ah = caps[2].parse().ok()?;
            return Some(FileKind::AhShape { ah, iteration });
        }
        if self.qlm_re.is_match(file_name) {
            return Some(FileKind::QlmScalars);
        }
        None
    }

    pub fn scan(&self, root: &Path) -> Result<ScannedFiles> {
        let metadata = fs::metadata(root)?;
        if !metadata.is_dir() {
            return Err(HorizonError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a directory", root.display()),
            )));
        }

        let mut found = ScannedFiles::default();
        self.walk(root, 0, &mut found)?;
        found.sort();

        tracing::debug!(
            "Scanned {}: {} horizon files ({} AH diagnostics, {} AH shapes, {} QLM)",
            root.display(),
            found.file_count(),
            found.ah_diagnostics.len(),
            found.ah_shapes.values().map(BTreeMap::len).sum::<usize>(),
            found.qlm_files.len()
        );
        Ok(found)
    }

    fn walk(&self, dir: &Path, depth: usize, found: &mut ScannedFiles) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            let file_type = entry.file_type()?;

            if file_type.is_dir() {
                if depth + 1 > self.options.max_depth || self.is_ignored(&name) {
                    tracing::debug!("Skipping directory {}", path.display());
                    continue;
                }
                self.walk(&path, depth + 1, found)?;
                continue;
            }

            // 不跟隨指向目錄的符號連結
            let is_file = if file_type.is_symlink() {
                fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false)
            } else {
                file_type.is_file()
            };
            if !is_file {
                continue;
            }

            match self.classify(&name) {
                Some(FileKind::AhDiagnostics { ah }) => {
                    found.ah_diagnostics.entry(ah).or_default().push(path);
                }
                Some(FileKind::AhShape { ah, iteration }) => {
                    found
                        .ah_shapes
                        .entry(ah)
                        .or_default()
                        .entry(iteration)
                        .or_default()
                        .push(path);
                }
                Some(FileKind::QlmScalars) => found.qlm_files.push(path),
                None => {}
            }
        }
        Ok(())
    }

    fn is_ignored(&self, name: &str) -> bool {
        name.starts_with('.') || self.options.ignored_dirs.iter().any(|d| d == name)
    }
}
