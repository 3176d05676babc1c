//! Horizon index built from the files found by the directory scanner.
//!
//! Two finders contribute: QuasiLocalMeasures (indexed by surface number)
//! and AHFinderDirect (indexed by apparent horizon number). A [`Horizon`]
//! pairs at most one index of each.

pub mod ah;
pub mod horizon;
pub mod qlm;
pub mod shape;

pub use horizon::{AhQuantities, Horizon};
pub use shape::{Axis, CutSpec, Outline, Patch, Shape};

use crate::series::{remove_duplicate_iters, TimeSeries};
use crate::simdir::scanner::ScannedFiles;
use crate::utils::error::{HorizonError, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type QuantityMap = BTreeMap<String, TimeSeries>;
pub type ShapeFiles = BTreeMap<u64, Vec<PathBuf>>;

/// Samples as read from disk, possibly overlapping across restarts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSamples {
    pub t: Vec<f64>,
    pub y: Vec<f64>,
}

impl RawSamples {
    pub fn push(&mut self, t: f64, y: f64) {
        self.t.push(t);
        self.y.push(y);
    }

    pub fn extend(&mut self, other: RawSamples) {
        self.t.extend(other.t);
        self.y.extend(other.y);
    }

    /// Keeps only the latest restart where segments overlap.
    pub fn into_series(self) -> Result<TimeSeries> {
        remove_duplicate_iters(&self.t, &self.y)
    }
}

pub(crate) fn parse_numbers(path: &str, line_no: usize, line: &str) -> Result<Vec<f64>> {
    line.split_whitespace()
        .map(|token| {
            token.parse::<f64>().map_err(|_| {
                HorizonError::parse(path, line_no, format!("'{}' is not a number", token))
            })
        })
        .collect()
}

fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        tracing::warn!("Cannot read {}: {}", path.display(), e);
        HorizonError::IoError(e)
    })
}

fn into_quantity_map(raw: BTreeMap<String, RawSamples>) -> Result<QuantityMap> {
    raw.into_iter()
        .map(|(name, samples)| Ok((name, samples.into_series()?)))
        .collect()
}

/// Every horizon of a simulation.
#[derive(Debug, Clone, Default)]
pub struct HorizonsDir {
    qlm: BTreeMap<usize, Arc<QuantityMap>>,
    ah: BTreeMap<usize, Arc<QuantityMap>>,
    shapes: BTreeMap<usize, Arc<ShapeFiles>>,
}

impl HorizonsDir {
    /// Parses the QLM and AH diagnostics files. Shape files are only
    /// read when a shape is requested.
    pub fn from_files(files: &ScannedFiles) -> Result<Self> {
        let mut qlm_raw: BTreeMap<usize, BTreeMap<String, RawSamples>> = BTreeMap::new();
        for path in &files.qlm_files {
            let display = path.display().to_string();
            let content = read_to_string(path)?;
            for (variable, samples) in qlm::parse_scalar_file(&display, &content)? {
                if let Some((quantity, index)) = qlm::qlm_variable(&variable) {
                    qlm_raw
                        .entry(index)
                        .or_default()
                        .entry(quantity)
                        .or_default()
                        .extend(samples);
                }
            }
        }

        let mut ah_raw: BTreeMap<usize, BTreeMap<String, RawSamples>> = BTreeMap::new();
        for (index, paths) in &files.ah_diagnostics {
            for path in paths {
                let display = path.display().to_string();
                let content = read_to_string(path)?;
                for (name, samples) in ah::parse_diagnostics(&display, &content)? {
                    ah_raw
                        .entry(*index)
                        .or_default()
                        .entry(name)
                        .or_default()
                        .extend(samples);
                }
            }
        }

        let qlm = qlm_raw
            .into_iter()
            .filter(|(_, quantities)| !quantities.is_empty())
            .map(|(index, raw)| Ok((index, Arc::new(into_quantity_map(raw)?))))
            .collect::<Result<BTreeMap<_, _>>>()?;
        let ah = ah_raw
            .into_iter()
            .filter(|(_, quantities)| !quantities.is_empty())
            .map(|(index, raw)| Ok((index, Arc::new(into_quantity_map(raw)?))))
            .collect::<Result<BTreeMap<_, _>>>()?;
        let shapes = files
            .ah_shapes
            .iter()
            .map(|(index, by_iteration)| (*index, Arc::new(by_iteration.clone())))
            .collect();

        let dir = Self { qlm, ah, shapes };
        tracing::info!(
            "Found {} QLM horizons and {} apparent horizons",
            dir.qlm.len(),
            dir.available_apparent_horizons().len()
        );
        Ok(dir)
    }

    pub fn available_qlm_horizons(&self) -> Vec<usize> {
        self.qlm.keys().copied().collect()
    }

    /// Indices with diagnostics or shape output.
    pub fn available_apparent_horizons(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.ah.keys().chain(self.shapes.keys()).copied().collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    pub fn is_empty(&self) -> bool {
        self.qlm.is_empty() && self.ah.is_empty() && self.shapes.is_empty()
    }

    fn has_ah(&self, index: usize) -> bool {
        self.ah.contains_key(&index) || self.shapes.contains_key(&index)
    }

    /// Looks up the pair `(qlm, ah)`. Either side may be left out, not both.
    pub fn get(&self, qlm: Option<usize>, ah: Option<usize>) -> Result<Horizon> {
        let not_found = || HorizonError::HorizonNotFound { qlm, ah };
        if qlm.is_none() && ah.is_none() {
            return Err(not_found());
        }

        let qlm_data = match qlm {
            Some(index) => Some(self.qlm.get(&index).cloned().ok_or_else(not_found)?),
            None => None,
        };
        if let Some(index) = ah {
            if !self.has_ah(index) {
                return Err(not_found());
            }
        }
        let ah_data = ah.and_then(|index| self.ah.get(&index).cloned());
        let shapes = ah.and_then(|index| self.shapes.get(&index).cloned());

        Ok(Horizon::new(qlm, ah, qlm_data, ah_data, shapes))
    }

    pub fn get_qlm_horizon(&self, index: usize) -> Result<Horizon> {
        self.get(Some(index), None)
    }

    pub fn get_apparent_horizon(&self, index: usize) -> Result<Horizon> {
        self.get(None, Some(index))
    }

    /// Summary followed by the details of every horizon.
    pub fn report(&self) -> Result<String> {
        let mut sections = vec![self.to_string()];
        for index in self.available_qlm_horizons() {
            sections.push(self.get_qlm_horizon(index)?.to_string());
        }
        for index in self.available_apparent_horizons() {
            sections.push(self.get_apparent_horizon(index)?.to_string());
        }
        Ok(sections.join("\n\n"))
    }
}

impl fmt::Display for HorizonsDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = |indices: Vec<usize>| {
            if indices.is_empty() {
                "none".to_string()
            } else {
                indices
                    .iter()
                    .map(usize::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        };
        writeln!(f, "QLM horizons: {}", list(self.available_qlm_horizons()))?;
        write!(
            f,
            "Apparent horizons: {}",
            list(self.available_apparent_horizons())
        )
    }
}
