use crate::horizons::{CutSpec, Outline, Shape};
use crate::series::TimeSeries;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A cut of one shape iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutOutline {
    pub iteration: u64,
    pub cut: CutSpec,
    pub outline: Outline,
}

/// Everything pulled out of the simulation for one horizon.
#[derive(Debug, Clone, Default)]
pub struct HorizonData {
    pub simdir: String,
    pub qlm_index: Option<usize>,
    pub ah_index: Option<usize>,
    pub formation_time: Option<f64>,
    pub qlm_series: BTreeMap<String, TimeSeries>,
    pub ah_series: BTreeMap<String, TimeSeries>,
    pub shapes: Vec<Shape>,
    pub outlines: Vec<CutOutline>,
}

impl HorizonData {
    pub fn series_count(&self) -> usize {
        self.qlm_series.len() + self.ah_series.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub name: String,
    pub contents: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportManifest {
    pub generated_at: DateTime<Utc>,
    pub simdir: String,
    pub qlm_index: Option<usize>,
    pub ah_index: Option<usize>,
    pub formation_time: Option<f64>,
    pub files: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ExportBundle {
    pub files: Vec<ExportFile>,
    pub manifest: ExportManifest,
}
