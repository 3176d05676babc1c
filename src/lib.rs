pub mod config;
pub mod core;
pub mod domain;
pub mod horizons;
pub mod series;
pub mod simdir;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, ExportSettings};

pub use core::{engine::ExportEngine, pipeline::ExportPipeline};
pub use horizons::{CutSpec, Horizon, HorizonsDir, Outline, Shape};
pub use series::TimeSeries;
pub use simdir::{ScanOptions, SimDir};
pub use utils::error::{HorizonError, Result};
