pub mod engine;
pub mod pipeline;

pub use crate::domain::model::{CutOutline, ExportBundle, ExportFile, ExportManifest, HorizonData};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
