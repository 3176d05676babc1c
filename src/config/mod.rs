pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::horizons::CutSpec;
use crate::simdir::ScanOptions;
use crate::utils::error::{HorizonError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};

pub const DEFAULT_OUTPUT_PATH: &str = "./output";
pub const MAX_SCAN_DEPTH: usize = 64;

/// Resolved export settings, after merging the TOML file and the flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    pub simdir: String,
    pub qlm: Option<usize>,
    pub ah: Option<usize>,
    pub output_path: String,
    pub quantities: Vec<String>,
    pub ah_quantities: Vec<String>,
    pub iterations: Vec<u64>,
    pub cuts: Vec<CutSpec>,
    pub archive: bool,
    pub scan: ScanOptions,
}

impl ExportSettings {
    pub fn new(simdir: impl Into<String>) -> Self {
        Self {
            simdir: simdir.into(),
            qlm: None,
            ah: None,
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            quantities: Vec::new(),
            ah_quantities: Vec::new(),
            iterations: Vec::new(),
            cuts: Vec::new(),
            archive: false,
            scan: ScanOptions::default(),
        }
    }
}

impl Validate for ExportSettings {
    fn validate(&self) -> Result<()> {
        validation::validate_path("simdir", &self.simdir)?;
        validation::validate_path("output_path", &self.output_path)?;

        if self.qlm.is_none() && self.ah.is_none() {
            return Err(HorizonError::ConfigValidationError {
                field: "horizon".to_string(),
                message: "Select a horizon with a QLM index, an AH index, or both".to_string(),
            });
        }

        validation::validate_range("max_depth", self.scan.max_depth, 1, MAX_SCAN_DEPTH)?;

        if self.ah.is_none() && (!self.iterations.is_empty() || !self.cuts.is_empty()) {
            return Err(HorizonError::ConfigValidationError {
                field: "ah".to_string(),
                message: "Shape iterations and cuts need an apparent horizon index".to_string(),
            });
        }

        for name in self.quantities.iter().chain(&self.ah_quantities) {
            validation::validate_non_empty_string("quantity", name)?;
        }

        for cut in &self.cuts {
            if cut.free_axes().is_empty() {
                return Err(HorizonError::InvalidConfigValueError {
                    field: "cut".to_string(),
                    value: cut.to_string(),
                    reason: "At least one axis must stay free".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl ConfigProvider for ExportSettings {
    fn simdir(&self) -> &str {
        &self.simdir
    }

    fn qlm_index(&self) -> Option<usize> {
        self.qlm
    }

    fn ah_index(&self) -> Option<usize> {
        self.ah
    }

    fn quantities(&self) -> &[String] {
        &self.quantities
    }

    fn ah_quantities(&self) -> &[String] {
        &self.ah_quantities
    }

    fn iterations(&self) -> &[u64] {
        &self.iterations
    }

    fn cuts(&self) -> &[CutSpec] {
        &self.cuts
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn archive(&self) -> bool {
        self.archive
    }

    fn scan_options(&self) -> ScanOptions {
        self.scan.clone()
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "horizon-scan")]
#[command(about = "Inspect and export apparent horizon data from simulation output")]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log as JSON lines")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Subcommand)]
pub enum Command {
    /// Summarise the horizons found in a simulation
    List(ListArgs),
    /// Write horizon series, shapes and cuts to CSV
    Export(ExportArgs),
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Args)]
pub struct ListArgs {
    pub simdir: String,

    #[arg(long)]
    pub max_depth: Option<usize>,
}

#[cfg(feature = "cli")]
impl ListArgs {
    pub fn scan_options(&self) -> Result<ScanOptions> {
        let mut options = ScanOptions::default();
        if let Some(depth) = self.max_depth {
            validation::validate_range("max_depth", depth, 1, MAX_SCAN_DEPTH)?;
            options.max_depth = depth;
        }
        Ok(options)
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Args)]
pub struct ExportArgs {
    #[arg(long)]
    pub simdir: Option<String>,

    #[arg(long, help = "TOML file with [simulation], [horizon] and [export] tables")]
    pub config: Option<String>,

    #[arg(long)]
    pub qlm: Option<usize>,

    #[arg(long)]
    pub ah: Option<usize>,

    #[arg(long, help = "Output directory [default: ./output]")]
    pub output_path: Option<String>,

    #[arg(long = "quantity", value_delimiter = ',')]
    pub quantities: Vec<String>,

    #[arg(long = "ah-quantity", value_delimiter = ',')]
    pub ah_quantities: Vec<String>,

    #[arg(long = "iteration", value_delimiter = ',')]
    pub iterations: Vec<u64>,

    #[arg(long = "cut", help = "Cut such as z=0, x=1,y=0 or _,_,0")]
    pub cuts: Vec<CutSpec>,

    #[arg(long, help = "Bundle every file into horizons.zip")]
    pub archive: bool,

    #[arg(long)]
    pub max_depth: Option<usize>,
}

#[cfg(feature = "cli")]
impl ExportArgs {
    /// Loads the TOML file if given, then applies the flags on top.
    pub fn resolve(&self) -> Result<ExportSettings> {
        let mut settings = match &self.config {
            Some(path) => {
                validation::validate_file_extensions("config", std::slice::from_ref(path), &["toml"])?;
                toml_config::TomlConfig::from_file(path)?.to_settings()?
            }
            None => {
                let simdir = validation::validate_required_field("simdir", &self.simdir)?;
                ExportSettings::new(simdir.clone())
            }
        };

        if let Some(simdir) = &self.simdir {
            settings.simdir = simdir.clone();
        }
        if let Some(qlm) = self.qlm {
            settings.qlm = Some(qlm);
        }
        if let Some(ah) = self.ah {
            settings.ah = Some(ah);
        }
        if let Some(output_path) = &self.output_path {
            settings.output_path = output_path.clone();
        }
        if !self.quantities.is_empty() {
            settings.quantities = self.quantities.clone();
        }
        if !self.ah_quantities.is_empty() {
            settings.ah_quantities = self.ah_quantities.clone();
        }
        if !self.iterations.is_empty() {
            settings.iterations = self.iterations.clone();
        }
        if !self.cuts.is_empty() {
            settings.cuts = self.cuts.clone();
        }
        if self.archive {
            settings.archive = true;
        }
        if let Some(depth) = self.max_depth {
            settings.scan.max_depth = depth;
        }

        settings.validate()?;
        Ok(settings)
    }
}
