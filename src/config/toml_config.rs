use crate::config::{ExportSettings, DEFAULT_OUTPUT_PATH};
use crate::horizons::CutSpec;
use crate::simdir::ScanOptions;
use crate::utils::error::{HorizonError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub horizon: HorizonConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub path: String,
    pub max_depth: Option<usize>,
    pub ignored_dirs: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HorizonConfig {
    pub qlm: Option<usize>,
    pub ah: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    pub output_path: Option<String>,
    #[serde(default)]
    pub quantities: Vec<String>,
    #[serde(default)]
    pub ah_quantities: Vec<String>,
    #[serde(default)]
    pub iterations: Vec<u64>,
    #[serde(default)]
    pub cuts: Vec<String>,
    pub archive: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(HorizonError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| HorizonError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SIM_ROOT})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| HorizonError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn scan_options(&self) -> ScanOptions {
        let mut options = ScanOptions::default();
        if let Some(depth) = self.simulation.max_depth {
            options.max_depth = depth;
        }
        if let Some(ignored) = &self.simulation.ignored_dirs {
            options.ignored_dirs = ignored.clone();
        }
        options
    }

    pub fn cuts(&self) -> Result<Vec<CutSpec>> {
        self.export.cuts.iter().map(|cut| cut.parse()).collect()
    }

    pub fn to_settings(&self) -> Result<ExportSettings> {
        Ok(ExportSettings {
            simdir: self.simulation.path.clone(),
            qlm: self.horizon.qlm,
            ah: self.horizon.ah,
            output_path: self
                .export
                .output_path
                .clone()
                .unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string()),
            quantities: self.export.quantities.clone(),
            ah_quantities: self.export.ah_quantities.clone(),
            iterations: self.export.iterations.clone(),
            cuts: self.cuts()?,
            archive: self.export.archive.unwrap_or(false),
            scan: self.scan_options(),
        })
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.to_settings()?.validate()
    }
}
