use crate::domain::model::{ExportBundle, HorizonData};
use crate::horizons::CutSpec;
use crate::simdir::ScanOptions;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Settings the export pipeline reads.
pub trait ConfigProvider: Send + Sync {
    fn simdir(&self) -> &str;
    fn qlm_index(&self) -> Option<usize>;
    fn ah_index(&self) -> Option<usize>;
    /// QLM quantities; empty means all of them.
    fn quantities(&self) -> &[String];
    /// AH quantities; empty means all of them.
    fn ah_quantities(&self) -> &[String];
    fn iterations(&self) -> &[u64];
    fn cuts(&self) -> &[CutSpec];
    fn output_path(&self) -> &str;
    fn archive(&self) -> bool;
    fn scan_options(&self) -> ScanOptions;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<HorizonData>;
    async fn transform(&self, data: HorizonData) -> Result<ExportBundle>;
    async fn load(&self, bundle: ExportBundle) -> Result<String>;
}
