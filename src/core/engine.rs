use crate::core::Pipeline;
use crate::utils::error::Result;

pub struct ExportEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ExportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting horizon export...");

        tracing::info!("Reading simulation output...");
        let data = self.pipeline.extract().await?;
        tracing::info!(
            "Extracted {} series, {} shapes, {} outlines",
            data.series_count(),
            data.shapes.len(),
            data.outlines.len()
        );

        tracing::info!("Formatting export files...");
        let bundle = self.pipeline.transform(data).await?;
        tracing::info!("Prepared {} files", bundle.files.len());

        tracing::info!("Writing output...");
        let output_path = self.pipeline.load(bundle).await?;
        tracing::info!("Output saved to: {}", output_path);

        Ok(output_path)
    }
}
