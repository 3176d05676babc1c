use crate::core::{
    ConfigProvider, CutOutline, ExportBundle, ExportFile, ExportManifest, HorizonData, Pipeline,
    Storage,
};
use crate::horizons::{CutSpec, Outline, Shape};
use crate::series::TimeSeries;
use crate::simdir::{ScanOptions, SimDir};
use crate::utils::error::{HorizonError, Result};
use std::collections::HashSet;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const ARCHIVE_NAME: &str = "horizons.zip";
pub const MANIFEST_NAME: &str = "manifest.json";

pub struct ExportPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> ExportPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    // Repeated iterations or cuts with the same label would collide on
    // export file names.
    fn request(&self) -> ExtractRequest {
        let mut iterations = self.config.iterations().to_vec();
        iterations.sort_unstable();
        iterations.dedup();
        let mut labels = HashSet::new();
        let cuts = self
            .config
            .cuts()
            .iter()
            .copied()
            .filter(|cut| labels.insert(cut.label()))
            .collect();

        ExtractRequest {
            simdir: self.config.simdir().to_string(),
            options: self.config.scan_options(),
            qlm: self.config.qlm_index(),
            ah: self.config.ah_index(),
            quantities: self.config.quantities().to_vec(),
            ah_quantities: self.config.ah_quantities().to_vec(),
            iterations,
            cuts,
        }
    }
}

// Owned copy of the settings, moved into the blocking task.
struct ExtractRequest {
    simdir: String,
    options: ScanOptions,
    qlm: Option<usize>,
    ah: Option<usize>,
    quantities: Vec<String>,
    ah_quantities: Vec<String>,
    iterations: Vec<u64>,
    cuts: Vec<CutSpec>,
}

fn extract_blocking(request: ExtractRequest) -> Result<HorizonData> {
    let sim = SimDir::open_with(&request.simdir, request.options)?;
    let horizons = sim.horizons()?;
    let horizon = horizons.get(request.qlm, request.ah)?;

    let mut data = HorizonData {
        simdir: request.simdir,
        qlm_index: request.qlm,
        ah_index: request.ah,
        formation_time: horizon.formation_time(),
        ..HorizonData::default()
    };

    let qlm_names = if request.quantities.is_empty() {
        horizon.available_quantities()
    } else {
        request.quantities
    };
    for name in qlm_names {
        let series = horizon.quantity(&name)?.clone();
        let key = name.strip_prefix("qlm_").unwrap_or(&name).to_string();
        data.qlm_series.insert(key, series);
    }

    let ah_names = if request.ah_quantities.is_empty() {
        horizon.ah().available_quantities()
    } else {
        request.ah_quantities
    };
    for name in ah_names {
        let series = horizon.ah().quantity(&name)?.clone();
        data.ah_series.insert(name, series);
    }

    // 指定迭代時匯出形狀；只給切面時取所有迭代
    let explicit = !request.iterations.is_empty();
    let iterations = if explicit {
        request.iterations
    } else if !request.cuts.is_empty() {
        horizon.shape_iterations()
    } else {
        Vec::new()
    };
    for iteration in iterations {
        let shape = horizon.shape_at_iteration(iteration)?;
        for cut in &request.cuts {
            let outline = shape.outline(cut)?;
            if outline.is_empty() {
                tracing::warn!("Cut {} misses the horizon at iteration {}", cut, iteration);
            }
            data.outlines.push(CutOutline {
                iteration,
                cut: *cut,
                outline,
            });
        }
        if explicit {
            data.shapes.push(shape);
        }
    }

    Ok(data)
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer.into_inner().map_err(|e| {
        HorizonError::IoError(std::io::Error::new(e.error().kind(), e.error().to_string()))
    })
}

fn series_csv(series: &TimeSeries) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["time", "value"])?;
    for (t, y) in series.iter() {
        writer.write_record([t.to_string(), y.to_string()])?;
    }
    finish_csv(writer)
}

fn shape_csv(shape: &Shape) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["patch", "row", "column", "x", "y", "z"])?;
    for patch in &shape.patches {
        for (row, column, [x, y, z]) in patch.points() {
            writer.write_record([
                patch.label.clone(),
                row.to_string(),
                column.to_string(),
                x.to_string(),
                y.to_string(),
                z.to_string(),
            ])?;
        }
    }
    finish_csv(writer)
}

fn outline_csv(outline: &Outline) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(outline.axes.iter().map(|axis| axis.name()))?;
    for i in 0..outline.len() {
        writer.write_record(outline.coordinates.iter().map(|values| values[i].to_string()))?;
    }
    finish_csv(writer)
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ExportPipeline<S, C> {
    async fn extract(&self) -> Result<HorizonData> {
        let request = self.request();
        tracing::debug!(
            "Opening simulation {} (qlm: {:?}, ah: {:?})",
            request.simdir,
            request.qlm,
            request.ah
        );

        tokio::task::spawn_blocking(move || extract_blocking(request))
            .await
            .map_err(|e| HorizonError::TaskError {
                message: e.to_string(),
            })?
    }

    async fn transform(&self, data: HorizonData) -> Result<ExportBundle> {
        let mut files = Vec::new();

        if let Some(qlm) = data.qlm_index {
            for (name, series) in &data.qlm_series {
                files.push(ExportFile {
                    name: format!("qlm{}_{}.csv", qlm, name),
                    contents: series_csv(series)?,
                });
            }
        }

        if let Some(ah) = data.ah_index {
            for (name, series) in &data.ah_series {
                files.push(ExportFile {
                    name: format!("ah{}_{}.csv", ah, name),
                    contents: series_csv(series)?,
                });
            }
            for shape in &data.shapes {
                files.push(ExportFile {
                    name: format!("ah{}_shape_it{}.csv", ah, shape.iteration),
                    contents: shape_csv(shape)?,
                });
            }
            for cut in &data.outlines {
                files.push(ExportFile {
                    name: format!(
                        "ah{}_outline_it{}_{}.csv",
                        ah,
                        cut.iteration,
                        cut.cut.label()
                    ),
                    contents: outline_csv(&cut.outline)?,
                });
            }
        }

        tracing::debug!("Generated {} CSV files", files.len());

        let manifest = ExportManifest {
            generated_at: chrono::Utc::now(),
            simdir: data.simdir,
            qlm_index: data.qlm_index,
            ah_index: data.ah_index,
            formation_time: data.formation_time,
            files: files.iter().map(|file| file.name.clone()).collect(),
        };

        Ok(ExportBundle { files, manifest })
    }

    async fn load(&self, bundle: ExportBundle) -> Result<String> {
        let manifest_json = serde_json::to_vec_pretty(&bundle.manifest)?;

        if self.config.archive() {
            tracing::debug!("Creating ZIP file with {} files", bundle.files.len() + 1);

            let zip_data = {
                let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
                for file in &bundle.files {
                    zip.start_file::<_, ()>(file.name.as_str(), FileOptions::default())?;
                    zip.write_all(&file.contents)?;
                }
                zip.start_file::<_, ()>(MANIFEST_NAME, FileOptions::default())?;
                zip.write_all(&manifest_json)?;

                let cursor = zip.finish()?;
                cursor.into_inner()
            };

            tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
            self.storage.write_file(ARCHIVE_NAME, &zip_data).await?;
            return Ok(format!("{}/{}", self.config.output_path(), ARCHIVE_NAME));
        }

        for file in &bundle.files {
            tracing::debug!("Writing {} ({} bytes)", file.name, file.contents.len());
            self.storage.write_file(&file.name, &file.contents).await?;
        }
        self.storage.write_file(MANIFEST_NAME, &manifest_json).await?;
        Ok(self.config.output_path().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::horizons::shape::tests::sphere;
    use crate::horizons::Axis;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                HorizonError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        simdir: String,
        qlm: Option<usize>,
        ah: Option<usize>,
        quantities: Vec<String>,
        ah_quantities: Vec<String>,
        iterations: Vec<u64>,
        cuts: Vec<CutSpec>,
        archive: bool,
    }

    impl MockConfig {
        fn new(simdir: &Path) -> Self {
            Self {
                simdir: simdir.display().to_string(),
                qlm: Some(0),
                ah: Some(1),
                quantities: vec![],
                ah_quantities: vec![],
                iterations: vec![],
                cuts: vec![],
                archive: false,
            }
        }
    }

    impl ConfigProvider for MockConfig {
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
            "test_output"
        }

        fn archive(&self) -> bool {
            self.archive
        }

        fn scan_options(&self) -> ScanOptions {
            ScanOptions::default()
        }
    }

    fn shape_file(shape: &Shape) -> String {
        let mut text = String::from("# AHFinderDirect shape\n");
        for patch in &shape.patches {
            text.push_str(&format!("### {} patch\n", patch.label));
            for row in 0..patch.x.len() {
                for col in 0..patch.x[row].len() {
                    let [x, y, z] = patch.point(row, col);
                    text.push_str(&format!("{} {} 1 {} {} {}\n", row, col, x, y, z));
                }
                text.push('\n');
            }
        }
        text
    }

    fn write_simulation(root: &Path) {
        let output = root.join("output-0000/sim");
        std::fs::create_dir_all(&output).unwrap();
        std::fs::write(
            output.join("quasilocalmeasures-qlm_scalars..asc"),
            "# data columns: 3:qlm_time[0] 4:qlm_mass[0] 5:qlm_spin[0]\n0 0.0 0.0 0.9 0.6\n64 1.0 1.0 0.95 0.65\n",
        )
        .unwrap();
        std::fs::write(
            output.join("BH_diagnostics.ah1.gp"),
            "# column 1 = cctk_iteration\n0 0.0 0.1\n64 1.0 0.2\n",
        )
        .unwrap();
        let text = shape_file(&sphere(1.0, 9, 17));
        std::fs::write(output.join("h.t0.ah1.gp"), &text).unwrap();
        std::fs::write(output.join("h.t64.ah1.gp"), &text).unwrap();
    }

    fn sample_data() -> HorizonData {
        let mut data = HorizonData {
            simdir: "/sims/bbh".to_string(),
            qlm_index: Some(0),
            ah_index: Some(1),
            formation_time: Some(0.5),
            ..HorizonData::default()
        };
        data.qlm_series.insert(
            "mass".to_string(),
            TimeSeries::new(vec![0.0, 1.0], vec![0.5, 0.75]).unwrap(),
        );
        data.ah_series.insert(
            "area".to_string(),
            TimeSeries::new(vec![0.5], vec![12.5]).unwrap(),
        );
        data.outlines.push(CutOutline {
            iteration: 64,
            cut: CutSpec::new(None, Some(0.0), Some(0.0)),
            outline: Outline {
                axes: vec![Axis::X],
                coordinates: vec![vec![-1.0, 1.0]],
            },
        });
        data
    }

    #[tokio::test]
    async fn test_extract_collects_every_quantity() {
        let dir = TempDir::new().unwrap();
        write_simulation(dir.path());

        let pipeline = ExportPipeline::new(MockStorage::new(), MockConfig::new(dir.path()));
        let data = pipeline.extract().await.unwrap();

        assert_eq!(
            data.qlm_series.keys().cloned().collect::<Vec<_>>(),
            vec!["mass".to_string(), "spin".to_string()]
        );
        assert_eq!(
            data.ah_series.keys().cloned().collect::<Vec<_>>(),
            vec!["cctk_iteration".to_string(), "centroid_x".to_string()]
        );
        assert_eq!(data.qlm_series["mass"].y(), &[0.9, 0.95]);
        assert_eq!(data.formation_time, Some(0.0));
        assert!(data.shapes.is_empty());
        assert!(data.outlines.is_empty());
    }

    #[tokio::test]
    async fn test_extract_cuts_without_iterations_use_all_shapes() {
        let dir = TempDir::new().unwrap();
        write_simulation(dir.path());

        let mut config = MockConfig::new(dir.path());
        config.quantities = vec!["qlm_mass".to_string()];
        config.ah_quantities = vec!["centroid_x".to_string()];
        config.cuts = vec![CutSpec::new(None, None, Some(0.0))];
        let pipeline = ExportPipeline::new(MockStorage::new(), config);
        let data = pipeline.extract().await.unwrap();

        assert_eq!(data.qlm_series.len(), 1);
        assert!(data.qlm_series.contains_key("mass"));
        assert_eq!(data.ah_series.len(), 1);
        assert!(data.shapes.is_empty());
        assert_eq!(
            data.outlines.iter().map(|o| o.iteration).collect::<Vec<_>>(),
            vec![0, 64]
        );
        assert!(!data.outlines[0].outline.is_empty());
    }

    #[tokio::test]
    async fn test_extract_requested_iteration() {
        let dir = TempDir::new().unwrap();
        write_simulation(dir.path());

        let mut config = MockConfig::new(dir.path());
        config.iterations = vec![64];
        let pipeline = ExportPipeline::new(MockStorage::new(), config);
        let data = pipeline.extract().await.unwrap();
        assert_eq!(data.shapes.len(), 1);
        assert_eq!(data.shapes[0].iteration, 64);

        let mut config = MockConfig::new(dir.path());
        config.iterations = vec![32];
        let pipeline = ExportPipeline::new(MockStorage::new(), config);
        assert!(matches!(
            pipeline.extract().await,
            Err(HorizonError::IterationNotFound { iteration: 32, .. })
        ));
    }

    #[tokio::test]
    async fn test_repeated_iterations_and_cuts_export_once() {
        let dir = TempDir::new().unwrap();
        write_simulation(dir.path());

        let mut config = MockConfig::new(dir.path());
        config.quantities = vec!["mass".to_string()];
        config.ah_quantities = vec!["centroid_x".to_string()];
        config.iterations = vec![64, 0, 64];
        config.cuts = vec!["z=0".parse().unwrap(), "_,_,0".parse().unwrap()];
        config.archive = true;
        let storage = MockStorage::new();
        let pipeline = ExportPipeline::new(storage.clone(), config);

        let data = pipeline.extract().await.unwrap();
        assert_eq!(
            data.shapes.iter().map(|s| s.iteration).collect::<Vec<_>>(),
            vec![0, 64]
        );
        assert_eq!(data.outlines.len(), 2);

        let bundle = pipeline.transform(data).await.unwrap();
        assert_eq!(
            bundle.manifest.files,
            vec![
                "qlm0_mass.csv",
                "ah1_centroid_x.csv",
                "ah1_shape_it0.csv",
                "ah1_shape_it64.csv",
                "ah1_outline_it0_z0.csv",
                "ah1_outline_it64_z0.csv",
            ]
        );
        pipeline.load(bundle).await.unwrap();
        assert!(storage.get_file(ARCHIVE_NAME).await.is_some());
    }

    #[tokio::test]
    async fn test_extract_unknown_quantity_and_horizon() {
        let dir = TempDir::new().unwrap();
        write_simulation(dir.path());

        let mut config = MockConfig::new(dir.path());
        config.quantities = vec!["charge".to_string()];
        let pipeline = ExportPipeline::new(MockStorage::new(), config);
        assert!(matches!(
            pipeline.extract().await,
            Err(HorizonError::QuantityNotFound { .. })
        ));

        let mut config = MockConfig::new(dir.path());
        config.ah = Some(4);
        let pipeline = ExportPipeline::new(MockStorage::new(), config);
        assert!(matches!(
            pipeline.extract().await,
            Err(HorizonError::HorizonNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_transform_names_and_contents() {
        let dir = TempDir::new().unwrap();
        let pipeline = ExportPipeline::new(MockStorage::new(), MockConfig::new(dir.path()));

        let bundle = pipeline.transform(sample_data()).await.unwrap();
        let names: Vec<&str> = bundle.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "qlm0_mass.csv",
                "ah1_area.csv",
                "ah1_outline_it64_y0_z0.csv"
            ]
        );
        assert_eq!(
            String::from_utf8(bundle.files[0].contents.clone()).unwrap(),
            "time,value\n0,0.5\n1,0.75\n"
        );
        assert_eq!(
            String::from_utf8(bundle.files[2].contents.clone()).unwrap(),
            "x\n-1\n1\n"
        );
        assert_eq!(bundle.manifest.files.len(), 3);
        assert_eq!(bundle.manifest.simdir, "/sims/bbh");
        assert_eq!(bundle.manifest.formation_time, Some(0.5));
    }

    #[tokio::test]
    async fn test_transform_shape_rows() {
        let dir = TempDir::new().unwrap();
        let pipeline = ExportPipeline::new(MockStorage::new(), MockConfig::new(dir.path()));

        let mut data = HorizonData {
            ah_index: Some(2),
            ..HorizonData::default()
        };
        data.shapes.push(sphere(1.0, 3, 5));
        let bundle = pipeline.transform(data).await.unwrap();

        assert_eq!(bundle.files.len(), 1);
        assert_eq!(bundle.files[0].name, "ah2_shape_it0.csv");
        let text = String::from_utf8(bundle.files[0].contents.clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "patch,row,column,x,y,z");
        assert_eq!(lines.len(), 1 + 2 * 3 * 5);
        assert!(lines[1].starts_with("+z,0,0,"));
    }

    #[tokio::test]
    async fn test_load_archive() {
        let dir = TempDir::new().unwrap();
        let storage = MockStorage::new();
        let mut config = MockConfig::new(dir.path());
        config.archive = true;
        let pipeline = ExportPipeline::new(storage.clone(), config);

        let bundle = pipeline.transform(sample_data()).await.unwrap();
        let output_path = pipeline.load(bundle).await.unwrap();
        assert_eq!(output_path, "test_output/horizons.zip");

        let zip_bytes = storage.get_file(ARCHIVE_NAME).await.unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_bytes)).unwrap();
        assert_eq!(archive.len(), 4);

        let manifest: ExportManifest = {
            let mut file = archive.by_name(MANIFEST_NAME).unwrap();
            let mut content = String::new();
            std::io::Read::read_to_string(&mut file, &mut content).unwrap();
            serde_json::from_str(&content).unwrap()
        };
        assert_eq!(manifest.qlm_index, Some(0));
        assert_eq!(manifest.files[0], "qlm0_mass.csv");
        assert!(archive.by_name("ah1_area.csv").is_ok());
    }

    #[tokio::test]
    async fn test_load_plain_files() {
        let dir = TempDir::new().unwrap();
        let storage = MockStorage::new();
        let pipeline = ExportPipeline::new(storage.clone(), MockConfig::new(dir.path()));

        let bundle = pipeline.transform(sample_data()).await.unwrap();
        let output_path = pipeline.load(bundle).await.unwrap();
        assert_eq!(output_path, "test_output");

        assert_eq!(
            storage.get_file("ah1_area.csv").await.unwrap(),
            b"time,value\n0.5,12.5\n".to_vec()
        );
        assert!(storage.get_file(MANIFEST_NAME).await.is_some());
        assert!(storage.get_file(ARCHIVE_NAME).await.is_none());
        assert!(storage.read_file("missing.csv").await.is_err());
    }
}
