use clap::Parser;
use horizon_scan::config::{Command, ExportArgs, ListArgs};
use horizon_scan::utils::error::{ErrorSeverity, HorizonError};
use horizon_scan::utils::logger;
use horizon_scan::{CliConfig, ExportEngine, ExportPipeline, LocalStorage, SimDir};

async fn list(args: ListArgs) -> horizon_scan::Result<()> {
    let options = args.scan_options()?;
    let report = tokio::task::spawn_blocking(move || {
        let sim = SimDir::open_with(&args.simdir, options)?;
        sim.horizons()?.report()
    })
    .await
    .map_err(|e| HorizonError::TaskError {
        message: e.to_string(),
    })??;

    println!("{}", report);
    Ok(())
}

async fn export(args: ExportArgs) -> horizon_scan::Result<()> {
    let settings = args.resolve()?;
    tracing::debug!("Export settings: {:?}", settings);

    let storage = LocalStorage::new(settings.output_path.clone());
    let pipeline = ExportPipeline::new(storage, settings);
    let engine = ExportEngine::new(pipeline);

    let output_path = engine.run().await?;
    println!("✅ Export completed successfully!");
    println!("📁 Output saved to: {}", output_path);
    Ok(())
}

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    if config.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting horizon-scan");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    let result = match config.command {
        Command::List(args) => list(args).await,
        Command::Export(args) => export(args).await,
    };

    if let Err(e) = result {
        tracing::error!(
            "❌ horizon-scan failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}
