use anyhow::Context;
use clap::Parser;
use consumption_report::core::ConfigProvider;
use consumption_report::utils::error::ErrorSeverity;
use consumption_report::utils::{logger, validation::Validate};
use consumption_report::{
    CliConfig, ConsumptionPipeline, FirmaSeguroClient, LocalStorage, ReportConfig, ReportEngine,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliConfig::parse();

    let mut config = ReportConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config file '{}'", args.config))?;
    args.apply_overrides(&mut config);

    match config.log_format() {
        Some("json") => logger::init_json_logger(args.verbose),
        _ => logger::init_cli_logger(args.verbose),
    }

    tracing::info!("Starting consumption-report '{}'", config.report.name);
    tracing::debug!("Config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        tracing::error!("Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if args.dry_run {
        print_plan(&config);
        return Ok(());
    }

    let storage = LocalStorage::new(config.output_path().to_string());
    let api = FirmaSeguroClient::from_config(&config)?;
    let pipeline = ConsumptionPipeline::new(storage, api, config);
    let engine = ReportEngine::new(pipeline);

    match engine.run().await {
        Ok(output_path) => {
            println!("✅ Consumption report completed");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "Consumption report failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

fn print_plan(config: &ReportConfig) {
    println!("🔍 Dry run, no requests will be made");
    println!("  API:          {}", config.api.base_url);
    println!(
        "  Date range:   {} .. {}",
        config.query.initial_date, config.query.final_date
    );
    println!("  NIT:          {}", config.nit().unwrap_or("(all tenants only)"));
    println!("  Duplicates:   {:?}", config.duplicate_status_policy());
    println!("  Month labels: {:?}", config.month_label());
    println!(
        "  Output:       {}/{}",
        config.output_path(),
        config.output_filename()
    );
}
