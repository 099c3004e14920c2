pub mod toml_config;

#[cfg(feature = "cli")]
mod cli {
    use super::toml_config::ReportConfig;
    use clap::Parser;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "consumption-report")]
    #[command(about = "Normalizes FirmaSeguro consumption data into a report bundle")]
    pub struct CliConfig {
        /// Path to TOML configuration file
        #[arg(short, long, default_value = "consumption-report.toml")]
        pub config: String,

        /// Override query.nit
        #[arg(long)]
        pub nit: Option<String>,

        /// Override query.initial_date (YYYY-MM-DD)
        #[arg(long)]
        pub initial_date: Option<String>,

        /// Override query.final_date (YYYY-MM-DD)
        #[arg(long)]
        pub final_date: Option<String>,

        /// Override load.output_path
        #[arg(long)]
        pub output_path: Option<String>,

        /// Validate the configuration and print the plan without calling the API
        #[arg(long)]
        pub dry_run: bool,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,
    }

    impl CliConfig {
        /// Command-line values win over the file.
        pub fn apply_overrides(&self, config: &mut ReportConfig) {
            if let Some(nit) = &self.nit {
                config.query.nit = Some(nit.clone());
            }
            if let Some(initial_date) = &self.initial_date {
                config.query.initial_date = initial_date.clone();
            }
            if let Some(final_date) = &self.final_date {
                config.query.final_date = final_date.clone();
            }
            if let Some(output_path) = &self.output_path {
                config.load.output_path = output_path.clone();
            }
        }
    }

}

#[cfg(feature = "cli")]
pub use cli::CliConfig;
