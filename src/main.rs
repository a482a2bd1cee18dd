use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use retail_etl::config::Config;
use retail_etl::logging;
use retail_etl::pipeline::Pipeline;
use retail_etl::storage::SqliteStore;

#[derive(Parser)]
#[command(name = "retail_etl")]
#[command(about = "CSV-to-relational ETL pipeline for retail sales data")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full extract-clean-load pipeline and write the quality report
    Run {
        /// Override the target database path from the config file
        #[arg(long)]
        db: Option<PathBuf>,
        /// Also write the quality report as JSON
        #[arg(long)]
        json_report: Option<PathBuf>,
    },
    /// Extract and clean the sources without loading anything
    Check,
    /// Create the target schema and exit
    InitDb {
        /// Override the target database path from the config file
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Run { db, json_report } => {
            if let Some(db) = db {
                config.target.db_path = db;
            }

            let mut store = SqliteStore::open(&config.target.db_path)?;
            store.apply_migrations()?;

            let report = Pipeline::new(&config).run(&mut store)?;
            let text = report.render_text();
            println!("{}", text);

            fs::write(&config.report.output_path, &text)?;
            println!(
                "📊 Quality report saved to {}",
                config.report.output_path.display()
            );

            if let Some(path) = json_report {
                fs::write(&path, serde_json::to_string_pretty(&report)?)?;
                println!("📊 JSON report saved to {}", path.display());
            }

            println!(
                "✅ Loaded {} rows ({} rejected)",
                report.total_loaded(),
                report.total_rejected()
            );
        }
        Commands::Check => {
            let report = Pipeline::new(&config).check()?;
            println!("{}", report.render_text());
            println!("✅ Check complete: no rows were loaded");
        }
        Commands::InitDb { db } => {
            if let Some(db) = db {
                config.target.db_path = db;
            }
            let store = SqliteStore::open(&config.target.db_path)?;
            store.apply_migrations()?;
            info!(path = %config.target.db_path.display(), "Schema created");
            println!(
                "✅ Target schema ready at {}",
                config.target.db_path.display()
            );
        }
    }

    Ok(())
}
