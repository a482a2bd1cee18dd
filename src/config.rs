use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{EtlError, Result};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub sources: Sources,
    pub target: Target,
    #[serde(default)]
    pub rules: Rules,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Paths to the raw CSV exports, one per dataset.
#[derive(Debug, Deserialize)]
pub struct Sources {
    pub customers: PathBuf,
    pub products: PathBuf,
    pub sales: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct Target {
    pub db_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Rules {
    /// Reject rows whose required text fields are missing instead of
    /// filling them with "Unknown". Identity fields are always required.
    #[serde(default = "default_true")]
    pub reject_on_missing_required: bool,
    /// Prefer day-first interpretation for ambiguous dates (31/01/2024).
    #[serde(default = "default_true")]
    pub date_day_first: bool,
}

#[derive(Debug, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_report_path")]
    pub output_path: PathBuf,
}

fn default_true() -> bool {
    true
}

fn default_report_path() -> PathBuf {
    PathBuf::from("data_quality_report.txt")
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            reject_on_missing_required: true,
            date_day_first: true,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_path: default_report_path(),
        }
    }
}

impl Config {
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            EtlError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        let mut config: Config = toml::from_str(&config_content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Environment beats the file: ETL_DB_PATH replaces the target path and
    /// ETL_DATA_DIR re-roots relative source paths.
    fn apply_env_overrides(&mut self) {
        if let Ok(db_path) = env::var("ETL_DB_PATH") {
            self.target.db_path = PathBuf::from(db_path);
        }
        if let Ok(data_dir) = env::var("ETL_DATA_DIR") {
            let data_dir = PathBuf::from(data_dir);
            for source in [
                &mut self.sources.customers,
                &mut self.sources.products,
                &mut self.sources.sales,
            ] {
                if source.is_relative() {
                    *source = data_dir.join(&*source);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let toml_str = r#"
            [sources]
            customers = "data/customers_raw.csv"
            products = "data/products_raw.csv"
            sales = "data/sales_raw.csv"

            [target]
            db_path = "retail.db"

            [rules]
            reject_on_missing_required = false

            [report]
            output_path = "out/report.txt"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(!config.rules.reject_on_missing_required);
        assert!(config.rules.date_day_first);
        assert_eq!(config.report.output_path, PathBuf::from("out/report.txt"));
    }

    #[test]
    fn rules_and_report_sections_are_optional() {
        let toml_str = r#"
            [sources]
            customers = "a.csv"
            products = "b.csv"
            sales = "c.csv"

            [target]
            db_path = "retail.db"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.rules.reject_on_missing_required);
        assert_eq!(
            config.report.output_path,
            PathBuf::from("data_quality_report.txt")
        );
    }
}
