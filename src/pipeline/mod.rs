// Ingestion pipeline: extract, clean, and load stages plus the
// per-run orchestration that strings them together.

pub mod clean;
pub mod extract;
pub mod fields;
pub mod load;

use std::path::Path;

use tracing::{info, warn};

use crate::config::{Config, Rules};
use crate::error::Result;
use crate::pipeline::clean::{CleanOutcome, Deduper};
use crate::pipeline::extract::{CsvSource, RawRecord};
use crate::pipeline::load::Loader;
use crate::report::{DatasetSummary, QualityReport};
use crate::storage::TargetStore;

/// One-shot, single-threaded ETL run over the configured sources.
///
/// Every source is extracted and cleaned before any row is committed, so
/// a missing or corrupt input aborts the run with the target untouched.
/// Row-level problems never abort; they land in the quality report.
pub struct Pipeline<'a> {
    config: &'a Config,
}

struct StagedDataset<T> {
    rows: Vec<(usize, T)>,
    summary: DatasetSummary,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Full extract -> clean -> load run. Returns the quality report;
    /// the target store holds every committed row when this returns Ok.
    pub fn run(&self, store: &mut dyn TargetStore) -> Result<QualityReport> {
        let mut report = QualityReport::new();
        let span = tracing::info_span!("etl_run", run_id = %report.run_id);
        let _enter = span.enter();

        let (mut customers, mut products, mut sales) = self.stage_all()?;

        let mut loader = Loader::new(store);
        loader.load_customers(&customers.rows, &mut customers.summary)?;
        loader.load_products(&products.rows, &mut products.summary)?;
        loader.load_sales(&sales.rows, &mut sales.summary)?;

        report.push_dataset(customers.summary);
        report.push_dataset(products.summary);
        report.push_dataset(sales.summary);

        info!(
            loaded = report.total_loaded(),
            rejected = report.total_rejected(),
            "Pipeline run complete"
        );
        Ok(report)
    }

    /// Extract + clean only; the target store is never touched. Useful
    /// for validating a drop of raw files before loading it.
    pub fn check(&self) -> Result<QualityReport> {
        let mut report = QualityReport::new();
        let span = tracing::info_span!("etl_check", run_id = %report.run_id);
        let _enter = span.enter();

        let (customers, products, sales) = self.stage_all()?;
        report.push_dataset(customers.summary);
        report.push_dataset(products.summary);
        report.push_dataset(sales.summary);
        Ok(report)
    }

    fn stage_all(
        &self,
    ) -> Result<(
        StagedDataset<crate::domain::Customer>,
        StagedDataset<crate::domain::Product>,
        StagedDataset<crate::domain::SaleRow>,
    )> {
        let customers = self.extract_clean(
            "Customers",
            &self.config.sources.customers,
            clean::clean_customer,
        )?;
        let products = self.extract_clean(
            "Products",
            &self.config.sources.products,
            clean::clean_product,
        )?;
        let sales = self.extract_clean("Sales", &self.config.sources.sales, clean::clean_sale)?;
        Ok((customers, products, sales))
    }

    fn extract_clean<T>(
        &self,
        name: &str,
        path: &Path,
        clean_fn: impl Fn(&RawRecord, &Rules) -> CleanOutcome<T>,
    ) -> Result<StagedDataset<T>> {
        let span = tracing::info_span!("dataset", name = %name);
        let _enter = span.enter();

        let mut summary = DatasetSummary::new(name);
        let mut deduper = Deduper::new();
        let mut rows = Vec::new();

        let source = CsvSource::open(path)?;
        info!(path = %path.display(), "Extracting source");

        for record in source {
            // A row the reader cannot parse as tabular data is fatal
            let record = record?;
            summary.record_read();

            if let Some(rejection) = deduper.check(&record) {
                summary.record_rejection(rejection);
                continue;
            }

            match clean_fn(&record, &self.config.rules) {
                Ok(cleaned) => {
                    for column in &cleaned.filled {
                        summary.record_filled(column);
                    }
                    summary.record_cleaned();
                    rows.push((record.line, cleaned.record));
                }
                Err(rejection) => {
                    warn!(
                        line = rejection.line,
                        reason = %rejection.reason,
                        detail = %rejection.detail,
                        "Row rejected"
                    );
                    summary.record_rejection(rejection);
                }
            }
        }

        info!(
            read = summary.rows_read,
            cleaned = summary.rows_cleaned,
            rejected = summary.rejected_count(),
            "Source cleaned"
        );
        Ok(StagedDataset { rows, summary })
    }
}
