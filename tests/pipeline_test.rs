use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use tempfile::TempDir;

use retail_etl::config::{Config, ReportConfig, Rules, Sources, Target};
use retail_etl::error::EtlError;
use retail_etl::pipeline::Pipeline;
use retail_etl::report::RejectReason;
use retail_etl::storage::{InMemoryStore, SqliteStore, TargetStore};

const CUSTOMERS_CSV: &str = "\
customer_id,name,email,phone,city,signup_date
CUST-001,A. Rao,rao@example.com,98765-43210,Pune,2024-01-15
CUST-002,Meena Iyer,,+91 91234 56789,Chennai,15/02/2024
CUST-002,Meena Iyer,,+91 91234 56789,Chennai,15/02/2024
CUST-003,,c3@example.com,9000000001,Delhi,2024-03-01
CUST-004,Vikram Shah,v@example.com,12345,Mumbai,2024-03-05
";

const PRODUCTS_CSV: &str = "\
product_id,product_name,category,unit_price
P-100,Wireless Mouse,ELECTRONICS,799.0
P-101,Steel Bottle,home goods,349.5
P-101,Steel Bottle Copy,home goods,349.5
";

const SALES_CSV: &str = "\
transaction_id,customer_id,product_id,quantity,unit_price,transaction_date,status
T-1000,CUST-001,P-100,2,799.0,05/04/2024,delivered
T-1001,CUST-999,P-100,1,799.0,06/04/2024,pending
T-1002,CUST-002,P-555,1,349.5,07/04/2024,delivered
T-1003,CUST-002,P-101,3,349.5,2024-04-08,delivered
T-1004,CUST-001,P-100,,799.0,09/04/2024,delivered
";

fn write_sources(dir: &TempDir) -> Result<Sources> {
    let customers = dir.path().join("customers_raw.csv");
    let products = dir.path().join("products_raw.csv");
    let sales = dir.path().join("sales_raw.csv");
    fs::write(&customers, CUSTOMERS_CSV)?;
    fs::write(&products, PRODUCTS_CSV)?;
    fs::write(&sales, SALES_CSV)?;
    Ok(Sources {
        customers,
        products,
        sales,
    })
}

fn config_with(sources: Sources, db_path: PathBuf) -> Config {
    Config {
        sources,
        target: Target { db_path },
        rules: Rules::default(),
        report: ReportConfig::default(),
    }
}

#[test]
fn full_run_loads_valid_rows_and_accounts_for_every_row() -> Result<()> {
    let dir = TempDir::new()?;
    let sources = write_sources(&dir)?;
    let config = config_with(sources, dir.path().join("retail.db"));

    let mut store = InMemoryStore::new();
    let report = Pipeline::new(&config).run(&mut store)?;

    // Every extracted row is either loaded or rejected, per dataset
    for dataset in &report.datasets {
        assert_eq!(
            dataset.rows_read,
            dataset.rows_loaded + dataset.rejected_count(),
            "accounting broke for dataset {}",
            dataset.name
        );
    }

    let customers = &report.datasets[0];
    assert_eq!(customers.rows_read, 5);
    assert_eq!(customers.duplicates_removed, 1);
    assert_eq!(customers.rows_loaded, 2);
    let by_reason = customers.rejections_by_reason();
    assert_eq!(by_reason[&RejectReason::MissingRequiredField], 1);
    assert_eq!(by_reason[&RejectReason::InvalidFormat], 1);
    assert_eq!(by_reason[&RejectReason::DuplicateRow], 1);

    let products = &report.datasets[1];
    assert_eq!(products.rows_read, 3);
    // Same product_id twice with different content: keep-first at load
    assert_eq!(products.rows_loaded, 2);
    assert_eq!(
        products.rejections_by_reason()[&RejectReason::DuplicateRow],
        1
    );

    let sales = &report.datasets[2];
    assert_eq!(sales.rows_read, 5);
    assert_eq!(sales.rows_loaded, 2);
    assert_eq!(
        sales.rejections_by_reason()[&RejectReason::ConstraintViolation],
        2
    );
    assert_eq!(
        sales.rejections_by_reason()[&RejectReason::MissingRequiredField],
        1
    );

    // Cleaned values made it into the store in canonical form
    assert_eq!(store.customers[&1].phone, "+91-9876543210");
    assert_eq!(store.products[&100].category, "Electronics");
    let order = &store.orders[&1000];
    assert_eq!(order.total_amount, 1598.0);
    assert_eq!(order.order_date.to_string(), "2024-04-05");

    // No order or item exists for the constraint-violating rows
    assert!(!store.orders.contains_key(&1001));
    assert!(!store.orders.contains_key(&1002));
    assert_eq!(store.order_items.len(), 2);

    let text = report.render_text();
    assert!(text.contains("Dataset #3: Sales"));
    assert!(text.contains("CONSTRAINT_VIOLATION: 2"));

    Ok(())
}

#[test]
fn full_run_against_sqlite_store() -> Result<()> {
    let dir = TempDir::new()?;
    let sources = write_sources(&dir)?;
    let db_path = dir.path().join("retail.db");
    let config = config_with(sources, db_path.clone());

    let mut store = SqliteStore::open(&db_path)?;
    store.apply_migrations()?;

    let report = Pipeline::new(&config).run(&mut store)?;
    assert_eq!(report.total_loaded(), 6);

    assert!(store.has_customer(1)?);
    assert!(store.has_order(1000)?);
    assert!(!store.has_order(1001)?);
    Ok(())
}

#[test]
fn missing_source_aborts_before_any_load() -> Result<()> {
    let dir = TempDir::new()?;
    let mut sources = write_sources(&dir)?;
    sources.sales = dir.path().join("no_such_file.csv");
    let config = config_with(sources, dir.path().join("retail.db"));

    let mut store = InMemoryStore::new();
    let err = Pipeline::new(&config).run(&mut store).unwrap_err();
    assert!(matches!(err, EtlError::SourceRead { .. }));

    // Nothing was committed, customers and products included
    assert!(store.customers.is_empty());
    assert!(store.products.is_empty());
    Ok(())
}

#[test]
fn check_mode_never_touches_the_store() -> Result<()> {
    let dir = TempDir::new()?;
    let sources = write_sources(&dir)?;
    let config = config_with(sources, dir.path().join("retail.db"));

    let report = Pipeline::new(&config).check()?;
    assert_eq!(report.datasets.len(), 3);
    assert_eq!(report.total_loaded(), 0);
    // Clean-stage accounting still holds
    assert_eq!(report.datasets[0].rows_cleaned, 2);
    assert!(!dir.path().join("retail.db").exists());
    Ok(())
}
