use std::path::Path;

use rusqlite::{params, Connection};
use tracing::info;

use crate::domain::{Customer, Order, OrderItem, Product};
use crate::error::{EtlError, Result};
use crate::storage::TargetStore;

/// SQLite-backed target store. The connection is opened once per run and
/// closed when the store is dropped.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path).map_err(|e| {
            EtlError::StoreConnection(format!(
                "Failed to open store at '{}': {}",
                db_path.display(),
                e
            ))
        })?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        info!(path = %db_path.display(), "Opened target store");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| EtlError::StoreConnection(format!("Failed to open in-memory store: {}", e)))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn })
    }

    /// Create the target schema if it does not exist yet.
    pub fn apply_migrations(&self) -> Result<()> {
        info!("Applying target schema migrations");
        self.conn
            .execute_batch(include_str!("../../migrations/001_create_core_tables.sql"))?;
        Ok(())
    }

    fn exists(&self, sql: &str, id: i64) -> Result<bool> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params![id])?;
        Ok(rows.next()?.is_some())
    }
}

impl TargetStore for SqliteStore {
    fn insert_customer(&mut self, customer: &Customer) -> Result<()> {
        self.conn.execute(
            "INSERT INTO customers (customer_id, name, email, phone, city, signup_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                customer.customer_id,
                customer.name,
                customer.email,
                customer.phone,
                customer.city,
                customer.signup_date.map(|d| d.to_string()),
            ],
        )?;
        Ok(())
    }

    fn insert_product(&mut self, product: &Product) -> Result<()> {
        self.conn.execute(
            "INSERT INTO products (product_id, product_name, category, unit_price)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                product.product_id,
                product.product_name,
                product.category,
                product.unit_price,
            ],
        )?;
        Ok(())
    }

    fn insert_order(&mut self, order: &Order) -> Result<()> {
        self.conn.execute(
            "INSERT INTO orders (order_id, customer_id, order_date, total_amount, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                order.order_id,
                order.customer_id,
                order.order_date.to_string(),
                order.total_amount,
                order.status,
            ],
        )?;
        Ok(())
    }

    fn insert_order_item(&mut self, item: &OrderItem) -> Result<()> {
        self.conn.execute(
            "INSERT INTO order_items (order_id, product_id, quantity, unit_price)
             VALUES (?1, ?2, ?3, ?4)",
            params![item.order_id, item.product_id, item.quantity, item.unit_price],
        )?;
        Ok(())
    }

    fn has_customer(&self, customer_id: i64) -> Result<bool> {
        self.exists("SELECT 1 FROM customers WHERE customer_id = ?1", customer_id)
    }

    fn has_product(&self, product_id: i64) -> Result<bool> {
        self.exists("SELECT 1 FROM products WHERE product_id = ?1", product_id)
    }

    fn has_order(&self, order_id: i64) -> Result<bool> {
        self.exists("SELECT 1 FROM orders WHERE order_id = ?1", order_id)
    }
}
