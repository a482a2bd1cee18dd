// Target-store boundary: the pipeline loads through this trait so the
// Load stage can be exercised without a database file.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use crate::domain::{Customer, Order, OrderItem, Product};
use crate::error::Result;

/// Synchronous writer for the normalized relational schema. One writer
/// per run; the connection lives for the duration of the run and is
/// released on drop.
pub trait TargetStore {
    fn insert_customer(&mut self, customer: &Customer) -> Result<()>;
    fn insert_product(&mut self, product: &Product) -> Result<()>;
    fn insert_order(&mut self, order: &Order) -> Result<()>;
    fn insert_order_item(&mut self, item: &OrderItem) -> Result<()>;

    fn has_customer(&self, customer_id: i64) -> Result<bool>;
    fn has_product(&self, product_id: i64) -> Result<bool>;
    fn has_order(&self, order_id: i64) -> Result<bool>;
}
