//! Load stage: maps cleaned records to target rows and commits them in
//! dependency order. Reference tables (customers, products) go first;
//! orders and order items follow so every foreign key resolves against
//! rows that are already present.

use tracing::{debug, info};

use crate::domain::{Customer, Product, SaleRow};
use crate::error::Result;
use crate::report::{DatasetSummary, RejectReason, Rejection};
use crate::storage::TargetStore;

pub struct Loader<'a> {
    store: &'a mut dyn TargetStore,
}

impl<'a> Loader<'a> {
    pub fn new(store: &'a mut dyn TargetStore) -> Self {
        Self { store }
    }

    /// Keep-first semantics: the first row wins a customer_id, later
    /// rows with the same id are rejected as duplicates.
    pub fn load_customers(
        &mut self,
        customers: &[(usize, Customer)],
        summary: &mut DatasetSummary,
    ) -> Result<()> {
        for (line, customer) in customers {
            if self.store.has_customer(customer.customer_id)? {
                summary.record_rejection(Rejection::new(
                    *line,
                    RejectReason::DuplicateRow,
                    Some("customer_id"),
                    format!("customer_id {} already loaded", customer.customer_id),
                ));
                continue;
            }
            self.store.insert_customer(customer)?;
            summary.record_loaded();
        }
        info!(loaded = summary.rows_loaded, "Loaded customers");
        Ok(())
    }

    pub fn load_products(
        &mut self,
        products: &[(usize, Product)],
        summary: &mut DatasetSummary,
    ) -> Result<()> {
        for (line, product) in products {
            if self.store.has_product(product.product_id)? {
                summary.record_rejection(Rejection::new(
                    *line,
                    RejectReason::DuplicateRow,
                    Some("product_id"),
                    format!("product_id {} already loaded", product.product_id),
                ));
                continue;
            }
            self.store.insert_product(product)?;
            summary.record_loaded();
        }
        info!(loaded = summary.rows_loaded, "Loaded products");
        Ok(())
    }

    /// A sales row commits an order row and an order-item row together.
    /// Both parents must resolve before anything is inserted so a rejected
    /// row leaves no partial state behind.
    pub fn load_sales(
        &mut self,
        sales: &[(usize, SaleRow)],
        summary: &mut DatasetSummary,
    ) -> Result<()> {
        for (line, sale) in sales {
            if !self.store.has_customer(sale.customer_id)? {
                debug!(line, customer_id = sale.customer_id, "Unresolved customer reference");
                summary.record_rejection(Rejection::new(
                    *line,
                    RejectReason::ConstraintViolation,
                    Some("customer_id"),
                    format!("customer_id {} does not resolve", sale.customer_id),
                ));
                continue;
            }
            if !self.store.has_product(sale.product_id)? {
                debug!(line, product_id = sale.product_id, "Unresolved product reference");
                summary.record_rejection(Rejection::new(
                    *line,
                    RejectReason::ConstraintViolation,
                    Some("product_id"),
                    format!("product_id {} does not resolve", sale.product_id),
                ));
                continue;
            }
            if self.store.has_order(sale.order_id)? {
                summary.record_rejection(Rejection::new(
                    *line,
                    RejectReason::DuplicateRow,
                    Some("order_id"),
                    format!("order_id {} already loaded", sale.order_id),
                ));
                continue;
            }

            let (order, item) = sale.to_target_rows();
            self.store.insert_order(&order)?;
            self.store.insert_order_item(&item)?;
            summary.record_loaded();
        }
        info!(loaded = summary.rows_loaded, "Loaded orders and order items");
        Ok(())
    }
}
