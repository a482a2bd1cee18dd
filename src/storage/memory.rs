use std::collections::HashMap;

use crate::domain::{Customer, Order, OrderItem, Product};
use crate::error::Result;
use crate::storage::TargetStore;

/// In-memory store implementation for development/testing.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    pub customers: HashMap<i64, Customer>,
    pub products: HashMap<i64, Product>,
    pub orders: HashMap<i64, Order>,
    pub order_items: Vec<OrderItem>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TargetStore for InMemoryStore {
    fn insert_customer(&mut self, customer: &Customer) -> Result<()> {
        self.customers
            .insert(customer.customer_id, customer.clone());
        Ok(())
    }

    fn insert_product(&mut self, product: &Product) -> Result<()> {
        self.products.insert(product.product_id, product.clone());
        Ok(())
    }

    fn insert_order(&mut self, order: &Order) -> Result<()> {
        self.orders.insert(order.order_id, order.clone());
        Ok(())
    }

    fn insert_order_item(&mut self, item: &OrderItem) -> Result<()> {
        self.order_items.push(item.clone());
        Ok(())
    }

    fn has_customer(&self, customer_id: i64) -> Result<bool> {
        Ok(self.customers.contains_key(&customer_id))
    }

    fn has_product(&self, product_id: i64) -> Result<bool> {
        Ok(self.products.contains_key(&product_id))
    }

    fn has_order(&self, order_id: i64) -> Result<bool> {
        Ok(self.orders.contains_key(&order_id))
    }
}
