use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub signup_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: i64,
    pub product_name: String,
    pub category: String,
    pub unit_price: f64,
}

/// One row of the sales export. Fans out into an order and an order item
/// when mapped to target rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRow {
    pub order_id: i64,
    pub customer_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
    pub order_date: NaiveDate,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: i64,
    pub customer_id: i64,
    pub order_date: NaiveDate,
    pub total_amount: f64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
}

impl SaleRow {
    pub fn total_amount(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }

    /// Map to target rows. The order must be committed before the item.
    pub fn to_target_rows(&self) -> (Order, OrderItem) {
        let order = Order {
            order_id: self.order_id,
            customer_id: self.customer_id,
            order_date: self.order_date,
            total_amount: self.total_amount(),
            status: self.status.clone(),
        };
        let item = OrderItem {
            order_id: self.order_id,
            product_id: self.product_id,
            quantity: self.quantity,
            unit_price: self.unit_price,
        };
        (order, item)
    }
}
