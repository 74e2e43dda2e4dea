use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the `region` dimension. `region_id` is a surrogate assigned
/// by the cleaning stage in first-seen order; `name` is the natural key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRow {
    pub region_id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRow {
    pub product_id: u32,
    pub name: String,
    pub category: String,
    pub unit_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRow {
    pub customer_id: u32,
    pub name: String,
    pub region_id: u32,
}

/// Order header. Natural key is (customer_id, order_date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRow {
    pub order_id: u32,
    pub customer_id: u32,
    pub order_date: NaiveDate,
}

/// Order line, child of an order and a product. Identity is
/// (order_id, product_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineRow {
    pub order_id: u32,
    pub product_id: u32,
    pub quantity: u32,
    pub line_total: f64,
}

/// The normalized frames produced by the cleaning stage, ready for
/// population in foreign-key dependency order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanedTables {
    pub regions: Vec<RegionRow>,
    pub products: Vec<ProductRow>,
    pub customers: Vec<CustomerRow>,
    pub orders: Vec<OrderRow>,
    pub order_lines: Vec<OrderLineRow>,
}

impl CleanedTables {
    pub fn total_rows(&self) -> usize {
        self.regions.len()
            + self.products.len()
            + self.customers.len()
            + self.orders.len()
            + self.order_lines.len()
    }
}
