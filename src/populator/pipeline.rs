use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use tokio_postgres::Client;
use tracing::{info, warn};

use crate::db::Database;
use crate::db::schema::{
    UPSERT_CUSTOMER_SQL, UPSERT_ORDER_LINE_SQL, UPSERT_ORDER_SQL, UPSERT_PRODUCT_SQL,
    UPSERT_REGION_SQL,
};
use crate::error::AppError;
use crate::models::{CleanedTables, CustomerRow, OrderLineRow, OrderRow, ProductRow, RegionRow};

/// A row that could not be written, identified by its natural key.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedRow {
    pub key: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct TableReport {
    pub table: &'static str,
    pub attempted: usize,
    pub written: usize,
    pub skipped: Vec<SkippedRow>,
}

impl TableReport {
    fn new(table: &'static str) -> Self {
        Self {
            table,
            attempted: 0,
            written: 0,
            skipped: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct PopulationReport {
    pub tables: Vec<TableReport>,
}

impl PopulationReport {
    pub fn total_written(&self) -> usize {
        self.tables.iter().map(|t| t.written).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.tables.iter().map(|t| t.skipped.len()).sum()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} rows written, {} skipped across {} tables",
            self.total_written(),
            self.total_skipped(),
            self.tables.len()
        )
    }
}

/// Upsert seam between the load loop and the database, so load-order
/// and skip semantics can be tested with an injected failure.
#[async_trait]
pub trait SalesWriter: Send + Sync {
    async fn upsert_region(&self, row: &RegionRow) -> Result<i32, AppError>;
    async fn upsert_product(&self, row: &ProductRow) -> Result<i32, AppError>;
    async fn upsert_customer(&self, row: &CustomerRow, region_id: i32) -> Result<i32, AppError>;
    async fn upsert_order(&self, row: &OrderRow, customer_id: i32) -> Result<i32, AppError>;
    async fn upsert_order_line(
        &self,
        row: &OrderLineRow,
        order_id: i32,
        product_id: i32,
    ) -> Result<(), AppError>;
}

/// Live implementation over a tokio-postgres client.
pub struct PgWriter {
    client: Client,
}

impl PgWriter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn upsert_returning_id(
        &self,
        sql: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> Result<i32, AppError> {
        self.client
            .query_one(sql, params)
            .await
            .map(|row| row.get(0))
            .map_err(|e| AppError::Population(e.to_string()))
    }
}

#[async_trait]
impl SalesWriter for PgWriter {
    async fn upsert_region(&self, row: &RegionRow) -> Result<i32, AppError> {
        self.upsert_returning_id(UPSERT_REGION_SQL, &[&row.name]).await
    }

    async fn upsert_product(&self, row: &ProductRow) -> Result<i32, AppError> {
        self.upsert_returning_id(
            UPSERT_PRODUCT_SQL,
            &[&row.name, &row.category, &row.unit_price],
        )
        .await
    }

    async fn upsert_customer(&self, row: &CustomerRow, region_id: i32) -> Result<i32, AppError> {
        self.upsert_returning_id(UPSERT_CUSTOMER_SQL, &[&row.name, &region_id])
            .await
    }

    async fn upsert_order(&self, row: &OrderRow, customer_id: i32) -> Result<i32, AppError> {
        self.upsert_returning_id(UPSERT_ORDER_SQL, &[&customer_id, &row.order_date])
            .await
    }

    async fn upsert_order_line(
        &self,
        row: &OrderLineRow,
        order_id: i32,
        product_id: i32,
    ) -> Result<(), AppError> {
        let quantity = row.quantity as i32;
        self.client
            .execute(
                UPSERT_ORDER_LINE_SQL,
                &[&order_id, &product_id, &quantity, &row.line_total],
            )
            .await
            .map(|_| ())
            .map_err(|e| AppError::Population(e.to_string()))
    }
}

/// Writes cleaned frames into the database in foreign-key dependency
/// order: region, product, customer, orders, order_line.
///
/// Every row is upserted by its natural key, so repeated runs against
/// the same target are safe. A failed parent row does not abort the
/// load; its children are skipped with the offending key recorded, and
/// independent branches continue.
pub struct Populator;

impl Populator {
    pub fn new() -> Self {
        Populator
    }

    pub async fn populate(
        &self,
        db: &Database,
        tables: &CleanedTables,
    ) -> Result<PopulationReport, AppError> {
        let client = db.connect().await?;
        Ok(self.load(&PgWriter::new(client), tables).await)
    }

    pub async fn load<W: SalesWriter>(
        &self,
        writer: &W,
        tables: &CleanedTables,
    ) -> PopulationReport {
        let mut report = PopulationReport::default();

        // Maps from the cleaning stage's surrogate ids to live database
        // ids; a missing entry means the parent row failed to load.
        let mut region_ids: HashMap<u32, i32> = HashMap::new();
        let mut product_ids: HashMap<u32, i32> = HashMap::new();
        let mut customer_ids: HashMap<u32, i32> = HashMap::new();
        let mut order_ids: HashMap<u32, i32> = HashMap::new();

        let mut regions = TableReport::new("region");
        for row in &tables.regions {
            regions.attempted += 1;
            match writer.upsert_region(row).await {
                Ok(id) => {
                    region_ids.insert(row.region_id, id);
                    regions.written += 1;
                }
                Err(e) => regions.skipped.push(SkippedRow {
                    key: row.name.clone(),
                    reason: e.to_string(),
                }),
            }
        }
        log_table(&regions);
        report.tables.push(regions);

        let mut products = TableReport::new("product");
        for row in &tables.products {
            products.attempted += 1;
            match writer.upsert_product(row).await {
                Ok(id) => {
                    product_ids.insert(row.product_id, id);
                    products.written += 1;
                }
                Err(e) => products.skipped.push(SkippedRow {
                    key: row.name.clone(),
                    reason: e.to_string(),
                }),
            }
        }
        log_table(&products);
        report.tables.push(products);

        let mut customers = TableReport::new("customer");
        for row in &tables.customers {
            customers.attempted += 1;
            let Some(region_id) = region_ids.get(&row.region_id) else {
                customers.skipped.push(SkippedRow {
                    key: row.name.clone(),
                    reason: "parent region was not loaded".to_string(),
                });
                continue;
            };
            match writer.upsert_customer(row, *region_id).await {
                Ok(id) => {
                    customer_ids.insert(row.customer_id, id);
                    customers.written += 1;
                }
                Err(e) => customers.skipped.push(SkippedRow {
                    key: row.name.clone(),
                    reason: e.to_string(),
                }),
            }
        }
        log_table(&customers);
        report.tables.push(customers);

        let mut orders = TableReport::new("orders");
        for row in &tables.orders {
            orders.attempted += 1;
            let key = format!("customer {} @ {}", row.customer_id, row.order_date);
            let Some(customer_id) = customer_ids.get(&row.customer_id) else {
                orders.skipped.push(SkippedRow {
                    key,
                    reason: "parent customer was not loaded".to_string(),
                });
                continue;
            };
            match writer.upsert_order(row, *customer_id).await {
                Ok(id) => {
                    order_ids.insert(row.order_id, id);
                    orders.written += 1;
                }
                Err(e) => orders.skipped.push(SkippedRow {
                    key,
                    reason: e.to_string(),
                }),
            }
        }
        log_table(&orders);
        report.tables.push(orders);

        let mut lines = TableReport::new("order_line");
        for row in &tables.order_lines {
            lines.attempted += 1;
            let key = format!("order {} / product {}", row.order_id, row.product_id);
            let (Some(order_id), Some(product_id)) =
                (order_ids.get(&row.order_id), product_ids.get(&row.product_id))
            else {
                lines.skipped.push(SkippedRow {
                    key,
                    reason: "parent order or product was not loaded".to_string(),
                });
                continue;
            };
            match writer.upsert_order_line(row, *order_id, *product_id).await {
                Ok(()) => lines.written += 1,
                Err(e) => lines.skipped.push(SkippedRow {
                    key,
                    reason: e.to_string(),
                }),
            }
        }
        log_table(&lines);
        report.tables.push(lines);

        info!("Population summary: {}", report.summary());
        report
    }
}

fn log_table(report: &TableReport) {
    if report.skipped.is_empty() {
        info!("{}: {} rows written", report.table, report.written);
    } else {
        warn!(
            "{}: {} rows written, {} skipped",
            report.table,
            report.written,
            report.skipped.len()
        );
        for skip in &report.skipped {
            warn!("  skipped [{}]: {}", skip.key, skip.reason);
        }
    }
}
