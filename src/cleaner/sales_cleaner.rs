use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

use crate::error::AppError;
use crate::models::{
    CleanedTables, CustomerRow, OrderLineRow, OrderRow, ProductRow, RegionRow,
};

/// A raw row that could not be used at all.
#[derive(Debug, Clone, Serialize)]
pub struct ExcludedRow {
    pub row: usize,
    pub reason: String,
}

/// A suspicious field that was flagged but did not exclude the whole row.
#[derive(Debug, Clone, Serialize)]
pub struct CleaningFlag {
    pub row: usize,
    pub field: String,
    pub detail: String,
}

#[derive(Debug, Default, Serialize)]
pub struct CleaningReport {
    pub rows_seen: usize,
    pub excluded: Vec<ExcludedRow>,
    pub flags: Vec<CleaningFlag>,
}

impl CleaningReport {
    pub fn summary(&self) -> String {
        format!(
            "{} rows seen, {} excluded, {} fields flagged",
            self.rows_seen,
            self.excluded.len(),
            self.flags.len()
        )
    }
}

/// Decomposes the denormalized sales frame into normalized tables.
///
/// Dimension rows are deduplicated by a case- and whitespace-insensitive
/// natural key; surrogate ids are assigned in first-seen order, so two
/// cleans of the same input produce identical tables. Each raw row
/// becomes one order header plus one line per entry in its semicolon
/// lists. Orders share a header when customer and date match; a product
/// repeated within one order keeps the last occurrence.
pub struct SalesCleaner;

impl SalesCleaner {
    pub fn new() -> Self {
        SalesCleaner
    }

    pub fn clean(&self, df: &DataFrame) -> Result<(CleanedTables, CleaningReport), AppError> {
        let customer = str_col(df, "customer")?;
        let region = str_col(df, "region")?;
        let order_date = str_col(df, "order_date")?;
        let products = str_col(df, "products")?;
        let categories = str_col(df, "categories")?;
        let unit_prices = str_col(df, "unit_prices")?;
        let quantities = str_col(df, "quantities")?;
        let line_totals = str_col(df, "line_totals")?;

        let mut tables = CleanedTables::default();
        let mut report = CleaningReport {
            rows_seen: df.height(),
            ..Default::default()
        };

        let mut region_ids: HashMap<String, u32> = HashMap::new();
        let mut product_ids: HashMap<String, u32> = HashMap::new();
        let mut customer_ids: HashMap<String, u32> = HashMap::new();
        let mut order_ids: HashMap<(u32, NaiveDate), u32> = HashMap::new();
        // (order_id, product_id) -> index into tables.order_lines
        let mut line_slots: HashMap<(u32, u32), usize> = HashMap::new();

        for row in 0..df.height() {
            let Some(customer_raw) = non_empty(customer.get(row)) else {
                report.excluded.push(ExcludedRow {
                    row,
                    reason: "missing customer name".to_string(),
                });
                continue;
            };
            let Some(region_raw) = non_empty(region.get(row)) else {
                report.excluded.push(ExcludedRow {
                    row,
                    reason: "missing region".to_string(),
                });
                continue;
            };
            let Some(date_raw) = non_empty(order_date.get(row)) else {
                report.excluded.push(ExcludedRow {
                    row,
                    reason: "missing order date".to_string(),
                });
                continue;
            };
            let Some(date) = parse_order_date(date_raw) else {
                report.excluded.push(ExcludedRow {
                    row,
                    reason: format!("unparseable order date '{}'", date_raw),
                });
                continue;
            };

            let product_list = split_list(products.get(row));
            let category_list = split_list(categories.get(row));
            let price_list = split_list(unit_prices.get(row));
            let quantity_list = split_list(quantities.get(row));
            let total_list = split_list(line_totals.get(row));

            if product_list.is_empty() {
                report.excluded.push(ExcludedRow {
                    row,
                    reason: "no order lines".to_string(),
                });
                continue;
            }

            let n = product_list.len();
            if category_list.len() != n
                || price_list.len() != n
                || quantity_list.len() != n
                || total_list.len() != n
            {
                report.excluded.push(ExcludedRow {
                    row,
                    reason: format!(
                        "ragged line lists ({} products, {} categories, {} prices, {} quantities, {} totals)",
                        n,
                        category_list.len(),
                        price_list.len(),
                        quantity_list.len(),
                        total_list.len()
                    ),
                });
                continue;
            }

            let region_id = {
                let key = natural_key(region_raw);
                match region_ids.get(&key) {
                    Some(id) => *id,
                    None => {
                        let id = (tables.regions.len() + 1) as u32;
                        tables.regions.push(RegionRow {
                            region_id: id,
                            name: display_name(region_raw),
                        });
                        region_ids.insert(key, id);
                        id
                    }
                }
            };

            let customer_id = {
                let key = natural_key(customer_raw);
                match customer_ids.get(&key) {
                    Some(id) => {
                        // Attribute conflict resolution: last write wins
                        tables.customers[(*id - 1) as usize].region_id = region_id;
                        *id
                    }
                    None => {
                        let id = (tables.customers.len() + 1) as u32;
                        tables.customers.push(CustomerRow {
                            customer_id: id,
                            name: display_name(customer_raw),
                            region_id,
                        });
                        customer_ids.insert(key, id);
                        id
                    }
                }
            };

            let order_id = match order_ids.get(&(customer_id, date)) {
                Some(id) => *id,
                None => {
                    let id = (tables.orders.len() + 1) as u32;
                    tables.orders.push(OrderRow {
                        order_id: id,
                        customer_id,
                        order_date: date,
                    });
                    order_ids.insert((customer_id, date), id);
                    id
                }
            };

            for i in 0..n {
                let product_raw = product_list[i];
                if product_raw.is_empty() {
                    report.flags.push(CleaningFlag {
                        row,
                        field: "products".to_string(),
                        detail: format!("empty product name at line {}", i + 1),
                    });
                    continue;
                }

                let Some(unit_price) = parse_money(price_list[i]) else {
                    report.flags.push(CleaningFlag {
                        row,
                        field: "unit_prices".to_string(),
                        detail: format!("unparseable unit price '{}'", price_list[i]),
                    });
                    continue;
                };
                if unit_price < 0.0 {
                    report.flags.push(CleaningFlag {
                        row,
                        field: "unit_prices".to_string(),
                        detail: format!("negative unit price {} for '{}'", unit_price, product_raw),
                    });
                    continue;
                }

                let Some(quantity) = parse_quantity(quantity_list[i]) else {
                    report.flags.push(CleaningFlag {
                        row,
                        field: "quantities".to_string(),
                        detail: format!("invalid quantity '{}'", quantity_list[i]),
                    });
                    continue;
                };

                let Some(line_total) = parse_money(total_list[i]) else {
                    report.flags.push(CleaningFlag {
                        row,
                        field: "line_totals".to_string(),
                        detail: format!("unparseable line total '{}'", total_list[i]),
                    });
                    continue;
                };
                if line_total < 0.0 {
                    report.flags.push(CleaningFlag {
                        row,
                        field: "line_totals".to_string(),
                        detail: format!("negative line total {}", line_total),
                    });
                    continue;
                }

                let product_id = {
                    let key = natural_key(product_raw);
                    match product_ids.get(&key) {
                        Some(id) => {
                            let slot = &mut tables.products[(*id - 1) as usize];
                            slot.category = display_name(category_list[i]);
                            slot.unit_price = unit_price;
                            *id
                        }
                        None => {
                            let id = (tables.products.len() + 1) as u32;
                            tables.products.push(ProductRow {
                                product_id: id,
                                name: display_name(product_raw),
                                category: display_name(category_list[i]),
                                unit_price,
                            });
                            product_ids.insert(key, id);
                            id
                        }
                    }
                };

                // Validate the stored total against quantity x price;
                // keep the stored value either way
                let expected = unit_price * quantity as f64;
                if (line_total - expected).abs() > 0.01 {
                    report.flags.push(CleaningFlag {
                        row,
                        field: "line_totals".to_string(),
                        detail: format!(
                            "line total {} inconsistent with {} x {}",
                            line_total, quantity, unit_price
                        ),
                    });
                }

                let line = OrderLineRow {
                    order_id,
                    product_id,
                    quantity,
                    line_total,
                };
                match line_slots.get(&(order_id, product_id)) {
                    Some(idx) => tables.order_lines[*idx] = line,
                    None => {
                        line_slots.insert((order_id, product_id), tables.order_lines.len());
                        tables.order_lines.push(line);
                    }
                }
            }
        }

        info!(
            "Cleaning summary: {} ({} regions, {} products, {} customers, {} orders, {} lines)",
            report.summary(),
            tables.regions.len(),
            tables.products.len(),
            tables.customers.len(),
            tables.orders.len(),
            tables.order_lines.len()
        );

        Ok((tables, report))
    }
}

fn str_col<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked, AppError> {
    df.column(name)
        .and_then(|c| c.str())
        .map_err(|e| AppError::Cleaning(format!("missing or non-string column '{}': {}", name, e)))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Case- and whitespace-insensitive key used for deduplication.
fn natural_key(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// First-seen display form of a natural key: whitespace collapsed, case kept.
fn display_name(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn split_list(value: Option<&str>) -> Vec<&str> {
    match value.map(str::trim) {
        Some(s) if !s.is_empty() => s.split(';').map(str::trim).collect(),
        _ => Vec::new(),
    }
}

fn parse_order_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()
}

fn parse_money(s: &str) -> Option<f64> {
    let cleaned = s.replace("$", "").replace(",", "");
    cleaned.trim().parse::<f64>().ok()
}

fn parse_quantity(s: &str) -> Option<u32> {
    let value = s.trim().parse::<i64>().ok()?;
    u32::try_from(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::raw_frame::raw_frame_from_str;

    const HEADER: &str =
        "customer\tregion\torder_date\tproducts\tcategories\tunit_prices\tquantities\tline_totals\n";

    fn clean_tsv(body: &str) -> (CleanedTables, CleaningReport) {
        let tsv = format!("{}{}", HEADER, body);
        let df = raw_frame_from_str(&tsv).unwrap();
        SalesCleaner::new().clean(&df).unwrap()
    }

    #[test]
    fn test_dedup_customer_casing_and_whitespace() {
        let (tables, report) = clean_tsv(
            "Jane Doe\tEurope\t20210105\tWidget\tTools\t2.50\t4\t10.00\n\
             jane   DOE\tEurope\t20210211\tGadget\tTools\t10.00\t1\t10.00\n",
        );
        assert_eq!(tables.customers.len(), 1);
        assert_eq!(tables.customers[0].name, "Jane Doe");
        assert_eq!(tables.orders.len(), 2);
        assert!(report.excluded.is_empty());
    }

    #[test]
    fn test_surrogate_ids_deterministic() {
        let body = "Jane Doe\tEurope\t20210105\tWidget;Gadget\tTools;Tools\t2.50;10.00\t4;1\t10.00;10.00\n\
                    Bob Roe\tAsia\t20210106\tGadget\tTools\t10.00\t2\t20.00\n";
        let (first, _) = clean_tsv(body);
        let (second, _) = clean_tsv(body);
        assert_eq!(first.regions, second.regions);
        assert_eq!(first.products, second.products);
        assert_eq!(first.customers, second.customers);
        assert_eq!(first.orders, second.orders);
        assert_eq!(first.order_lines, second.order_lines);
        // first-seen order, not alphabetical
        assert_eq!(first.products[0].name, "Widget");
        assert_eq!(first.products[1].name, "Gadget");
    }

    #[test]
    fn test_missing_customer_excluded_and_recorded() {
        let (tables, report) = clean_tsv(
            "\tEurope\t20210105\tWidget\tTools\t2.50\t4\t10.00\n\
             Bob Roe\tAsia\t20210106\tGadget\tTools\t10.00\t2\t20.00\n",
        );
        assert_eq!(tables.customers.len(), 1);
        assert_eq!(report.excluded.len(), 1);
        assert_eq!(report.excluded[0].row, 0);
        assert!(report.excluded[0].reason.contains("customer"));
    }

    #[test]
    fn test_unparseable_date_excluded() {
        let (tables, report) = clean_tsv(
            "Jane Doe\tEurope\tnot-a-date\tWidget\tTools\t2.50\t4\t10.00\n",
        );
        assert!(tables.orders.is_empty());
        assert_eq!(report.excluded.len(), 1);
        assert!(report.excluded[0].reason.contains("order date"));
    }

    #[test]
    fn test_negative_price_flagged_and_line_skipped() {
        let (tables, report) = clean_tsv(
            "Jane Doe\tEurope\t20210105\tWidget;Gadget\tTools;Tools\t-2.50;10.00\t4;1\t10.00;10.00\n",
        );
        assert_eq!(tables.order_lines.len(), 1);
        assert_eq!(tables.products.len(), 1);
        assert_eq!(tables.products[0].name, "Gadget");
        assert!(
            report
                .flags
                .iter()
                .any(|f| f.detail.contains("negative unit price"))
        );
    }

    #[test]
    fn test_line_total_validated_not_recomputed() {
        let (tables, report) = clean_tsv(
            "Jane Doe\tEurope\t20210105\tWidget\tTools\t2.50\t4\t99.00\n",
        );
        assert_eq!(tables.order_lines.len(), 1);
        // stored total kept as-is
        assert_eq!(tables.order_lines[0].line_total, 99.00);
        assert!(report.flags.iter().any(|f| f.detail.contains("inconsistent")));
    }

    #[test]
    fn test_money_parsing_strips_currency_noise() {
        let (tables, report) = clean_tsv(
            "Jane Doe\tEurope\t20210105\tWidget\tTools\t$1,250.00\t2\t$2,500.00\n",
        );
        assert!(report.flags.is_empty());
        assert_eq!(tables.products[0].unit_price, 1250.0);
        assert_eq!(tables.order_lines[0].line_total, 2500.0);
    }

    #[test]
    fn test_order_decomposition_shares_header() {
        let (tables, _) = clean_tsv(
            "Jane Doe\tEurope\t20210105\tWidget;Gadget\tTools;Tools\t2.50;10.00\t4;1\t10.00;10.00\n\
             Jane Doe\tEurope\t20210105\tSprocket\tParts\t5.00\t2\t10.00\n\
             Jane Doe\tEurope\t20210106\tWidget\tTools\t2.50\t1\t2.50\n",
        );
        // same customer+date rows collapse into one header
        assert_eq!(tables.orders.len(), 2);
        assert_eq!(tables.order_lines.len(), 4);
    }

    #[test]
    fn test_duplicate_product_in_order_last_write_wins() {
        let (tables, _) = clean_tsv(
            "Jane Doe\tEurope\t20210105\tWidget;Widget\tTools;Tools\t2.50;2.50\t4;6\t10.00;15.00\n",
        );
        assert_eq!(tables.order_lines.len(), 1);
        assert_eq!(tables.order_lines[0].quantity, 6);
        assert_eq!(tables.order_lines[0].line_total, 15.00);
    }

    #[test]
    fn test_ragged_lists_excluded() {
        let (tables, report) = clean_tsv(
            "Jane Doe\tEurope\t20210105\tWidget;Gadget\tTools\t2.50;10.00\t4;1\t10.00;10.00\n",
        );
        assert!(tables.order_lines.is_empty());
        assert_eq!(report.excluded.len(), 1);
        assert!(report.excluded[0].reason.contains("ragged"));
    }

    #[test]
    fn test_referential_integrity_of_cleaned_frames() {
        let (tables, _) = clean_tsv(
            "Jane Doe\tEurope\t20210105\tWidget;Gadget\tTools;Tools\t2.50;10.00\t4;1\t10.00;10.00\n\
             Bob Roe\tAsia\t20210106\tGadget\tTools\t10.00\t2\t20.00\n\
             Ann Poe\tEurope\t20210107\tSprocket\tParts\t5.00\t1\t5.00\n",
        );
        for line in &tables.order_lines {
            assert!(tables.orders.iter().any(|o| o.order_id == line.order_id));
            assert!(
                tables
                    .products
                    .iter()
                    .any(|p| p.product_id == line.product_id)
            );
        }
        for order in &tables.orders {
            assert!(
                tables
                    .customers
                    .iter()
                    .any(|c| c.customer_id == order.customer_id)
            );
        }
        for customer in &tables.customers {
            assert!(
                tables
                    .regions
                    .iter()
                    .any(|r| r.region_id == customer.region_id)
            );
        }
    }

    #[test]
    fn test_region_revenue_fixture() {
        // 3 regions, 5 orders; per-region revenue must sum to the grand total
        let (tables, report) = clean_tsv(
            "Jane Doe\tEurope\t20210105\tWidget\tTools\t2.50\t4\t10.00\n\
             Bob Roe\tAsia\t20210106\tGadget\tTools\t10.00\t2\t20.00\n\
             Ann Poe\tAmericas\t20210107\tSprocket\tParts\t5.00\t6\t30.00\n\
             Jane Doe\tEurope\t20210208\tGadget\tTools\t10.00\t4\t40.00\n\
             Bob Roe\tAsia\t20210309\tWidget\tTools\t2.50\t20\t50.00\n",
        );
        assert!(report.excluded.is_empty());
        assert_eq!(tables.regions.len(), 3);
        assert_eq!(tables.orders.len(), 5);

        let mut by_region: HashMap<u32, f64> = HashMap::new();
        for line in &tables.order_lines {
            let order = &tables.orders[(line.order_id - 1) as usize];
            let customer = &tables.customers[(order.customer_id - 1) as usize];
            *by_region.entry(customer.region_id).or_default() += line.line_total;
        }

        assert_eq!(by_region.len(), 3);
        let europe = tables.regions.iter().find(|r| r.name == "Europe").unwrap();
        assert_eq!(by_region[&europe.region_id], 50.0);
        let grand_total: f64 = by_region.values().sum();
        assert_eq!(grand_total, 150.0);
    }
}
