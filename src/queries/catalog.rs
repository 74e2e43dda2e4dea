//! The fixed library of analytical queries. Each entry declares its
//! parameters and output columns so the UI and the tests can enumerate
//! and invoke queries uniformly instead of hard-coding each one.

use serde::Serialize;

/// A single named parameter a catalog query expects, in positional order.
#[derive(Debug, Clone, Serialize)]
pub struct ParamDef {
    pub name: &'static str,
    pub description: &'static str,
}

/// One catalog entry: a stable name, a parameterized read-only SQL
/// statement, and the column shape it produces.
#[derive(Debug, Clone, Serialize)]
pub struct QueryDef {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamDef],
    #[serde(skip)]
    pub sql: &'static str,
    pub columns: &'static [&'static str],
}

const CUSTOMER_PARAM: &[ParamDef] = &[ParamDef {
    name: "customer_name",
    description: "Full customer name, e.g. 'Jane Doe'",
}];

pub static CATALOG: &[QueryDef] = &[
    QueryDef {
        name: "ex1",
        description: "Order history for one customer: every purchased line with date, price and total",
        params: CUSTOMER_PARAM,
        sql: "
            SELECT c.name AS customer,
                   p.name AS product,
                   o.order_date,
                   p.unit_price,
                   l.quantity,
                   ROUND(l.line_total::numeric, 2)::float8 AS total
            FROM order_line l
            JOIN orders o ON l.order_id = o.order_id
            JOIN customer c ON o.customer_id = c.customer_id
            JOIN product p ON l.product_id = p.product_id
            WHERE c.name = $1
            ORDER BY o.order_date, p.name
        ",
        columns: &["customer", "product", "order_date", "unit_price", "quantity", "total"],
    },
    QueryDef {
        name: "ex2",
        description: "Total revenue from one customer across all their orders",
        params: CUSTOMER_PARAM,
        sql: "
            SELECT c.name AS customer,
                   ROUND(SUM(l.line_total)::numeric, 2)::float8 AS total
            FROM order_line l
            JOIN orders o ON l.order_id = o.order_id
            JOIN customer c ON o.customer_id = c.customer_id
            WHERE c.name = $1
            GROUP BY c.customer_id, c.name
        ",
        columns: &["customer", "total"],
    },
    QueryDef {
        name: "ex3",
        description: "All customers ranked by total spend, highest first",
        params: &[],
        sql: "
            SELECT c.name AS customer,
                   ROUND(SUM(l.line_total)::numeric, 2)::float8 AS total
            FROM order_line l
            JOIN orders o ON l.order_id = o.order_id
            JOIN customer c ON o.customer_id = c.customer_id
            GROUP BY c.customer_id, c.name
            ORDER BY total DESC
        ",
        columns: &["customer", "total"],
    },
    QueryDef {
        name: "ex4",
        description: "Revenue per region, highest first",
        params: &[],
        sql: "
            SELECT r.name AS region,
                   ROUND(SUM(l.line_total)::numeric, 2)::float8 AS total
            FROM order_line l
            JOIN orders o ON l.order_id = o.order_id
            JOIN customer c ON o.customer_id = c.customer_id
            JOIN region r ON c.region_id = r.region_id
            GROUP BY r.region_id, r.name
            ORDER BY total DESC
        ",
        columns: &["region", "total"],
    },
    QueryDef {
        name: "ex5",
        description: "Revenue per product category, highest first",
        params: &[],
        sql: "
            SELECT p.category,
                   ROUND(SUM(l.line_total)::numeric, 2)::float8 AS total
            FROM order_line l
            JOIN product p ON l.product_id = p.product_id
            GROUP BY p.category
            ORDER BY total DESC
        ",
        columns: &["category", "total"],
    },
    QueryDef {
        name: "ex6",
        description: "Products ranked by revenue within their category",
        params: &[],
        sql: "
            SELECT p.category,
                   p.name AS product,
                   ROUND(SUM(l.line_total)::numeric, 2)::float8 AS total,
                   RANK() OVER (
                       PARTITION BY p.category
                       ORDER BY SUM(l.line_total) DESC
                   )::int AS category_rank
            FROM order_line l
            JOIN product p ON l.product_id = p.product_id
            GROUP BY p.category, p.product_id, p.name
            ORDER BY p.category ASC, category_rank ASC
        ",
        columns: &["category", "product", "total", "category_rank"],
    },
    QueryDef {
        name: "ex7",
        description: "Best-selling product in each region (rank 1 only)",
        params: &[],
        sql: "
            WITH ranked_products AS (
                SELECT r.name AS region,
                       p.name AS product,
                       ROUND(SUM(l.line_total)::numeric, 2)::float8 AS total,
                       RANK() OVER (
                           PARTITION BY r.region_id
                           ORDER BY SUM(l.line_total) DESC
                       )::int AS regional_rank
                FROM order_line l
                JOIN orders o ON l.order_id = o.order_id
                JOIN customer c ON o.customer_id = c.customer_id
                JOIN region r ON c.region_id = r.region_id
                JOIN product p ON l.product_id = p.product_id
                GROUP BY r.region_id, r.name, p.product_id, p.name
            )
            SELECT region, product, total, regional_rank
            FROM ranked_products
            WHERE regional_rank = 1
            ORDER BY region ASC, product ASC
        ",
        columns: &["region", "product", "total", "regional_rank"],
    },
    QueryDef {
        name: "ex8",
        description: "Quarterly revenue per customer",
        params: &[],
        sql: "
            SELECT 'Q' || EXTRACT(QUARTER FROM o.order_date)::int AS quarter,
                   EXTRACT(YEAR FROM o.order_date)::int AS year,
                   c.name AS customer,
                   ROUND(SUM(l.line_total)::numeric, 2)::float8 AS total
            FROM order_line l
            JOIN orders o ON l.order_id = o.order_id
            JOIN customer c ON o.customer_id = c.customer_id
            GROUP BY quarter, year, c.customer_id, c.name
            ORDER BY year, quarter, c.name
        ",
        columns: &["quarter", "year", "customer", "total"],
    },
    QueryDef {
        name: "ex9",
        description: "Top 5 customers by revenue in each quarter",
        params: &[],
        sql: "
            WITH quarterly_sales AS (
                SELECT 'Q' || EXTRACT(QUARTER FROM o.order_date)::int AS quarter,
                       EXTRACT(YEAR FROM o.order_date)::int AS year,
                       c.name AS customer,
                       ROUND(SUM(l.line_total)::numeric, 2)::float8 AS total
                FROM order_line l
                JOIN orders o ON l.order_id = o.order_id
                JOIN customer c ON o.customer_id = c.customer_id
                GROUP BY quarter, year, c.customer_id, c.name
            ),
            ranked_sales AS (
                SELECT quarter, year, customer, total,
                       RANK() OVER (
                           PARTITION BY year, quarter
                           ORDER BY total DESC
                       )::int AS customer_rank
                FROM quarterly_sales
            )
            SELECT quarter, year, customer, total, customer_rank
            FROM ranked_sales
            WHERE customer_rank <= 5
            ORDER BY year, quarter, total DESC
        ",
        columns: &["quarter", "year", "customer", "total", "customer_rank"],
    },
    QueryDef {
        name: "ex10",
        description: "Calendar months ranked by total revenue across all years",
        params: &[],
        sql: "
            WITH monthly_totals AS (
                SELECT EXTRACT(MONTH FROM o.order_date)::int AS month_num,
                       ROUND(SUM(l.line_total)::numeric, 2)::float8 AS total
                FROM order_line l
                JOIN orders o ON l.order_id = o.order_id
                GROUP BY month_num
            )
            SELECT TO_CHAR(TO_DATE(month_num::text, 'MM'), 'FMMonth') AS month,
                   total,
                   RANK() OVER (ORDER BY total DESC)::int AS total_rank
            FROM monthly_totals
            ORDER BY total_rank
        ",
        columns: &["month", "total", "total_rank"],
    },
    QueryDef {
        name: "ex11",
        description: "Longest gap in days between consecutive orders for each customer",
        params: &[],
        sql: "
            WITH lagged AS (
                SELECT c.customer_id,
                       c.name AS customer,
                       r.name AS region,
                       o.order_date,
                       LAG(o.order_date) OVER (
                           PARTITION BY c.customer_id
                           ORDER BY o.order_date
                       ) AS previous_order_date
                FROM orders o
                JOIN customer c ON o.customer_id = c.customer_id
                JOIN region r ON c.region_id = r.region_id
            ),
            gaps AS (
                SELECT *,
                       (order_date - previous_order_date) AS days_between
                FROM lagged
                WHERE previous_order_date IS NOT NULL
            ),
            ranked_gaps AS (
                SELECT *,
                       ROW_NUMBER() OVER (
                           PARTITION BY customer_id
                           ORDER BY days_between DESC, order_date ASC
                       ) AS rn
                FROM gaps
            )
            SELECT customer, region, order_date, previous_order_date,
                   days_between AS max_days_without_order
            FROM ranked_gaps
            WHERE rn = 1
            ORDER BY max_days_without_order DESC, customer ASC
        ",
        columns: &["customer", "region", "order_date", "previous_order_date", "max_days_without_order"],
    },
];

/// All catalog entries in their stable order.
pub fn catalog() -> &'static [QueryDef] {
    CATALOG
}

/// Look up a catalog entry by name.
pub fn find(name: &str) -> Option<&'static QueryDef> {
    CATALOG.iter().find(|q| q.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_eleven_queries_in_order() {
        assert_eq!(CATALOG.len(), 11);
        for (i, def) in CATALOG.iter().enumerate() {
            assert_eq!(def.name, format!("ex{}", i + 1));
        }
    }

    #[test]
    fn test_find_known_and_unknown() {
        assert!(find("ex4").is_some());
        assert!(find("ex12").is_none());
        assert!(find("").is_none());
    }

    #[test]
    fn test_region_revenue_shape() {
        let def = find("ex4").unwrap();
        assert_eq!(def.columns, &["region", "total"]);
        assert!(def.params.is_empty());
    }

    #[test]
    fn test_customer_queries_take_one_param() {
        assert_eq!(find("ex1").unwrap().params.len(), 1);
        assert_eq!(find("ex2").unwrap().params.len(), 1);
        for name in ["ex3", "ex5", "ex6", "ex7", "ex8", "ex9", "ex10", "ex11"] {
            assert!(find(name).unwrap().params.is_empty());
        }
    }

    #[test]
    fn test_all_queries_are_read_only() {
        for def in CATALOG {
            let sql = def.sql.trim_start().to_lowercase();
            assert!(
                sql.starts_with("select") || sql.starts_with("with"),
                "{} must be a read-only statement",
                def.name
            );
        }
    }
}
