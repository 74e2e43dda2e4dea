//! SQL statements and schema definitions for the normalized sales
//! database. Centralizing the DDL and upsert statements here keeps the
//! population pipeline free of embedded SQL strings.

/// Load order matters: parents before children.
pub const CREATE_REGION_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS region (
        region_id SERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    );
";

pub const CREATE_PRODUCT_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS product (
        product_id SERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        category TEXT NOT NULL,
        unit_price DOUBLE PRECISION NOT NULL CHECK (unit_price >= 0)
    );
";

pub const CREATE_CUSTOMER_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS customer (
        customer_id SERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        region_id INTEGER NOT NULL REFERENCES region(region_id)
    );
";

pub const CREATE_ORDERS_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS orders (
        order_id SERIAL PRIMARY KEY,
        customer_id INTEGER NOT NULL REFERENCES customer(customer_id),
        order_date DATE NOT NULL,
        UNIQUE (customer_id, order_date)
    );
";

pub const CREATE_ORDER_LINE_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS order_line (
        order_id INTEGER NOT NULL REFERENCES orders(order_id),
        product_id INTEGER NOT NULL REFERENCES product(product_id),
        quantity INTEGER NOT NULL CHECK (quantity >= 0),
        line_total DOUBLE PRECISION NOT NULL CHECK (line_total >= 0),
        PRIMARY KEY (order_id, product_id)
    );
";

/// All schema creation statements in foreign-key dependency order.
pub const ALL_TABLE_CREATION_SQL: &[&str] = &[
    CREATE_REGION_TABLE_SQL,
    CREATE_PRODUCT_TABLE_SQL,
    CREATE_CUSTOMER_TABLE_SQL,
    CREATE_ORDERS_TABLE_SQL,
    CREATE_ORDER_LINE_TABLE_SQL,
];

/// Tables exposed to the UI preview endpoint, in load order.
pub const TABLE_NAMES: &[&str] = &["region", "product", "customer", "orders", "order_line"];

// Upserts match on the natural key; non-key attributes are overwritten
// on conflict (last write wins). RETURNING hands back the live database
// id so children can reference parents that predate this load.

pub const UPSERT_REGION_SQL: &str = "
    INSERT INTO region (name) VALUES ($1)
    ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
    RETURNING region_id
";

pub const UPSERT_PRODUCT_SQL: &str = "
    INSERT INTO product (name, category, unit_price) VALUES ($1, $2, $3)
    ON CONFLICT (name) DO UPDATE
        SET category = EXCLUDED.category, unit_price = EXCLUDED.unit_price
    RETURNING product_id
";

pub const UPSERT_CUSTOMER_SQL: &str = "
    INSERT INTO customer (name, region_id) VALUES ($1, $2)
    ON CONFLICT (name) DO UPDATE SET region_id = EXCLUDED.region_id
    RETURNING customer_id
";

pub const UPSERT_ORDER_SQL: &str = "
    INSERT INTO orders (customer_id, order_date) VALUES ($1, $2)
    ON CONFLICT (customer_id, order_date) DO UPDATE SET order_date = EXCLUDED.order_date
    RETURNING order_id
";

pub const UPSERT_ORDER_LINE_SQL: &str = "
    INSERT INTO order_line (order_id, product_id, quantity, line_total)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (order_id, product_id) DO UPDATE
        SET quantity = EXCLUDED.quantity, line_total = EXCLUDED.line_total
";

/// Schema description sent to the AI service as prompt context.
pub const SCHEMA_CONTEXT: &str = "
Normalized Sales Database (Schema Overview)

region (
    region_id SERIAL PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
)

product (
    product_id SERIAL PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    category TEXT NOT NULL,
    unit_price DOUBLE PRECISION NOT NULL
)

customer (
    customer_id SERIAL PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    region_id INTEGER NOT NULL REFERENCES region(region_id)
)

orders (
    order_id SERIAL PRIMARY KEY,
    customer_id INTEGER NOT NULL REFERENCES customer(customer_id),
    order_date DATE NOT NULL
)

order_line (
    order_id INTEGER NOT NULL REFERENCES orders(order_id),
    product_id INTEGER NOT NULL REFERENCES product(product_id),
    quantity INTEGER NOT NULL,
    line_total DOUBLE PRECISION NOT NULL
)

Notes:
- Revenue for a line is order_line.line_total
- order_date is a PostgreSQL DATE column
- Tables connect: region -> customer -> orders -> order_line -> product
";
