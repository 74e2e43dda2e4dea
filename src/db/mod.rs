pub mod postgres;
pub mod rows;
pub mod schema;

pub use postgres::{Database, Overview, PostgresConfig, ReadOnlySql};
pub use rows::{QueryOutput, rows_to_output};
