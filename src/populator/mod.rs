pub mod pipeline;

pub use pipeline::{PgWriter, PopulationReport, Populator, SalesWriter, SkippedRow, TableReport};
