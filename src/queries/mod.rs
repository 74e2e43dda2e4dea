pub mod catalog;
pub mod runner;

pub use catalog::{CATALOG, ParamDef, QueryDef, catalog, find};
pub use runner::run;
