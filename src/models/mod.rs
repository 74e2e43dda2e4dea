pub mod sales_models;

pub use sales_models::*;
