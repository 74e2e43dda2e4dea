pub mod assistant;
pub mod auth;
pub mod cleaner;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod populator;
pub mod queries;
pub mod server;

pub use error::AppError;
