pub mod app_config;

pub use app_config::{AppConfig, AssistantSection, DatabaseSection, ServerSection};
