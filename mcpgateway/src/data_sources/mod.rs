//! Data source implementations

pub mod data_source_health;
pub mod data_source_object;

pub use data_source_health::HealthDataSource;
pub use data_source_object::ObjectDataSource;
