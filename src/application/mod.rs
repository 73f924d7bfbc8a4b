// Application layer - Use cases and the seams adapters plug into
pub mod archive_service;
pub mod clock;
pub mod dashboard;
pub mod health_classifier;
pub mod line_decoder;
pub mod line_source;
pub mod schema_registry;
pub mod session;
pub mod statistics;
pub mod trend_store;
