// Infrastructure layer - External dependencies and adapters
pub mod archive;
pub mod config;
pub mod line_reader;
pub mod output;
