// Presentation layer - CLI, console dashboard and archive reports
pub mod archive_report;
pub mod cli;
pub mod console;
