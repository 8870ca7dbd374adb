pub mod api;
pub mod charts;
pub mod config;
pub mod loader;
pub mod pipeline;
pub mod processing;
pub mod report;
pub mod table;
