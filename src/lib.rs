pub mod analyzers;
pub mod checks;
pub mod coerce;
pub mod config;
pub mod fetch;
pub mod output;
pub mod render;
pub mod report;
pub mod schema;
pub mod table;
