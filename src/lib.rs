pub mod ai_client;
pub mod coerce;
pub mod columns;
pub mod config;
pub mod db;
pub mod export;
pub mod http_client;
pub mod importer;
pub mod model;
pub mod queries;
pub mod report;
pub mod sheet;
