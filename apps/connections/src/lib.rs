pub mod config;
pub mod db;
pub mod errors;
pub mod fetcher;
pub mod loader;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod telemetry;
