//! HTTP API for producing GeoTIFFs

pub mod config;
pub mod handlers;
pub mod models;
pub mod routes;

pub use config::ServerConfig;
pub use routes::create_router;
