pub mod auth;
pub mod config;
pub mod context;
pub mod telemetry;
pub mod time;
