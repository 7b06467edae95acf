pub mod app;
pub mod config;
pub mod environment;
pub mod group;
pub mod handler;
pub mod middleware;
pub mod server;
pub mod test_client;

pub use forerun_core::{body, error, request, response};

