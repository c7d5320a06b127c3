//! REST API for the CloudCar dealership back office.
//!
//! Handlers stay stateless: every request borrows the shared [`Store`]
//! connection, runs one service call and maps the outcome to JSON.

pub mod config;
mod error;
mod http;
mod store;

pub use config::ServerConfig;
pub use error::ApiError;
pub use http::build_router;
pub use store::Store;
