#![doc = "The `taskboard` library crate."]
#![doc = ""]
#![doc = "This crate contains the services, domain models, store backends, routing"]
#![doc = "configuration and error handling for the Taskboard API. The binary (`main.rs`)"]
#![doc = "loads configuration, connects to MongoDB and serves the routes."]

pub mod auth;
pub mod config;
pub mod drafting;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod tasks;

pub use error::AppError;
pub use state::AppState;
