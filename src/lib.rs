#![doc = "The `taskdesk` library crate."]
#![doc = ""]
#![doc = "Password and token authentication plus per-user task management over a"]
#![doc = "JSON HTTP API. The binary (`main.rs`) wires the Postgres stores and runs"]
#![doc = "the server; tests wire the in-memory stores instead."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod response;
pub mod routes;
pub mod state;
pub mod store;

pub use crate::config::Config;
pub use crate::error::AppError;
pub use crate::state::AppState;
