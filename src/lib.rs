pub mod api;
pub mod config;
pub mod db;
pub mod digikey_oauth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod service;
pub mod types;

pub use error::NexusError;
pub use service::{Supplier, Suppliers};
