//! Zhihu Daily client library
//!
//! A cache-augmented API layer: an [`Operation`] resolves to an endpoint, is
//! served from a time-expiring cache or the network, and decodes into either
//! a JSON object or typed models.

pub mod api;
pub mod cache;
pub mod cli;
pub mod client;
pub mod decode;
pub mod deferred;
pub mod error;
pub mod models;
pub mod transport;

pub use api::{describe, Endpoint, Operation};
pub use client::{ApiClient, ClientConfig};
pub use deferred::Deferred;
pub use error::ApiError;
