//! Inout Metrics External Project Client
//!
//! REST access to the user's backend-as-a-service project (a PostgREST
//! endpoint under `/rest/v1`). A client is built per integration through
//! [`RestClientFactory`]; nothing here holds a process-wide connection.
//!
//! - Paged reads of the lead table filtered by creation time
//! - Chat history and agent settings reads and updates
//! - Connection probe and table discovery

pub mod client;
pub mod error;
mod project;

pub use client::{RestClient, RestClientFactory};
pub use error::RestError;
