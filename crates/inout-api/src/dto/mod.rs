//! Data Transfer Objects (DTOs) for API requests and responses

pub mod admin;
pub mod common;
pub mod dashboard;
pub mod history;
pub mod integration;
pub mod session;

pub use admin::*;
pub use common::*;
pub use dashboard::*;
pub use history::*;
pub use integration::*;
pub use session::*;
