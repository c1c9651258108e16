//! Azure Resource Graph integration
//!
//! - [`source`] - the [`QuerySource`] trait the export loop pages through
//! - [`client`] - REST implementation of [`QuerySource`]
//! - [`models`] - request/response wire formats

pub mod client;
pub mod models;
pub mod source;

pub use client::ResourceGraphClient;
pub use source::{QueryPage, QueryRequest, QuerySource, Record};
