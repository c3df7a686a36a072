//! # Pressroom Shared
//!
//! Wire types for the HTTP API. Kept free of domain and server
//! dependencies so clients can depend on this crate alone.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse};
