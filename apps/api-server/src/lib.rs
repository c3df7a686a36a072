//! # Pressroom API Server
//!
//! HTTP surface over the Pressroom services. Built as a library as well as
//! a binary so the integration tests drive the exact routes `main` serves.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod state;
pub mod telemetry;
