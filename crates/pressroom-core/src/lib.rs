//! # Pressroom Core
//!
//! The domain layer of the publishing backend: post lifecycle, reaction
//! ledger, authorization gate and the services that tie them to the ports.
//! This crate has no infrastructure dependencies.

pub mod access;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use access::{Actor, Operation, Role};
pub use error::{DomainError, RepoError};
