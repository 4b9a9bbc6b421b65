//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`]: domain-level errors
//! - [`id`]: locally generated identifiers

pub mod error;
pub mod id;
