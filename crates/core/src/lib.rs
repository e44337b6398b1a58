//! `gatehouse-core`: shared domain primitives.
//!
//! This crate holds the error taxonomy and typed identifiers; it has no
//! transport or storage concerns.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult, ErrorCode};
pub use id::{ResourceId, UserId};
