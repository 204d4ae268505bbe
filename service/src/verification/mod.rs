//! Phone verification flow
//!
//! Issues one-time SMS codes and exchanges them for session tokens. State is
//! held in a pluggable [`store::CodeStore`] with an optional Postgres mirror.

pub mod http;
pub mod limits;
pub mod repo;
pub mod service;
pub mod store;

pub use service::VerificationService;
