//! Common test utilities for integration tests.
//!
//! [`app_builder::TestAppBuilder`] assembles an Axum router with the same
//! wiring and layer ordering as `main.rs`, but with the mock SMS sender, an
//! in-memory code store, and no database unless one is injected.
//!
//! ```ignore
//! use common::app_builder::TestAppBuilder;
//!
//! #[tokio::test]
//! async fn test_with_full_app() {
//!     let app = TestAppBuilder::new().build();
//!     // Use app.oneshot(...) to send requests
//! }
//! ```

pub mod app_builder;
