//! SMS dispatch.
//!
//! A trait-based client for the outbound side of verification. The trait
//! abstraction enables:
//!
//! - Easy mocking in unit tests
//! - HTTP-level testing with a local mock server in integration tests
//! - Swapping providers without touching the verification flow
//!
//! [`TwilioSender`] is the production implementation. Demo mode never
//! reaches a sender at all; the verification service short-circuits first.

use async_trait::async_trait;
use thiserror::Error;

mod twilio;
pub use twilio::TwilioSender;

/// Errors from dispatching an SMS.
#[derive(Debug, Error)]
pub enum SmsError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Provider returned an error response
    #[error("SMS API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// Trait for SMS delivery.
///
/// Use [`TwilioSender`] for real delivery, or `mock::MockSmsSender` in
/// tests.
#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Deliver one text message to an E.164 recipient.
    async fn send(&self, to: &str, body: &str) -> Result<(), SmsError>;
}

#[cfg(any(test, feature = "test-utils"))]
#[allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::missing_const_for_fn,
    clippy::must_use_candidate
)]
pub mod mock {
    //! Mock implementation for unit testing.

    use super::{SmsError, SmsSender};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// One recorded `send` call.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SentMessage {
        pub to: String,
        pub body: String,
    }

    /// Mock implementation of [`SmsSender`] for unit tests.
    ///
    /// Delivery succeeds unless a result is scripted with
    /// `set_send_result`; every call is recorded for assertions.
    pub struct MockSmsSender {
        send_result: Mutex<Option<Result<(), SmsError>>>,
        calls: Mutex<Vec<SentMessage>>,
    }

    impl MockSmsSender {
        pub fn new() -> Self {
            Self {
                send_result: Mutex::new(None),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Set the result for the next `send` call.
        pub fn set_send_result(&self, result: Result<(), SmsError>) {
            *self.send_result.lock().unwrap() = Some(result);
        }

        /// All messages passed to `send`, in order.
        pub fn calls(&self) -> Vec<SentMessage> {
            self.calls.lock().unwrap().clone()
        }

        /// Number of `send` calls so far.
        pub fn sent_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl Default for MockSmsSender {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl SmsSender for MockSmsSender {
        async fn send(&self, to: &str, body: &str) -> Result<(), SmsError> {
            self.calls.lock().unwrap().push(SentMessage {
                to: to.to_string(),
                body: body.to_string(),
            });

            self.send_result.lock().unwrap().take().unwrap_or(Ok(()))
        }
    }
}
