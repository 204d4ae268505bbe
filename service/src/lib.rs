#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::print_stdout,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]

pub mod admin;
pub mod auth;
pub mod config;
pub mod db;
pub mod http;
pub mod members;
pub mod sms;
pub mod verification;
