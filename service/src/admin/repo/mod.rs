//! Repository layer for the admin dashboard tables.

pub mod accounts;
pub mod posts;
pub mod settings;
