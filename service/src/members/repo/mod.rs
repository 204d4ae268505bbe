//! Postgres repositories for members and fans.

pub mod fans;
pub mod members;
