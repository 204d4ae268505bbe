//! Member and fan audience records
//!
//! Members are the club's signed-up users, upserted by phone or email. Fans
//! are the wider marketing audience with consent and UTM attribution, bucketed
//! `core` or `probation`. Both live in Postgres only; the endpoints refuse to
//! run memory-only.

pub mod http;
pub mod repo;
