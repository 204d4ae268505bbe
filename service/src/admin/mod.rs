//! Promo dashboard backend: settings, platform accounts, and the
//! scheduled-post queue.
//!
//! Everything here is storage for the dashboard and the external posting
//! cron. This service never talks to the social platforms itself.

pub mod http;
pub mod repo;
