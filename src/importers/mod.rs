//! Backup importers turning exported archives into chat logs.

pub mod config;
pub mod facebook;

pub use config::ImportConfig;
pub use facebook::{FacebookMessage, parse_backup, parse_facebook_time};
