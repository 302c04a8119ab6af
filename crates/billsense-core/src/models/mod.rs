//! Data models: configuration, invoice records and envelopes.

pub mod config;
pub mod invoice;
