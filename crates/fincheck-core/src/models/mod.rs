//! Data models shared by the extraction and anomaly stages.

pub mod anomaly;
pub mod config;
pub mod record;
pub mod token;
