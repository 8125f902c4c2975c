//! Anomaly detection over resolved records.

pub mod checker;
pub mod fingerprint;

pub use checker::AnomalyChecker;
pub use fingerprint::{Fingerprint, FingerprintEntry, FingerprintIndex, InMemoryFingerprintIndex};
