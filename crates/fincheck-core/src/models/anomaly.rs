//! Anomalies reported by the anomaly checker.

use serde::{Deserialize, Serialize};

/// Anomaly code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyCode {
    MissingField,
    TotalMismatch,
    NegativeAmount,
    MalformedDate,
    DuplicateSuspected,
    LineItemMismatch,
    FutureDate,
    DuplicateLineItem,
    NoLineItems,
    UnusualTaxRate,
}

/// Anomaly severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A data-quality problem found in a resolved record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anomaly {
    pub code: AnomalyCode,

    /// Record field the anomaly concerns, if any.
    pub field: Option<String>,

    /// Human-readable explanation.
    pub detail: String,

    pub severity: Severity,
}

impl Anomaly {
    pub fn new(code: AnomalyCode, severity: Severity, detail: impl Into<String>) -> Self {
        Self {
            code,
            field: None,
            detail: detail.into(),
            severity,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}
