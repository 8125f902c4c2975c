//! Configuration structures for the extraction and anomaly engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Main configuration for the fincheck engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FincheckConfig {
    /// Tokenizer and resolver configuration.
    pub extraction: ExtractionConfig,

    /// Anomaly checker configuration.
    pub anomaly: AnomalyConfig,

    /// Fingerprint index configuration.
    pub index: IndexConfig,

    /// Summarizer collaborator configuration.
    pub summary: SummaryConfig,
}

/// Order used to read ambiguous numeric dates such as `03/04/2025`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// Use the document currency as a locale hint, else prefer day-first.
    #[default]
    Auto,
    DayFirst,
    MonthFirst,
}

/// Field extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Currency used when none is detected.
    pub default_currency: String,

    /// How ambiguous day/month dates are read.
    pub date_order: DateOrder,

    /// Number of leading non-empty lines searched for an unlabeled vendor name.
    pub vendor_scan_lines: usize,

    /// Tokens below this confidence are discarded.
    pub min_token_confidence: f32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            default_currency: "USD".to_string(),
            date_order: DateOrder::Auto,
            vendor_scan_lines: 5,
            min_token_confidence: 0.0,
        }
    }
}

/// Anomaly checker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Allowed absolute difference between total and subtotal + tax.
    pub total_tolerance: Decimal,

    /// Enable the line item, future date and tax rate rules.
    pub extended_rules: bool,

    /// Relative tolerance for line item sums (fraction of the sum).
    pub line_item_tolerance_ratio: Decimal,

    /// Absolute tolerance floor for line item sums.
    pub line_item_tolerance_floor: Decimal,

    /// Tax rates above this percentage of the subtotal are reported.
    pub max_tax_rate_percent: Decimal,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            total_tolerance: Decimal::new(1, 2),
            extended_rules: false,
            line_item_tolerance_ratio: Decimal::new(1, 2),
            line_item_tolerance_floor: Decimal::ONE,
            max_tax_rate_percent: Decimal::new(50, 0),
        }
    }
}

/// Fingerprint index configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Maximum number of fingerprints kept (unbounded when unset).
    pub capacity: Option<usize>,
}

/// Summarizer collaborator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Retries after a transient summarizer failure.
    pub max_retries: u32,

    /// Fall back to the template summary when the summarizer fails.
    pub fallback_to_template: bool,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            fallback_to_template: true,
        }
    }
}

impl FincheckConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        use crate::error::FincheckError;

        if self.extraction.default_currency.trim().is_empty() {
            return Err(FincheckError::Config(
                "extraction.default_currency must not be empty".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.extraction.min_token_confidence) {
            return Err(FincheckError::Config(format!(
                "extraction.min_token_confidence must be within 0..=1, got {}",
                self.extraction.min_token_confidence
            )));
        }
        if self.anomaly.total_tolerance.is_sign_negative() {
            return Err(FincheckError::Config(
                "anomaly.total_tolerance must not be negative".to_string(),
            ));
        }
        if self.index.capacity == Some(0) {
            return Err(FincheckError::Config(
                "index.capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
