//! Natural-language summary of a checked record.

use crate::error::SummaryError;
use crate::models::anomaly::Anomaly;
use crate::models::record::FinancialRecord;

/// Trait for summarizer backends (typically a language model).
pub trait Summarizer: Send + Sync {
    fn summarize(
        &self,
        record: &FinancialRecord,
        anomalies: &[Anomaly],
    ) -> std::result::Result<String, SummaryError>;
}

/// Deterministic one-line summary, also used when a backend fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateSummarizer;

impl TemplateSummarizer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, record: &FinancialRecord, anomalies: &[Anomaly]) -> String {
        let vendor = record.vendor.as_deref().unwrap_or("Unknown vendor");
        let total = record
            .total
            .map(|t| t.to_string())
            .unwrap_or_else(|| "N/A".to_string());

        let mut summary = format!(
            "Invoice/expense from {} with total {} {}.",
            vendor, total, record.currency
        );
        if !anomalies.is_empty() {
            summary.push_str(" Potential issues were detected; please review the anomaly list.");
        }
        summary
    }
}

impl Summarizer for TemplateSummarizer {
    fn summarize(
        &self,
        record: &FinancialRecord,
        anomalies: &[Anomaly],
    ) -> std::result::Result<String, SummaryError> {
        Ok(self.render(record, anomalies))
    }
}
