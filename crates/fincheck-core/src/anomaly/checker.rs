//! Anomaly checker: integrity rules over a resolved record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::debug;

use super::fingerprint::{FingerprintEntry, FingerprintIndex};
use crate::models::anomaly::{Anomaly, AnomalyCode, Severity};
use crate::models::config::AnomalyConfig;
use crate::models::record::{FinancialRecord, MonetaryField};

const MONETARY_FIELDS: [MonetaryField; 3] = [
    MonetaryField::Subtotal,
    MonetaryField::Tax,
    MonetaryField::Total,
];

/// Evaluates a record against completeness, arithmetic and duplicate rules.
///
/// Rules run in a fixed order so identical input yields identically ordered
/// output. Every checked record is indexed exactly once, duplicate or not.
#[derive(Debug, Clone, Default)]
pub struct AnomalyChecker {
    config: AnomalyConfig,
}

impl AnomalyChecker {
    pub fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    /// Check a record, indexing it as seen now.
    pub fn check(&self, record: &FinancialRecord, index: &dyn FingerprintIndex) -> Vec<Anomaly> {
        self.check_at(record, index, Utc::now())
    }

    /// Check a record, indexing it as seen at `now`.
    pub fn check_at(
        &self,
        record: &FinancialRecord,
        index: &dyn FingerprintIndex,
        now: DateTime<Utc>,
    ) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();

        self.check_missing(record, &mut anomalies);
        self.check_total(record, &mut anomalies);
        self.check_negative(record, &mut anomalies);
        self.check_malformed_date(record, &mut anomalies);
        self.check_duplicate(record, index, now, &mut anomalies);

        if self.config.extended_rules {
            self.check_line_item_sum(record, &mut anomalies);
            self.check_future_date(record, now, &mut anomalies);
            self.check_duplicate_line_items(record, &mut anomalies);
            self.check_no_line_items(record, &mut anomalies);
            self.check_tax_rate(record, &mut anomalies);
        }

        debug!("Checked record: {} anomalies", anomalies.len());
        anomalies
    }

    fn check_missing(&self, record: &FinancialRecord, anomalies: &mut Vec<Anomaly>) {
        let fields = [
            ("vendor", record.vendor.is_none(), Severity::Medium),
            ("invoice_number", record.invoice_number.is_none(), Severity::Low),
            ("date", record.date.is_none(), Severity::Medium),
            ("total", record.total.is_none(), Severity::Medium),
        ];
        for (field, missing, severity) in fields {
            if missing {
                anomalies.push(
                    Anomaly::new(
                        AnomalyCode::MissingField,
                        severity,
                        format!("{} is missing", field),
                    )
                    .with_field(field),
                );
            }
        }
    }

    fn check_total(&self, record: &FinancialRecord, anomalies: &mut Vec<Anomaly>) {
        let (Some(total), Some(subtotal), Some(tax)) = (record.total, record.subtotal, record.tax)
        else {
            return;
        };

        let Some((expected, difference)) = subtotal
            .checked_add(tax)
            .and_then(|expected| Some((expected, total.checked_sub(expected)?.abs())))
        else {
            debug!("Subtotal + tax out of range, total check skipped");
            return;
        };
        if difference <= self.config.total_tolerance {
            return;
        }

        let origin = |field| {
            if record.is_derived(field) {
                "derived"
            } else {
                "stated"
            }
        };
        anomalies.push(
            Anomaly::new(
                AnomalyCode::TotalMismatch,
                Severity::High,
                format!(
                    "{} total {} does not match subtotal + tax {} ({} subtotal {} + tax {}), difference {}",
                    origin(MonetaryField::Total),
                    total,
                    expected,
                    origin(MonetaryField::Subtotal),
                    subtotal,
                    tax,
                    difference
                ),
            )
            .with_field("total"),
        );
    }

    fn check_negative(&self, record: &FinancialRecord, anomalies: &mut Vec<Anomaly>) {
        for field in MONETARY_FIELDS {
            if let Some(value) = record.amount(field) {
                if value.is_sign_negative() && !value.is_zero() {
                    anomalies.push(
                        Anomaly::new(
                            AnomalyCode::NegativeAmount,
                            Severity::High,
                            format!("{} is negative: {}", field.as_str(), value),
                        )
                        .with_field(field.as_str()),
                    );
                }
            }
        }

        for (i, item) in record.line_items.iter().enumerate() {
            if item.amount.is_sign_negative() && !item.amount.is_zero() {
                anomalies.push(
                    Anomaly::new(
                        AnomalyCode::NegativeAmount,
                        Severity::High,
                        format!("line item '{}' is negative: {}", item.description, item.amount),
                    )
                    .with_field(format!("line_items[{}]", i)),
                );
            }
        }
    }

    fn check_malformed_date(&self, record: &FinancialRecord, anomalies: &mut Vec<Anomaly>) {
        if let Some(raw) = &record.provenance.malformed_date {
            anomalies.push(
                Anomaly::new(
                    AnomalyCode::MalformedDate,
                    Severity::Medium,
                    format!("'{}' is not a valid calendar date", raw),
                )
                .with_field("date"),
            );
        }
    }

    fn check_duplicate(
        &self,
        record: &FinancialRecord,
        index: &dyn FingerprintIndex,
        now: DateTime<Utc>,
        anomalies: &mut Vec<Anomaly>,
    ) {
        let entry = FingerprintEntry::new(record, now);
        let fingerprint = entry.fingerprint;

        if let Some(prior) = index.observe(entry) {
            debug!("Fingerprint {} seen before", fingerprint);
            anomalies.push(Anomaly::new(
                AnomalyCode::DuplicateSuspected,
                Severity::High,
                format!(
                    "same vendor, date and total as a document seen at {}",
                    prior.seen_at.to_rfc3339()
                ),
            ));
        }
    }

    fn check_line_item_sum(&self, record: &FinancialRecord, anomalies: &mut Vec<Anomaly>) {
        if record.line_items.is_empty() {
            return;
        }
        let reference = [MonetaryField::Subtotal, MonetaryField::Total]
            .into_iter()
            .find(|field| record.is_stated(*field))
            .and_then(|field| record.amount(field).map(|value| (field, value)));
        let Some((field, expected)) = reference else {
            return;
        };

        let Some(sum) = record.line_item_sum() else {
            return;
        };
        let Some(difference) = sum.checked_sub(expected).map(|d| d.abs()) else {
            return;
        };
        let tolerance = sum
            .abs()
            .checked_mul(self.config.line_item_tolerance_ratio)
            .unwrap_or(Decimal::MAX)
            .max(self.config.line_item_tolerance_floor);

        if difference > tolerance {
            anomalies.push(
                Anomaly::new(
                    AnomalyCode::LineItemMismatch,
                    Severity::High,
                    format!(
                        "line items sum to {} but {} is {}",
                        sum,
                        field.as_str(),
                        expected
                    ),
                )
                .with_field("line_items"),
            );
        }
    }

    fn check_future_date(
        &self,
        record: &FinancialRecord,
        now: DateTime<Utc>,
        anomalies: &mut Vec<Anomaly>,
    ) {
        let Some(date) = record.date else { return };
        if date > now.date_naive() {
            anomalies.push(
                Anomaly::new(
                    AnomalyCode::FutureDate,
                    Severity::Medium,
                    format!("date {} is in the future", date),
                )
                .with_field("date"),
            );
        }
    }

    fn check_duplicate_line_items(&self, record: &FinancialRecord, anomalies: &mut Vec<Anomaly>) {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();

        for item in &record.line_items {
            let key = (item.description.to_lowercase(), item.amount.normalize());
            if !seen.insert(key.clone()) && reported.insert(key) {
                anomalies.push(
                    Anomaly::new(
                        AnomalyCode::DuplicateLineItem,
                        Severity::High,
                        format!("line item '{}' ({}) appears more than once", item.description, item.amount),
                    )
                    .with_field("line_items"),
                );
            }
        }
    }

    fn check_no_line_items(&self, record: &FinancialRecord, anomalies: &mut Vec<Anomaly>) {
        if let Some(total) = record.total {
            if !total.is_zero() && record.line_items.is_empty() {
                anomalies.push(
                    Anomaly::new(
                        AnomalyCode::NoLineItems,
                        Severity::Medium,
                        format!("total {} present but no line items found", total),
                    )
                    .with_field("line_items"),
                );
            }
        }
    }

    fn check_tax_rate(&self, record: &FinancialRecord, anomalies: &mut Vec<Anomaly>) {
        let (Some(subtotal), Some(tax)) = (record.subtotal, record.tax) else {
            return;
        };
        if subtotal <= Decimal::ZERO {
            return;
        }

        let Some(rate) = tax
            .checked_div(subtotal)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .map(|rate| rate.round_dp(2))
        else {
            return;
        };
        if rate < Decimal::ZERO || rate > self.config.max_tax_rate_percent {
            anomalies.push(
                Anomaly::new(
                    AnomalyCode::UnusualTaxRate,
                    Severity::Low,
                    format!("tax is {}% of subtotal", rate),
                )
                .with_field("tax"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::fingerprint::InMemoryFingerprintIndex;
    use crate::models::record::LineItem;
    use chrono::{NaiveDate, TimeZone};
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn clean_record() -> FinancialRecord {
        let mut record = FinancialRecord::empty("USD");
        record.vendor = Some("Acme Corp".to_string());
        record.invoice_number = Some("INV-1".to_string());
        record.date = NaiveDate::from_ymd_opt(2025, 2, 3);
        record.subtotal = Some(dec("100.00"));
        record.tax = Some(dec("10.00"));
        record.total = Some(dec("110.00"));
        record
    }

    fn codes(anomalies: &[Anomaly]) -> Vec<AnomalyCode> {
        anomalies.iter().map(|a| a.code).collect()
    }

    fn extended() -> AnomalyChecker {
        AnomalyChecker::new(AnomalyConfig {
            extended_rules: true,
            ..AnomalyConfig::default()
        })
    }

    #[test]
    fn test_clean_record_has_no_anomalies() {
        let index = InMemoryFingerprintIndex::new();
        let anomalies = AnomalyChecker::default().check_at(&clean_record(), &index, now());
        assert_eq!(anomalies, vec![]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_missing_fields_in_order() {
        let index = InMemoryFingerprintIndex::new();
        let record = FinancialRecord::empty("USD");
        let anomalies = AnomalyChecker::default().check_at(&record, &index, now());

        let fields: Vec<(Option<&str>, Severity)> = anomalies
            .iter()
            .map(|a| (a.field.as_deref(), a.severity))
            .collect();
        assert_eq!(
            fields,
            vec![
                (Some("vendor"), Severity::Medium),
                (Some("invoice_number"), Severity::Low),
                (Some("date"), Severity::Medium),
                (Some("total"), Severity::Medium),
            ]
        );
    }

    #[test]
    fn test_total_mismatch_beyond_tolerance() {
        let index = InMemoryFingerprintIndex::new();
        let checker = AnomalyChecker::default();

        let mut record = clean_record();
        record.total = Some(dec("110.01"));
        assert_eq!(checker.check_at(&record, &index, now()), vec![]);

        record.total = Some(dec("115.00"));
        let anomalies = checker.check_at(&record, &index, now());
        assert_eq!(codes(&anomalies), vec![AnomalyCode::TotalMismatch]);
        assert_eq!(anomalies[0].severity, Severity::High);
        assert!(anomalies[0].detail.contains("115.00"));
        assert!(anomalies[0].detail.contains("110.00"));
        assert!(anomalies[0].detail.starts_with("stated total"));
    }

    #[test]
    fn test_negative_amounts() {
        let index = InMemoryFingerprintIndex::new();
        let mut record = clean_record();
        record.tax = Some(dec("-10.00"));
        record.total = Some(dec("90.00"));
        record.line_items.push(LineItem::new("Refund", dec("-50.00")));

        let anomalies = AnomalyChecker::default().check_at(&record, &index, now());
        let fields: Vec<Option<&str>> = anomalies.iter().map(|a| a.field.as_deref()).collect();
        assert_eq!(codes(&anomalies), vec![AnomalyCode::NegativeAmount; 2]);
        assert_eq!(fields, vec![Some("tax"), Some("line_items[0]")]);
    }

    #[test]
    fn test_malformed_date_alongside_missing_date() {
        let index = InMemoryFingerprintIndex::new();
        let mut record = clean_record();
        record.date = None;
        record.provenance.malformed_date = Some("31/31/2024".to_string());

        let anomalies = AnomalyChecker::default().check_at(&record, &index, now());
        assert_eq!(
            codes(&anomalies),
            vec![AnomalyCode::MissingField, AnomalyCode::MalformedDate]
        );
        assert_eq!(anomalies[1].severity, Severity::Medium);
    }

    #[test]
    fn test_duplicate_reports_prior_timestamp() {
        let index = InMemoryFingerprintIndex::new();
        let checker = AnomalyChecker::default();
        let first = Utc.with_ymd_and_hms(2025, 5, 1, 8, 30, 0).unwrap();

        assert_eq!(checker.check_at(&clean_record(), &index, first), vec![]);
        let anomalies = checker.check_at(&clean_record(), &index, now());

        assert_eq!(codes(&anomalies), vec![AnomalyCode::DuplicateSuspected]);
        assert!(anomalies[0].detail.contains("2025-05-01T08:30:00+00:00"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_extended_rules_are_opt_in() {
        let index = InMemoryFingerprintIndex::new();
        let mut record = clean_record();
        record.date = NaiveDate::from_ymd_opt(2030, 1, 1);

        assert_eq!(AnomalyChecker::default().check_at(&record, &index, now()), vec![]);
    }

    #[test]
    fn test_extended_rules_in_order() {
        let index = InMemoryFingerprintIndex::new();
        let mut record = clean_record();
        record.date = NaiveDate::from_ymd_opt(2030, 1, 1);
        record.tax = Some(dec("60.00"));
        record.total = Some(dec("160.00"));
        record.line_items = vec![
            LineItem::new("Widget", dec("20.00")),
            LineItem::new("widget", dec("20.0")),
        ];

        let anomalies = extended().check_at(&record, &index, now());
        assert_eq!(
            codes(&anomalies),
            vec![
                AnomalyCode::LineItemMismatch,
                AnomalyCode::FutureDate,
                AnomalyCode::DuplicateLineItem,
                AnomalyCode::UnusualTaxRate,
            ]
        );
    }

    #[test]
    fn test_arithmetic_overflow_skips_rules() {
        let index = InMemoryFingerprintIndex::new();
        let mut record = clean_record();
        record.subtotal = Some(Decimal::MAX);
        record.tax = Some(dec("1.00"));
        record.total = Some(dec("1.00"));
        record.line_items = vec![
            LineItem::new("Widget", Decimal::MAX),
            LineItem::new("Gadget", Decimal::MAX),
        ];
        let anomalies = extended().check_at(&record, &index, now());
        assert_eq!(anomalies, vec![]);

        let mut record = clean_record();
        record.subtotal = Some(dec("0.0001"));
        record.tax = Some(Decimal::MAX);
        record.total = Some(Decimal::MIN);
        let anomalies = extended().check_at(&record, &index, now());
        assert_eq!(
            codes(&anomalies),
            vec![AnomalyCode::NegativeAmount, AnomalyCode::NoLineItems]
        );
    }

    #[test]
    fn test_no_line_items_rule() {
        let index = InMemoryFingerprintIndex::new();
        let anomalies = extended().check_at(&clean_record(), &index, now());
        assert_eq!(codes(&anomalies), vec![AnomalyCode::NoLineItems]);
    }

    #[test]
    fn test_line_item_tolerance_floor() {
        let index = InMemoryFingerprintIndex::new();
        let mut record = clean_record();
        record.line_items = vec![
            LineItem::new("Parts", dec("60.00")),
            LineItem::new("Labour", dec("39.50")),
        ];

        let anomalies = extended().check_at(&record, &index, now());
        assert_eq!(anomalies, vec![]);
    }
}
