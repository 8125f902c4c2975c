//! Financial record produced by the field resolver.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single line item on an invoice or receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product/service description.
    pub description: String,

    /// Line amount.
    pub amount: Decimal,
}

impl LineItem {
    pub fn new(description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            description: description.into(),
            amount,
        }
    }
}

/// Monetary summary fields of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonetaryField {
    Subtotal,
    Tax,
    Total,
}

impl MonetaryField {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonetaryField::Subtotal => "subtotal",
            MonetaryField::Tax => "tax",
            MonetaryField::Total => "total",
        }
    }
}

/// How the resolver arrived at the record's values.
///
/// Kept beside the caller-facing fields so the anomaly checker can tell stated
/// values from computed ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Provenance {
    /// Monetary fields computed from other fields rather than read from text.
    pub derived: Vec<MonetaryField>,

    /// Raw text of a date candidate that failed calendar validation, when no
    /// valid date could be resolved.
    pub malformed_date: Option<String>,
}

/// Canonical, best-effort structured representation of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    pub vendor: Option<String>,

    pub invoice_number: Option<String>,

    pub date: Option<NaiveDate>,

    /// ISO-4217 currency code.
    pub currency: String,

    pub subtotal: Option<Decimal>,

    pub tax: Option<Decimal>,

    pub total: Option<Decimal>,

    /// Line items in document order.
    #[serde(default)]
    pub line_items: Vec<LineItem>,

    #[serde(skip)]
    pub provenance: Provenance,
}

impl FinancialRecord {
    /// Create an empty record in the given currency.
    pub fn empty(currency: impl Into<String>) -> Self {
        Self {
            vendor: None,
            invoice_number: None,
            date: None,
            currency: currency.into(),
            subtotal: None,
            tax: None,
            total: None,
            line_items: Vec::new(),
            provenance: Provenance::default(),
        }
    }

    /// Value of a monetary summary field.
    pub fn amount(&self, field: MonetaryField) -> Option<Decimal> {
        match field {
            MonetaryField::Subtotal => self.subtotal,
            MonetaryField::Tax => self.tax,
            MonetaryField::Total => self.total,
        }
    }

    /// Whether a monetary field was computed rather than read from the text.
    pub fn is_derived(&self, field: MonetaryField) -> bool {
        self.provenance.derived.contains(&field)
    }

    /// Whether a monetary field is present and was read from the text.
    pub fn is_stated(&self, field: MonetaryField) -> bool {
        self.amount(field).is_some() && !self.is_derived(field)
    }

    /// Sum of all line item amounts, `None` if the sum overflows.
    pub fn line_item_sum(&self) -> Option<Decimal> {
        self.line_items
            .iter()
            .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.amount))
    }
}

impl Default for FinancialRecord {
    fn default() -> Self {
        Self::empty("USD")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_serializes_caller_facing_keys_only() {
        let mut record = FinancialRecord::empty("USD");
        record.vendor = Some("Acme Corp".to_string());
        record.total = Some(Decimal::new(110000, 2));
        record.line_items.push(LineItem::new("Widget", Decimal::new(5000, 2)));
        record.provenance.derived.push(MonetaryField::Total);

        let json = serde_json::to_value(&record).unwrap();
        let mut keys: Vec<&str> = json
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();

        assert_eq!(
            keys,
            vec![
                "currency",
                "date",
                "invoice_number",
                "line_items",
                "subtotal",
                "tax",
                "total",
                "vendor"
            ]
        );
        assert_eq!(json["line_items"][0]["description"], "Widget");
    }

    #[test]
    fn test_stated_vs_derived() {
        let mut record = FinancialRecord::default();
        record.subtotal = Some(Decimal::new(100, 0));
        record.total = Some(Decimal::new(110, 0));
        record.provenance.derived.push(MonetaryField::Total);

        assert!(record.is_stated(MonetaryField::Subtotal));
        assert!(!record.is_stated(MonetaryField::Total));
        assert!(record.is_derived(MonetaryField::Total));
        assert!(!record.is_stated(MonetaryField::Tax));
    }

    #[test]
    fn test_line_item_sum_overflow() {
        let mut record = FinancialRecord::default();
        assert_eq!(record.line_item_sum(), Some(Decimal::ZERO));

        record.line_items.push(LineItem::new("Latte", Decimal::new(450, 2)));
        record.line_items.push(LineItem::new("Bagel", Decimal::new(225, 2)));
        assert_eq!(record.line_item_sum(), Some(Decimal::new(675, 2)));

        record.line_items.push(LineItem::new("Widget", Decimal::MAX));
        assert_eq!(record.line_item_sum(), None);
    }
}
