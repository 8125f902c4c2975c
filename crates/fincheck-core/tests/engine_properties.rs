use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use fincheck_core::{
    resolve, tokenize, Anomaly, AnomalyCode, AnomalyChecker, Engine, ExtractionConfig,
    FincheckConfig, FinancialRecord, FingerprintIndex, InMemoryFingerprintIndex, LineItem,
    MonetaryField, Severity,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

const ACME_INVOICE: &str =
    "Acme Corp\nInvoice INV-2025-001\nDate: 2025-02-03\nSubtotal: 1000.00\nTax: 100.00\nTotal: 1100.00";

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn codes(anomalies: &[Anomaly]) -> Vec<AnomalyCode> {
    anomalies.iter().map(|a| a.code).collect()
}

fn shared_engine() -> (Engine, Arc<InMemoryFingerprintIndex>) {
    let index = Arc::new(InMemoryFingerprintIndex::new());
    let engine = Engine::new(FincheckConfig::default(), index.clone());
    (engine, index)
}

#[test]
fn test_end_to_end_invoice() {
    let (engine, _) = shared_engine();
    let processed = engine.process(ACME_INVOICE).unwrap();
    let record = &processed.record;

    assert_eq!(record.vendor.as_deref(), Some("Acme Corp"));
    assert_eq!(record.invoice_number.as_deref(), Some("INV-2025-001"));
    assert_eq!(record.date, NaiveDate::from_ymd_opt(2025, 2, 3));
    assert_eq!(record.currency, "USD");
    assert_eq!(record.subtotal, Some(dec("1000.00")));
    assert_eq!(record.tax, Some(dec("100.00")));
    assert_eq!(record.total, Some(dec("1100.00")));
    assert_eq!(processed.anomalies, vec![]);
}

#[test]
fn test_record_wire_shape() {
    let (engine, _) = shared_engine();
    let processed = engine.process(ACME_INVOICE).unwrap();
    let json = serde_json::to_value(&processed.record).unwrap();

    assert_eq!(json["vendor"], "Acme Corp");
    assert_eq!(json["date"], "2025-02-03");
    assert_eq!(json["total"], "1100.00");
    assert_eq!(json["line_items"], serde_json::json!([]));
}

#[test]
fn test_same_document_twice_is_one_duplicate() {
    let (engine, index) = shared_engine();
    let text = "Corner Market\nDate: 2025-01-10\nMilk 2.50\nBread 3.10\nTotal: 5.60";

    let first = engine.process(text).unwrap();
    let second = engine.process(text).unwrap();

    assert!(!codes(&first.anomalies).contains(&AnomalyCode::DuplicateSuspected));

    let duplicates: Vec<&Anomaly> = second
        .anomalies
        .iter()
        .filter(|a| a.code == AnomalyCode::DuplicateSuspected)
        .collect();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].severity, Severity::High);

    let others: Vec<Anomaly> = second
        .anomalies
        .iter()
        .filter(|a| a.code != AnomalyCode::DuplicateSuspected)
        .cloned()
        .collect();
    assert_eq!(others, first.anomalies);
    assert_eq!(index.len(), 1);
}

#[test]
fn test_engines_share_an_index() {
    let index: Arc<dyn FingerprintIndex> = Arc::new(InMemoryFingerprintIndex::new());
    let a = Engine::new(FincheckConfig::default(), Arc::clone(&index));
    let b = Engine::new(FincheckConfig::default(), Arc::clone(&index));

    assert!(a.process(ACME_INVOICE).unwrap().anomalies.is_empty());
    assert_eq!(
        codes(&b.process(ACME_INVOICE).unwrap().anomalies),
        vec![AnomalyCode::DuplicateSuspected]
    );
}

#[test]
fn test_total_off_by_five_is_a_mismatch() {
    let (engine, _) = shared_engine();
    let processed = engine
        .process("Acme Corp\nInvoice #77\nDate: 2025-02-03\nSubtotal: 100.00\nTax: 10.00\nTotal: 115.00")
        .unwrap();

    assert_eq!(codes(&processed.anomalies), vec![AnomalyCode::TotalMismatch]);
    let mismatch = &processed.anomalies[0];
    assert_eq!(mismatch.severity, Severity::High);
    assert!(mismatch.detail.contains("115.00"));
    assert!(mismatch.detail.contains("110.00"));
}

#[test]
fn test_missing_vendor_date_total() {
    let mut record = FinancialRecord::empty("USD");
    record.invoice_number = Some("INV-9".to_string());

    let index = InMemoryFingerprintIndex::new();
    let anomalies = AnomalyChecker::default().check(&record, &index);

    assert_eq!(anomalies.len(), 3);
    assert!(anomalies
        .iter()
        .all(|a| a.code == AnomalyCode::MissingField && a.severity == Severity::Medium));
    let fields: Vec<&str> = anomalies.iter().filter_map(|a| a.field.as_deref()).collect();
    assert_eq!(fields, vec!["vendor", "date", "total"]);
}

#[test]
fn test_negative_line_item() {
    let (engine, _) = shared_engine();
    let processed = engine.process("Refund -50.00").unwrap();

    assert_eq!(processed.record.line_items.len(), 1);
    assert_eq!(processed.record.line_items[0].amount, dec("-50.00"));
    assert!(processed
        .anomalies
        .iter()
        .any(|a| a.code == AnomalyCode::NegativeAmount
            && a.field.as_deref() == Some("line_items[0]")));
}

#[test]
fn test_derived_total_is_exact() {
    let config = ExtractionConfig::default();
    let record = resolve(
        &tokenize("Shop Ltd\nSubtotal: 19.99\nVAT 20%: 4.00", &config),
        &config,
    );

    assert_eq!(record.total, Some(dec("23.99")));
    assert!(record.is_derived(MonetaryField::Total));
}

#[test]
fn test_malformed_date_surfaces_as_anomaly() {
    let (engine, _) = shared_engine();
    let processed = engine
        .process("Acme Corp\nInvoice #5\nDate: 45/13/2024\nTotal: 10.00")
        .unwrap();

    assert_eq!(
        codes(&processed.anomalies),
        vec![AnomalyCode::MissingField, AnomalyCode::MalformedDate]
    );
}

#[test]
fn test_tokenize_and_resolve_are_total() {
    let config = ExtractionConfig::default();
    let inputs = [
        "",
        "\n\n\n",
        "Total:",
        "Total: $",
        "Subtotal: ,,,.\nTax: .\n",
        "Date: 99/99/9999",
        "$$$ €€€ £££",
        "(((((12",
        "Invoice # Invoice # Invoice #",
        "OOOO.OO",
        "1,2,3,4,5,6,7,8,9",
        "ÿþ\u{feff}日本語のテキスト 1.000,00",
        "Subtotal: 79228162514264337593543950335\nTax: 79228162514264337593543950335",
        "Widget 79228162514264337593543950335\nGadget 79228162514264337593543950335",
        "9999999999999999999999999999999999999999.99",
        "Corner Cafe\nLatte $4.50\nBagel $2.25",
        "Tel 12-34-56",
    ];
    for text in inputs {
        let record = resolve(&tokenize(text, &config), &config);
        assert!(!record.currency.is_empty());
    }
}

#[test]
fn test_oversized_amounts_leave_derived_fields_unset() {
    let config = ExtractionConfig::default();
    let max = "79228162514264337593543950335";

    let record = resolve(&tokenize(&format!("Subtotal: {max}\nTax: {max}"), &config), &config);
    assert_eq!(record.subtotal, Some(Decimal::MAX));
    assert_eq!(record.tax, Some(Decimal::MAX));
    assert_eq!(record.total, None);
    assert!(record.provenance.derived.is_empty());

    let record = resolve(&tokenize(&format!("Shop\nWidget {max}\nGadget {max}"), &config), &config);
    assert_eq!(record.line_items.len(), 2);
    assert_eq!(record.subtotal, None);
    assert_eq!(record.total, None);

    let mut config = FincheckConfig::default();
    config.anomaly.extended_rules = true;
    let engine = Engine::with_default_index(config);
    let processed = engine
        .process(&format!("Shop\nWidget {max}\nGadget {max}\nSubtotal: 1.00\nTax: {max}\nTotal: -{max}"))
        .unwrap();
    assert!(!codes(&processed.anomalies).contains(&AnomalyCode::TotalMismatch));
}

#[test]
fn test_receipt_ending_in_currency_item_line() {
    let (engine, _) = shared_engine();
    let processed = engine.process("Corner Cafe\nLatte $4.50\nBagel $2.25").unwrap();
    let record = &processed.record;

    assert_eq!(
        record.line_items,
        vec![
            LineItem::new("Latte", dec("4.50")),
            LineItem::new("Bagel", dec("2.25")),
        ]
    );
    assert_eq!(record.subtotal, Some(dec("6.75")));
    assert!(record.is_derived(MonetaryField::Subtotal));
    assert_eq!(record.total, None);
    assert!(processed
        .anomalies
        .iter()
        .any(|a| a.code == AnomalyCode::MissingField && a.field.as_deref() == Some("total")));
}

#[test]
fn test_garbage_document_is_indexed_once() {
    let (engine, index) = shared_engine();
    let processed = engine.process("$$$ €€€ £££\n(((((12\nTel 12-34-56").unwrap();

    assert_eq!(index.len(), 1);
    assert!(!codes(&processed.anomalies).contains(&AnomalyCode::MalformedDate));
    assert!(!codes(&processed.anomalies).contains(&AnomalyCode::DuplicateSuspected));
}
