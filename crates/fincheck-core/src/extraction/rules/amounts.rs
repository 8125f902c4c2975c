//! Amount recognition and OCR-tolerant amount normalization.

use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::{
    CURRENCY_AMOUNT, DECIMAL_AMOUNT, FALLBACK_TOTAL_AMOUNT, LINE_ITEM_LABEL, SUBTOTAL_AMOUNT,
    TAX_AMOUNT, TOTAL_AMOUNT, TRAILING_CURRENCY_AMOUNT, TRAILING_INTEGER_AMOUNT,
};
use super::{push_unless_overlapping, Recognizer, ScanContext};
use crate::models::token::{AmountRole, CandidateToken, TokenKind, TokenValue};

/// Confidence of an explicitly labeled subtotal, tax or total.
const LABELED_CONFIDENCE: f32 = 0.95;
/// Confidence of "Amount Due", "Balance" and similar total labels.
const FALLBACK_LABEL_CONFIDENCE: f32 = 0.85;
/// Confidence of a bare currency amount closing the document.
const TRAILING_TOTAL_CONFIDENCE: f32 = 0.3;

/// A labeled amount pattern and the role it assigns.
struct LabeledPattern {
    regex: &'static Regex,
    role: AmountRole,
    confidence: f32,
}

/// Amount recognizer.
///
/// Patterns run from most specific to most general: explicit summary labels,
/// fallback total labels, a trailing currency amount, then unlabeled amounts.
/// A later pattern never claims text an earlier one already matched.
pub struct AmountRecognizer {
    labeled: Vec<LabeledPattern>,
}

impl AmountRecognizer {
    pub fn new() -> Self {
        Self {
            labeled: vec![
                LabeledPattern {
                    regex: &SUBTOTAL_AMOUNT,
                    role: AmountRole::Subtotal,
                    confidence: LABELED_CONFIDENCE,
                },
                LabeledPattern {
                    regex: &TAX_AMOUNT,
                    role: AmountRole::Tax,
                    confidence: LABELED_CONFIDENCE,
                },
                LabeledPattern {
                    regex: &TOTAL_AMOUNT,
                    role: AmountRole::Total,
                    confidence: LABELED_CONFIDENCE,
                },
                LabeledPattern {
                    regex: &FALLBACK_TOTAL_AMOUNT,
                    role: AmountRole::Total,
                    confidence: FALLBACK_LABEL_CONFIDENCE,
                },
            ],
        }
    }

    fn recognize_labeled(&self, text: &str, tokens: &mut Vec<CandidateToken>) {
        for pattern in &self.labeled {
            for caps in pattern.regex.captures_iter(text) {
                let (Some(full), Some(amount)) = (caps.get(0), caps.get(1)) else {
                    continue;
                };

                // "Sub-total" must not also read as "total".
                if pattern.role == AmountRole::Total && preceded_by_sub(text, full.start()) {
                    continue;
                }
                // "Tax 10%" is a rate, not an amount.
                if text[amount.end()..].starts_with('%') {
                    continue;
                }

                if let Some(value) = normalize_amount(amount.as_str()) {
                    push_unless_overlapping(
                        tokens,
                        CandidateToken::new(
                            TokenKind::Amount,
                            amount.as_str(),
                            TokenValue::Amount {
                                value,
                                role: Some(pattern.role),
                            },
                            amount.start(),
                            pattern.confidence,
                        ),
                    );
                }
            }
        }

        if let Some((full, amount)) = TRAILING_CURRENCY_AMOUNT
            .captures(text)
            .and_then(|caps| Some((caps.get(0)?, caps.get(1)?)))
            // "Bagel $2.25" closing a receipt is a line item, not the total.
            .filter(|(full, _)| !describes_item(line_prefix(text, full.start())))
        {
            if let Some(value) = normalize_amount(amount.as_str()) {
                push_unless_overlapping(
                    tokens,
                    CandidateToken::new(
                        TokenKind::Amount,
                        amount.as_str(),
                        TokenValue::Amount {
                            value,
                            role: Some(AmountRole::Total),
                        },
                        amount.start(),
                        TRAILING_TOTAL_CONFIDENCE,
                    ),
                );
            }
        }
    }

    fn recognize_unlabeled(&self, text: &str, tokens: &mut Vec<CandidateToken>) {
        for caps in CURRENCY_AMOUNT.captures_iter(text) {
            let (Some(full), Some(amount)) = (caps.get(0), caps.get(2)) else {
                continue;
            };
            let negative = caps.get(1).is_some();
            if let Some(value) = normalize_amount(amount.as_str()) {
                let value = if negative { -value.abs() } else { value };
                push_unless_overlapping(
                    tokens,
                    CandidateToken::new(
                        TokenKind::Amount,
                        full.as_str(),
                        TokenValue::Amount { value, role: None },
                        full.start(),
                        0.6,
                    ),
                );
            }
        }

        for m in DECIMAL_AMOUNT.find_iter(text) {
            if !is_isolated(text, m.start(), m.end()) {
                continue;
            }
            if let Some(value) = normalize_amount(m.as_str()) {
                push_unless_overlapping(
                    tokens,
                    CandidateToken::new(
                        TokenKind::Amount,
                        m.as_str(),
                        TokenValue::Amount { value, role: None },
                        m.start(),
                        0.5,
                    ),
                );
            }
        }

        for caps in TRAILING_INTEGER_AMOUNT.captures_iter(text) {
            let Some(amount) = caps.get(1) else {
                continue;
            };
            if let Some(value) = normalize_amount(amount.as_str()) {
                push_unless_overlapping(
                    tokens,
                    CandidateToken::new(
                        TokenKind::Amount,
                        amount.as_str(),
                        TokenValue::Amount { value, role: None },
                        amount.start(),
                        0.4,
                    ),
                );
            }
        }
    }
}

impl Default for AmountRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Recognizer for AmountRecognizer {
    fn kind(&self) -> TokenKind {
        TokenKind::Amount
    }

    fn name(&self) -> &'static str {
        "amount"
    }

    fn recognize(&self, text: &str, _ctx: &ScanContext<'_>) -> Vec<CandidateToken> {
        let mut tokens = Vec::new();
        self.recognize_labeled(text, &mut tokens);
        self.recognize_unlabeled(text, &mut tokens);
        tokens
    }
}

/// Normalize an OCR'd amount string into a decimal.
///
/// Handles currency symbols and codes, `O`/`o` read for `0`, `l`/`I` read
/// for `1`, leading minus or accounting parentheses, and mixed or misplaced
/// thousands separators ("1,00.00", "1.234,56"). Returns `None` when the text
/// is not a number after normalization.
pub fn normalize_amount(raw: &str) -> Option<Decimal> {
    let mut s = raw.trim();

    let mut negative = false;
    if let Some(inner) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        negative = true;
        s = inner.trim();
    }
    if let Some(rest) = s.strip_prefix(['-', '\u{2212}']) {
        negative = !negative;
        s = rest.trim_start();
    }

    for code in ["USD", "EUR", "GBP", "INR", "PLN", "CAD", "AUD", "CHF", "JPY"] {
        if let Some(rest) = s.strip_prefix(code) {
            s = rest;
        }
        if let Some(rest) = s.strip_suffix(code) {
            s = rest;
        }
    }
    let s = s.trim_matches(|c: char| matches!(c, '$' | '€' | '£' | '₹') || c.is_whitespace());

    // Sign after the currency symbol: "$-50.00"
    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (!negative, rest),
        None => (negative, s),
    };

    let mut cleaned = String::with_capacity(s.len());
    let mut saw_digit = false;
    for c in s.chars() {
        match c {
            '0'..='9' => {
                saw_digit = true;
                cleaned.push(c);
            }
            'O' | 'o' => cleaned.push('0'),
            'l' | 'I' => cleaned.push('1'),
            ',' | '.' => cleaned.push(c),
            ' ' | '\u{00a0}' | '\'' => {}
            _ => return None,
        }
    }
    if !saw_digit {
        return None;
    }

    let normalized = match cleaned.rfind([',', '.']) {
        None => cleaned,
        Some(pos) => {
            let separator = &cleaned[pos..=pos];
            let integer: String = cleaned[..pos]
                .chars()
                .filter(char::is_ascii_digit)
                .collect();
            let fraction = &cleaned[pos + 1..];
            let separator_count = cleaned.matches([',', '.']).count();

            let is_decimal = match fraction.len() {
                0 => false,
                1 | 2 => true,
                3 => separator == "." && separator_count == 1,
                _ => true,
            };

            let integer = if integer.is_empty() { "0".to_string() } else { integer };
            if is_decimal {
                format!("{}.{}", integer, fraction)
            } else {
                format!("{}{}", integer, fraction)
            }
        }
    };

    let value = Decimal::from_str(&normalized).ok()?;
    Some(if negative { -value } else { value })
}

/// Text between the start of the line and `offset`.
fn line_prefix(text: &str, offset: usize) -> &str {
    let start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    &text[start..offset]
}

/// Whether a line prefix reads as a line item description rather than a label.
fn describes_item(prefix: &str) -> bool {
    let prefix = prefix.trim();
    prefix.chars().any(char::is_alphabetic) && !LINE_ITEM_LABEL.is_match(prefix)
}

fn preceded_by_sub(text: &str, start: usize) -> bool {
    let before = text[..start].trim_end_matches([' ', '\t', '-']);
    before
        .get(before.len().saturating_sub(3)..)
        .is_some_and(|tail| tail.eq_ignore_ascii_case("sub"))
}

/// A bare number is only an amount when it is not glued to a word, a date or
/// an identifier.
fn is_isolated(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    if before.is_some_and(|c| c.is_alphanumeric() || matches!(c, '.' | ',' | '/' | '-' | '_')) {
        return false;
    }

    let mut after = text[end..].chars();
    match after.next() {
        Some(c) if c.is_alphanumeric() || c == '_' => false,
        Some('.' | ',' | '/' | '-') => !after.next().is_some_and(|c| c.is_ascii_digit()),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::ExtractionConfig;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn recognize(text: &str) -> Vec<CandidateToken> {
        let config = ExtractionConfig::default();
        AmountRecognizer::new().recognize(text, &ScanContext::new(&config))
    }

    #[test]
    fn test_normalize_plain_amounts() {
        assert_eq!(normalize_amount("1100.00"), Some(dec("1100.00")));
        assert_eq!(normalize_amount("1,234.56"), Some(dec("1234.56")));
        assert_eq!(normalize_amount("$ 5.50"), Some(dec("5.50")));
        assert_eq!(normalize_amount("EUR 12"), Some(dec("12")));
    }

    #[test]
    fn test_normalize_ocr_substitutions() {
        assert_eq!(normalize_amount("1O0.00"), Some(dec("100.00")));
        assert_eq!(normalize_amount("2l.5O"), Some(dec("21.50")));
    }

    #[test]
    fn test_normalize_separators() {
        assert_eq!(normalize_amount("1,00.00"), Some(dec("100.00")));
        assert_eq!(normalize_amount("1.234,56"), Some(dec("1234.56")));
        assert_eq!(normalize_amount("12 345,67"), Some(dec("12345.67")));
        assert_eq!(normalize_amount("1,234"), Some(dec("1234")));
        assert_eq!(normalize_amount("1,234,567"), Some(dec("1234567")));
        assert_eq!(normalize_amount("10,5"), Some(dec("10.5")));
    }

    #[test]
    fn test_normalize_negative() {
        assert_eq!(normalize_amount("-50.00"), Some(dec("-50.00")));
        assert_eq!(normalize_amount("(50.00)"), Some(dec("-50.00")));
        assert_eq!(normalize_amount("$-50.00"), Some(dec("-50.00")));
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert_eq!(normalize_amount("OO"), None);
        assert_eq!(normalize_amount("12a4"), None);
        assert_eq!(normalize_amount(""), None);
    }

    #[test]
    fn test_labeled_amounts_get_roles() {
        let tokens = recognize("Subtotal: 1000.00\nTax: 100.00\nTotal: 1100.00");
        let roles: Vec<_> = tokens
            .iter()
            .filter_map(|t| t.amount())
            .map(|(value, role)| (value, role))
            .collect();

        assert!(roles.contains(&(dec("1000.00"), Some(AmountRole::Subtotal))));
        assert!(roles.contains(&(dec("100.00"), Some(AmountRole::Tax))));
        assert!(roles.contains(&(dec("1100.00"), Some(AmountRole::Total))));
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_sub_total_is_not_total() {
        let tokens = recognize("Sub-total: 90.00");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].amount(), Some((dec("90.00"), Some(AmountRole::Subtotal))));
    }

    #[test]
    fn test_label_beats_trailing_currency_amount() {
        let tokens = recognize("Total: 12.00\nPaid $12.00");
        let total = tokens
            .iter()
            .find(|t| t.amount().map(|(_, r)| r) == Some(Some(AmountRole::Total)))
            .unwrap();
        assert_eq!(total.confidence, LABELED_CONFIDENCE);

        let trailing: Vec<_> = tokens
            .iter()
            .filter(|t| t.confidence == TRAILING_TOTAL_CONFIDENCE)
            .collect();
        assert_eq!(trailing.len(), 1);
    }

    #[test]
    fn test_trailing_item_line_is_not_a_total() {
        let tokens = recognize("Corner Cafe\nLatte $4.50\nBagel $2.25");

        assert!(tokens.iter().all(|t| t.amount().map(|(_, r)| r) == Some(None)));
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].amount(), Some((dec("2.25"), None)));

        let tokens = recognize("Corner Cafe\nLatte 4.50\n  $4.50");
        let trailing: Vec<_> = tokens
            .iter()
            .filter(|t| t.confidence == TRAILING_TOTAL_CONFIDENCE)
            .collect();
        assert_eq!(trailing.len(), 1);
    }

    #[test]
    fn test_unlabeled_amounts_skip_dates_and_ids() {
        let tokens = recognize("Date: 2025-02-03\nInvoice INV-2025-001\nLatte  5.50");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].amount(), Some((dec("5.50"), None)));
    }

    #[test]
    fn test_tax_rate_is_not_an_amount() {
        let tokens = recognize("Tax 10%");
        assert!(tokens.iter().all(|t| t.amount().map(|(_, r)| r) != Some(Some(AmountRole::Tax))));
    }
}
