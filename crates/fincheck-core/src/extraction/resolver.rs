//! Field resolver: assembles candidate tokens into a financial record.

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::config::ExtractionConfig;
use crate::models::record::{FinancialRecord, LineItem, MonetaryField};
use crate::models::token::{AmountRole, CandidateToken, TokenKind, TokenValue};

/// Resolve candidate tokens into a record.
///
/// Total function: an unresolvable field is left unset. Single-valued fields
/// take the highest-confidence candidate, earliest in the text on ties.
/// Missing subtotal and total are derived from line items and from
/// subtotal + tax respectively, and marked as derived.
pub fn resolve(tokens: &[CandidateToken], config: &ExtractionConfig) -> FinancialRecord {
    let currency = best(tokens, |t| match &t.parsed_value {
        TokenValue::Currency(code) if t.kind == TokenKind::Currency => Some(code.clone()),
        _ => None,
    })
    .unwrap_or_else(|| config.default_currency.clone());

    let mut record = FinancialRecord::empty(currency);

    record.vendor = best(tokens, |t| text_of(t, TokenKind::VendorName));
    record.invoice_number = best(tokens, |t| text_of(t, TokenKind::Identifier));
    record.date = best(tokens, |t| match t.parsed_value {
        TokenValue::Date(date) if t.kind == TokenKind::Date => Some(date),
        _ => None,
    });
    if record.date.is_none() {
        record.provenance.malformed_date = best(tokens, |t| match t.parsed_value {
            TokenValue::MalformedDate => Some(t.raw_text.clone()),
            _ => None,
        });
    }

    record.subtotal = best(tokens, |t| role_amount(t, AmountRole::Subtotal));
    record.tax = best(tokens, |t| role_amount(t, AmountRole::Tax));
    record.total = best(tokens, |t| role_amount(t, AmountRole::Total));

    record.line_items = pair_line_items(tokens);

    if record.subtotal.is_none() && !record.line_items.is_empty() {
        match record.line_item_sum() {
            Some(sum) => {
                debug!("Derived subtotal {} from {} line items", sum, record.line_items.len());
                record.subtotal = Some(sum);
                record.provenance.derived.push(MonetaryField::Subtotal);
            }
            None => debug!("Line item sum overflowed, subtotal left unset"),
        }
    }

    if record.total.is_none() {
        if let (Some(subtotal), Some(tax)) = (record.subtotal, record.tax) {
            match subtotal.checked_add(tax) {
                Some(total) => {
                    debug!("Derived total {} from subtotal + tax", total);
                    record.total = Some(total);
                    record.provenance.derived.push(MonetaryField::Total);
                }
                None => debug!("Subtotal + tax overflowed, total left unset"),
            }
        }
    }

    record
}

/// Highest-confidence value selected by `pick`; earliest offset wins ties.
fn best<T>(tokens: &[CandidateToken], pick: impl Fn(&CandidateToken) -> Option<T>) -> Option<T> {
    let mut winner: Option<(f32, usize, T)> = None;
    for token in tokens {
        let Some(value) = pick(token) else { continue };
        let better = match &winner {
            None => true,
            Some((confidence, offset, _)) => {
                token.confidence > *confidence
                    || (token.confidence == *confidence && token.source_offset < *offset)
            }
        };
        if better {
            winner = Some((token.confidence, token.source_offset, value));
        }
    }
    winner.map(|(_, _, value)| value)
}

fn text_of(token: &CandidateToken, kind: TokenKind) -> Option<String> {
    match &token.parsed_value {
        TokenValue::Text(text) if token.kind == kind => Some(text.clone()),
        _ => None,
    }
}

fn role_amount(token: &CandidateToken, role: AmountRole) -> Option<Decimal> {
    match token.amount() {
        Some((value, Some(r))) if r == role => Some(value),
        _ => None,
    }
}

/// Pair each line item description with the amount that immediately follows it.
///
/// Currency tokens and tokens inside the description span are skipped; a
/// description whose next token is anything but an unlabeled amount is
/// dropped.
fn pair_line_items(tokens: &[CandidateToken]) -> Vec<LineItem> {
    let mut items = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        if token.kind != TokenKind::LineItem {
            continue;
        }
        let Some(description) = token.text() else {
            continue;
        };

        let next = tokens[i + 1..]
            .iter()
            .filter(|t| t.source_offset >= token.end_offset())
            .find(|t| t.kind != TokenKind::Currency);

        if let Some((amount, None)) = next.and_then(CandidateToken::amount) {
            items.push(LineItem::new(description, amount));
        }
    }

    items
}
