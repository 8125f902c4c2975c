//! Rule-based recognizers for invoice and receipt fields.

pub mod amounts;
pub mod currency;
pub mod dates;
pub mod identifiers;
pub mod line_items;
pub mod patterns;
pub mod vendor;

pub use amounts::{normalize_amount, AmountRecognizer};
pub use currency::{symbol_to_code, CurrencyRecognizer};
pub use dates::{read_date, DateReading, DateRecognizer};
pub use identifiers::IdentifierRecognizer;
pub use line_items::LineItemRecognizer;
pub use vendor::VendorRecognizer;

use crate::models::config::{DateOrder, ExtractionConfig};
use crate::models::token::{CandidateToken, TokenKind};

/// Trait for field recognizers.
pub trait Recognizer: Send + Sync {
    /// Kind of token this recognizer emits.
    fn kind(&self) -> TokenKind;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Find every candidate for this field in the text.
    fn recognize(&self, text: &str, ctx: &ScanContext<'_>) -> Vec<CandidateToken>;
}

/// Per-document state shared by recognizers.
#[derive(Debug, Clone)]
pub struct ScanContext<'a> {
    pub config: &'a ExtractionConfig,

    /// Currency detected before date recognition, used as a locale hint.
    pub currency_hint: Option<String>,
}

impl<'a> ScanContext<'a> {
    pub fn new(config: &'a ExtractionConfig) -> Self {
        Self {
            config,
            currency_hint: None,
        }
    }

    pub fn with_currency_hint(mut self, code: impl Into<String>) -> Self {
        self.currency_hint = Some(code.into());
        self
    }

    /// Order for ambiguous numeric dates, or `None` when nothing decides it.
    ///
    /// A configured order always wins over the currency hint.
    pub fn date_order(&self) -> Option<DateOrder> {
        match self.config.date_order {
            DateOrder::Auto => match self.currency_hint.as_deref() {
                Some("USD") => Some(DateOrder::MonthFirst),
                Some("EUR" | "GBP" | "INR" | "PLN" | "AUD" | "CHF") => Some(DateOrder::DayFirst),
                _ => None,
            },
            order => Some(order),
        }
    }
}

/// Push `token` unless its span intersects a token already collected.
pub fn push_unless_overlapping(tokens: &mut Vec<CandidateToken>, token: CandidateToken) {
    let (start, end) = (token.source_offset, token.end_offset());
    if tokens.iter().any(|t| t.overlaps(start, end)) {
        return;
    }
    tokens.push(token);
}

/// Lines of `text` with the byte offset each one starts at.
///
/// A trailing `\r` is stripped from each line.
pub fn lines_with_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    text.split('\n').map(move |line| {
        let start = offset;
        offset += line.len() + 1;
        (start, line.strip_suffix('\r').unwrap_or(line))
    })
}

/// The full recognizer set, currency first.
pub fn default_recognizers() -> Vec<Box<dyn Recognizer>> {
    vec![
        Box::new(CurrencyRecognizer::new()),
        Box::new(AmountRecognizer::new()),
        Box::new(DateRecognizer::new()),
        Box::new(IdentifierRecognizer::new()),
        Box::new(VendorRecognizer::new()),
        Box::new(LineItemRecognizer::new()),
    ]
}
