//! Tokenizing pattern matcher.

use tracing::debug;

use super::rules::{default_recognizers, Recognizer, ScanContext};
use crate::models::config::ExtractionConfig;
use crate::models::token::{CandidateToken, TokenKind};

/// Runs an ordered set of recognizers over raw document text.
///
/// Currency recognizers run first: the detected currency is the locale hint
/// used to read ambiguous numeric dates. Recognizers are independent and may
/// produce overlapping tokens of different kinds.
pub struct Tokenizer {
    recognizers: Vec<Box<dyn Recognizer>>,
}

impl Tokenizer {
    /// Create a tokenizer with the full recognizer set.
    pub fn new() -> Self {
        Self {
            recognizers: default_recognizers(),
        }
    }

    /// Create a tokenizer with a custom recognizer set.
    pub fn with_recognizers(recognizers: Vec<Box<dyn Recognizer>>) -> Self {
        Self { recognizers }
    }

    /// Scan `text` and return every candidate token in source order.
    ///
    /// Never fails: text without recognizable fields yields no tokens.
    pub fn tokenize(&self, text: &str, config: &ExtractionConfig) -> Vec<CandidateToken> {
        let (currency, others): (Vec<&dyn Recognizer>, Vec<&dyn Recognizer>) = self
            .recognizers
            .iter()
            .map(|r| r.as_ref())
            .partition(|r| r.kind() == TokenKind::Currency);

        let mut ctx = ScanContext::new(config);
        let mut tokens = run(&currency, text, &ctx);

        if let Some(code) = best_currency(&tokens) {
            debug!("Currency hint: {}", code);
            ctx = ctx.with_currency_hint(code);
        }
        tokens.extend(run(&others, text, &ctx));

        tokens.retain(|t| t.confidence >= config.min_token_confidence);
        tokens.sort_by_key(|t| t.source_offset);
        tokens
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

fn run(recognizers: &[&dyn Recognizer], text: &str, ctx: &ScanContext<'_>) -> Vec<CandidateToken> {
    let mut tokens = Vec::new();
    for recognizer in recognizers {
        let found = recognizer.recognize(text, ctx);
        debug!("Recognizer {} found {} tokens", recognizer.name(), found.len());
        tokens.extend(found);
    }
    tokens
}

/// Highest-confidence currency code, earliest first on ties.
fn best_currency(tokens: &[CandidateToken]) -> Option<String> {
    tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Currency)
        .fold(None::<&CandidateToken>, |best, t| match best {
            Some(b) if b.confidence > t.confidence => Some(b),
            Some(b) if b.confidence == t.confidence && b.source_offset <= t.source_offset => Some(b),
            _ => Some(t),
        })
        .and_then(|t| t.text())
        .map(str::to_string)
}

/// Tokenize `text` with the full recognizer set.
pub fn tokenize(text: &str, config: &ExtractionConfig) -> Vec<CandidateToken> {
    Tokenizer::new().tokenize(text, config)
}
