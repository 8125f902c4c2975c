//! Line item description recognition.
//!
//! The recognizer only marks description spans; the resolver pairs each
//! description with the amount token that immediately follows it.

use super::amounts::normalize_amount;
use super::patterns::{
    DATE_DAY_MONTH_NAME, DATE_ISO, DATE_MONTH_NAME_DAY, DATE_NUMERIC, LINE_ITEM, LINE_ITEM_LABEL,
};
use super::{lines_with_offsets, Recognizer, ScanContext};
use crate::models::token::{CandidateToken, TokenKind, TokenValue};

/// Line item recognizer.
pub struct LineItemRecognizer;

impl LineItemRecognizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LineItemRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

fn contains_date(line: &str) -> bool {
    DATE_ISO.is_match(line)
        || DATE_NUMERIC.is_match(line)
        || DATE_DAY_MONTH_NAME.is_match(line)
        || DATE_MONTH_NAME_DAY.is_match(line)
}

impl Recognizer for LineItemRecognizer {
    fn kind(&self) -> TokenKind {
        TokenKind::LineItem
    }

    fn name(&self) -> &'static str {
        "line_item"
    }

    fn recognize(&self, text: &str, _ctx: &ScanContext<'_>) -> Vec<CandidateToken> {
        let mut tokens = Vec::new();

        for (offset, line) in lines_with_offsets(text) {
            let Some(caps) = LINE_ITEM.captures(line) else {
                continue;
            };
            let (Some(desc), Some(amount)) = (caps.get(1), caps.get(2)) else {
                continue;
            };

            let description = desc
                .as_str()
                .trim_end_matches(['.', ' ', '\t', '-', '|', '*', '_']);
            if description.is_empty()
                || description.ends_with(':')
                || description.contains('#')
                || LINE_ITEM_LABEL.is_match(description)
                || contains_date(line)
                || normalize_amount(amount.as_str()).is_none()
            {
                continue;
            }

            tokens.push(CandidateToken::new(
                TokenKind::LineItem,
                description,
                TokenValue::Text(description.to_string()),
                offset + desc.start(),
                0.7,
            ));
        }

        tokens
    }
}
