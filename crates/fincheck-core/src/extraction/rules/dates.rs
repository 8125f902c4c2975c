//! Date recognition with day/month ambiguity handling.

use chrono::NaiveDate;
use regex::Regex;

use super::patterns::{
    CONTACT_LINE, DATE_DAY_MONTH_NAME, DATE_ISO, DATE_MONTH_NAME_DAY, DATE_NUMERIC, DUE_DATE,
    ISSUE_DATE,
};
use super::{push_unless_overlapping, Recognizer, ScanContext};
use crate::models::config::DateOrder;
use crate::models::token::{CandidateToken, TokenKind, TokenValue};

/// Confidence multiplier when both day/month orders are valid and a locale
/// hint (currency or explicit configuration) picked one.
const HINTED_AMBIGUITY: f32 = 0.75;
/// Confidence multiplier when both orders are valid and nothing hinted.
const UNHINTED_AMBIGUITY: f32 = 0.5;
/// Confidence multiplier for date-shaped text that is no valid date.
const MALFORMED: f32 = 0.4;

/// Outcome of reading one date string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DateReading {
    /// A valid date; `factor` scales the pattern confidence down when the
    /// day/month order had to be guessed.
    Valid { date: NaiveDate, factor: f32 },
    /// Looks like a date but is not a valid calendar date in any order.
    Malformed,
}

/// Date field recognizer.
pub struct DateRecognizer {
    labeled: Vec<(&'static Regex, f32)>,
}

impl DateRecognizer {
    pub fn new() -> Self {
        Self {
            // Due dates first so "Due Date:" is not also read as "Date:".
            labeled: vec![(&DUE_DATE, 0.7), (&ISSUE_DATE, 0.95)],
        }
    }

    fn push_reading(
        tokens: &mut Vec<CandidateToken>,
        raw: &str,
        offset: usize,
        base_confidence: f32,
        reading: Option<DateReading>,
    ) {
        let token = match reading {
            Some(DateReading::Valid { date, factor }) => CandidateToken::new(
                TokenKind::Date,
                raw,
                TokenValue::Date(date),
                offset,
                base_confidence * factor,
            ),
            Some(DateReading::Malformed) => CandidateToken::new(
                TokenKind::Date,
                raw,
                TokenValue::MalformedDate,
                offset,
                base_confidence * MALFORMED,
            ),
            None => return,
        };
        push_unless_overlapping(tokens, token);
    }
}

impl Default for DateRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Recognizer for DateRecognizer {
    fn kind(&self) -> TokenKind {
        TokenKind::Date
    }

    fn name(&self) -> &'static str {
        "date"
    }

    fn recognize(&self, text: &str, ctx: &ScanContext<'_>) -> Vec<CandidateToken> {
        let order = ctx.date_order();
        let mut tokens = Vec::new();

        for (regex, confidence) in &self.labeled {
            for caps in regex.captures_iter(text) {
                let Some(date) = caps.get(1) else {
                    continue;
                };
                let reading = read_date(date.as_str(), order);
                Self::push_reading(&mut tokens, date.as_str(), date.start(), *confidence, reading);
            }
        }

        // YYYY-MM-DD or YYYY/MM/DD
        for caps in DATE_ISO.captures_iter(text) {
            let Some(m) = caps.get(0) else { continue };
            let reading = match (caps[1].parse(), caps[2].parse(), caps[3].parse()) {
                (Ok(y), Ok(mo), Ok(d)) => Some(ymd(y, mo, d)),
                _ => None,
            };
            Self::push_reading(&mut tokens, m.as_str(), m.start(), 0.9, reading);
        }

        // "3 Feb 2025"
        for caps in DATE_DAY_MONTH_NAME.captures_iter(text) {
            let Some(m) = caps.get(0) else { continue };
            let reading = match (caps[1].parse(), month_from_name(&caps[2]), caps[3].parse()) {
                (Ok(d), Some(mo), Ok(y)) => Some(ymd(y, mo, d)),
                _ => None,
            };
            Self::push_reading(&mut tokens, m.as_str(), m.start(), 0.9, reading);
        }

        // "Feb 3, 2025"
        for caps in DATE_MONTH_NAME_DAY.captures_iter(text) {
            let Some(m) = caps.get(0) else { continue };
            let reading = match (month_from_name(&caps[1]), caps[2].parse(), caps[3].parse()) {
                (Some(mo), Ok(d), Ok(y)) => Some(ymd(y, mo, d)),
                _ => None,
            };
            Self::push_reading(&mut tokens, m.as_str(), m.start(), 0.9, reading);
        }

        // DD/MM/YYYY or MM/DD/YYYY
        for caps in DATE_NUMERIC.captures_iter(text) {
            let Some(m) = caps.get(0) else { continue };
            if CONTACT_LINE.is_match(line_at(text, m.start())) {
                continue;
            }
            let reading = read_numeric(&caps[1], &caps[2], &caps[3], order);
            Self::push_reading(&mut tokens, m.as_str(), m.start(), 0.85, reading);
        }

        tokens
    }
}

/// Read a date string in any supported format.
pub fn read_date(s: &str, order: Option<DateOrder>) -> Option<DateReading> {
    let s = s.trim();

    if let Some(caps) = DATE_ISO.captures(s) {
        return match (caps[1].parse(), caps[2].parse(), caps[3].parse()) {
            (Ok(y), Ok(m), Ok(d)) => Some(ymd(y, m, d)),
            _ => None,
        };
    }
    if let Some(caps) = DATE_NUMERIC.captures(s) {
        return read_numeric(&caps[1], &caps[2], &caps[3], order);
    }
    if let Some(caps) = DATE_DAY_MONTH_NAME.captures(s) {
        return match (caps[1].parse(), month_from_name(&caps[2]), caps[3].parse()) {
            (Ok(d), Some(m), Ok(y)) => Some(ymd(y, m, d)),
            _ => None,
        };
    }
    if let Some(caps) = DATE_MONTH_NAME_DAY.captures(s) {
        return match (month_from_name(&caps[1]), caps[2].parse(), caps[3].parse()) {
            (Some(m), Ok(d), Ok(y)) => Some(ymd(y, m, d)),
            _ => None,
        };
    }
    None
}

/// Read `a/b/year`, where either `a` or `b` may be the day.
///
/// `order` is the locale hint; `None` means no hint is available and
/// day-first is preferred when both readings are valid.
fn read_numeric(a: &str, b: &str, year: &str, order: Option<DateOrder>) -> Option<DateReading> {
    let a: u32 = a.parse().ok()?;
    let b: u32 = b.parse().ok()?;
    let year = parse_year(year)?;

    let day_first = NaiveDate::from_ymd_opt(year, b, a);
    let month_first = NaiveDate::from_ymd_opt(year, a, b);

    let reading = match (day_first, month_first) {
        (Some(date), Some(_)) if a == b => DateReading::Valid { date, factor: 1.0 },
        (Some(dmy), Some(mdy)) => match order {
            Some(DateOrder::MonthFirst) => DateReading::Valid {
                date: mdy,
                factor: HINTED_AMBIGUITY,
            },
            Some(DateOrder::DayFirst) => DateReading::Valid {
                date: dmy,
                factor: HINTED_AMBIGUITY,
            },
            Some(DateOrder::Auto) | None => DateReading::Valid {
                date: dmy,
                factor: UNHINTED_AMBIGUITY,
            },
        },
        (Some(date), None) | (None, Some(date)) => DateReading::Valid { date, factor: 1.0 },
        (None, None) => DateReading::Malformed,
    };
    Some(reading)
}

/// The line of `text` containing byte `offset`.
fn line_at(text: &str, offset: usize) -> &str {
    let start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    let end = text[offset..].find('\n').map_or(text.len(), |i| offset + i);
    &text[start..end]
}

fn ymd(year: i32, month: u32, day: u32) -> DateReading {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => DateReading::Valid { date, factor: 1.0 },
        None => DateReading::Malformed,
    }
}

fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    Some(if s.len() <= 2 {
        // Two-digit year: assume 2000s for 00-50, 1900s for 51-99
        if year <= 50 { 2000 + year } else { 1900 + year }
    } else {
        year
    })
}

fn month_from_name(name: &str) -> Option<u32> {
    let month = match name.get(..3)?.to_ascii_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}
