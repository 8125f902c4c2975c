//! Common regex patterns for invoice and receipt extraction.
//!
//! Amount captures accept the letter `O` in digit positions; the amount
//! normalizer maps it back to `0`. Labels are matched case-insensitively,
//! amounts are not.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Labeled summary amounts
    pub static ref SUBTOTAL_AMOUNT: Regex = Regex::new(
        r"(?i:\bsub[ \t-]?total)[ \t]*:?[ \t]*(?:[$€£₹][ \t]*|(?:USD|EUR|GBP|INR|PLN|CAD|AUD|CHF|JPY)[ \t]+)?(-?\d(?:[\d,.Oo]*[\dOo])?)"
    ).unwrap();

    pub static ref TAX_AMOUNT: Regex = Regex::new(
        r"(?i:\b(?:sales[ \t]+tax|tax|vat|gst))(?:[ \t]*\(?[ \t]*\d{1,2}(?:[.,]\d+)?[ \t]*%[ \t]*\)?)?[ \t]*:?[ \t]*(?:[$€£₹][ \t]*|(?:USD|EUR|GBP|INR|PLN|CAD|AUD|CHF|JPY)[ \t]+)?(-?\d(?:[\d,.Oo]*[\dOo])?)"
    ).unwrap();

    pub static ref TOTAL_AMOUNT: Regex = Regex::new(
        r"(?i:\b(?:grand[ \t]+)?total(?:[ \t]+amount)?(?:[ \t]+due)?)[ \t]*:?[ \t]*(?:[$€£₹][ \t]*|(?:USD|EUR|GBP|INR|PLN|CAD|AUD|CHF|JPY)[ \t]+)?(-?\d(?:[\d,.Oo]*[\dOo])?)"
    ).unwrap();

    pub static ref FALLBACK_TOTAL_AMOUNT: Regex = Regex::new(
        r"(?i:\b(?:amount[ \t]+due|balance(?:[ \t]+due)?|net[ \t]+amount|amount[ \t]+payable))[ \t]*:?[ \t]*(?:[$€£₹][ \t]*|(?:USD|EUR|GBP|INR|PLN|CAD|AUD|CHF|JPY)[ \t]+)?(-?\d(?:[\d,.Oo]*[\dOo])?)"
    ).unwrap();

    // Bare currency amount closing the document, e.g. a receipt footer "$12.50"
    pub static ref TRAILING_CURRENCY_AMOUNT: Regex = Regex::new(
        r"[$€£₹][ \t]*(-?\d(?:[\d,.Oo]*[\dOo])?)\s*\z"
    ).unwrap();

    // Unlabeled amounts
    pub static ref CURRENCY_AMOUNT: Regex = Regex::new(
        r"(-)?(?:[$€£₹]|\b(?:USD|EUR|GBP|INR|PLN|CAD|AUD|CHF|JPY))[ \t]*(-?\d(?:[\d,.Oo]*[\dOo])?)"
    ).unwrap();

    pub static ref DECIMAL_AMOUNT: Regex = Regex::new(
        r"-?\d[\d,.Oo]*[.,][\dOo]{2}\b"
    ).unwrap();

    pub static ref TRAILING_INTEGER_AMOUNT: Regex = Regex::new(
        r"(?m)[ \t](-?\d[\d,Oo]*)[ \t]*$"
    ).unwrap();

    // Dates
    pub static ref DUE_DATE: Regex = Regex::new(
        r"(?i)\b(?:due[ \t]+date|payment[ \t]+due|due)[ \t]*[:\-]?[ \t]*(\d{4}[/\-.]\d{1,2}[/\-.]\d{1,2}|\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}|\d{1,2}(?:st|nd|rd|th)?[ \t]+(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?,?[ \t]+\d{4}|(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?[ \t]+\d{1,2}(?:st|nd|rd|th)?,?[ \t]+\d{4})"
    ).unwrap();

    pub static ref ISSUE_DATE: Regex = Regex::new(
        r"(?i)\b(?:invoice[ \t]+date|issue[ \t]+date|date[ \t]+of[ \t]+issue|dated|date|issued(?:[ \t]+on)?)[ \t]*[:\-]?[ \t]*(\d{4}[/\-.]\d{1,2}[/\-.]\d{1,2}|\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}|\d{1,2}(?:st|nd|rd|th)?[ \t]+(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?,?[ \t]+\d{4}|(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?[ \t]+\d{1,2}(?:st|nd|rd|th)?,?[ \t]+\d{4})"
    ).unwrap();

    // Phone and fax lines carry dash/slash separated digit groups that read as dates
    pub static ref CONTACT_LINE: Regex = Regex::new(
        r"(?i)^[ \t]*(?:tel\b|tel\.|telephone|phone|ph\b|fax|mobile|cell\b)"
    ).unwrap();

    pub static ref DATE_ISO: Regex = Regex::new(
        r"\b(\d{4})[/\-.](\d{1,2})[/\-.](\d{1,2})\b"
    ).unwrap();

    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"\b(\d{1,2})[/\-.](\d{1,2})[/\-.](\d{4}|\d{2})\b"
    ).unwrap();

    pub static ref DATE_DAY_MONTH_NAME: Regex = Regex::new(
        r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?[ \t]+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?,?[ \t]+(\d{4})\b"
    ).unwrap();

    pub static ref DATE_MONTH_NAME_DAY: Regex = Regex::new(
        r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?[ \t]+(\d{1,2})(?:st|nd|rd|th)?,?[ \t]+(\d{4})\b"
    ).unwrap();

    // Invoice / receipt identifiers
    pub static ref LABELED_IDENTIFIER: Regex = Regex::new(
        r"(?i:\b(?:invoice[ \t]*(?:no\.?|number|num\.?|#)?|inv[ \t]*(?:no\.?|#)|receipt[ \t]*(?:no\.?|number|#)|ref(?:erence)?[ \t]*(?:no\.?|#)?|id[ \t]*#))[ \t]*[:#]?[ \t]*([A-Za-z0-9][A-Za-z0-9\-/_.]*[A-Za-z0-9]|\d)"
    ).unwrap();

    pub static ref STANDALONE_IDENTIFIER: Regex = Regex::new(
        r"\b([A-Z]{2,5})[- ]?(\d{4,})\b"
    ).unwrap();

    // Currency
    pub static ref CURRENCY_CODE: Regex = Regex::new(
        r"\b(USD|EUR|GBP|INR|PLN|CAD|AUD|CHF|JPY)\b"
    ).unwrap();

    pub static ref CURRENCY_SYMBOL: Regex = Regex::new(
        r"[$€£₹]|zł"
    ).unwrap();

    // Vendor
    pub static ref LABELED_VENDOR: Regex = Regex::new(
        r"(?im)^[ \t]*(?:vendor|merchant|supplier|seller|sold[ \t]+by|bill(?:ed)?[ \t]+from|from)(?:[ \t]*:[ \t]*|[ \t]+)(\S[^\r\n]*?)[ \t]*\r?$"
    ).unwrap();

    pub static ref SYMBOLIC_LINE: Regex = Regex::new(
        r"^[\d\s/\-.,:#$€£₹%()*+=_|]+$"
    ).unwrap();

    pub static ref DOCUMENT_LABEL_LINE: Regex = Regex::new(
        r"(?i)^(?:invoice|inv\b|date|due|total|grand[ \t]+total|sub[ \t-]?total|tax|vat|gst|receipt|bill[ \t]+to|ship[ \t]+to|amount|balance|page|tel\b|phone|fax|email)"
    ).unwrap();

    // Line items
    pub static ref LINE_ITEM: Regex = Regex::new(
        r"^[ \t]*(.*?\p{L}.*?)[ \t]+(-?(?:[$€£₹][ \t]*)?-?\d(?:[\d,.Oo]*[\dOo])?)[ \t]*\r?$"
    ).unwrap();

    pub static ref LINE_ITEM_LABEL: Regex = Regex::new(
        r"(?i)^(?:sub[ \t-]?total|grand[ \t]+total|total|sales[ \t]+tax|tax|vat|gst|amount|balance|net[ \t]+amount|invoice|inv\b|date|dated|due|issued|receipt|ref\b|reference|id\b|page|qty|quantity|phone|tel\b|fax|change|cash|card|paid)"
    ).unwrap();
}
