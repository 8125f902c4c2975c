//! Document type classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of financial document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Invoice,
    ExpenseReceipt,
    Other,
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DocumentType::Invoice => "invoice",
            DocumentType::ExpenseReceipt => "expense_receipt",
            DocumentType::Other => "other",
        };
        f.write_str(label)
    }
}

/// Classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub document_type: DocumentType,
    pub confidence: f32,
}

/// Trait for document classifiers.
pub trait DocumentClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Classification;
}

/// Keyword rules used when no trained model is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentClassifier for KeywordClassifier {
    fn classify(&self, text: &str) -> Classification {
        let lower = text.to_lowercase();

        let (document_type, confidence) = if lower.contains("invoice")
            && (text.contains('#') || lower.contains("number") || lower.contains("date"))
        {
            (DocumentType::Invoice, 0.7)
        } else if lower.contains("receipt") || lower.contains("thank you for your purchase") {
            (DocumentType::ExpenseReceipt, 0.7)
        } else {
            (DocumentType::Other, 0.5)
        };

        Classification {
            document_type,
            confidence,
        }
    }
}
