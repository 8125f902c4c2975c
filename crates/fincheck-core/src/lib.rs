//! Core library for invoice and receipt field extraction and anomaly detection.
//!
//! This crate provides:
//! - Tokenizing of noisy OCR text into typed candidate tokens
//! - Resolution of candidates into a canonical financial record
//! - Completeness, arithmetic and duplicate checks over resolved records
//! - Interfaces for the OCR, classifier and summarizer collaborators

pub mod anomaly;
pub mod collab;
pub mod error;
pub mod extraction;
pub mod models;
pub mod pipeline;

pub use anomaly::{AnomalyChecker, Fingerprint, FingerprintEntry, FingerprintIndex, InMemoryFingerprintIndex};
pub use collab::{
    Classification, DocumentClassifier, DocumentType, KeywordClassifier, OcrProvider,
    PlainTextProvider, RawDocument, Summarizer, TemplateSummarizer,
};
pub use error::{FincheckError, Result, SummaryError};
pub use extraction::{resolve, tokenize, Recognizer, ScanContext, Tokenizer};
pub use models::anomaly::{Anomaly, AnomalyCode, Severity};
pub use models::config::{AnomalyConfig, DateOrder, ExtractionConfig, FincheckConfig};
pub use models::record::{FinancialRecord, LineItem, MonetaryField};
pub use models::token::{AmountRole, CandidateToken, TokenKind, TokenValue};
pub use pipeline::{AnalysisReport, Analyzer, Engine, ProcessedDocument};
