//! Engine entry points: tokenize, resolve and check one document.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::anomaly::{AnomalyChecker, FingerprintIndex, InMemoryFingerprintIndex};
use crate::collab::{
    Classification, DocumentClassifier, DocumentType, KeywordClassifier, RawDocument, Summarizer,
    TemplateSummarizer,
};
use crate::error::{FincheckError, Result, SummaryError};
use crate::extraction::{resolve, Tokenizer};
use crate::models::anomaly::Anomaly;
use crate::models::config::FincheckConfig;
use crate::models::record::FinancialRecord;

/// A resolved record together with the anomalies found in it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedDocument {
    pub record: FinancialRecord,
    pub anomalies: Vec<Anomaly>,
    /// Number of candidate tokens the record was resolved from.
    pub token_count: usize,
}

/// Field extraction and anomaly detection engine.
///
/// Synchronous and free of I/O. The fingerprint index is the only shared
/// state; clone the `Arc` into several engines to share duplicate detection
/// between them.
pub struct Engine {
    config: FincheckConfig,
    tokenizer: Tokenizer,
    checker: AnomalyChecker,
    index: Arc<dyn FingerprintIndex>,
}

impl Engine {
    pub fn new(config: FincheckConfig, index: Arc<dyn FingerprintIndex>) -> Self {
        let checker = AnomalyChecker::new(config.anomaly.clone());
        Self {
            config,
            tokenizer: Tokenizer::new(),
            checker,
            index,
        }
    }

    /// Create an engine with its own in-memory index sized from the config.
    pub fn with_default_index(config: FincheckConfig) -> Self {
        let index = match config.index.capacity {
            Some(capacity) => InMemoryFingerprintIndex::with_capacity(capacity),
            None => InMemoryFingerprintIndex::new(),
        };
        Self::new(config, Arc::new(index))
    }

    pub fn config(&self) -> &FincheckConfig {
        &self.config
    }

    pub fn index(&self) -> &Arc<dyn FingerprintIndex> {
        &self.index
    }

    /// Process one document's OCR text.
    pub fn process(&self, text: &str) -> Result<ProcessedDocument> {
        self.process_at(text, Utc::now())
    }

    /// Process one document as if checked at `now`.
    pub fn process_at(&self, text: &str, now: DateTime<Utc>) -> Result<ProcessedDocument> {
        let text = text.trim_start_matches('\u{feff}');
        if text.trim().is_empty() {
            return Err(FincheckError::InvalidInput(
                "document text is empty".to_string(),
            ));
        }

        let tokens = self.tokenizer.tokenize(text, &self.config.extraction);
        debug!("Tokenized document into {} candidates", tokens.len());

        let record = resolve(&tokens, &self.config.extraction);
        let anomalies = self.checker.check_at(&record, self.index.as_ref(), now);

        info!(
            "Processed document from {}: {} anomalies",
            record.vendor.as_deref().unwrap_or("unknown vendor"),
            anomalies.len()
        );

        Ok(ProcessedDocument {
            record,
            anomalies,
            token_count: tokens.len(),
        })
    }

    /// Process raw bytes, which must be UTF-8 text.
    pub fn process_bytes(&self, bytes: &[u8]) -> Result<ProcessedDocument> {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            FincheckError::InvalidInput(format!("document is not UTF-8 text: {}", e))
        })?;
        self.process(text)
    }
}

/// Combined result of the engine and its collaborators for one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub document_type: DocumentType,
    pub classification_confidence: f32,
    pub fields: FinancialRecord,
    pub anomalies: Vec<Anomaly>,
    pub summary: String,
}

/// Runs the engine, a classifier and a summarizer over a document.
pub struct Analyzer {
    engine: Engine,
    classifier: Box<dyn DocumentClassifier>,
    summarizer: Box<dyn Summarizer>,
    template: TemplateSummarizer,
}

impl Analyzer {
    /// Create an analyzer with the keyword classifier and template summarizer.
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            classifier: Box::new(KeywordClassifier::new()),
            summarizer: Box::new(TemplateSummarizer::new()),
            template: TemplateSummarizer::new(),
        }
    }

    /// Set the document classifier.
    pub fn with_classifier(mut self, classifier: impl DocumentClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    /// Set the summarizer backend.
    pub fn with_summarizer(mut self, summarizer: impl Summarizer + 'static) -> Self {
        self.summarizer = Box::new(summarizer);
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Analyze a document produced by an OCR provider.
    pub fn analyze_document(&self, document: &RawDocument) -> Result<AnalysisReport> {
        self.analyze(&document.text)
    }

    /// Analyze one document's text.
    pub fn analyze(&self, text: &str) -> Result<AnalysisReport> {
        let processed = self.engine.process(text)?;
        let Classification {
            document_type,
            confidence,
        } = self.classifier.classify(text);
        let summary = self.summarize(&processed.record, &processed.anomalies)?;

        Ok(AnalysisReport {
            document_type,
            classification_confidence: confidence,
            fields: processed.record,
            anomalies: processed.anomalies,
            summary,
        })
    }

    /// Call the summarizer, retrying transient failures.
    fn summarize(&self, record: &FinancialRecord, anomalies: &[Anomaly]) -> Result<String> {
        let settings = &self.engine.config().summary;
        let mut attempt = 0;

        let error: SummaryError = loop {
            match self.summarizer.summarize(record, anomalies) {
                Ok(summary) => return Ok(summary),
                Err(e) if e.is_transient() && attempt < settings.max_retries => {
                    attempt += 1;
                    warn!("Summarizer attempt {} failed: {}, retrying", attempt, e);
                }
                Err(e) => break e,
            }
        };

        if settings.fallback_to_template {
            warn!("Summarizer failed: {}, using template summary", error);
            Ok(self.template.render(record, anomalies))
        } else {
            Err(error.into())
        }
    }
}
