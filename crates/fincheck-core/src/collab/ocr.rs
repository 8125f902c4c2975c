//! OCR provider interface.

use std::path::{Path, PathBuf};

use crate::error::{FincheckError, Result};

/// Text produced by an OCR provider for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub text: String,
    pub source: Option<PathBuf>,
}

impl RawDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Trait for OCR backends.
pub trait OcrProvider: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Produce raw text for the document at `path`.
    fn extract_text(&self, path: &Path) -> Result<RawDocument>;
}

/// Provider for documents that were already OCR'd to UTF-8 text files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextProvider;

impl PlainTextProvider {
    pub fn new() -> Self {
        Self
    }
}

impl OcrProvider for PlainTextProvider {
    fn name(&self) -> &'static str {
        "plain-text"
    }

    fn extract_text(&self, path: &Path) -> Result<RawDocument> {
        let bytes = std::fs::read(path)?;
        let text = String::from_utf8(bytes).map_err(|_| {
            FincheckError::InvalidInput(format!("{} is not UTF-8 text", path.display()))
        })?;
        Ok(RawDocument::new(text).with_source(path))
    }
}
