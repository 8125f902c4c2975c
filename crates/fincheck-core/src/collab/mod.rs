//! Interfaces to the collaborators around the engine.
//!
//! The engine itself never calls these; [`crate::pipeline::Analyzer`] wires
//! them together the way a surrounding service would.

pub mod classifier;
pub mod ocr;
pub mod summarizer;

pub use classifier::{Classification, DocumentClassifier, DocumentType, KeywordClassifier};
pub use ocr::{OcrProvider, PlainTextProvider, RawDocument};
pub use summarizer::{Summarizer, TemplateSummarizer};
