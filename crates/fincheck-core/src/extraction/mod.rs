//! Field extraction: text to candidate tokens to a resolved record.

pub mod resolver;
pub mod rules;
pub mod tokenizer;

pub use resolver::resolve;
pub use rules::{Recognizer, ScanContext};
pub use tokenizer::{tokenize, Tokenizer};
