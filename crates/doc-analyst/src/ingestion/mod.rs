//! Document ingestion: format-aware text extraction

mod extractor;

pub use extractor::TextExtractor;
