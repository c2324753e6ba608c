//! Event extraction: turns raw log lines into rendered notifications.

mod extractor;
mod rules;

pub use extractor::{EventExtractor, RenderedEvent};
pub use rules::{EventKind, Rule, RuleSet};

/// Errors raised while extracting from a line.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    /// The line is not valid UTF-8.
    #[error("Line is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// A rule pattern failed to compile.
    #[error("Invalid rule pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}
