//! Line-to-notification extraction.

use std::fmt;

use crate::templates::TemplateMap;

use super::rules::{EventKind, Rule, RuleSet};
use super::ExtractError;

/// A notification rendered from one matched line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEvent {
    /// Which rule produced it.
    pub kind: EventKind,
    /// The text to deliver.
    pub message: String,
}

impl RenderedEvent {
    #[must_use]
    pub fn into_message(self) -> String {
        self.message
    }
}

impl fmt::Display for RenderedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Applies the ordered rule table to log lines.
#[derive(Debug, Clone)]
pub struct EventExtractor {
    rules: Vec<Rule>,
}

impl Default for EventExtractor {
    fn default() -> Self {
        Self::new(RuleSet::default())
    }
}

impl EventExtractor {
    /// Build an extractor for the given rule selection.
    #[must_use]
    pub fn new(set: RuleSet) -> Self {
        let rules = set
            .build()
            .into_iter()
            .filter_map(|result| match result {
                Ok(rule) => Some(rule),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to compile extraction rule");
                    None
                }
            })
            .collect();
        Self { rules }
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Render `line` with the first matching rule, or `None` if no rule
    /// matches.
    #[must_use]
    pub fn extract(&self, line: &str, templates: &TemplateMap) -> Option<RenderedEvent> {
        self.rules.iter().find_map(|rule| {
            rule.apply(line, templates).map(|message| RenderedEvent {
                kind: rule.kind(),
                message,
            })
        })
    }

    /// Decode a raw line and extract from it.
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::Encoding` if the line is not valid UTF-8.
    pub fn extract_bytes(
        &self,
        line: &[u8],
        templates: &TemplateMap,
    ) -> Result<Option<RenderedEvent>, ExtractError> {
        let line = std::str::from_utf8(line)?;
        Ok(self.extract(line, templates))
    }
}
