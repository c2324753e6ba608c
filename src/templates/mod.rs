//! Message templates: recognized keys, mappings and the shared store.

mod map;
mod store;

use std::path::PathBuf;

pub use map::{substitute, MessageKey, TemplateMap};
pub use store::TemplateStore;

/// Errors from reading or parsing the template source.
#[derive(thiserror::Error, Debug)]
pub enum TemplateError {
    #[error("Failed to read templates {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed templates: {0}")]
    Parse(#[from] ini::ParseError),
}
