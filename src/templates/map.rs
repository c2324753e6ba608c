//! Message keys, template mappings and placeholder substitution.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use ini::{Ini, ParseOption};
use serde::Deserialize;

use super::TemplateError;

/// Section holding the templates, matched case-insensitively.
const SECTION: &str = "MESSAGES";

/// Recognized template keys, one per templated event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    /// `creating game [...]`
    Create,
    /// `player [user|ip] joined the game`
    Player,
    /// `deleting player [user]:`
    Leave,
    /// `connecting to server [...]`
    Connect,
}

impl MessageKey {
    pub const ALL: [Self; 4] = [Self::Create, Self::Player, Self::Leave, Self::Connect];

    /// Key name as it appears in the template source.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "messagecreate",
            Self::Player => "messageplayer",
            Self::Leave => "messagetoleave",
            Self::Connect => "messagetoconnect",
        }
    }

    /// Built-in template used when the source has no entry for this key.
    #[must_use]
    pub fn default_template(self) -> &'static str {
        match self {
            Self::Create => "Game created: {game_name}",
            Self::Player => "{user} connected from {ip}",
            Self::Leave => "{user} left the game",
            Self::Connect => "Connected to server {SERVIDOR}",
        }
    }

    /// Placeholders this key's templates may use.
    #[must_use]
    pub fn placeholders(self) -> &'static [&'static str] {
        match self {
            Self::Create => &["{game_name}"],
            Self::Player => &["{user}", "{ip}"],
            Self::Leave => &["{user}"],
            Self::Connect => &["{SERVIDOR}"],
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default, Deserialize)]
struct TemplateFile {
    #[serde(rename = "MESSAGES", alias = "messages", default)]
    messages: HashMap<String, String>,
}

/// Immutable key -> template mapping.
///
/// Lookups never fail: unknown or absent keys fall back to the caller's
/// default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateMap {
    entries: HashMap<String, String>,
}

impl TemplateMap {
    /// Empty mapping; every lookup falls back to its default.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse the template source: an INI file with a `[MESSAGES]` section
    /// of unquoted `key = value` lines, or the same layout as a TOML table.
    /// Section and key names are case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::Parse` if the text is neither valid TOML nor
    /// valid INI.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        match toml::from_str::<TemplateFile>(source) {
            Ok(file) => Ok(file.messages.into_iter().collect()),
            Err(e) => {
                tracing::trace!(error = %e, "Template source is not TOML, reading as INI");
                Self::parse_ini(source)
            }
        }
    }

    fn parse_ini(source: &str) -> Result<Self, TemplateError> {
        let option = ParseOption {
            enabled_escape: false,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_str_opt(source, option)?;
        Ok(ini
            .iter()
            .filter(|(name, _)| matches!(name, Some(n) if n.eq_ignore_ascii_case(SECTION)))
            .flat_map(|(_, props)| props.iter())
            .collect())
    }

    /// Read and parse a template source file.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::Read` if the file cannot be read, or
    /// `TemplateError::Parse` if it is malformed.
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let content = std::fs::read_to_string(path).map_err(|e| TemplateError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Look up a raw key, falling back to `default`.
    #[must_use]
    pub fn get<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.entries
            .get(&key.to_ascii_lowercase())
            .map_or(default, String::as_str)
    }

    /// Template for `key`, or its built-in default.
    #[must_use]
    pub fn template(&self, key: MessageKey) -> &str {
        self.get(key.as_str(), key.default_template())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TemplateMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into().to_ascii_lowercase(), v.into()))
                .collect(),
        }
    }
}

/// Replace each `(placeholder, value)` token in `template` in a single pass.
///
/// Substituted values are never rescanned, so a captured value that happens
/// to contain a placeholder is inserted verbatim. Unknown `{...}` tokens are
/// left as they are.
#[must_use]
pub fn substitute(template: &str, replacements: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let candidate = &rest[open..];
        match replacements
            .iter()
            .find(|(token, _)| candidate.starts_with(token))
        {
            Some((token, value)) => {
                out.push_str(value);
                rest = &candidate[token.len()..];
            }
            None => {
                out.push('{');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
