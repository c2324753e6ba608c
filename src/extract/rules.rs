//! Extraction rule table.
//!
//! Each rule pairs a line pattern with a way of rendering its captures.
//! Rules are tried in table order and the first match wins.

use regex::{Captures, Regex};

use crate::templates::{substitute, MessageKey, TemplateMap};

use super::ExtractError;

/// Kind of event a rule recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    GameCreated,
    PlayerJoined,
    PlayerLeft,
    ServerConnect,
    /// Chat line with a `[GAME: ...]` prefix and a channel tag.
    Chat,
    /// Line starting with `[Lobby] `, forwarded as is.
    LobbyPassthrough,
}

/// How a matched line becomes a message.
#[derive(Debug, Clone, Copy)]
enum Render {
    /// Look up `key` and substitute `(placeholder, capture group)` pairs.
    Template {
        key: MessageKey,
        captures: &'static [(&'static str, usize)],
    },
    /// `[<game>] <user>: <message>` from groups 1, 4 and 5, each trimmed.
    Chat,
    /// The whole line, unchanged.
    Verbatim,
}

/// A single extraction rule.
#[derive(Debug, Clone)]
pub struct Rule {
    kind: EventKind,
    pattern: Regex,
    render: Render,
}

impl Rule {
    fn new(kind: EventKind, pattern: &str, render: Render) -> Result<Self, ExtractError> {
        Ok(Self {
            kind,
            pattern: Regex::new(pattern)?,
            render,
        })
    }

    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Pattern string (for debugging/display).
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Render `line` if this rule matches it.
    #[must_use]
    pub fn apply(&self, line: &str, templates: &TemplateMap) -> Option<String> {
        let caps = self.pattern.captures(line)?;
        Some(match self.render {
            Render::Template { key, captures } => {
                let values: Vec<(&str, &str)> = captures
                    .iter()
                    .map(|&(token, group)| (token, group_str(&caps, group)))
                    .collect();
                substitute(templates.template(key), &values)
            }
            Render::Chat => format!(
                "[{}] {}: {}",
                group_str(&caps, 1).trim(),
                group_str(&caps, 4).trim(),
                group_str(&caps, 5).trim()
            ),
            Render::Verbatim => line.to_string(),
        })
    }
}

fn group_str<'a>(caps: &Captures<'a>, group: usize) -> &'a str {
    caps.get(group).map_or("", |m| m.as_str())
}

/// Which optional rules are enabled.
///
/// The core rules (game created, player joined, player left, chat) are
/// always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleSet {
    pub server_connect: bool,
    pub lobby_passthrough: bool,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            server_connect: true,
            lobby_passthrough: true,
        }
    }
}

impl RuleSet {
    /// Only the core rules.
    #[must_use]
    pub fn core() -> Self {
        Self {
            server_connect: false,
            lobby_passthrough: false,
        }
    }

    /// Compile the rule table in match order.
    pub(crate) fn build(self) -> Vec<Result<Rule, ExtractError>> {
        let mut rules = vec![
            Rule::new(
                EventKind::GameCreated,
                r"creating game \[(.*)\]",
                Render::Template {
                    key: MessageKey::Create,
                    captures: &[("{game_name}", 1)],
                },
            ),
            Rule::new(
                EventKind::PlayerJoined,
                r"player \[(.*)\|(.+?)\] joined the game",
                Render::Template {
                    key: MessageKey::Player,
                    captures: &[("{user}", 1), ("{ip}", 2)],
                },
            ),
            Rule::new(
                EventKind::PlayerLeft,
                r"deleting player \[(.*)\]:",
                Render::Template {
                    key: MessageKey::Leave,
                    captures: &[("{user}", 1)],
                },
            ),
        ];

        if self.server_connect {
            rules.push(Rule::new(
                EventKind::ServerConnect,
                r"connecting to server \[(.*?)\]",
                Render::Template {
                    key: MessageKey::Connect,
                    captures: &[("{SERVIDOR}", 1)],
                },
            ));
        }

        rules.push(Rule::new(
            EventKind::Chat,
            r"\[GAME:\s*(.*?)\](?:.*?\((\d{1,2}:\d{2})\))?.*?\[(Lobby|All|Team|Observer)\]\s*\[(.*?)\]:\s*(.+)",
            Render::Chat,
        ));

        if self.lobby_passthrough {
            rules.push(Rule::new(
                EventKind::LobbyPassthrough,
                r"^\[Lobby\] .+",
                Render::Verbatim,
            ));
        }

        rules
    }
}
