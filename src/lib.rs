//! Ghost Monitor - tail game server logs and forward matched events to webhooks.

pub mod config;
pub mod extract;
pub mod sink;
pub mod status;
pub mod supervisor;
pub mod templates;
pub mod watcher;
