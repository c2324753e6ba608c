//! Supervisor module: group lifecycle of watchers and target-list reloads.

mod group;
mod reload;

pub use group::*;
pub use reload::*;
