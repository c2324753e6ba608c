//! Configuration module.

mod loader;
mod stamp;
mod targets;

pub use loader::*;
pub use stamp::*;
pub use targets::*;
