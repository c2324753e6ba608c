//! Supervisor tests.

mod pipeline_test;
mod reload_test;
