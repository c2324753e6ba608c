//! Webhook sink tests.

mod sink_test;
