//! Integration tests for ocean-client.
//!
//! These tests run the stream transport against an in-process websocket
//! server.

pub mod common;
