//! timewarp-mcp library
//!
//! This module exports the history engine and the MCP surface of
//! timewarp-mcp for use in integration tests and as a library.

pub mod config;
pub mod dates;
pub mod handlers;
pub mod history;
pub mod reset;
pub mod server;
pub mod synth;
pub mod validation;
