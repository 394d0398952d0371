//! Servers exposing the Siteflow tools over a protocol.

pub mod mcp;
