//! Siteflow workflow management as callable tools.
//!
//! Builds on [`siteflow_api`] and adds:
//! - Configuration from the environment and `.env` files
//! - Argument marshaling and text rendering for each tool
//! - An MCP server (stdio) and a CLI exposing the same tools

pub mod commands;
pub mod config;
pub mod format;
pub mod serve;
pub mod tools;
