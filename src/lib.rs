//! FitCo Library
//!
//! Nutrition targets, food logging and progress streaks behind an MCP server.

pub mod build_info;
pub mod db;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod tools;
