//! MCP server wiring

mod server;

pub use server::FitcoService;
