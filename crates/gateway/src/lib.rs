//! Tour-guide gateway: dialogue orchestration, web search, HTTP API and CLI.

pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod runtime;
pub mod search;
pub mod server;
pub mod state;
