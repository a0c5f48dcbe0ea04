//! Shared domain types for the tour-guide gateway: configuration, the
//! common error type, structured trace events, provider-agnostic chat/tool
//! types and usage counters.

pub mod config;
pub mod error;
pub mod tool;
pub mod trace;
pub mod usage;
