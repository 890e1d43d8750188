//! Field-history audit search: query a remote history service, normalize and sort the
//! returned rows, and export them as CSV.

pub mod cli;
pub mod history;
pub mod service;
pub mod session;

pub const USER_AGENT: &str = concat!("history-search/", env!("CARGO_PKG_VERSION"));
