//! bfs CLI library
//!
//! Command definitions, output formatting and exit codes, shared by the
//! `bfs` binary and its tests.

pub mod commands;
pub mod exit_code;
pub mod output;
