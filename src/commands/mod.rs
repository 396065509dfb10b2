//! CLI command handlers
//!
//! Kept out of main.rs so the binary only parses arguments and picks an exit code.

pub mod compile_all;

pub use compile_all::{CompileOptions, compile_all};
