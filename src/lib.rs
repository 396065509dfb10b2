//! # sketch-ci - compile every test sketch against every board
//!
//! A CI helper for microcontroller libraries. It expands a set of sketch glob
//! patterns, runs an external build driver (PlatformIO by default) once per
//! (sketch, board) pair with the sketch path in an environment variable,
//! prints a `PASS:`/`FAIL:` line per attempt and dumps the captured compiler
//! output of every failure at the end.
//!
//! ## Quick Start
//!
//! ```bash
//! # Use the built-in board list and sketch patterns
//! compile-all
//!
//! # Four builds at a time, JSON summary for the CI dashboard
//! compile-all --jobs 4 --report build/sketches.json
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Board list, sketch patterns, `compile_all.toml`
//! - [`discovery`] - Glob expansion into the sketch set
//! - [`driver`] - Build driver invocation and output capture
//! - [`runner`] - The sketch × board loop, sequential or pooled
//! - [`report`] - Log lines, failure dump, exit code, JSON summary
//! - [`commands`] - CLI command handlers

/// CLI command handlers extracted from main.
pub mod commands;

/// Run configuration (`compile_all.toml`).
pub mod config;

/// Sketch discovery from glob patterns.
pub mod discovery;

/// External build driver invocation.
pub mod driver;

/// Fatal run errors.
pub mod error;

/// Results and console reporting.
pub mod report;

/// Sketch × board scheduling.
pub mod runner;
