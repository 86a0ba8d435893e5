//! Common types and utilities for the phpz PHP compiler.
//!
//! This crate provides foundational types used across all phpz crates:
//! - Source spans (`Span`, `Spanned`)
//! - Diagnostics (`Diagnostic`, `DiagnosticCategory`, diagnostic codes)
//! - Centralized limits and thresholds
//! - Analysis options

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::{Span, Spanned};

// Diagnostics for PHP source-level problems
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, diagnostic_codes};

// Centralized limits and thresholds
pub mod limits;

// Analysis configuration
pub mod options;
pub use options::AnalysisOptions;
