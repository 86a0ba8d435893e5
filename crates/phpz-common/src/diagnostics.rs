//! Diagnostics for PHP source-level problems.
//!
//! These describe conditions the language itself permits (reading an
//! undefined variable, for instance): analysis records them and keeps going.
//! They are distinct from binder errors, which abort the enclosing routine.

use crate::span::Span;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Notice,
}

/// Diagnostic codes for the semantic core.
pub mod diagnostic_codes {
    /// Use of a variable that may not have been assigned on some path.
    pub const UNDEFINED_VARIABLE: u32 = 5001;
    /// Static call on something that is not a class.
    pub const UNDEFINED_TYPE: u32 = 5002;
    /// Call to a function the resolver does not know.
    pub const UNDEFINED_FUNCTION: u32 = 5003;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(code: u32, span: Span, message: impl Into<String>) -> Self {
        Self {
            category: DiagnosticCategory::Warning,
            code,
            span,
            message: message.into(),
        }
    }

    pub fn error(code: u32, span: Span, message: impl Into<String>) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            code,
            span,
            message: message.into(),
        }
    }

    pub fn notice(code: u32, span: Span, message: impl Into<String>) -> Self {
        Self {
            category: DiagnosticCategory::Notice,
            code,
            span,
            message: message.into(),
        }
    }
}
