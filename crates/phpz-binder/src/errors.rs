//! Binder failure modes.
//!
//! These are fatal for the enclosing routine: the driver aborts that
//! routine's compilation and reports a diagnostic. They are *not* PHP source
//! errors — those bind to valid nodes with a marker and analysis continues.

use phpz_common::span::Span;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BindError {
    /// A syntax shape without a binding rule yet.
    #[error("construct not yet supported: {construct}")]
    NotImplemented { construct: &'static str, span: Span },

    /// A fixed non-goal, not a missing feature.
    #[error("call to '{routine}' is unsupported: by-reference parameters")]
    ByRefParameter { routine: String, span: Span },

    /// Expression nesting exceeded the depth guard.
    #[error("expression nesting too deep while binding")]
    TooDeep { span: Span },
}

impl BindError {
    pub fn span(&self) -> Span {
        match self {
            BindError::NotImplemented { span, .. }
            | BindError::ByRefParameter { span, .. }
            | BindError::TooDeep { span } => *span,
        }
    }
}
