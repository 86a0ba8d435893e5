//! Conversion classification between static representations.
//!
//! `classify_conversion` answers the question both the binder and the code
//! generator keep asking: can a value of representation `from` become a
//! value of representation `to`, and what does it take. The answer is a
//! datum, never an error — callers fall back to a different
//! [`ConversionKinds`] selection or surface a type-mismatch diagnostic.

use crate::catalog::{MethodId, Repr, TypeCatalog, is_subtype};
use crate::operators::{OperatorQuery, resolve_operator};
use bitflags::bitflags;

bitflags! {
    /// Which conversion families a query is willing to consider.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct ConversionKinds: u8 {
        const NUMERIC = 1 << 0;
        const REFERENCE = 1 << 1;
        /// Disallow user-defined conversion operators.
        const STRICT = 1 << 2;
        const IMPLICIT = 1 << 3;
        const EXPLICIT = 1 << 4;
    }
}

impl ConversionKinds {
    /// Everything an implicit coercion site may use.
    pub fn implicit_all() -> Self {
        Self::NUMERIC | Self::REFERENCE | Self::IMPLICIT
    }

    /// Everything an explicit cast site may use.
    pub fn explicit_all() -> Self {
        Self::NUMERIC | Self::REFERENCE | Self::IMPLICIT | Self::EXPLICIT
    }
}

/// Method name priority list for implicit user-defined conversions.
pub const IMPLICIT_OPERATOR_NAMES: &[&str] = &["op_Implicit"];

/// Method name priority list for explicit user-defined conversions. The
/// string-representation conversions come right after the dedicated cast
/// operator; they are the cheapest user-defined conversions.
pub const EXPLICIT_OPERATOR_NAMES: &[&str] = &[
    "op_Explicit",
    "ToString",
    "ToBoolean",
    "ToLong",
    "ToDouble",
    "ToArray",
];

/// The classification result.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Conversion {
    /// Same representation; nothing to emit.
    Identity,
    /// No conversion exists under the requested kinds.
    NoConversion,
    /// Implicit reference conversion (upcast).
    Reference,
    /// Checked reference conversion (downcast or special-to-object).
    ExplicitReference,
    Numeric {
        explicit: bool,
    },
    /// Call this method to convert.
    UserDefined(MethodId),
}

impl Conversion {
    pub fn exists(self) -> bool {
        !matches!(self, Conversion::NoConversion)
    }

    pub fn is_explicit(self) -> bool {
        matches!(
            self,
            Conversion::ExplicitReference | Conversion::Numeric { explicit: true }
        )
    }
}

/// Numeric widening test: a conversion is implicit when the target can hold
/// every source value — size does not shrink, integers may gain but not lose
/// a sign, and floating targets accept any integer source.
fn numeric_is_implicit(from: &Repr, to: &Repr) -> Option<bool> {
    let f = from.numeric_info()?;
    let t = to.numeric_info()?;
    if t.is_floating {
        return Some(true);
    }
    if f.is_floating {
        // Narrowing a float to an integer always truncates.
        return Some(false);
    }
    let sign_ok = if f.is_signed {
        t.is_signed
    } else {
        // Unsigned fits a signed target only with room for the sign bit.
        t.is_signed && t.bit_size > f.bit_size || !t.is_signed
    };
    Some(sign_ok && t.bit_size >= f.bit_size)
}

/// Classify the conversion from `from` to `to` under the requested kinds.
///
/// `Identity` always wins; numeric and reference conversions are tried next;
/// user-defined conversion operators are consulted last unless `STRICT`.
pub fn classify_conversion(
    catalog: &dyn TypeCatalog,
    from: &Repr,
    to: &Repr,
    kinds: ConversionKinds,
) -> Conversion {
    if from == to {
        return Conversion::Identity;
    }

    if kinds.contains(ConversionKinds::NUMERIC)
        && let Some(implicit) = numeric_is_implicit(from, to)
    {
        if implicit && kinds.contains(ConversionKinds::IMPLICIT) {
            return Conversion::Numeric { explicit: false };
        }
        if kinds.contains(ConversionKinds::EXPLICIT) {
            return Conversion::Numeric { explicit: true };
        }
        return Conversion::NoConversion;
    }

    if kinds.contains(ConversionKinds::REFERENCE)
        && from.is_reference_type()
        && to.is_reference_type()
    {
        // Special PHP representations never implicitly decay to object.
        let decays_special = from.is_special_reference() && *to == Repr::ObjectBase;
        if !decays_special && is_subtype(catalog, from, to) {
            if kinds.contains(ConversionKinds::IMPLICIT) {
                return Conversion::Reference;
            }
            if kinds.contains(ConversionKinds::EXPLICIT) {
                return Conversion::ExplicitReference;
            }
        }
        // Downcasts and special-to-object need an explicit, checked cast.
        if kinds.contains(ConversionKinds::EXPLICIT)
            && (decays_special || is_subtype(catalog, to, from))
        {
            return Conversion::ExplicitReference;
        }
    }

    if !kinds.contains(ConversionKinds::STRICT)
        && let Repr::Object(class) = from
    {
        let names = if kinds.contains(ConversionKinds::EXPLICIT) {
            EXPLICIT_OPERATOR_NAMES
        } else {
            IMPLICIT_OPERATOR_NAMES
        };
        let query = OperatorQuery {
            receiver: *class,
            has_ref: false,
            names,
            extensions: &[],
            operand: None,
            target: Some(to),
        };
        if let Some(method) = resolve_operator(catalog, &query) {
            return Conversion::UserDefined(method);
        }
    }

    Conversion::NoConversion
}
