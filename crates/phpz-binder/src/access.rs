//! The access-mode model.
//!
//! Every bound expression records *how* it will be used: plain read, write,
//! aliasing read/write, quiet read (missing-value diagnostics suppressed),
//! ensure (the container must be materialized as an array/object so a child
//! write can land), or unset. Binding decisions that encode PHP's
//! copy-on-write and autovivification semantics all flow from this value,
//! and consumers query only the derived predicates — never raw bits.
//!
//! Values are immutable; the `with_*` combinators return a new value and
//! enforce the construction invariant that at most one of
//! `{ensure-array, ensure-object, read-ref}` is set.

use phpz_solver::TypeRefMask;
use serde::Serialize;
use std::fmt;

/// Raw access flag bits. Kept private to the model; use the predicates.
pub mod access_flags {
    pub const NONE: u16 = 0;
    pub const READ: u16 = 1 << 0;
    pub const WRITE: u16 = 1 << 1;
    /// Aliasing access; combines with READ or WRITE.
    pub const REF: u16 = 1 << 2;
    /// Suppress missing-variable/member diagnostics.
    pub const QUIET: u16 = 1 << 3;
    /// The expression must yield an object a member write can target.
    pub const ENSURE_OBJECT: u16 = 1 << 4;
    /// The expression must yield an array an item write can target.
    pub const ENSURE_ARRAY: u16 = 1 << 5;
    pub const UNSET: u16 = 1 << 6;
    /// `isset()` operand.
    pub const ISSET: u16 = 1 << 7;
    /// The result is known to never be an alias.
    pub const NOT_REF: u16 = 1 << 8;
}

use access_flags as f;

/// How an expression is used by its parent.
#[derive(Copy, Clone, PartialEq, Eq, Serialize)]
pub struct AccessMode {
    flags: u16,
    /// Union of the types assigned through this access.
    write_mask: TypeRefMask,
}

impl AccessMode {
    const fn from_flags(flags: u16) -> Self {
        Self {
            flags,
            write_mask: TypeRefMask::NONE,
        }
    }

    pub const fn none() -> Self {
        Self::from_flags(f::NONE)
    }

    pub const fn read() -> Self {
        Self::from_flags(f::READ)
    }

    pub const fn read_quiet() -> Self {
        Self::from_flags(f::READ | f::QUIET)
    }

    pub fn write(mask: TypeRefMask) -> Self {
        Self::from_flags(f::WRITE).accumulate(mask)
    }

    pub fn write_ref(mask: TypeRefMask) -> Self {
        Self::from_flags(f::WRITE | f::REF).accumulate(mask)
    }

    pub const fn unset() -> Self {
        Self::from_flags(f::UNSET)
    }

    /// `isset()` operand access: a quiet read that also checks existence.
    pub const fn isset() -> Self {
        Self::from_flags(f::ISSET | f::QUIET | f::READ)
    }

    // Fluent combinators. Each returns a new value and re-checks the
    // single-ensure invariant.

    pub fn with_read(self) -> Self {
        Self {
            flags: self.flags | f::READ,
            ..self
        }
        .checked()
    }

    pub fn with_write(self, mask: TypeRefMask) -> Self {
        Self {
            flags: self.flags | f::WRITE,
            ..self
        }
        .accumulate(mask)
        .checked()
    }

    pub fn with_write_ref(self, mask: TypeRefMask) -> Self {
        Self {
            flags: self.flags | f::WRITE | f::REF,
            ..self
        }
        .accumulate(mask)
        .checked()
    }

    pub fn with_read_ref(self) -> Self {
        Self {
            flags: self.flags | f::READ | f::REF,
            ..self
        }
        .checked()
    }

    pub fn with_quiet(self) -> Self {
        Self {
            flags: self.flags | f::QUIET,
            ..self
        }
    }

    pub fn with_ensure_object(self) -> Self {
        Self {
            flags: self.flags | f::ENSURE_OBJECT | f::READ,
            ..self
        }
        .checked()
    }

    pub fn with_ensure_array(self) -> Self {
        Self {
            flags: self.flags | f::ENSURE_ARRAY | f::READ,
            ..self
        }
        .checked()
    }

    pub fn with_not_ref(self) -> Self {
        Self {
            flags: self.flags | f::NOT_REF,
            ..self
        }
    }

    fn accumulate(mut self, mask: TypeRefMask) -> Self {
        self.write_mask |= mask;
        self
    }

    /// The single-ensure invariant: an expression can be asked to
    /// materialize as an array, as an object, or as an alias — never more
    /// than one at a time. Violations are compiler bugs, so this is a hard
    /// construction-time check.
    fn checked(self) -> Self {
        let ensure_array = self.flags & f::ENSURE_ARRAY != 0;
        let ensure_object = self.flags & f::ENSURE_OBJECT != 0;
        let read_ref = self.flags & (f::REF | f::READ) == (f::REF | f::READ)
            && self.flags & f::WRITE == 0;
        let count =
            usize::from(ensure_array) + usize::from(ensure_object) + usize::from(read_ref);
        assert!(
            count <= 1,
            "access invariant violated: EnsureArray/EnsureObject/ReadRef are mutually exclusive ({self:?})"
        );
        self
    }

    // Derived predicates.

    pub const fn is_none(self) -> bool {
        self.flags == f::NONE
    }

    pub const fn is_read(self) -> bool {
        self.flags & f::READ != 0
    }

    pub const fn is_write(self) -> bool {
        self.flags & f::WRITE != 0
    }

    pub const fn is_read_ref(self) -> bool {
        self.flags & (f::REF | f::READ) == (f::REF | f::READ) && self.flags & f::WRITE == 0
    }

    pub const fn is_write_ref(self) -> bool {
        self.flags & (f::REF | f::WRITE) == (f::REF | f::WRITE)
    }

    pub const fn is_quiet(self) -> bool {
        self.flags & f::QUIET != 0
    }

    pub const fn is_unset(self) -> bool {
        self.flags & f::UNSET != 0
    }

    pub const fn is_isset(self) -> bool {
        self.flags & f::ISSET != 0
    }

    pub const fn is_not_ref(self) -> bool {
        self.flags & f::NOT_REF != 0
    }

    pub const fn ensure_object(self) -> bool {
        self.flags & f::ENSURE_OBJECT != 0
    }

    pub const fn ensure_array(self) -> bool {
        self.flags & f::ENSURE_ARRAY != 0
    }

    /// Ensure accesses are the ones that may materialize a container
    /// without being writes themselves.
    pub const fn is_ensure(self) -> bool {
        self.ensure_object() || self.ensure_array() || self.is_read_ref()
    }

    /// Whether evaluating under this access may change the target.
    pub const fn might_change(self) -> bool {
        self.is_write() || self.is_unset() || self.is_ensure()
    }

    /// Union of the type masks written through this access so far.
    pub const fn write_mask(self) -> TypeRefMask {
        self.write_mask
    }
}

impl Default for AccessMode {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for AccessMode {
    fn fmt(&self, fmt_: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: &[(u16, &str)] = &[
            (f::READ, "Read"),
            (f::WRITE, "Write"),
            (f::REF, "Ref"),
            (f::QUIET, "Quiet"),
            (f::ENSURE_OBJECT, "EnsureObject"),
            (f::ENSURE_ARRAY, "EnsureArray"),
            (f::UNSET, "Unset"),
            (f::ISSET, "Isset"),
            (f::NOT_REF, "NotRef"),
        ];
        write!(fmt_, "AccessMode(")?;
        let mut wrote = false;
        for &(bit, name) in NAMES {
            if self.flags & bit != 0 {
                if wrote {
                    write!(fmt_, "|")?;
                }
                write!(fmt_, "{name}")?;
                wrote = true;
            }
        }
        if !wrote {
            write!(fmt_, "None")?;
        }
        write!(fmt_, ")")
    }
}
