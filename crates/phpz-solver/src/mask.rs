//! `TypeRefMask` — the per-routine type approximation lattice.
//!
//! A mask is a fixed-width set of bits over the value kinds an expression or
//! variable may hold at a program point. The low bits are the same in every
//! routine (primitives and the special PHP value representations); bits from
//! [`TypeRefMask::FIRST_CLASS_BIT`] up are handed out by
//! [`TypeRefContext`](crate::context::TypeRefContext) to class types seen in
//! the routine. The top bit is the "anything" overflow.
//!
//! Merge is bitwise OR: commutative, associative, idempotent. The universe
//! is finite per routine, so repeated merges form a finite join-semilattice
//! and any monotone dataflow over masks terminates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRefMask(pub u64);

impl TypeRefMask {
    /// The empty mask. A variable slot that was never written.
    pub const NONE: Self = Self(0);

    /// Not yet assigned on some path reaching this point.
    pub const UNINITIALIZED: Self = Self(1 << 0);
    pub const NULL: Self = Self(1 << 1);
    pub const BOOLEAN: Self = Self(1 << 2);
    pub const LONG: Self = Self(1 << 3);
    pub const DOUBLE: Self = Self(1 << 4);
    /// The mutable string representation (string builder / byte buffer).
    pub const WRITABLE_STRING: Self = Self(1 << 5);
    pub const STRING: Self = Self(1 << 6);
    pub const ARRAY: Self = Self(1 << 7);
    pub const LAMBDA: Self = Self(1 << 8);
    pub const RESOURCE: Self = Self(1 << 9);
    /// An object of statically unknown class.
    pub const OBJECT: Self = Self(1 << 10);

    /// First bit available for per-routine class types.
    pub const FIRST_CLASS_BIT: u32 = 11;
    /// Last bit available for per-routine class types (inclusive).
    pub const LAST_CLASS_BIT: u32 = 61;

    /// The value (or one alias target) is a PHP reference.
    pub const IS_REF: Self = Self(1 << 62);
    /// Overflow bit: any value kind at all.
    pub const ANYTHING: Self = Self(1 << 63);

    /// Both numeric kinds.
    pub const NUMBER: Self = Self(Self::LONG.0 | Self::DOUBLE.0);
    /// Both string representations.
    pub const STRINGS: Self = Self(Self::STRING.0 | Self::WRITABLE_STRING.0);

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    pub const fn is_anything(self) -> bool {
        self.0 & Self::ANYTHING.0 != 0
    }

    pub const fn is_ref(self) -> bool {
        self.0 & Self::IS_REF.0 != 0
    }

    pub const fn is_uninitialized(self) -> bool {
        self.0 & Self::UNINITIALIZED.0 != 0
    }

    /// True when every bit of `other` is present in `self`. An anything-mask
    /// includes every mask.
    pub const fn includes(self, other: Self) -> bool {
        self.is_anything() || (self.0 & other.0) == other.0
    }

    /// True when any bit of `other` is present in `self`.
    pub const fn intersects(self, other: Self) -> bool {
        self.is_anything() || (self.0 & other.0) != 0
    }

    /// The lattice join.
    pub const fn merge(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Remove `other`'s bits. The ref and anything bits survive removal of
    /// value-kind bits only if not named explicitly.
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub const fn with_refs(self) -> Self {
        Self(self.0 | Self::IS_REF.0)
    }

    pub const fn without_refs(self) -> Self {
        Self(self.0 & !Self::IS_REF.0)
    }

    /// True if the mask holds exactly one value-kind bit (ref/anything bits
    /// are not value kinds).
    pub const fn is_single_kind(self) -> bool {
        let kinds = self.0 & !(Self::IS_REF.0 | Self::ANYTHING.0);
        kinds != 0 && (kinds & (kinds.wrapping_sub(1))) == 0
    }

    /// True when only numeric bits (and possibly ref) are present.
    pub const fn is_number_only(self) -> bool {
        !self.is_anything()
            && self.0 & !(Self::NUMBER.0 | Self::IS_REF.0) == 0
            && self.0 & Self::NUMBER.0 != 0
    }

    /// Mask of a class-type bit index allocated by the routine's context.
    pub const fn from_class_bit(bit: u32) -> Self {
        Self(1 << bit)
    }

    /// True when any per-routine class bit is set.
    pub const fn has_class_bits(self) -> bool {
        const CLASS_RANGE: u64 = {
            let mut m = 0u64;
            let mut b = TypeRefMask::FIRST_CLASS_BIT;
            while b <= TypeRefMask::LAST_CLASS_BIT {
                m |= 1 << b;
                b += 1;
            }
            m
        };
        self.0 & CLASS_RANGE != 0
    }
}

impl BitOr for TypeRefMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for TypeRefMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for TypeRefMask {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Debug for TypeRefMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: &[(TypeRefMask, &str)] = &[
            (TypeRefMask::UNINITIALIZED, "uninit"),
            (TypeRefMask::NULL, "null"),
            (TypeRefMask::BOOLEAN, "bool"),
            (TypeRefMask::LONG, "long"),
            (TypeRefMask::DOUBLE, "double"),
            (TypeRefMask::WRITABLE_STRING, "wstring"),
            (TypeRefMask::STRING, "string"),
            (TypeRefMask::ARRAY, "array"),
            (TypeRefMask::LAMBDA, "lambda"),
            (TypeRefMask::RESOURCE, "resource"),
            (TypeRefMask::OBJECT, "object"),
            (TypeRefMask::IS_REF, "&ref"),
            (TypeRefMask::ANYTHING, "anything"),
        ];
        let mut wrote = false;
        write!(f, "TypeRefMask(")?;
        for &(bit, name) in NAMES {
            if self.0 & bit.0 != 0 {
                if wrote {
                    write!(f, "|")?;
                }
                write!(f, "{name}")?;
                wrote = true;
            }
        }
        for bit in Self::FIRST_CLASS_BIT..=Self::LAST_CLASS_BIT {
            if self.0 & (1 << bit) != 0 {
                if wrote {
                    write!(f, "|")?;
                }
                write!(f, "class#{bit}")?;
                wrote = true;
            }
        }
        if !wrote {
            write!(f, "none")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn single_kind_ignores_ref_bit() {
        let m = TypeRefMask::LONG.with_refs();
        assert!(m.is_single_kind());
        assert!(!(TypeRefMask::LONG | TypeRefMask::DOUBLE).is_single_kind());
        assert!(!TypeRefMask::NONE.is_single_kind());
    }

    #[test]
    fn anything_includes_everything() {
        assert!(TypeRefMask::ANYTHING.includes(TypeRefMask::ARRAY | TypeRefMask::NULL));
    }
}
