//! `TypeRefContext` — the per-routine type-bit allocator.
//!
//! Primitive bits are fixed across all routines; class types observed while
//! binding one routine get the next free bit, in first-seen order. The
//! context is created at binder entry and discarded with the routine, so the
//! bit universe — and with it the lattice height of the flow analysis — is
//! finite per routine. Once the bit budget is exhausted, further class types
//! collapse to the anything-mask instead of failing.

use crate::catalog::{ClassId, Repr, TypeCatalog};
use crate::mask::TypeRefMask;
use indexmap::IndexMap;
use phpz_ast::TypeHint;
use tracing::trace;

#[derive(Clone, Debug, Default)]
pub struct TypeRefContext {
    /// Class name → allocated bit, in first-seen order.
    class_bits: IndexMap<String, u32>,
}

impl TypeRefContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mask for a named class type, allocating a bit on first sight.
    /// Returns the anything-mask when the per-routine bit budget is spent.
    pub fn class_mask(&mut self, name: &str) -> TypeRefMask {
        if let Some(&bit) = self.class_bits.get(name) {
            return TypeRefMask::from_class_bit(bit);
        }
        let next = TypeRefMask::FIRST_CLASS_BIT + self.class_bits.len() as u32;
        let budget = phpz_common::limits::MAX_CLASS_TYPE_BITS
            .min(TypeRefMask::LAST_CLASS_BIT - TypeRefMask::FIRST_CLASS_BIT + 1);
        if next >= TypeRefMask::FIRST_CLASS_BIT + budget {
            trace!(class = name, "class-type bit budget exhausted");
            return TypeRefMask::ANYTHING;
        }
        self.class_bits.insert(name.to_string(), next);
        TypeRefMask::from_class_bit(next)
    }

    /// The class name a bit was allocated to, if any.
    pub fn class_of_bit(&self, bit: u32) -> Option<&str> {
        self.class_bits
            .iter()
            .find(|&(_, &b)| b == bit)
            .map(|(name, _)| name.as_str())
    }

    /// If the mask is exactly one allocated class bit (plus ref bit), the
    /// class name.
    pub fn single_class_of(&self, mask: TypeRefMask) -> Option<&str> {
        if mask.is_anything() || !mask.without_refs().is_single_kind() {
            return None;
        }
        for (name, &bit) in &self.class_bits {
            if mask.includes(TypeRefMask::from_class_bit(bit)) {
                return Some(name.as_str());
            }
        }
        None
    }

    /// Mask of a declared type hint.
    pub fn mask_of_hint(&mut self, hint: &TypeHint) -> TypeRefMask {
        match hint {
            TypeHint::Bool => TypeRefMask::BOOLEAN,
            TypeHint::Long => TypeRefMask::LONG,
            TypeHint::Double => TypeRefMask::DOUBLE,
            TypeHint::Str => TypeRefMask::STRINGS,
            TypeHint::Array => TypeRefMask::ARRAY,
            TypeHint::Callable => TypeRefMask::LAMBDA | TypeRefMask::STRINGS,
            TypeHint::Object => TypeRefMask::OBJECT,
            TypeHint::Class(name) => self.class_mask(name),
            TypeHint::Nullable(inner) => self.mask_of_hint(inner) | TypeRefMask::NULL,
            TypeHint::Union(parts) => parts
                .iter()
                .fold(TypeRefMask::NONE, |m, h| m | self.mask_of_hint(h)),
            TypeHint::Mixed => TypeRefMask::ANYTHING,
        }
    }

    /// Mask of a static representation, e.g. a resolved signature's return.
    pub fn mask_of_repr(&mut self, repr: &Repr, catalog: &dyn TypeCatalog) -> TypeRefMask {
        match repr {
            Repr::Void => TypeRefMask::NULL,
            Repr::Bool => TypeRefMask::BOOLEAN,
            Repr::Int32 | Repr::Int64 => TypeRefMask::LONG,
            Repr::Double => TypeRefMask::DOUBLE,
            Repr::Str => TypeRefMask::STRING,
            Repr::WritableStr => TypeRefMask::WRITABLE_STRING,
            Repr::PhpArray => TypeRefMask::ARRAY,
            Repr::PhpAlias => TypeRefMask::ANYTHING.with_refs(),
            Repr::PhpResource => TypeRefMask::RESOURCE,
            Repr::PhpValue => TypeRefMask::ANYTHING,
            Repr::Object(id) => {
                let name = catalog.class_name(*id).to_string();
                self.class_mask(&name)
            }
            Repr::ObjectBase => TypeRefMask::OBJECT,
        }
    }

    /// Best-effort inverse of [`mask_of_repr`](Self::mask_of_repr): the
    /// representation of a single-kind mask. Multi-kind masks box to
    /// `PhpValue`; `None` only for empty/uninitialized masks.
    pub fn repr_of_mask(&self, mask: TypeRefMask, catalog: &dyn TypeCatalog) -> Option<Repr> {
        let kinds = mask.without_refs();
        if kinds.is_none() || kinds == TypeRefMask::UNINITIALIZED {
            return None;
        }
        if !kinds.is_single_kind() {
            return Some(Repr::PhpValue);
        }
        Some(match kinds {
            m if m == TypeRefMask::BOOLEAN => Repr::Bool,
            m if m == TypeRefMask::LONG => Repr::Int64,
            m if m == TypeRefMask::DOUBLE => Repr::Double,
            m if m == TypeRefMask::STRING => Repr::Str,
            m if m == TypeRefMask::WRITABLE_STRING => Repr::WritableStr,
            m if m == TypeRefMask::ARRAY => Repr::PhpArray,
            m if m == TypeRefMask::RESOURCE => Repr::PhpResource,
            m if m == TypeRefMask::OBJECT => Repr::ObjectBase,
            m if m == TypeRefMask::NULL => Repr::PhpValue,
            m if m == TypeRefMask::LAMBDA => Repr::ObjectBase,
            m => match self
                .single_class_of(m)
                .and_then(|name| catalog.class_by_name(name))
            {
                Some(id) => Repr::Object(id),
                None => Repr::PhpValue,
            },
        })
    }

    /// Number of class bits handed out so far.
    pub fn class_count(&self) -> usize {
        self.class_bits.len()
    }
}
