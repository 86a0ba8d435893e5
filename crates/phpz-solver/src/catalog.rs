//! The runtime type catalog seam.
//!
//! Conversion classification and operator resolution reason about *static
//! representations*: the fixed set of special PHP value representations the
//! managed runtime uses (strings, arrays, aliases, resources), the numeric
//! family, and user classes. The catalog itself — class hierarchy, declared
//! methods, known global functions — is owned by the external symbol
//! resolver; this module defines the trait the solver consumes and a small
//! in-memory implementation used by drivers and tests.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Identifies a class in the catalog.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassId(pub u32);

/// Identifies a method as (declaring class, declaration index).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodId {
    pub class: ClassId,
    pub index: u32,
}

/// Numeric shape of a primitive representation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericInfo {
    pub is_floating: bool,
    pub is_signed: bool,
    pub bit_size: u16,
}

/// A static value representation in the managed runtime.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Repr {
    Void,
    Bool,
    Int32,
    Int64,
    Double,
    /// The immutable string representation.
    Str,
    /// The mutable string builder representation.
    WritableStr,
    PhpArray,
    /// The alias (reference) wrapper cell.
    PhpAlias,
    PhpResource,
    /// The boxed any-value representation.
    PhpValue,
    /// An instance of a known class.
    Object(ClassId),
    /// The bare object base type every class derives from.
    ObjectBase,
}

impl Repr {
    /// Numeric info, if this representation is part of the numeric family.
    /// Boolean is modeled as a 1-bit unsigned integer.
    pub fn numeric_info(&self) -> Option<NumericInfo> {
        match self {
            Repr::Bool => Some(NumericInfo {
                is_floating: false,
                is_signed: false,
                bit_size: 1,
            }),
            Repr::Int32 => Some(NumericInfo {
                is_floating: false,
                is_signed: true,
                bit_size: 32,
            }),
            Repr::Int64 => Some(NumericInfo {
                is_floating: false,
                is_signed: true,
                bit_size: 64,
            }),
            Repr::Double => Some(NumericInfo {
                is_floating: true,
                is_signed: true,
                bit_size: 64,
            }),
            _ => None,
        }
    }

    /// Representations living on the managed heap.
    pub fn is_reference_type(&self) -> bool {
        matches!(
            self,
            Repr::Str
                | Repr::WritableStr
                | Repr::PhpArray
                | Repr::PhpAlias
                | Repr::PhpResource
                | Repr::Object(_)
                | Repr::ObjectBase
        )
    }

    /// The specially-semantic reference representations. These carry PHP
    /// value semantics (copy-on-write, aliasing) and must never implicitly
    /// decay to the bare object type.
    pub fn is_special_reference(&self) -> bool {
        matches!(
            self,
            Repr::Str | Repr::WritableStr | Repr::PhpArray | Repr::PhpAlias | Repr::PhpResource
        )
    }
}

/// A method declaration as operator resolution sees it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MethodSig {
    pub name: String,
    /// Parameter representations, excluding any leading context parameter.
    pub params: Vec<Repr>,
    pub ret: Repr,
    /// Whether the method takes the execution-context object as an implicit
    /// leading parameter.
    pub takes_context: bool,
    pub is_static: bool,
}

impl MethodSig {
    pub fn new(name: impl Into<String>, params: Vec<Repr>, ret: Repr) -> Self {
        Self {
            name: name.into(),
            params,
            ret,
            takes_context: false,
            is_static: false,
        }
    }

    pub fn with_context(mut self) -> Self {
        self.takes_context = true;
        self
    }

    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }
}

/// One declared parameter of a known global function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionParam {
    pub name: String,
    pub repr: Repr,
    pub by_ref: bool,
}

/// A known global function signature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    pub params: Vec<FunctionParam>,
    pub ret: Repr,
}

impl FunctionInfo {
    pub fn new(name: impl Into<String>, params: Vec<FunctionParam>, ret: Repr) -> Self {
        Self {
            name: name.into(),
            params,
            ret,
        }
    }

    pub fn has_by_ref_param(&self) -> bool {
        self.params.iter().any(|p| p.by_ref)
    }
}

/// The catalog the external symbol resolver implements.
pub trait TypeCatalog {
    fn class_by_name(&self, name: &str) -> Option<ClassId>;
    fn class_name(&self, id: ClassId) -> &str;
    fn base_of(&self, id: ClassId) -> Option<ClassId>;
    /// Methods declared directly on `id`, in declaration order.
    fn methods_of(&self, id: ClassId) -> &[MethodSig];
    fn function(&self, name: &str) -> Option<&FunctionInfo>;
}

/// Walk `id` and its base chain, closest first.
pub fn hierarchy(catalog: &dyn TypeCatalog, id: ClassId) -> Vec<ClassId> {
    let mut chain = Vec::new();
    let mut cur = Some(id);
    while let Some(c) = cur {
        // A malformed cycle in the external catalog must not hang us.
        if chain.contains(&c) {
            break;
        }
        chain.push(c);
        cur = catalog.base_of(c);
    }
    chain
}

/// Identity-inclusive subclass test.
pub fn is_subclass_of(catalog: &dyn TypeCatalog, sub: ClassId, sup: ClassId) -> bool {
    hierarchy(catalog, sub).contains(&sup)
}

/// Subtype test over representations: identity, class hierarchy, and every
/// reference type is a subtype of the bare object base — except the special
/// PHP reference representations, which never decay (see
/// [`Repr::is_special_reference`]).
pub fn is_subtype(catalog: &dyn TypeCatalog, sub: &Repr, sup: &Repr) -> bool {
    if sub == sup {
        return true;
    }
    match (sub, sup) {
        (Repr::Object(a), Repr::Object(b)) => is_subclass_of(catalog, *a, *b),
        (Repr::Object(_), Repr::ObjectBase) => true,
        (s, Repr::ObjectBase) if s.is_reference_type() => !s.is_special_reference(),
        _ => false,
    }
}

#[derive(Clone, Debug, Default)]
struct ClassDef {
    name: String,
    base: Option<ClassId>,
    methods: Vec<MethodSig>,
}

/// An in-memory [`TypeCatalog`] for tests and simple drivers.
#[derive(Clone, Debug, Default)]
pub struct SimpleCatalog {
    classes: Vec<ClassDef>,
    by_name: FxHashMap<String, ClassId>,
    functions: FxHashMap<String, FunctionInfo>,
}

impl SimpleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_class(&mut self, name: impl Into<String>, base: Option<ClassId>) -> ClassId {
        let name = name.into();
        let id = ClassId(self.classes.len() as u32);
        self.by_name.insert(name.clone(), id);
        self.classes.push(ClassDef {
            name,
            base,
            methods: Vec::new(),
        });
        id
    }

    pub fn add_method(&mut self, class: ClassId, sig: MethodSig) -> MethodId {
        let methods = &mut self.classes[class.0 as usize].methods;
        methods.push(sig);
        MethodId {
            class,
            index: (methods.len() - 1) as u32,
        }
    }

    pub fn add_function(&mut self, info: FunctionInfo) {
        self.functions.insert(info.name.clone(), info);
    }

    pub fn method_sig(&self, id: MethodId) -> &MethodSig {
        &self.classes[id.class.0 as usize].methods[id.index as usize]
    }
}

impl TypeCatalog for SimpleCatalog {
    fn class_by_name(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    fn class_name(&self, id: ClassId) -> &str {
        &self.classes[id.0 as usize].name
    }

    fn base_of(&self, id: ClassId) -> Option<ClassId> {
        self.classes[id.0 as usize].base
    }

    fn methods_of(&self, id: ClassId) -> &[MethodSig] {
        &self.classes[id.0 as usize].methods
    }

    fn function(&self, name: &str) -> Option<&FunctionInfo> {
        self.functions.get(name)
    }
}
