//! Conversion classification behavior.

use phpz_solver::{
    ClassId, Conversion, ConversionKinds, MethodSig, Repr, SimpleCatalog, classify_conversion,
};

fn catalog_with_hierarchy() -> (SimpleCatalog, ClassId, ClassId) {
    let mut cat = SimpleCatalog::new();
    let base = cat.add_class("Base", None);
    let derived = cat.add_class("Derived", Some(base));
    (cat, base, derived)
}

#[test]
fn identity_for_every_representation() {
    let (cat, base, _) = catalog_with_hierarchy();
    let reprs = [
        Repr::Bool,
        Repr::Int32,
        Repr::Int64,
        Repr::Double,
        Repr::Str,
        Repr::WritableStr,
        Repr::PhpArray,
        Repr::PhpAlias,
        Repr::PhpResource,
        Repr::PhpValue,
        Repr::Object(base),
        Repr::ObjectBase,
    ];
    for r in &reprs {
        assert_eq!(
            classify_conversion(&cat, r, r, ConversionKinds::implicit_all()),
            Conversion::Identity,
            "identity failed for {r:?}"
        );
    }
}

#[test]
fn long_to_double_widens_implicitly() {
    let (cat, _, _) = catalog_with_hierarchy();
    assert_eq!(
        classify_conversion(
            &cat,
            &Repr::Int64,
            &Repr::Double,
            ConversionKinds::implicit_all()
        ),
        Conversion::Numeric { explicit: false }
    );
}

#[test]
fn double_to_long_narrows_explicitly() {
    let (cat, _, _) = catalog_with_hierarchy();
    // Not available at an implicit site...
    assert_eq!(
        classify_conversion(
            &cat,
            &Repr::Double,
            &Repr::Int64,
            ConversionKinds::NUMERIC | ConversionKinds::IMPLICIT | ConversionKinds::STRICT
        ),
        Conversion::NoConversion
    );
    // ...but an explicit cast site gets the narrowing.
    assert_eq!(
        classify_conversion(
            &cat,
            &Repr::Double,
            &Repr::Int64,
            ConversionKinds::explicit_all()
        ),
        Conversion::Numeric { explicit: true }
    );
}

#[test]
fn int32_to_int64_widens() {
    let (cat, _, _) = catalog_with_hierarchy();
    assert_eq!(
        classify_conversion(
            &cat,
            &Repr::Int32,
            &Repr::Int64,
            ConversionKinds::implicit_all()
        ),
        Conversion::Numeric { explicit: false }
    );
}

#[test]
fn upcast_is_implicit_reference_conversion() {
    let (cat, base, derived) = catalog_with_hierarchy();
    assert_eq!(
        classify_conversion(
            &cat,
            &Repr::Object(derived),
            &Repr::Object(base),
            ConversionKinds::implicit_all()
        ),
        Conversion::Reference
    );
}

#[test]
fn downcast_needs_explicit() {
    let (cat, base, derived) = catalog_with_hierarchy();
    assert_eq!(
        classify_conversion(
            &cat,
            &Repr::Object(base),
            &Repr::Object(derived),
            ConversionKinds::implicit_all() | ConversionKinds::STRICT
        ),
        Conversion::NoConversion
    );
    assert_eq!(
        classify_conversion(
            &cat,
            &Repr::Object(base),
            &Repr::Object(derived),
            ConversionKinds::explicit_all()
        ),
        Conversion::ExplicitReference
    );
}

#[test]
fn special_reference_types_never_decay_to_object_implicitly() {
    let (cat, _, _) = catalog_with_hierarchy();
    for special in [
        Repr::Str,
        Repr::WritableStr,
        Repr::PhpArray,
        Repr::PhpAlias,
        Repr::PhpResource,
    ] {
        assert_eq!(
            classify_conversion(
                &cat,
                &special,
                &Repr::ObjectBase,
                ConversionKinds::implicit_all() | ConversionKinds::STRICT
            ),
            Conversion::NoConversion,
            "{special:?} must not decay to object"
        );
        assert_eq!(
            classify_conversion(
                &cat,
                &special,
                &Repr::ObjectBase,
                ConversionKinds::explicit_all()
            ),
            Conversion::ExplicitReference,
            "{special:?} should still convert with an explicit cast"
        );
    }
    // Plain class instances DO implicitly upcast to the object base.
    let (cat, base, _) = catalog_with_hierarchy();
    assert_eq!(
        classify_conversion(
            &cat,
            &Repr::Object(base),
            &Repr::ObjectBase,
            ConversionKinds::implicit_all()
        ),
        Conversion::Reference
    );
}

#[test]
fn user_defined_conversion_found_via_operator() {
    let mut cat = SimpleCatalog::new();
    let cls = cat.add_class("Money", None);
    let m = cat.add_method(cls, MethodSig::new("ToString", vec![], Repr::Str));
    assert_eq!(
        classify_conversion(
            &cat,
            &Repr::Object(cls),
            &Repr::Str,
            ConversionKinds::explicit_all()
        ),
        Conversion::UserDefined(m)
    );
}

#[test]
fn strict_suppresses_user_defined() {
    let mut cat = SimpleCatalog::new();
    let cls = cat.add_class("Money", None);
    cat.add_method(cls, MethodSig::new("ToString", vec![], Repr::Str));
    assert_eq!(
        classify_conversion(
            &cat,
            &Repr::Object(cls),
            &Repr::Str,
            ConversionKinds::explicit_all() | ConversionKinds::STRICT
        ),
        Conversion::NoConversion
    );
}
