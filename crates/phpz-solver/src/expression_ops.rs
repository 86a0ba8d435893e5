//! Result-mask rules for PHP's built-in operators.
//!
//! These encode the engine's coercion outcomes at the mask level: what kinds
//! can `+` produce given what its operands can be. The binder calls these
//! with the operand masks current at the flow state it is binding under, so
//! results sharpen as the fixpoint converges.

use crate::mask::TypeRefMask;
use phpz_ast::{BinaryOp, UnaryOp};

/// Result of the arithmetic family (`+ - * pow`): double dominates, two
/// pure-long operands stay long, `+` on two arrays is array union.
fn arith_mask(left: TypeRefMask, right: TypeRefMask, allow_array_union: bool) -> TypeRefMask {
    if allow_array_union
        && left.includes(TypeRefMask::ARRAY)
        && right.includes(TypeRefMask::ARRAY)
        && !left.is_anything()
        && !right.is_anything()
        && (left | right).without_refs().without(TypeRefMask::ARRAY).is_none()
    {
        return TypeRefMask::ARRAY;
    }
    if left.intersects(TypeRefMask::DOUBLE) || right.intersects(TypeRefMask::DOUBLE) {
        if left.is_number_only() && right.is_number_only() {
            // long op double still reaches double only.
            if !left.intersects(TypeRefMask::LONG) || !right.intersects(TypeRefMask::LONG) {
                return TypeRefMask::DOUBLE;
            }
        }
        return TypeRefMask::NUMBER;
    }
    if !left.is_anything()
        && !right.is_anything()
        && left.without_refs().without(TypeRefMask::LONG | TypeRefMask::NULL | TypeRefMask::BOOLEAN).is_none()
        && right.without_refs().without(TypeRefMask::LONG | TypeRefMask::NULL | TypeRefMask::BOOLEAN).is_none()
    {
        return TypeRefMask::LONG;
    }
    TypeRefMask::NUMBER
}

/// The mask a binary operation produces from its operand masks.
pub fn binary_op_mask(op: BinaryOp, left: TypeRefMask, right: TypeRefMask) -> TypeRefMask {
    match op {
        BinaryOp::Add => arith_mask(left, right, true),
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Pow => arith_mask(left, right, false),
        // Integer division of longs can still yield a fraction.
        BinaryOp::Div => {
            if left.intersects(TypeRefMask::DOUBLE) || right.intersects(TypeRefMask::DOUBLE) {
                TypeRefMask::DOUBLE
            } else {
                TypeRefMask::NUMBER
            }
        }
        BinaryOp::Mod | BinaryOp::Spaceship => TypeRefMask::LONG,
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl | BinaryOp::Shr => {
            TypeRefMask::LONG
        }
        BinaryOp::Concat => TypeRefMask::STRING,
        BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => TypeRefMask::BOOLEAN,
        BinaryOp::Eq
        | BinaryOp::NotEq
        | BinaryOp::Identical
        | BinaryOp::NotIdentical
        | BinaryOp::Lt
        | BinaryOp::Gt
        | BinaryOp::LtEq
        | BinaryOp::GtEq => TypeRefMask::BOOLEAN,
        // `??`: the left side minus its null-ish kinds, or the right side.
        BinaryOp::Coalesce => {
            let left_hit = left.without(TypeRefMask::NULL | TypeRefMask::UNINITIALIZED);
            left_hit | right
        }
    }
}

/// The mask a unary operation produces from its operand mask.
pub fn unary_op_mask(op: UnaryOp, operand: TypeRefMask) -> TypeRefMask {
    match op {
        UnaryOp::Minus | UnaryOp::Plus => {
            if operand.intersects(TypeRefMask::DOUBLE) && operand.is_number_only() {
                if operand.intersects(TypeRefMask::LONG) {
                    TypeRefMask::NUMBER
                } else {
                    TypeRefMask::DOUBLE
                }
            } else if !operand.is_anything()
                && operand.without_refs().without(TypeRefMask::LONG).is_none()
                && !operand.is_none()
            {
                TypeRefMask::LONG
            } else {
                TypeRefMask::NUMBER
            }
        }
        UnaryOp::LogicNot => TypeRefMask::BOOLEAN,
        UnaryOp::BitNot => TypeRefMask::LONG,
        UnaryOp::CastInt => TypeRefMask::LONG,
        UnaryOp::CastDouble => TypeRefMask::DOUBLE,
        UnaryOp::CastString => TypeRefMask::STRING,
        UnaryOp::CastBool => TypeRefMask::BOOLEAN,
        UnaryOp::CastArray => TypeRefMask::ARRAY,
        UnaryOp::CastObject => TypeRefMask::OBJECT,
        UnaryOp::Silence => operand,
        // Increment keeps a numeric operand's kinds; null pre-increment
        // produces a long; anything else widens to number.
        UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => {
            if operand.is_number_only() {
                operand.without_refs()
            } else if !operand.is_anything()
                && operand
                    .without_refs()
                    .without(TypeRefMask::NULL | TypeRefMask::LONG)
                    .is_none()
                && !operand.is_none()
            {
                TypeRefMask::LONG
            } else {
                TypeRefMask::NUMBER
            }
        }
    }
}
