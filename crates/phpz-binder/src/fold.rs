//! Constant evaluation during binding.
//!
//! Literal and constant-operand expressions get their `constant_value`
//! populated eagerly so later passes can fold without re-deriving values.
//! Folding is conservative: any case whose engine semantics are subtle
//! (float formatting, overflow-sensitive string math) stays unfolded.

use crate::bound::ConstValue;
use phpz_ast::{BinaryOp, Lit, UnaryOp};

pub fn const_of_literal(lit: &Lit) -> Option<ConstValue> {
    match lit {
        Lit::Null => Some(ConstValue::Null),
        Lit::Bool(b) => Some(ConstValue::Bool(*b)),
        Lit::Long(n) => Some(ConstValue::Long(*n)),
        Lit::Double(d) => Some(ConstValue::Double(*d)),
        Lit::Str(s) => Some(ConstValue::Str(s.clone())),
        Lit::Array(_) => None,
    }
}

fn as_number(v: &ConstValue) -> Option<(f64, Option<i64>)> {
    match v {
        ConstValue::Null => Some((0.0, Some(0))),
        ConstValue::Bool(b) => Some((f64::from(*b as u8), Some(i64::from(*b)))),
        ConstValue::Long(n) => Some((*n as f64, Some(*n))),
        ConstValue::Double(d) => Some((*d, None)),
        ConstValue::Str(_) => None,
    }
}

/// String form for folding concatenation. Doubles are excluded: their
/// engine formatting is locale- and precision-sensitive.
fn as_concat_str(v: &ConstValue) -> Option<String> {
    match v {
        ConstValue::Null => Some(String::new()),
        ConstValue::Bool(b) => Some(if *b { "1".to_string() } else { String::new() }),
        ConstValue::Long(n) => Some(n.to_string()),
        ConstValue::Str(s) => Some(s.clone()),
        ConstValue::Double(_) => None,
    }
}

pub fn eval_unary(op: UnaryOp, v: &ConstValue) -> Option<ConstValue> {
    match op {
        UnaryOp::Minus => match v {
            ConstValue::Long(n) => n.checked_neg().map(ConstValue::Long),
            ConstValue::Double(d) => Some(ConstValue::Double(-d)),
            _ => None,
        },
        UnaryOp::Plus => match v {
            ConstValue::Long(_) | ConstValue::Double(_) => Some(v.clone()),
            _ => None,
        },
        UnaryOp::LogicNot => Some(ConstValue::Bool(!v.to_bool())),
        UnaryOp::BitNot => match v {
            ConstValue::Long(n) => Some(ConstValue::Long(!n)),
            _ => None,
        },
        UnaryOp::CastBool => Some(ConstValue::Bool(v.to_bool())),
        UnaryOp::CastInt => match v {
            ConstValue::Long(n) => Some(ConstValue::Long(*n)),
            ConstValue::Bool(b) => Some(ConstValue::Long(i64::from(*b))),
            ConstValue::Null => Some(ConstValue::Long(0)),
            ConstValue::Double(d) if d.is_finite() => Some(ConstValue::Long(*d as i64)),
            _ => None,
        },
        UnaryOp::CastString => as_concat_str(v).map(ConstValue::Str),
        _ => None,
    }
}

pub fn eval_binary(op: BinaryOp, l: &ConstValue, r: &ConstValue) -> Option<ConstValue> {
    use BinaryOp::*;
    match op {
        Add | Sub | Mul => {
            let (lf, li) = as_number(l)?;
            let (rf, ri) = as_number(r)?;
            if let (Some(a), Some(b)) = (li, ri) {
                let exact = match op {
                    Add => a.checked_add(b),
                    Sub => a.checked_sub(b),
                    Mul => a.checked_mul(b),
                    _ => unreachable!(),
                };
                // Engine semantics: long overflow spills into double.
                return Some(match exact {
                    Some(n) => ConstValue::Long(n),
                    None => ConstValue::Double(match op {
                        Add => lf + rf,
                        Sub => lf - rf,
                        Mul => lf * rf,
                        _ => unreachable!(),
                    }),
                });
            }
            Some(ConstValue::Double(match op {
                Add => lf + rf,
                Sub => lf - rf,
                Mul => lf * rf,
                _ => unreachable!(),
            }))
        }
        Div => {
            let (lf, li) = as_number(l)?;
            let (rf, ri) = as_number(r)?;
            if rf == 0.0 {
                return None;
            }
            if let (Some(a), Some(b)) = (li, ri)
                && a.checked_rem(b) == Some(0)
                && let Some(q) = a.checked_div(b)
            {
                return Some(ConstValue::Long(q));
            }
            Some(ConstValue::Double(lf / rf))
        }
        Mod => {
            let (_, li) = as_number(l)?;
            let (_, ri) = as_number(r)?;
            match (li, ri) {
                (Some(a), Some(b)) if b != 0 => a.checked_rem(b).map(ConstValue::Long),
                _ => None,
            }
        }
        Concat => {
            let mut s = as_concat_str(l)?;
            s.push_str(&as_concat_str(r)?);
            Some(ConstValue::Str(s))
        }
        And => Some(ConstValue::Bool(l.to_bool() && r.to_bool())),
        Or => Some(ConstValue::Bool(l.to_bool() || r.to_bool())),
        Xor => Some(ConstValue::Bool(l.to_bool() != r.to_bool())),
        BitAnd | BitOr | BitXor | Shl | Shr => match (l, r) {
            (ConstValue::Long(a), ConstValue::Long(b)) => {
                let v = match op {
                    BitAnd => a & b,
                    BitOr => a | b,
                    BitXor => a ^ b,
                    Shl => a.checked_shl(u32::try_from(*b).ok()?)?,
                    Shr => a.checked_shr(u32::try_from(*b).ok()?)?,
                    _ => unreachable!(),
                };
                Some(ConstValue::Long(v))
            }
            _ => None,
        },
        Identical => Some(ConstValue::Bool(l == r)),
        NotIdentical => Some(ConstValue::Bool(l != r)),
        Eq | NotEq | Lt | Gt | LtEq | GtEq | Spaceship => {
            // Loose comparison folds only when both sides are numeric.
            let (lf, _) = as_number(l)?;
            let (rf, _) = as_number(r)?;
            let ord = lf.partial_cmp(&rf)?;
            Some(match op {
                Eq => ConstValue::Bool(ord.is_eq()),
                NotEq => ConstValue::Bool(!ord.is_eq()),
                Lt => ConstValue::Bool(ord.is_lt()),
                Gt => ConstValue::Bool(ord.is_gt()),
                LtEq => ConstValue::Bool(ord.is_le()),
                GtEq => ConstValue::Bool(ord.is_ge()),
                Spaceship => ConstValue::Long(ord as i64),
                _ => unreachable!(),
            })
        }
        Coalesce => {
            if matches!(l, ConstValue::Null) {
                Some(r.clone())
            } else {
                Some(l.clone())
            }
        }
        Pow => None,
    }
}
