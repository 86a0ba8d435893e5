//! User-defined operator and conversion-method resolution.
//!
//! Given a receiver type, a prioritized list of method names, and an
//! optional operand/target shape, pick the cheapest applicable method from
//! the receiver's hierarchy plus any designated extension/helper types.
//! Selection is deterministic: primary conversion cost, then a secondary
//! tie-break counter, then name priority, then first-found order.

use crate::catalog::{ClassId, MethodId, MethodSig, Repr, TypeCatalog, hierarchy};
use crate::convert::{Conversion, ConversionKinds, classify_conversion};
use tracing::trace;

/// Cost assigned to a conversion step when ranking candidates.
///
/// Identity is free; an explicit-only step doubles the implicit cost;
/// boolean participation is penalized hard enough that a 1-bit "widening"
/// never beats a genuine numeric widening; user-defined string conversions
/// are the cheapest of the user-defined family.
fn conversion_cost(conv: Conversion, from: &Repr, to: &Repr, catalog: &dyn TypeCatalog) -> u32 {
    let bool_penalty = if *from == Repr::Bool || *to == Repr::Bool {
        8
    } else {
        0
    };
    match conv {
        Conversion::Identity => 0,
        Conversion::Reference => 1 + bool_penalty,
        Conversion::Numeric { explicit: false } => 1 + bool_penalty,
        Conversion::Numeric { explicit: true } => 2 * (1 + bool_penalty),
        Conversion::ExplicitReference => 2 * (1 + bool_penalty),
        Conversion::UserDefined(m) => {
            let sig = method_sig(catalog, m);
            if sig.is_some_and(|s| s.name.starts_with("ToString") || s.name == "__toString") {
                2
            } else {
                4
            }
        }
        Conversion::NoConversion => INAPPLICABLE,
    }
}

const INAPPLICABLE: u32 = u32::MAX / 2;

fn method_sig(catalog: &dyn TypeCatalog, id: MethodId) -> Option<&MethodSig> {
    catalog.methods_of(id.class).get(id.index as usize)
}

/// One operator-resolution request.
#[derive(Clone, Debug)]
pub struct OperatorQuery<'a> {
    /// The operand's own class.
    pub receiver: ClassId,
    /// Whether the operand arrives wrapped in an alias cell.
    pub has_ref: bool,
    /// Candidate method names, most preferred first.
    pub names: &'a [&'a str],
    /// Extension/helper types searched after the receiver's hierarchy.
    /// Their matching methods are static and take the operand as first
    /// parameter.
    pub extensions: &'a [ClassId],
    /// The right-hand operand shape, if the operator is binary.
    pub operand: Option<&'a Repr>,
    /// The required result shape, if the caller needs one.
    pub target: Option<&'a Repr>,
}

struct Candidate {
    method: MethodId,
    cost: u32,
    secondary: u32,
    name_rank: u32,
    order: u32,
}

/// Resolve the best matching operator method, or `None` when no candidate
/// applies. Never an error: an empty result is a normal outcome the caller
/// must have a fallback for.
pub fn resolve_operator(catalog: &dyn TypeCatalog, query: &OperatorQuery<'_>) -> Option<MethodId> {
    let mut best: Option<Candidate> = None;
    let mut order = 0u32;

    // Costs inside ranking never recurse into user-defined conversions.
    let cost_kinds = ConversionKinds::explicit_all() | ConversionKinds::STRICT;

    let mut consider = |method: MethodId, sig: &MethodSig, on_receiver: bool, boxed: bool| {
        let name_rank = match query.names.iter().position(|n| *n == sig.name) {
            Some(r) => r as u32,
            None => return,
        };

        // Expected value parameters: extension-style statics take the
        // operand as their first parameter.
        let mut params = sig.params.iter();
        if boxed {
            match params.next() {
                Some(_) => {}
                None => return,
            }
        }

        let mut cost = 0u32;
        match (query.operand, params.next()) {
            (Some(operand), Some(param)) => {
                let conv = classify_conversion(catalog, operand, param, cost_kinds);
                cost = cost.saturating_add(conversion_cost(conv, operand, param, catalog));
            }
            (Some(_), None) | (None, Some(_)) => return,
            (None, None) => {}
        }
        if params.next().is_some() {
            return;
        }
        if let Some(target) = query.target {
            let conv = classify_conversion(catalog, &sig.ret, target, cost_kinds);
            cost = cost.saturating_add(conversion_cost(conv, &sig.ret, target, catalog));
        }
        if cost >= INAPPLICABLE {
            return;
        }

        // Context-taking methods and methods declared on the operand's own
        // type win ties against boxed/fallback containers.
        let mut secondary = 0u32;
        if !sig.takes_context {
            secondary += 1;
        }
        if !on_receiver || boxed {
            secondary += 1;
        }
        if query.has_ref && !sig.takes_context {
            secondary += 1;
        }

        let candidate = Candidate {
            method,
            cost,
            secondary,
            name_rank,
            order,
        };
        let better = match &best {
            None => true,
            Some(b) => {
                (candidate.cost, candidate.secondary, candidate.name_rank, candidate.order)
                    < (b.cost, b.secondary, b.name_rank, b.order)
            }
        };
        if better {
            best = Some(candidate);
        }
        order += 1;
    };

    for (depth, class) in hierarchy(catalog, query.receiver).into_iter().enumerate() {
        for (index, sig) in catalog.methods_of(class).iter().enumerate() {
            let id = MethodId {
                class,
                index: index as u32,
            };
            consider(id, sig, depth == 0, false);
        }
    }
    for &ext in query.extensions {
        for (index, sig) in catalog.methods_of(ext).iter().enumerate() {
            if !sig.is_static {
                continue;
            }
            let id = MethodId {
                class: ext,
                index: index as u32,
            };
            consider(id, sig, false, true);
        }
    }

    let found = best.map(|c| c.method);
    trace!(?found, receiver = query.receiver.0, "operator resolution");
    found
}
