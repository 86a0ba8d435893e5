//! Per-routine variable table.
//!
//! Created lazily as names are first bound; parameters and the implicit
//! `$this` are pre-populated at construction. In global code every local is
//! really a global, and `global`/`static` declarations re-kind a name for
//! the rest of the routine.

use phpz_ast::{Routine, RoutineKind};
use rustc_hash::FxHashMap;
use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum VariableKind {
    Local,
    Parameter,
    ThisParameter,
    StaticLocal,
    /// Name computed at run time (`$$x`).
    IndirectLocal,
    GlobalVariable,
}

#[derive(Clone, Debug)]
pub struct LocalsTable {
    routine_kind: RoutineKind,
    vars: FxHashMap<String, VariableKind>,
}

impl LocalsTable {
    pub fn new(routine: &Routine) -> Self {
        let mut vars = FxHashMap::default();
        for p in &routine.params {
            vars.insert(p.name.clone(), VariableKind::Parameter);
        }
        if routine.this_class.is_some() {
            vars.insert("this".to_string(), VariableKind::ThisParameter);
        }
        Self {
            routine_kind: routine.kind,
            vars,
        }
    }

    /// The kind of `name`, creating the entry on first sight.
    pub fn ensure(&mut self, name: &str) -> VariableKind {
        if let Some(&kind) = self.vars.get(name) {
            return kind;
        }
        let kind = match self.routine_kind {
            RoutineKind::GlobalCode => VariableKind::GlobalVariable,
            _ => VariableKind::Local,
        };
        self.vars.insert(name.to_string(), kind);
        kind
    }

    pub fn kind(&self, name: &str) -> Option<VariableKind> {
        self.vars.get(name).copied()
    }

    /// Re-kind a name (`global $x;` / `static $x;`).
    pub fn mark(&mut self, name: &str, kind: VariableKind) {
        self.vars.insert(name.to_string(), kind);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, VariableKind)> {
        self.vars.iter().map(|(n, &k)| (n.as_str(), k))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
