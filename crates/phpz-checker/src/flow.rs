//! Per-routine flow state.
//!
//! `FlowContext` owns the variable-slot mapping, the routine's
//! `TypeRefContext`, the accumulated per-variable masks, and the return
//! slot; `FlowState` is one program point's snapshot of slot masks. A slot
//! that a state has never seen is uninitialized, so states of different
//! lengths merge cleanly.

use phpz_solver::{TypeRefContext, TypeRefMask};
use rustc_hash::FxHashMap;

/// One program point: variable slot → type mask.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FlowState {
    masks: Vec<TypeRefMask>,
}

impl FlowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mask(&self, slot: usize) -> TypeRefMask {
        self.masks
            .get(slot)
            .copied()
            .unwrap_or(TypeRefMask::UNINITIALIZED)
    }

    pub fn set(&mut self, slot: usize, mask: TypeRefMask) {
        if slot >= self.masks.len() {
            self.masks.resize(slot + 1, TypeRefMask::UNINITIALIZED);
        }
        self.masks[slot] = mask;
    }

    /// OR-merge `other` into `self`; true when any bit was added.
    pub fn merge_with(&mut self, other: &FlowState) -> bool {
        if other.masks.len() > self.masks.len() {
            self.masks
                .resize(other.masks.len(), TypeRefMask::UNINITIALIZED);
        }
        let mut changed = false;
        for (slot, &incoming) in other.masks.iter().enumerate() {
            let merged = self.masks[slot].merge(incoming);
            if merged != self.masks[slot] {
                self.masks[slot] = merged;
                changed = true;
            }
        }
        changed
    }

    pub fn slot_count(&self) -> usize {
        self.masks.len()
    }
}

/// Shared per-routine flow bookkeeping, owner of all [`FlowState`] slots.
#[derive(Debug, Default)]
pub struct FlowContext {
    pub(crate) names: FxHashMap<String, usize>,
    slot_names: Vec<String>,
    /// Union of every mask ever assigned to each slot.
    accumulated: Vec<TypeRefMask>,
    return_mask: TypeRefMask,
    saw_return: bool,
    pub types: TypeRefContext,
}

impl FlowContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot for `name`, created on first sight.
    pub fn slot(&mut self, name: &str) -> usize {
        if let Some(&s) = self.names.get(name) {
            return s;
        }
        let s = self.slot_names.len();
        self.names.insert(name.to_string(), s);
        self.slot_names.push(name.to_string());
        self.accumulated.push(TypeRefMask::NONE);
        s
    }

    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    pub fn names(&self) -> &FxHashMap<String, usize> {
        &self.names
    }

    /// Strong update: the variable now holds exactly `mask`.
    pub fn set_var(&mut self, state: &mut FlowState, name: &str, mask: TypeRefMask) {
        let slot = self.slot(name);
        state.set(slot, mask);
        self.accumulated[slot] |= mask;
    }

    /// Weak update: the variable may additionally hold `mask`.
    pub fn merge_var(&mut self, state: &mut FlowState, name: &str, mask: TypeRefMask) {
        let slot = self.slot(name);
        let merged = state.mask(slot).merge(mask);
        state.set(slot, merged);
        self.accumulated[slot] |= mask;
    }

    /// An indirect write (`$$x = ...`) can hit any variable: widen every
    /// known slot to anything.
    pub fn widen_all(&mut self, state: &mut FlowState) {
        for slot in 0..self.slot_names.len() {
            let widened = state.mask(slot).merge(TypeRefMask::ANYTHING);
            state.set(slot, widened);
            self.accumulated[slot] |= TypeRefMask::ANYTHING;
        }
    }

    /// Union of all masks ever assigned to `name`.
    pub fn accumulated_mask(&self, name: &str) -> TypeRefMask {
        match self.lookup(name) {
            Some(slot) => self.accumulated[slot],
            None => TypeRefMask::NONE,
        }
    }

    pub fn add_return(&mut self, mask: TypeRefMask) {
        self.return_mask |= mask;
        self.saw_return = true;
    }

    /// Union of all `return` operand masks; a routine that can only fall
    /// off the end returns null.
    pub fn return_mask(&self) -> TypeRefMask {
        if self.saw_return {
            self.return_mask
        } else {
            TypeRefMask::NULL
        }
    }
}
