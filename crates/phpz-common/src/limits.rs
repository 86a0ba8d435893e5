//! Centralized limits and thresholds for the phpz semantic core.
//!
//! This module provides shared constants for iteration counts and capacity
//! limits used throughout the codebase. Centralizing these values:
//! - Prevents duplicate definitions with inconsistent values
//! - Documents the rationale for each limit

/// Maximum number of block visits during one routine's fixpoint analysis.
///
/// The type lattice is finite per routine, so the dataflow loop terminates on
/// its own; this cap exists so a lattice-height regression fails loudly
/// instead of hanging the compiler.
/// The bound is generous: a routine re-visits each block at most once per
/// type bit, and real routines converge in a handful of passes.
pub const MAX_FLOW_ITERATIONS: u32 = 10_000;

/// Maximum number of class types tracked with a dedicated mask bit.
///
/// `TypeRefMask` is 64 bits wide; after the fixed primitive bits, the
/// remainder is handed out to class types seen in the routine. Once the
/// budget is exhausted, further class types collapse to the anything-mask
/// rather than failing.
pub const MAX_CLASS_TYPE_BITS: u32 = 51;

/// Maximum recursion depth when binding nested expressions.
///
/// Deeply nested source expressions (`((((1+2)+3)...)`) recurse once per
/// level in the binder; past this depth binding fails for the routine
/// instead of overflowing the stack.
pub const MAX_BIND_DEPTH: u32 = 512;
