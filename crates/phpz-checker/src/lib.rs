//! Flow-sensitive type inference for the phpz compiler.
//!
//! This crate builds the control-flow graph for one routine and runs the
//! monotone fixpoint dataflow over it:
//!
//! 1. Seed the start block with parameter type masks.
//! 2. Process a block: re-bind its statements with the semantic binder
//!    against the block's current entry state, apply each statement's
//!    effect, producing an exit state.
//! 3. OR-merge the exit state into each successor; re-enqueue successors
//!    whose entry state changed.
//! 4. Repeat until nothing changes.
//!
//! Re-binding during analysis is deliberate: access decisions and operator
//! selection depend on operand types only known once some analysis has run,
//! so binder and flow form one coupled fixpoint loop. Termination follows
//! from the finite mask lattice; a defensive iteration cap turns a lattice
//! regression into a loud error instead of a hang.

pub mod analysis;
pub mod cfg;
pub mod flow;

pub use analysis::{AnalysisError, TypeAnalysis};
pub use cfg::{BlockId, BoundBlock, ControlFlowGraph, Terminator};
pub use flow::{FlowContext, FlowState};
