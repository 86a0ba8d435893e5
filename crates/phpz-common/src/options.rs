//! Analysis configuration.

use crate::limits;

/// Knobs for one routine's semantic analysis.
///
/// The defaults mirror the PHP runtime's behavior; drivers override them for
/// stricter dialects or for testing.
#[derive(Clone, Debug)]
pub struct AnalysisOptions {
    /// Cap on block visits in the fixpoint loop. Defaults to
    /// [`limits::MAX_FLOW_ITERATIONS`].
    pub max_flow_iterations: u32,
    /// When `true`, a read of an unassigned local evaluates to NULL (the
    /// engine's behavior). When `false`, its mask stays uninitialized-only,
    /// which downstream consumers may treat as unreachable.
    pub uninitialized_reads_as_null: bool,
    /// Emit [`diagnostic_codes::UNDEFINED_VARIABLE`] warnings for non-quiet
    /// reads of possibly-unassigned variables.
    ///
    /// [`diagnostic_codes::UNDEFINED_VARIABLE`]: crate::diagnostics::diagnostic_codes::UNDEFINED_VARIABLE
    pub report_undefined_variables: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            max_flow_iterations: limits::MAX_FLOW_ITERATIONS,
            uninitialized_reads_as_null: true,
            report_undefined_variables: true,
        }
    }
}
