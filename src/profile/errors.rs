use thiserror::Error;

use crate::profile::breakdown::TimingType;

/// Misuse of the profiling primitives.
///
/// These indicate decorator wiring defects rather than operational failures;
/// they surface as [`crate::SearchError::Profile`] so the search fails loudly.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProfileError {
    /// `start` was called for a phase that is already running.
    #[error("timing {0} started while already running")]
    AlreadyRunning(TimingType),
    /// `stop` was called for a phase that is not running.
    #[error("timing {0} stopped while not running")]
    NotRunning(TimingType),
    /// A pop was requested with no open profile node.
    #[error("profile stack is empty")]
    EmptyStack,
    /// The tree was read while profiled calls were still open.
    #[error("profile tree read with {depth} open node(s)")]
    Unbalanced {
        /// Nodes still on the stack.
        depth: usize,
    },
}
