//! Solver configuration.

/// Tunables for a [`Solver`](crate::Solver).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SolverConfig {
    /// Pivots allowed per optimization pass before giving up.
    ///
    /// The entering-symbol rule has no anti-cycling guard, so degenerate
    /// systems could otherwise loop forever.
    pub max_iterations: usize,
}

impl SolverConfig {
    pub const DEFAULT_MAX_ITERATIONS: usize = 100_000;

    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pivot ceiling.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
        }
    }
}
