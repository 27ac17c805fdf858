//! Reconstruction settings shared by all gradient drivers.

use did_compute::Strategy;

/// Default number of relaxation steps.
pub const DEFAULT_ITERATIONS: usize = 500;

/// How the edited fields are reconstructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconstructionConfig {
    /// Relaxation steps per channel.
    pub iterations: usize,
    /// Execution strategy.
    pub strategy: Strategy,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            strategy: Strategy::default(),
        }
    }
}

impl ReconstructionConfig {
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }
}
