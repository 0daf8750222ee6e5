//! Pass configuration.
//!
//! Provides typed configuration for the pass pipeline with bon builders.
//! Supports both explicit configuration and environment variable fallbacks.

use bon::bon;
use tensorfold_ir::RewriteOptions;

const DEFAULT_MAX_SWEEPS: usize = 64;
const DEFAULT_MAX_LOCAL_ITERATIONS: usize = 1000;

/// Iteration caps handed to the rewrite driver by every pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassOptions {
    /// Maximum number of bottom-up sweeps per pass.
    pub max_sweeps: usize,
    /// Maximum rewrites of a single node within one sweep.
    pub max_local_iterations: usize,
}

impl Default for PassOptions {
    fn default() -> Self {
        Self { max_sweeps: DEFAULT_MAX_SWEEPS, max_local_iterations: DEFAULT_MAX_LOCAL_ITERATIONS }
    }
}

#[bon]
impl PassOptions {
    /// Create pass options with builder pattern.
    #[builder]
    pub fn builder(
        #[builder(default = DEFAULT_MAX_SWEEPS)] max_sweeps: usize,
        #[builder(default = DEFAULT_MAX_LOCAL_ITERATIONS)] max_local_iterations: usize,
    ) -> Self {
        Self { max_sweeps, max_local_iterations }
    }

    /// Create options from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `TENSORFOLD_MAX_SWEEPS` - Sweep cap (default: 64)
    /// * `TENSORFOLD_MAX_LOCAL_ITERATIONS` - Per-node rewrite cap (default: 1000)
    ///
    /// Unset or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let max_sweeps =
            std::env::var("TENSORFOLD_MAX_SWEEPS").ok().and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_MAX_SWEEPS);
        let max_local_iterations = std::env::var("TENSORFOLD_MAX_LOCAL_ITERATIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_LOCAL_ITERATIONS);

        Self { max_sweeps, max_local_iterations }
    }

    pub fn rewrite_options(&self) -> RewriteOptions {
        RewriteOptions::builder()
            .max_sweeps(self.max_sweeps)
            .max_local_iterations(self.max_local_iterations)
            .build()
    }
}
