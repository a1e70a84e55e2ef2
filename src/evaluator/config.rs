// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Evaluation configuration
//!
//! Step budgets and trace settings shared by every driver.

/// Default step budget
pub const DEFAULT_MAX_STEPS: usize = 25;

/// Configuration for [`Evaluator`](super::Evaluator)
///
/// # Examples
///
/// ```rust
/// use lamedh::evaluator::EvalConfig;
///
/// // Use default configuration
/// let config = EvalConfig::default();
/// assert_eq!(config.max_steps, 25);
///
/// // Or use builder pattern methods
/// let config = EvalConfig::default()
///     .with_max_steps(1000)
///     .with_verbose(true);
/// assert!(config.verbose);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalConfig {
    /// Maximum number of reduction or evaluation steps
    ///
    /// A driver that would need more steps fails with
    /// [`LambdaError::StepLimitExceeded`](crate::LambdaError::StepLimitExceeded)
    /// instead of returning a partial result. Default: 25
    pub max_steps: usize,

    /// Emit one trace line per step through the trace provider. Default: false
    pub verbose: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            verbose: false,
        }
    }
}

impl EvalConfig {
    /// Create new configuration with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the step budget
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Enable or disable step tracing
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = EvalConfig::new().with_max_steps(3).with_verbose(true);
        assert_eq!(
            config,
            EvalConfig {
                max_steps: 3,
                verbose: true
            }
        );
        assert_eq!(EvalConfig::default().max_steps, DEFAULT_MAX_STEPS);
    }
}
