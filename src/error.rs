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

//! Error types for reduction and evaluation

use crate::parser::ParseError;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, LambdaError>;

/// Failures raised by the reducer, the drivers and the evaluators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LambdaError {
    /// `reduce` was called on something that is not a beta-redex
    #[error("Cannot reduce {term}: the operator is not an abstraction")]
    CantReduce {
        /// Rendering of the offending term
        term: String,
    },

    /// A recursive evaluator could not make progress
    #[error("Cannot evaluate: {message}")]
    CantEval {
        /// Description of the stuck term
        message: String,
    },

    /// An iterative driver ran out of redexes before reaching its target
    #[error("Cannot reduce {term} to canonical form: no redex left")]
    CantReduceToCanonical {
        /// Rendering of the stuck term
        term: String,
    },

    /// The step budget was exhausted before a result was reached
    #[error("Step limit of {max_steps} exceeded")]
    StepLimitExceeded {
        /// Configured budget
        max_steps: usize,
    },

    /// An operation received a value of the wrong kind
    #[error("Type error: {message}")]
    TypeError {
        /// Error message
        message: String,
    },

    /// The `error` term was evaluated or an arithmetic fault occurred
    #[error("Error raised: {message}")]
    RaisedError {
        /// Error message
        message: String,
    },

    /// `rename` was called on a node that has no name
    #[error("Cannot rename {term}: only variables and abstractions carry a name")]
    CantRename {
        /// Rendering of the offending term
        term: String,
    },

    /// Source text could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl LambdaError {
    /// Short kind name, as reported at the command boundary
    pub fn kind(&self) -> &'static str {
        match self {
            LambdaError::CantReduce { .. } => "CantReduce",
            LambdaError::CantEval { .. } => "CantEval",
            LambdaError::CantReduceToCanonical { .. } => "CantReduceToCanonical",
            LambdaError::StepLimitExceeded { .. } => "StepLimitExceeded",
            LambdaError::TypeError { .. } => "TypeError",
            LambdaError::RaisedError { .. } => "Error",
            LambdaError::CantRename { .. } => "CantRename",
            LambdaError::Parse(_) => "ParseError",
        }
    }

    /// Whether this failure means the budget ran out rather than a real answer
    pub fn is_step_limit(&self) -> bool {
        matches!(self, LambdaError::StepLimitExceeded { .. })
    }

    pub(crate) fn cant_eval(message: impl Into<String>) -> Self {
        LambdaError::CantEval {
            message: message.into(),
        }
    }

    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        LambdaError::TypeError {
            message: message.into(),
        }
    }

    pub(crate) fn raised(message: impl Into<String>) -> Self {
        LambdaError::RaisedError {
            message: message.into(),
        }
    }
}
