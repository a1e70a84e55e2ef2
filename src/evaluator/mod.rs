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

//! Bounded evaluation drivers
//!
//! Two families share one [`Evaluator`]:
//!
//! - iterative drivers ([`Evaluator::goto_canonical`], [`Evaluator::goto_normal_form`])
//!   repeatedly pick a redex from the redex list and reduce it in place
//! - recursive evaluators ([`Evaluator::eval_normal`], [`Evaluator::eval_eager`])
//!   walk the term under a [`Strategy`] and share one step counter
//!
//! Every driver deep-clones the tree containing its input and works on the
//! clone, so the caller's term is never mutated. When a driver fails, every
//! node it allocated is discarded again.
//!
//! # Examples
//!
//! ```rust
//! use lamedh::ast::ExprArena;
//! use lamedh::evaluator::{EvalConfig, Evaluator};
//! use lamedh::parser::parse_expression;
//!
//! let mut arena = ExprArena::new();
//! let term = parse_expression(&mut arena, "(λx.x) (λy.y)").unwrap();
//!
//! let evaluator = Evaluator::new(EvalConfig::default().with_max_steps(10));
//! let value = evaluator.eval_normal(&mut arena, term).unwrap();
//! assert_eq!(arena.display(value).to_string(), "(λy.y)");
//! ```

mod applicative;
pub mod config;
mod iterative;
mod recursive;
pub mod trace;

pub use config::{DEFAULT_MAX_STEPS, EvalConfig};
pub use trace::{
    CollectingTraceProvider, NoOpTraceProvider, SharedTraceProvider, StdoutTraceProvider,
    TraceProvider, create_collecting_provider, create_noop_provider, create_stdout_provider,
};

use crate::ast::{CanonicalFormatter, ExprArena, NodeId, TermFormatter};
use crate::error::Result;
use std::fmt;

/// Operand-handling policy of the recursive evaluators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Operands are substituted unevaluated
    Normal,
    /// Operands are evaluated to a value before substitution
    Eager,
}

impl Strategy {
    /// Arrow printed between a term and its value in verbose traces
    pub fn arrow(self) -> &'static str {
        match self {
            Strategy::Normal => " =N=> ",
            Strategy::Eager => " =E=> ",
        }
    }

    /// Breadcrumb of the final evaluation of an instantiated body
    fn body_crumb(self) -> char {
        match self {
            Strategy::Normal => 'b',
            Strategy::Eager => 'c',
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Normal => write!(f, "normal"),
            Strategy::Eager => write!(f, "eager"),
        }
    }
}

/// Runs the drivers with one configuration, formatter and trace sink
pub struct Evaluator {
    config: EvalConfig,
    formatter: Box<dyn TermFormatter + Send + Sync>,
    tracer: SharedTraceProvider,
}

impl Evaluator {
    /// Create an evaluator that renders canonically and traces to stdout
    pub fn new(config: EvalConfig) -> Self {
        Self {
            config,
            formatter: Box::new(CanonicalFormatter),
            tracer: create_stdout_provider(),
        }
    }

    /// Use `formatter` to render terms in trace lines
    pub fn with_formatter(mut self, formatter: impl TermFormatter + Send + Sync + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    /// Send trace lines to `tracer`
    pub fn with_trace_provider(mut self, tracer: SharedTraceProvider) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn trace_provider(&self) -> &SharedTraceProvider {
        &self.tracer
    }

    /// Evaluate `node` with the recursive evaluator selected by `strategy`
    pub fn eval(&self, arena: &mut ExprArena, node: NodeId, strategy: Strategy) -> Result<NodeId> {
        self.guarded(arena, |this, arena| this.run_recursive(arena, node, strategy))
    }

    /// Full normal-order evaluation
    pub fn eval_normal(&self, arena: &mut ExprArena, node: NodeId) -> Result<NodeId> {
        self.eval(arena, node, Strategy::Normal)
    }

    /// Full eager (call-by-value) evaluation
    pub fn eval_eager(&self, arena: &mut ExprArena, node: NodeId) -> Result<NodeId> {
        self.eval(arena, node, Strategy::Eager)
    }

    /// Run `driver`, discarding everything it allocated if it fails
    fn guarded(
        &self,
        arena: &mut ExprArena,
        driver: impl FnOnce(&Self, &mut ExprArena) -> Result<NodeId>,
    ) -> Result<NodeId> {
        let mark = arena.mark();
        let result = driver(self, arena);
        if let Err(err) = &result {
            log::debug!("evaluation failed: {err}");
            arena.discard_from(mark);
        }
        result
    }

    fn render(&self, arena: &ExprArena, id: NodeId) -> String {
        self.formatter.format(arena, id)
    }

    fn emit(&self, line: String) {
        log::trace!("{line}");
        self.tracer.trace(&line);
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(EvalConfig::default())
    }
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
