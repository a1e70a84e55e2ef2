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

//! Redex-list drivers

use super::Evaluator;
use crate::ast::{ExprArena, NodeId};
use crate::error::{LambdaError, Result};
use crate::reduction::RedexOrder;

impl Evaluator {
    /// Reduce the outermost redex until the root is an abstraction
    ///
    /// Fails with [`LambdaError::CantReduceToCanonical`] when no redex is left
    /// while the root is still not an abstraction.
    pub fn goto_canonical(&self, arena: &mut ExprArena, node: NodeId) -> Result<NodeId> {
        self.guarded(arena, |this, arena| this.run_to_canonical(arena, node))
    }

    /// Reduce innermost redexes until no redex is left anywhere
    ///
    /// Each step reduces the last redex of the outermost-first enumeration,
    /// which has no redex beneath it.
    pub fn goto_normal_form(&self, arena: &mut ExprArena, node: NodeId) -> Result<NodeId> {
        self.guarded(arena, |this, arena| this.run_to_normal_form(arena, node))
    }

    fn run_to_canonical(&self, arena: &mut ExprArena, node: NodeId) -> Result<NodeId> {
        let mut root = arena.deep_clone(arena.root_of(node));
        let mut steps = 0;
        log::debug!("reducing {} to canonical form", arena.display(root));
        self.trace_iteration(arena, root, steps, None);

        while !arena.is_canonical(root) {
            self.check_budget(steps)?;
            let redexes = arena.find_redexes(root, RedexOrder::OutermostFirst);
            let Some(&redex) = redexes.first() else {
                return Err(LambdaError::CantReduceToCanonical {
                    term: arena.display(root).to_string(),
                });
            };
            let reduced = arena.reduce(redex)?;
            root = arena.root_of(reduced);
            steps += 1;
            self.trace_iteration(arena, root, steps, None);
        }

        log::debug!("canonical form reached after {steps} steps");
        Ok(root)
    }

    fn run_to_normal_form(&self, arena: &mut ExprArena, node: NodeId) -> Result<NodeId> {
        let mut root = arena.deep_clone(arena.root_of(node));
        let mut steps = 0;
        log::debug!("reducing {} to normal form", arena.display(root));

        let mut redexes = arena.find_redexes(root, RedexOrder::OutermostFirst);
        self.trace_iteration(arena, root, steps, Some(redexes.len()));

        while let Some(&redex) = redexes.last() {
            self.check_budget(steps)?;
            let reduced = arena.reduce(redex)?;
            root = arena.root_of(reduced);
            steps += 1;
            redexes = arena.find_redexes(root, RedexOrder::OutermostFirst);
            self.trace_iteration(arena, root, steps, Some(redexes.len()));
        }

        log::debug!("normal form reached after {steps} steps");
        Ok(root)
    }

    fn check_budget(&self, steps: usize) -> Result<()> {
        if steps >= self.config.max_steps {
            return Err(LambdaError::StepLimitExceeded {
                max_steps: self.config.max_steps,
            });
        }
        Ok(())
    }

    fn trace_iteration(&self, arena: &ExprArena, root: NodeId, steps: usize, redexes: Option<usize>) {
        if !self.config.verbose {
            return;
        }
        let term = self.render(arena, root);
        let line = match redexes {
            Some(count) => format!("step {steps:>3} -> {term}    {count} redexes"),
            None => format!("step {steps:>3} -> {term}"),
        };
        self.emit(line);
    }
}
