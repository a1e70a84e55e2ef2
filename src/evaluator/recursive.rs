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

//! Recursive normal-order and eager evaluation
//!
//! `eval_node` consumes the detached tree it is given: the tree is either
//! returned as the value or released once its parts have been copied out.
//! Every value returned is canonical: an abstraction, a constant or a tuple.

use super::{Evaluator, Strategy};
use crate::ast::{ErrorTerm, ExprArena, ExpressionNode, NodeId};
use crate::error::{LambdaError, Result};
use crate::reduction::SubstitutionMap;

/// Mutable state of one recursive evaluation
pub(super) struct EvalState {
    pub(super) strategy: Strategy,
    pub(super) steps: usize,
    crumbs: String,
}

impl EvalState {
    fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            steps: 0,
            crumbs: String::new(),
        }
    }
}

impl Evaluator {
    pub(super) fn run_recursive(
        &self,
        arena: &mut ExprArena,
        node: NodeId,
        strategy: Strategy,
    ) -> Result<NodeId> {
        let working = arena.deep_clone(arena.root_of(node));
        log::debug!("{strategy} evaluation of {}", arena.display(working));
        let mut state = EvalState::new(strategy);
        let value = self.eval_node(arena, working, &mut state)?;
        log::debug!("{strategy} evaluation finished after {} steps", state.steps);
        Ok(value)
    }

    pub(super) fn eval_node(
        &self,
        arena: &mut ExprArena,
        id: NodeId,
        state: &mut EvalState,
    ) -> Result<NodeId> {
        match arena.kind(id).clone() {
            ExpressionNode::Var { name } => Err(LambdaError::cant_eval(format!(
                "free variable {name} has no value"
            ))),
            ExpressionNode::Lam { .. } | ExpressionNode::Literal(_) => {
                self.step(arena, id, state)?;
                Ok(id)
            }
            ExpressionNode::App { operator, operand } => {
                self.eval_application(arena, id, operator, operand, state)
            }
            ExpressionNode::Error(ErrorTerm::Error) => {
                Err(LambdaError::raised("the error term was evaluated"))
            }
            ExpressionNode::Error(ErrorTerm::TypeError) => {
                Err(LambdaError::type_error("the typeerror term was evaluated"))
            }
            ExpressionNode::UnaryOp { op, operand } => {
                self.eval_unary(arena, id, op, operand, state)
            }
            ExpressionNode::BinaryOp { op, left, right } => {
                self.eval_binary(arena, id, op, left, right, state)
            }
            ExpressionNode::Conditional {
                condition,
                then_branch,
                else_branch,
            } => self.eval_conditional(arena, id, [condition, then_branch, else_branch], state),
            ExpressionNode::Tuple { items } => self.eval_tuple(arena, id, &items, state),
            ExpressionNode::TupleIndex { tuple, index } => {
                self.eval_projection(arena, id, tuple, index, state)
            }
            ExpressionNode::LetIn { definitions, body } => {
                self.eval_let(arena, id, &definitions, body, state)
            }
            ExpressionNode::LetRec { definitions, body } => {
                self.eval_letrec(arena, id, &definitions, body, state)
            }
            ExpressionNode::Rec { inner } => self.eval_rec(arena, id, inner, state),
        }
    }

    fn eval_application(
        &self,
        arena: &mut ExprArena,
        id: NodeId,
        operator: NodeId,
        operand: NodeId,
        state: &mut EvalState,
    ) -> Result<NodeId> {
        let shown = self.step(arena, id, state)?;
        let operator = arena.deep_clone(operator);
        let operand = arena.deep_clone(operand);
        arena.release(id);

        let function = self.descend(arena, operator, state, 'a')?;
        let (binder, body) = self.abstraction_parts(arena, function)?;
        let argument = match state.strategy {
            Strategy::Eager => {
                let value = self.descend(arena, operand, state, 'b')?;
                debug_assert!(
                    arena.kind(value).is_value(),
                    "eager operand evaluated to {}",
                    arena.display(value)
                );
                value
            }
            Strategy::Normal => operand,
        };
        let instance = instantiate(arena, body, binder, argument);
        arena.release(function);
        arena.release(argument);

        let crumb = state.strategy.body_crumb();
        let value = self.descend(arena, instance, state, crumb)?;
        self.trace_value(arena, shown, value, state);
        Ok(value)
    }

    /// Binder and body of `function`, which must have evaluated to an abstraction
    pub(super) fn abstraction_parts(
        &self,
        arena: &ExprArena,
        function: NodeId,
    ) -> Result<(String, NodeId)> {
        match arena.kind(function) {
            ExpressionNode::Lam { binder, body } => Ok((binder.clone(), *body)),
            other => Err(LambdaError::cant_eval(format!(
                "{} is a {}, not an abstraction",
                arena.display(function),
                other.kind_name()
            ))),
        }
    }

    /// Evaluate `id` one level deeper, under breadcrumb `crumb`
    pub(super) fn descend(
        &self,
        arena: &mut ExprArena,
        id: NodeId,
        state: &mut EvalState,
        crumb: char,
    ) -> Result<NodeId> {
        state.crumbs.push(crumb);
        let result = self.eval_node(arena, id, state);
        state.crumbs.pop();
        result
    }

    /// Consume one step, tracing `id` on entry. Returns the rendered term when verbose.
    pub(super) fn step(
        &self,
        arena: &ExprArena,
        id: NodeId,
        state: &mut EvalState,
    ) -> Result<Option<String>> {
        let max_steps = self.config.max_steps;
        if state.steps >= max_steps {
            return Err(LambdaError::StepLimitExceeded { max_steps });
        }
        state.steps += 1;

        if !self.config.verbose {
            return Ok(None);
        }
        let term = self.render(arena, id);
        self.emit(format!("{}{term}", self.trace_prefix(state)));
        Ok(Some(term))
    }

    /// Trace `shown` together with the value it evaluated to
    pub(super) fn trace_value(
        &self,
        arena: &ExprArena,
        shown: Option<String>,
        value: NodeId,
        state: &EvalState,
    ) {
        if let Some(term) = shown {
            let value = self.render(arena, value);
            let arrow = state.strategy.arrow();
            self.emit(format!("{}{term}{arrow}{value}", self.trace_prefix(state)));
        }
    }

    fn trace_prefix(&self, state: &EvalState) -> String {
        let counter = format!("{}/{}", state.steps, self.config.max_steps);
        format!(
            "{:<6} step {counter:>6} -> {}",
            state.crumbs,
            "| ".repeat(state.crumbs.chars().count())
        )
    }
}

/// `body[binder := argument]` as a fresh tree
pub(super) fn instantiate(
    arena: &mut ExprArena,
    body: NodeId,
    binder: String,
    argument: NodeId,
) -> NodeId {
    let mut map = SubstitutionMap::default();
    map.insert(binder, argument);
    arena.substitute(body, &map)
}
