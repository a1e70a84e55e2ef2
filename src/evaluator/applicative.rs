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

//! Evaluation rules for constants, operators, conditionals, tuples and the
//! local binding forms

use super::recursive::{EvalState, instantiate};
use super::{Evaluator, Strategy};
use crate::ast::{
    BinaryOperator, ExprArena, ExpressionNode, LiteralValue, LocalDefinition, NodeId, Pattern,
    RecursiveDefinition, UnaryOperator,
};
use crate::error::{LambdaError, Result};
use crate::reduction::SubstitutionMap;

/// Values bound by a `let`, plus the evaluated trees they point into
#[derive(Default)]
struct Bindings {
    map: SubstitutionMap,
    temporaries: Vec<NodeId>,
}

impl Evaluator {
    pub(super) fn eval_unary(
        &self,
        arena: &mut ExprArena,
        id: NodeId,
        op: UnaryOperator,
        operand: NodeId,
        state: &mut EvalState,
    ) -> Result<NodeId> {
        let shown = self.step(arena, id, state)?;
        let operand = arena.deep_clone(operand);
        arena.release(id);

        let value = self.descend(arena, operand, state, 'a')?;
        let constant = constant_of(arena, value, op.symbol())?;
        arena.release(value);

        let result = arena.literal(apply_unary(op, constant)?);
        self.trace_value(arena, shown, result, state);
        Ok(result)
    }

    pub(super) fn eval_binary(
        &self,
        arena: &mut ExprArena,
        id: NodeId,
        op: BinaryOperator,
        left: NodeId,
        right: NodeId,
        state: &mut EvalState,
    ) -> Result<NodeId> {
        let shown = self.step(arena, id, state)?;
        let left = arena.deep_clone(left);
        let right = arena.deep_clone(right);
        arena.release(id);

        let left_value = self.descend(arena, left, state, 'a')?;
        let lhs = constant_of(arena, left_value, op.symbol())?;
        arena.release(left_value);

        let constant = match short_circuit(op, lhs)? {
            Some(decided) => {
                arena.release(right);
                decided
            }
            None => {
                let right_value = self.descend(arena, right, state, 'b')?;
                let rhs = constant_of(arena, right_value, op.symbol())?;
                arena.release(right_value);
                apply_binary(op, lhs, rhs)?
            }
        };

        let result = arena.literal(constant);
        self.trace_value(arena, shown, result, state);
        Ok(result)
    }

    pub(super) fn eval_conditional(
        &self,
        arena: &mut ExprArena,
        id: NodeId,
        [condition, then_branch, else_branch]: [NodeId; 3],
        state: &mut EvalState,
    ) -> Result<NodeId> {
        let shown = self.step(arena, id, state)?;
        let condition = arena.deep_clone(condition);
        let then_branch = arena.deep_clone(then_branch);
        let else_branch = arena.deep_clone(else_branch);
        arena.release(id);

        let guard = self.descend(arena, condition, state, 'a')?;
        let flag = match arena.kind(guard) {
            ExpressionNode::Literal(LiteralValue::Boolean(flag)) => *flag,
            other => {
                return Err(LambdaError::type_error(format!(
                    "the condition {} is a {}, not a boolean",
                    arena.display(guard),
                    other.kind_name()
                )));
            }
        };
        arena.release(guard);

        let (taken, skipped) = if flag {
            (then_branch, else_branch)
        } else {
            (else_branch, then_branch)
        };
        arena.release(skipped);

        let value = self.descend(arena, taken, state, 'b')?;
        self.trace_value(arena, shown, value, state);
        Ok(value)
    }

    pub(super) fn eval_tuple(
        &self,
        arena: &mut ExprArena,
        id: NodeId,
        items: &[NodeId],
        state: &mut EvalState,
    ) -> Result<NodeId> {
        let shown = self.step(arena, id, state)?;
        if state.strategy == Strategy::Normal {
            return Ok(id);
        }

        let copies: Vec<NodeId> = items.iter().map(|&item| arena.deep_clone(item)).collect();
        arena.release(id);
        let mut values = Vec::with_capacity(copies.len());
        for copy in copies {
            values.push(self.descend(arena, copy, state, 't')?);
        }

        let result = arena.tuple(values);
        self.trace_value(arena, shown, result, state);
        Ok(result)
    }

    pub(super) fn eval_projection(
        &self,
        arena: &mut ExprArena,
        id: NodeId,
        tuple: NodeId,
        index: usize,
        state: &mut EvalState,
    ) -> Result<NodeId> {
        let shown = self.step(arena, id, state)?;
        let tuple = arena.deep_clone(tuple);
        arena.release(id);

        let value = self.descend(arena, tuple, state, 'a')?;
        let items = match arena.kind(value) {
            ExpressionNode::Tuple { items } => items.clone(),
            other => {
                return Err(LambdaError::type_error(format!(
                    "projection .{index} applied to {}, a {}",
                    arena.display(value),
                    other.kind_name()
                )));
            }
        };
        let Some(&item) = index.checked_sub(1).and_then(|i| items.get(i)) else {
            return Err(LambdaError::cant_eval(format!(
                "a tuple with {} components has no component {index}",
                items.len()
            )));
        };
        let selected = arena.deep_clone(item);
        arena.release(value);

        let result = self.descend(arena, selected, state, 'b')?;
        self.trace_value(arena, shown, result, state);
        Ok(result)
    }

    pub(super) fn eval_let(
        &self,
        arena: &mut ExprArena,
        id: NodeId,
        definitions: &[LocalDefinition],
        body: NodeId,
        state: &mut EvalState,
    ) -> Result<NodeId> {
        let shown = self.step(arena, id, state)?;
        let mut bindings = Bindings::default();
        for definition in definitions {
            self.bind_pattern(
                arena,
                &definition.pattern,
                definition.value,
                false,
                &mut bindings,
                state,
            )?;
        }

        let instance = arena.substitute(body, &bindings.map);
        for temporary in bindings.temporaries {
            arena.release(temporary);
        }
        arena.release(id);

        let value = self.descend(arena, instance, state, 'b')?;
        self.trace_value(arena, shown, value, state);
        Ok(value)
    }

    /// Bind `pattern` to `value`, evaluating only what the strategy and the
    /// pattern shape require. `evaluated` says whether `value` already is the
    /// result of an evaluation.
    fn bind_pattern(
        &self,
        arena: &mut ExprArena,
        pattern: &Pattern,
        value: NodeId,
        evaluated: bool,
        bindings: &mut Bindings,
        state: &mut EvalState,
    ) -> Result<()> {
        let needs_value = matches!(pattern, Pattern::Tuple(_)) || state.strategy == Strategy::Eager;
        let value = if needs_value && !evaluated {
            let copy = arena.deep_clone(value);
            let result = self.descend(arena, copy, state, 'a')?;
            bindings.temporaries.push(result);
            result
        } else {
            value
        };

        match pattern {
            Pattern::Var(name) => {
                bindings.map.insert(name.clone(), value);
                Ok(())
            }
            Pattern::Tuple(patterns) => {
                let items = match arena.kind(value) {
                    ExpressionNode::Tuple { items } if items.len() == patterns.len() => {
                        items.clone()
                    }
                    _ => {
                        return Err(LambdaError::type_error(format!(
                            "pattern {pattern} does not match {}",
                            arena.display(value)
                        )));
                    }
                };
                let items_evaluated = state.strategy == Strategy::Eager;
                for (pattern, item) in patterns.iter().zip(items) {
                    self.bind_pattern(arena, pattern, item, items_evaluated, bindings, state)?;
                }
                Ok(())
            }
        }
    }

    pub(super) fn eval_letrec(
        &self,
        arena: &mut ExprArena,
        id: NodeId,
        definitions: &[RecursiveDefinition],
        body: NodeId,
        state: &mut EvalState,
    ) -> Result<NodeId> {
        let shown = self.step(arena, id, state)?;

        // every name unfolds to `letrec <definitions> in name`
        let mut unfold = SubstitutionMap::default();
        for definition in definitions {
            let copies: Vec<(String, NodeId)> = definitions
                .iter()
                .map(|d| (d.name.clone(), arena.deep_clone(d.value)))
                .collect();
            let name = arena.var(definition.name.clone());
            let unfolded = arena.let_rec(copies, name);
            if let Some(previous) = unfold.insert(definition.name.clone(), unfolded) {
                arena.release(previous);
            }
        }

        let mut bindings = SubstitutionMap::default();
        let mut temporaries = Vec::with_capacity(definitions.len());
        for definition in definitions {
            let instance = arena.substitute(definition.value, &unfold);
            let bound = match state.strategy {
                Strategy::Eager => self.descend(arena, instance, state, 'a')?,
                Strategy::Normal => instance,
            };
            temporaries.push(bound);
            bindings.insert(definition.name.clone(), bound);
        }

        let instance = arena.substitute(body, &bindings);
        for node in temporaries.into_iter().chain(unfold.into_values()) {
            arena.release(node);
        }
        arena.release(id);

        let value = self.descend(arena, instance, state, 'b')?;
        self.trace_value(arena, shown, value, state);
        Ok(value)
    }

    pub(super) fn eval_rec(
        &self,
        arena: &mut ExprArena,
        id: NodeId,
        inner: NodeId,
        state: &mut EvalState,
    ) -> Result<NodeId> {
        let shown = self.step(arena, id, state)?;
        let inner = arena.deep_clone(inner);
        arena.release(id);

        let function = self.descend(arena, inner, state, 'a')?;
        let (binder, body) = self.abstraction_parts(arena, function)?;
        let copy = arena.deep_clone(function);
        let unfolded = arena.rec(copy);
        let instance = instantiate(arena, body, binder, unfolded);
        arena.release(unfolded);
        arena.release(function);

        let value = self.descend(arena, instance, state, 'b')?;
        self.trace_value(arena, shown, value, state);
        Ok(value)
    }
}

fn constant_of(arena: &ExprArena, id: NodeId, operator: &str) -> Result<LiteralValue> {
    match arena.kind(id) {
        ExpressionNode::Literal(value) => Ok(*value),
        other => Err(LambdaError::type_error(format!(
            "operator {operator} expects constants, got {} ({})",
            other.kind_name(),
            arena.display(id)
        ))),
    }
}

fn apply_unary(op: UnaryOperator, operand: LiteralValue) -> Result<LiteralValue> {
    match (op, operand) {
        (UnaryOperator::Not, LiteralValue::Boolean(b)) => Ok(LiteralValue::Boolean(!b)),
        (UnaryOperator::Minus, LiteralValue::Natural(0)) => Ok(LiteralValue::Natural(0)),
        (UnaryOperator::Minus, LiteralValue::Natural(n)) => Err(LambdaError::raised(format!(
            "-{n} is not a natural number"
        ))),
        (op, operand) => Err(LambdaError::type_error(format!(
            "operator {op} cannot be applied to a {}",
            operand.type_name()
        ))),
    }
}

fn short_circuit(op: BinaryOperator, lhs: LiteralValue) -> Result<Option<LiteralValue>> {
    if !op.short_circuits() {
        return Ok(None);
    }
    let LiteralValue::Boolean(flag) = lhs else {
        return Err(LambdaError::type_error(format!(
            "operator {op} expects booleans, got a {}",
            lhs.type_name()
        )));
    };
    let decided = match op {
        BinaryOperator::And if !flag => Some(false),
        BinaryOperator::Or if flag => Some(true),
        BinaryOperator::Implies if !flag => Some(true),
        _ => None,
    };
    Ok(decided.map(LiteralValue::Boolean))
}

fn apply_binary(op: BinaryOperator, lhs: LiteralValue, rhs: LiteralValue) -> Result<LiteralValue> {
    use BinaryOperator as Op;
    use LiteralValue::{Boolean, Natural};

    let overflow = || LambdaError::raised(format!("{lhs} {op} {rhs} overflows"));
    let value = match (op, lhs, rhs) {
        (Op::Add, Natural(a), Natural(b)) => Natural(a.checked_add(b).ok_or_else(overflow)?),
        (Op::Subtract, Natural(a), Natural(b)) => match a.checked_sub(b) {
            Some(n) => Natural(n),
            None => {
                return Err(LambdaError::raised(format!(
                    "{a} - {b} is not a natural number"
                )));
            }
        },
        (Op::Multiply, Natural(a), Natural(b)) => Natural(a.checked_mul(b).ok_or_else(overflow)?),
        (Op::Divide | Op::Modulo, Natural(_), Natural(0)) => {
            return Err(LambdaError::raised(format!("{lhs} {op} 0: division by zero")));
        }
        (Op::Divide, Natural(a), Natural(b)) => Natural(a / b),
        (Op::Modulo, Natural(a), Natural(b)) => Natural(a % b),
        (Op::Equal, a, b) if a.type_name() == b.type_name() => Boolean(a == b),
        (Op::NotEqual, a, b) if a.type_name() == b.type_name() => Boolean(a != b),
        (Op::LessThan, Natural(a), Natural(b)) => Boolean(a < b),
        (Op::LessThanOrEqual, Natural(a), Natural(b)) => Boolean(a <= b),
        (Op::GreaterThan, Natural(a), Natural(b)) => Boolean(a > b),
        (Op::GreaterThanOrEqual, Natural(a), Natural(b)) => Boolean(a >= b),
        (Op::And, Boolean(a), Boolean(b)) => Boolean(a && b),
        (Op::Or, Boolean(a), Boolean(b)) => Boolean(a || b),
        (Op::Implies, Boolean(a), Boolean(b)) => Boolean(!a || b),
        (Op::Equivalent, Boolean(a), Boolean(b)) => Boolean(a == b),
        _ => {
            return Err(LambdaError::type_error(format!(
                "operator {op} cannot be applied to a {} and a {}",
                lhs.type_name(),
                rhs.type_name()
            )));
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::EvalConfig;
    use crate::parser::parse_expression;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn evaluate(source: &str, strategy: Strategy) -> Result<String> {
        let mut arena = ExprArena::new();
        let term = parse_expression(&mut arena, source)?;
        let evaluator = Evaluator::new(EvalConfig::default().with_max_steps(2000));
        let value = evaluator.eval(&mut arena, term, strategy)?;
        Ok(arena.display(value).to_string())
    }

    #[rstest]
    #[case("1 + 2 * 3", "7")]
    #[case("(10 - 4) / 3", "2")]
    #[case("10 % 4", "2")]
    #[case("3 < 4 and not (2 = 3)", "true")]
    #[case("false => error", "true")]
    #[case("true or error", "true")]
    #[case("true <=> false", "false")]
    #[case("if 2 >= 3 then 1 else 0", "0")]
    #[case("<1, 2 + 3>.2", "5")]
    #[case("let x := 4, y := 5 in x * y", "20")]
    #[case("let <a, b> := <1, 2> in b - a", "1")]
    #[case("(λp.p.1) <true, 3>", "true")]
    #[case("letrec fact := λn. if n = 0 then 1 else n * fact (n - 1) in fact 5", "120")]
    #[case("(rec λf.λn. if n = 0 then 0 else n + f (n - 1)) 4", "10")]
    fn test_applicative_programs(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(evaluate(source, Strategy::Normal).unwrap(), expected);
        assert_eq!(evaluate(source, Strategy::Eager).unwrap(), expected);
    }

    #[test]
    fn test_tuples_under_each_strategy() {
        assert_eq!(
            evaluate("<1 + 1, λx.x>", Strategy::Normal).unwrap(),
            "<(1 + 1), (λx.x)>"
        );
        assert_eq!(
            evaluate("<1 + 1, λx.x>", Strategy::Eager).unwrap(),
            "<2, (λx.x)>"
        );
    }

    #[test]
    fn test_lazy_let_skips_unused_definition() {
        let source = "let unused := error, x := 1 in x";
        assert_eq!(evaluate(source, Strategy::Normal).unwrap(), "1");
        assert_eq!(
            evaluate(source, Strategy::Eager).unwrap_err().kind(),
            "Error"
        );
    }

    #[rstest]
    #[case("1 + true", "TypeError")]
    #[case("if 1 then 2 else 3", "TypeError")]
    #[case("typeerror", "TypeError")]
    #[case("error", "Error")]
    #[case("4 / 0", "Error")]
    #[case("2 - 3", "Error")]
    #[case("- 1", "Error")]
    #[case("<1, 2>.3", "CantEval")]
    #[case("(λx.x).1", "TypeError")]
    #[case("let <a, b> := <1, 2, 3> in a", "TypeError")]
    #[case("rec 3", "CantEval")]
    fn test_runtime_failures(#[case] source: &str, #[case] kind: &str) {
        assert_eq!(evaluate(source, Strategy::Normal).unwrap_err().kind(), kind);
    }

    #[test]
    fn test_apply_binary_table() {
        use LiteralValue::*;
        assert_eq!(
            apply_binary(BinaryOperator::Equal, Boolean(true), Boolean(true)).unwrap(),
            Boolean(true)
        );
        assert_eq!(
            apply_binary(BinaryOperator::Equal, Natural(1), Boolean(true))
                .unwrap_err()
                .kind(),
            "TypeError"
        );
        assert_eq!(
            apply_binary(BinaryOperator::Multiply, Natural(u64::MAX), Natural(2))
                .unwrap_err()
                .kind(),
            "Error"
        );
    }
}
