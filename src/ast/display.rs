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

//! Canonical rendering of terms
//!
//! Every composite node is fully parenthesized, so the rendering is unambiguous
//! and the parser reads it back to the same tree.

use super::arena::ExprArena;
use super::expression::{ExpressionNode, NodeId};
use std::fmt;

/// Displayable view of one subtree
pub struct Displayed<'a> {
    arena: &'a ExprArena,
    id: NodeId,
}

impl ExprArena {
    /// Canonical rendering of the subtree rooted at `id`
    pub fn display(&self, id: NodeId) -> Displayed<'_> {
        Displayed { arena: self, id }
    }
}

impl fmt::Display for Displayed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_term(self.arena, self.id, f)
    }
}

fn write_term(arena: &ExprArena, id: NodeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &arena[id] {
        ExpressionNode::Var { name } => write!(f, "{name}"),
        ExpressionNode::Lam { binder, body } => {
            write!(f, "(λ{binder}.")?;
            write_term(arena, *body, f)?;
            write!(f, ")")
        }
        ExpressionNode::App { operator, operand } => {
            write!(f, "(")?;
            write_term(arena, *operator, f)?;
            write!(f, " ")?;
            write_term(arena, *operand, f)?;
            write!(f, ")")
        }
        ExpressionNode::Literal(value) => write!(f, "{value}"),
        ExpressionNode::Error(term) => write!(f, "{}", term.keyword()),
        ExpressionNode::UnaryOp { op, operand } => {
            write!(f, "({op} ")?;
            write_term(arena, *operand, f)?;
            write!(f, ")")
        }
        ExpressionNode::BinaryOp { op, left, right } => {
            write!(f, "(")?;
            write_term(arena, *left, f)?;
            write!(f, " {op} ")?;
            write_term(arena, *right, f)?;
            write!(f, ")")
        }
        ExpressionNode::Conditional {
            condition,
            then_branch,
            else_branch,
        } => {
            write!(f, "(if ")?;
            write_term(arena, *condition, f)?;
            write!(f, " then ")?;
            write_term(arena, *then_branch, f)?;
            write!(f, " else ")?;
            write_term(arena, *else_branch, f)?;
            write!(f, ")")
        }
        ExpressionNode::Tuple { items } => {
            write!(f, "<")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_term(arena, *item, f)?;
            }
            write!(f, ">")
        }
        ExpressionNode::TupleIndex { tuple, index } => {
            write!(f, "(")?;
            write_term(arena, *tuple, f)?;
            write!(f, ".{index})")
        }
        ExpressionNode::LetIn { definitions, body } => {
            write!(f, "(let ")?;
            for (i, definition) in definitions.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{} := ", definition.pattern)?;
                write_term(arena, definition.value, f)?;
            }
            write!(f, " in ")?;
            write_term(arena, *body, f)?;
            write!(f, ")")
        }
        ExpressionNode::LetRec { definitions, body } => {
            write!(f, "(letrec ")?;
            for (i, definition) in definitions.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{} := ", definition.name)?;
                write_term(arena, definition.value, f)?;
            }
            write!(f, " in ")?;
            write_term(arena, *body, f)?;
            write!(f, ")")
        }
        ExpressionNode::Rec { inner } => {
            write!(f, "(rec ")?;
            write_term(arena, *inner, f)?;
            write!(f, ")")
        }
    }
}

/// Renders terms for trace output
pub trait TermFormatter {
    /// Render the subtree rooted at `id`
    fn format(&self, arena: &ExprArena, id: NodeId) -> String;
}

/// The canonical, fully parenthesized rendering
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalFormatter;

impl TermFormatter for CanonicalFormatter {
    fn format(&self, arena: &ExprArena, id: NodeId) -> String {
        arena.display(id).to_string()
    }
}

impl<F> TermFormatter for F
where
    F: Fn(&ExprArena, NodeId) -> String,
{
    fn format(&self, arena: &ExprArena, id: NodeId) -> String {
        self(arena, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOperator, ErrorTerm, Pattern};

    #[test]
    fn test_core_rendering() {
        let mut arena = ExprArena::new();
        let x = arena.var("x");
        let y = arena.var("y");
        let app = arena.app(x, y);
        let lam = arena.lam("x", app);
        assert_eq!(arena.display(lam).to_string(), "(λx.(x y))");
    }

    #[test]
    fn test_extension_rendering() {
        let mut arena = ExprArena::new();
        let one = arena.natural(1);
        let two = arena.natural(2);
        let sum = arena.binary_op(BinaryOperator::Add, one, two);
        let flag = arena.boolean(true);
        let oops = arena.error_term(ErrorTerm::TypeError);
        let pair = arena.tuple([sum, flag]);
        let guard = arena.boolean(false);
        let cond = arena.conditional(guard, pair, oops);
        let p = arena.var("p");
        let first = arena.tuple_index(p, 1);
        let let_in = arena.let_in([(Pattern::Var("p".into()), cond)], first);
        assert_eq!(
            arena.display(let_in).to_string(),
            "(let p := (if false then <(1 + 2), true> else typeerror) in (p.1))"
        );
    }

    #[test]
    fn test_closure_formatter() {
        let mut arena = ExprArena::new();
        let x = arena.var("x");
        let formatter = |arena: &ExprArena, id: NodeId| format!("[{}]", arena.display(id));
        assert_eq!(formatter.format(&arena, x), "[x]");
        assert_eq!(CanonicalFormatter.format(&arena, x), "x");
    }
}
