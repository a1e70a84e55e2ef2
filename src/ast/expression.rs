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

//! Expression node definitions

use super::operator::{BinaryOperator, UnaryOperator};
use smallvec::SmallVec;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Handle of a node inside an [`ExprArena`](super::ExprArena)
///
/// The generation tells apart successive occupants of a reused slot, so a
/// handle outliving its node never resolves to the slot's next occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index of this node
    pub fn index(self) -> usize {
        self.index as usize
    }

    /// Occupancy count of the slot when this handle was issued
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.generation {
            0 => write!(f, "#{}", self.index),
            generation => write!(f, "#{}v{generation}", self.index),
        }
    }
}

/// Child list of a node, left to right
pub type Children = SmallVec<[NodeId; 4]>;

/// Term node kinds. Child links are arena handles.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExpressionNode {
    /// Variable occurrence
    Var {
        /// Variable name
        name: String,
    },

    /// Abstraction `λbinder.body`
    Lam {
        /// Bound name
        binder: String,
        /// Scope of the binder
        body: NodeId,
    },

    /// Application `operator operand`
    App {
        /// Function position
        operator: NodeId,
        /// Argument position
        operand: NodeId,
    },

    /// Boolean or natural constant
    Literal(LiteralValue),

    /// The `error` and `typeerror` terms
    Error(ErrorTerm),

    /// Unary operation
    UnaryOp {
        /// The operator
        op: UnaryOperator,
        /// The operand
        operand: NodeId,
    },

    /// Binary operation
    BinaryOp {
        /// The operator
        op: BinaryOperator,
        /// Left operand
        left: NodeId,
        /// Right operand
        right: NodeId,
    },

    /// `if condition then then_branch else else_branch`
    Conditional {
        /// Guard, must evaluate to a boolean
        condition: NodeId,
        /// Taken when the guard holds
        then_branch: NodeId,
        /// Taken otherwise
        else_branch: NodeId,
    },

    /// Tuple `<a, b, ...>`
    Tuple {
        /// Components in order
        items: Children,
    },

    /// Tuple projection `tuple.index` (1-based)
    TupleIndex {
        /// Projected expression
        tuple: NodeId,
        /// 1-based component index
        index: usize,
    },

    /// `let p := e, ... in body`; definitions are not in scope of each other
    LetIn {
        /// Pattern definitions
        definitions: Vec<LocalDefinition>,
        /// Scope of the patterns
        body: NodeId,
    },

    /// `letrec f := e, ... in body`; every definition sees every name
    LetRec {
        /// Named definitions
        definitions: Vec<RecursiveDefinition>,
        /// Scope of the names
        body: NodeId,
    },

    /// Fixed point `rec e`
    Rec {
        /// Expression whose fixed point is taken
        inner: NodeId,
    },
}

/// Constant values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LiteralValue {
    /// `true` / `false`
    Boolean(bool),
    /// Natural number
    Natural(u64),
}

impl LiteralValue {
    /// Name of the value kind, used in type errors
    pub fn type_name(&self) -> &'static str {
        match self {
            LiteralValue::Boolean(_) => "boolean",
            LiteralValue::Natural(_) => "natural",
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Boolean(b) => write!(f, "{b}"),
            LiteralValue::Natural(n) => write!(f, "{n}"),
        }
    }
}

/// Kind of explicit error term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ErrorTerm {
    /// `error`
    Error,
    /// `typeerror`
    TypeError,
}

impl ErrorTerm {
    /// Keyword of this term
    pub fn keyword(&self) -> &'static str {
        match self {
            ErrorTerm::Error => "error",
            ErrorTerm::TypeError => "typeerror",
        }
    }
}

/// Binding pattern of a `let` definition
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Pattern {
    /// Binds the whole value
    Var(String),
    /// Destructures a tuple component-wise
    Tuple(Vec<Pattern>),
}

impl Pattern {
    /// Names bound by this pattern, left to right
    pub fn names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Pattern::Var(name) => out.push(name),
            Pattern::Tuple(items) => items.iter().for_each(|p| p.collect_names(out)),
        }
    }

    /// Whether this pattern binds `name`
    pub fn binds(&self, name: &str) -> bool {
        match self {
            Pattern::Var(n) => n == name,
            Pattern::Tuple(items) => items.iter().any(|p| p.binds(name)),
        }
    }

    /// Rename every binding of `old` to `new`
    pub fn rename(&mut self, old: &str, new: &str) {
        match self {
            Pattern::Var(n) if *n == old => *n = new.to_string(),
            Pattern::Var(_) => {}
            Pattern::Tuple(items) => items.iter_mut().for_each(|p| p.rename(old, new)),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Var(name) => write!(f, "{name}"),
            Pattern::Tuple(items) => {
                write!(f, "<")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ">")
            }
        }
    }
}

/// One `pattern := value` entry of a `let`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LocalDefinition {
    /// Bound pattern
    pub pattern: Pattern,
    /// Defining expression
    pub value: NodeId,
}

/// One `name := value` entry of a `letrec`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RecursiveDefinition {
    /// Bound name
    pub name: String,
    /// Defining expression
    pub value: NodeId,
}

impl ExpressionNode {
    /// Children of this node, left to right (definitions before bodies)
    pub fn children(&self) -> Children {
        match self {
            ExpressionNode::Var { .. } | ExpressionNode::Literal(_) | ExpressionNode::Error(_) => {
                Children::new()
            }
            ExpressionNode::Lam { body, .. } => smallvec::smallvec![*body],
            ExpressionNode::App { operator, operand } => smallvec::smallvec![*operator, *operand],
            ExpressionNode::UnaryOp { operand, .. } => smallvec::smallvec![*operand],
            ExpressionNode::BinaryOp { left, right, .. } => smallvec::smallvec![*left, *right],
            ExpressionNode::Conditional {
                condition,
                then_branch,
                else_branch,
            } => smallvec::smallvec![*condition, *then_branch, *else_branch],
            ExpressionNode::Tuple { items } => items.clone(),
            ExpressionNode::TupleIndex { tuple, .. } => smallvec::smallvec![*tuple],
            ExpressionNode::LetIn { definitions, body } => definitions
                .iter()
                .map(|d| d.value)
                .chain(std::iter::once(*body))
                .collect(),
            ExpressionNode::LetRec { definitions, body } => definitions
                .iter()
                .map(|d| d.value)
                .chain(std::iter::once(*body))
                .collect(),
            ExpressionNode::Rec { inner } => smallvec::smallvec![*inner],
        }
    }

    /// Rebuild this node with every child passed through `f`, in [`children`](Self::children) order
    pub fn map_children(self, mut f: impl FnMut(NodeId) -> NodeId) -> ExpressionNode {
        match self {
            leaf @ (ExpressionNode::Var { .. }
            | ExpressionNode::Literal(_)
            | ExpressionNode::Error(_)) => leaf,
            ExpressionNode::Lam { binder, body } => ExpressionNode::Lam {
                binder,
                body: f(body),
            },
            ExpressionNode::App { operator, operand } => {
                let operator = f(operator);
                ExpressionNode::App {
                    operator,
                    operand: f(operand),
                }
            }
            ExpressionNode::UnaryOp { op, operand } => ExpressionNode::UnaryOp {
                op,
                operand: f(operand),
            },
            ExpressionNode::BinaryOp { op, left, right } => {
                let left = f(left);
                ExpressionNode::BinaryOp {
                    op,
                    left,
                    right: f(right),
                }
            }
            ExpressionNode::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = f(condition);
                let then_branch = f(then_branch);
                ExpressionNode::Conditional {
                    condition,
                    then_branch,
                    else_branch: f(else_branch),
                }
            }
            ExpressionNode::Tuple { items } => ExpressionNode::Tuple {
                items: items.into_iter().map(&mut f).collect(),
            },
            ExpressionNode::TupleIndex { tuple, index } => ExpressionNode::TupleIndex {
                tuple: f(tuple),
                index,
            },
            ExpressionNode::LetIn { definitions, body } => {
                let definitions = definitions
                    .into_iter()
                    .map(|d| LocalDefinition {
                        pattern: d.pattern,
                        value: f(d.value),
                    })
                    .collect();
                ExpressionNode::LetIn {
                    definitions,
                    body: f(body),
                }
            }
            ExpressionNode::LetRec { definitions, body } => {
                let definitions = definitions
                    .into_iter()
                    .map(|d| RecursiveDefinition {
                        name: d.name,
                        value: f(d.value),
                    })
                    .collect();
                ExpressionNode::LetRec {
                    definitions,
                    body: f(body),
                }
            }
            ExpressionNode::Rec { inner } => ExpressionNode::Rec { inner: f(inner) },
        }
    }

    /// Point the child link holding `old` at `new`. Returns false if `old` is not a child.
    pub(crate) fn replace_child(&mut self, old: NodeId, new: NodeId) -> bool {
        let mut swap = |slot: &mut NodeId| {
            if *slot == old {
                *slot = new;
                true
            } else {
                false
            }
        };
        match self {
            ExpressionNode::Var { .. } | ExpressionNode::Literal(_) | ExpressionNode::Error(_) => {
                false
            }
            ExpressionNode::Lam { body, .. } => swap(body),
            ExpressionNode::App { operator, operand } => swap(operator) || swap(operand),
            ExpressionNode::UnaryOp { operand, .. } => swap(operand),
            ExpressionNode::BinaryOp { left, right, .. } => swap(left) || swap(right),
            ExpressionNode::Conditional {
                condition,
                then_branch,
                else_branch,
            } => swap(condition) || swap(then_branch) || swap(else_branch),
            ExpressionNode::Tuple { items } => items.iter_mut().any(&mut swap),
            ExpressionNode::TupleIndex { tuple, .. } => swap(tuple),
            ExpressionNode::LetIn { definitions, body } => {
                definitions.iter_mut().any(|d| swap(&mut d.value)) || swap(body)
            }
            ExpressionNode::LetRec { definitions, body } => {
                definitions.iter_mut().any(|d| swap(&mut d.value)) || swap(body)
            }
            ExpressionNode::Rec { inner } => swap(inner),
        }
    }

    /// Names introduced by this node for its own scope
    pub fn bound_names(&self) -> Vec<&str> {
        match self {
            ExpressionNode::Lam { binder, .. } => vec![binder.as_str()],
            ExpressionNode::LetIn { definitions, .. } => definitions
                .iter()
                .flat_map(|d| d.pattern.names())
                .collect(),
            ExpressionNode::LetRec { definitions, .. } => {
                definitions.iter().map(|d| d.name.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Children that lie inside the scope of [`bound_names`](Self::bound_names)
    pub fn scope_children(&self) -> Children {
        match self {
            ExpressionNode::Lam { body, .. } => smallvec::smallvec![*body],
            ExpressionNode::LetIn { body, .. } => smallvec::smallvec![*body],
            ExpressionNode::LetRec { .. } => self.children(),
            _ => Children::new(),
        }
    }

    /// Whether this is a binding form
    pub fn is_binder(&self) -> bool {
        matches!(
            self,
            ExpressionNode::Lam { .. } | ExpressionNode::LetIn { .. } | ExpressionNode::LetRec { .. }
        )
    }

    /// Whether this node is a canonical value: an abstraction, a constant or a tuple
    pub fn is_value(&self) -> bool {
        matches!(
            self,
            ExpressionNode::Lam { .. } | ExpressionNode::Literal(_) | ExpressionNode::Tuple { .. }
        )
    }

    /// Node kind name, used in messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            ExpressionNode::Var { .. } => "variable",
            ExpressionNode::Lam { .. } => "abstraction",
            ExpressionNode::App { .. } => "application",
            ExpressionNode::Literal(_) => "constant",
            ExpressionNode::Error(_) => "error",
            ExpressionNode::UnaryOp { .. } => "unary operation",
            ExpressionNode::BinaryOp { .. } => "binary operation",
            ExpressionNode::Conditional { .. } => "conditional",
            ExpressionNode::Tuple { .. } => "tuple",
            ExpressionNode::TupleIndex { .. } => "tuple projection",
            ExpressionNode::LetIn { .. } => "let",
            ExpressionNode::LetRec { .. } => "letrec",
            ExpressionNode::Rec { .. } => "rec",
        }
    }
}
