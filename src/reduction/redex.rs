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

//! Redex discovery and single-step beta reduction

use super::substitute::SubstitutionMap;
use crate::ast::{ExprArena, ExpressionNode, NodeId};
use crate::error::{LambdaError, Result};
use smallvec::SmallVec;

/// Ordered list of redexes
pub type RedexList = SmallVec<[NodeId; 8]>;

/// Traversal order of [`ExprArena::find_redexes`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedexOrder {
    /// Pre-order: an enclosing redex precedes the redexes nested inside it
    OutermostFirst,
    /// Post-order: nested redexes precede the redex enclosing them
    InnermostFirst,
}

impl ExprArena {
    /// Whether `id` is an application whose operator is currently an abstraction
    pub fn is_redex(&self, id: NodeId) -> bool {
        match self.kind(id) {
            ExpressionNode::App { operator, .. } => {
                matches!(self.kind(*operator), ExpressionNode::Lam { .. })
            }
            _ => false,
        }
    }

    /// Whether `id` is headed by an abstraction
    pub fn is_canonical(&self, id: NodeId) -> bool {
        matches!(self.kind(id), ExpressionNode::Lam { .. })
    }

    /// Whether the subtree rooted at `id` contains no redex
    pub fn is_normal_form(&self, id: NodeId) -> bool {
        self.find_redexes(id, RedexOrder::OutermostFirst).is_empty()
    }

    /// Every redex of the subtree rooted at `root`, children visited left to right
    pub fn find_redexes(&self, root: NodeId, order: RedexOrder) -> RedexList {
        let mut out = RedexList::new();
        self.collect_redexes(root, order, &mut out);
        out
    }

    fn collect_redexes(&self, id: NodeId, order: RedexOrder, out: &mut RedexList) {
        let redex = self.is_redex(id);
        if redex && order == RedexOrder::OutermostFirst {
            out.push(id);
        }
        for child in self.children(id) {
            self.collect_redexes(child, order, out);
        }
        if redex && order == RedexOrder::InnermostFirst {
            out.push(id);
        }
    }

    /// Perform one beta step on `redex`, splicing the result into its parent
    ///
    /// Returns the node that took the place of `redex`. When `redex` was a root
    /// the result is a new root. The replaced subtree is released.
    pub fn reduce(&mut self, redex: NodeId) -> Result<NodeId> {
        let (binder, body, operand) = match self.kind(redex) {
            ExpressionNode::App { operator, operand } => match self.kind(*operator) {
                ExpressionNode::Lam { binder, body } => (binder.clone(), *body, *operand),
                _ => return Err(self.not_a_redex(redex)),
            },
            _ => return Err(self.not_a_redex(redex)),
        };

        let argument = self.deep_clone(operand);
        let mut map = SubstitutionMap::default();
        map.insert(binder, argument);
        let reduced = self.substitute(body, &map);
        self.release(argument);

        if let Some(parent) = self.parent(redex) {
            self.replace_child(parent, redex, reduced);
        }
        self.release(redex);
        Ok(reduced)
    }

    fn not_a_redex(&self, id: NodeId) -> LambdaError {
        LambdaError::CantReduce {
            term: self.display(id).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn identity(arena: &mut ExprArena) -> NodeId {
        let x = arena.var("x");
        arena.lam("x", x)
    }

    #[test]
    fn test_reduce_root_redex() {
        let mut arena = ExprArena::new();
        let id = identity(&mut arena);
        let y = arena.var("y");
        let app = arena.app(id, y);

        assert!(arena.is_redex(app));
        let result = arena.reduce(app).unwrap();
        assert_eq!(arena.display(result).to_string(), "y");
        assert_eq!(arena.parent(result), None);
        assert!(!arena.contains(app));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_reduce_twice() {
        // ((λx.x) ((λx.x) y))
        let mut arena = ExprArena::new();
        let outer = identity(&mut arena);
        let inner = identity(&mut arena);
        let y = arena.var("y");
        let inner_app = arena.app(inner, y);
        let app = arena.app(outer, inner_app);

        let first = arena.reduce(app).unwrap();
        assert_eq!(arena.display(first).to_string(), "((λx.x) y)");
        let second = arena.reduce(first).unwrap();
        assert_eq!(arena.display(second).to_string(), "y");
    }

    #[test]
    fn test_reduce_splices_into_parent() {
        // λz.((λx.x) z)
        let mut arena = ExprArena::new();
        let id = identity(&mut arena);
        let z = arena.var("z");
        let app = arena.app(id, z);
        let lam = arena.lam("z", app);

        let result = arena.reduce(app).unwrap();
        assert_eq!(arena.parent(result), Some(lam));
        assert_eq!(arena.root_of(result), lam);
        assert_eq!(arena.display(lam).to_string(), "(λz.z)");
    }

    #[test]
    fn test_reduce_avoids_capture() {
        // ((λz.(λw.(z w))) (w a))
        let mut arena = ExprArena::new();
        let z = arena.var("z");
        let w = arena.var("w");
        let zw = arena.app(z, w);
        let inner = arena.lam("w", zw);
        let outer = arena.lam("z", inner);
        let fw = arena.var("w");
        let a = arena.var("a");
        let arg = arena.app(fw, a);
        let app = arena.app(outer, arg);

        let result = arena.reduce(app).unwrap();
        assert_eq!(arena.display(result).to_string(), "(λw1.((w a) w1))");
    }

    #[test]
    fn test_reduce_rejects_non_redex() {
        let mut arena = ExprArena::new();
        let f = arena.var("f");
        let y = arena.var("y");
        let app = arena.app(f, y);

        let err = arena.reduce(app).unwrap_err();
        assert_eq!(
            err,
            LambdaError::CantReduce {
                term: "(f y)".to_string()
            }
        );
        assert_eq!(arena.display(app).to_string(), "(f y)");
    }

    #[test]
    fn test_redex_orders() {
        // ((λa.((λb.b) a)) ((λc.c) d))
        let mut arena = ExprArena::new();
        let b = arena.var("b");
        let lam_b = arena.lam("b", b);
        let a = arena.var("a");
        let inner_left = arena.app(lam_b, a);
        let lam_a = arena.lam("a", inner_left);
        let c = arena.var("c");
        let lam_c = arena.lam("c", c);
        let d = arena.var("d");
        let inner_right = arena.app(lam_c, d);
        let root = arena.app(lam_a, inner_right);

        let outermost = arena.find_redexes(root, RedexOrder::OutermostFirst);
        assert_eq!(outermost.as_slice(), &[root, inner_left, inner_right]);

        let innermost = arena.find_redexes(root, RedexOrder::InnermostFirst);
        assert_eq!(innermost.as_slice(), &[inner_left, inner_right, root]);

        assert!(!arena.is_normal_form(root));
        assert!(arena.is_normal_form(lam_b));
        assert!(arena.is_canonical(lam_b));
        assert!(!arena.is_canonical(root));
    }
}
