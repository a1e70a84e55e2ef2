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

//! Free and bound variable analysis, and in-place renaming
//!
//! Variable identity is by occurrence: two `Var` nodes with the same name are
//! different members of a free-variable set.

use super::arena::ExprArena;
use super::expression::{ExpressionNode, NodeId};
use crate::error::{LambdaError, Result};
use rustc_hash::FxHashSet;

impl ExprArena {
    /// Free variable occurrences of the subtree rooted at `id`
    pub fn free_vars(&self, id: NodeId) -> FxHashSet<NodeId> {
        let mut out = FxHashSet::default();
        let mut bound = Vec::new();
        self.collect_free(id, &mut bound, &mut out);
        out
    }

    /// Names of the free variables of the subtree rooted at `id`
    pub fn free_var_names(&self, id: NodeId) -> FxHashSet<String> {
        self.free_vars(id)
            .into_iter()
            .filter_map(|occurrence| match self.kind(occurrence) {
                ExpressionNode::Var { name } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    fn collect_free<'a>(
        &'a self,
        id: NodeId,
        bound: &mut Vec<&'a str>,
        out: &mut FxHashSet<NodeId>,
    ) {
        let kind = self.kind(id);
        match kind {
            ExpressionNode::Var { name } => {
                if !bound.contains(&name.as_str()) {
                    out.insert(id);
                }
            }
            ExpressionNode::LetIn { definitions, body } => {
                for definition in definitions {
                    self.collect_free(definition.value, bound, out);
                }
                let depth = bound.len();
                bound.extend(kind.bound_names());
                self.collect_free(*body, bound, out);
                bound.truncate(depth);
            }
            _ if kind.is_binder() => {
                let depth = bound.len();
                bound.extend(kind.bound_names());
                for child in kind.scope_children() {
                    self.collect_free(child, bound, out);
                }
                bound.truncate(depth);
            }
            _ => {
                for child in kind.children() {
                    self.collect_free(child, bound, out);
                }
            }
        }
    }

    /// Occurrences of `name` inside the scope of `binder` that `binder` still binds
    ///
    /// Descent stops at an inner binding form that rebinds `name`; for an inner
    /// `let` only its body is shadowed, its definitions are still searched.
    pub fn bound_occurrences(&self, binder: NodeId, name: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        for child in self.kind(binder).scope_children() {
            self.collect_bound(child, name, &mut out);
        }
        out
    }

    fn collect_bound(&self, id: NodeId, name: &str, out: &mut Vec<NodeId>) {
        let kind = self.kind(id);
        match kind {
            ExpressionNode::Var { name: var } if var == name => out.push(id),
            ExpressionNode::LetIn { definitions, .. } if kind.bound_names().contains(&name) => {
                for definition in definitions {
                    self.collect_bound(definition.value, name, out);
                }
            }
            _ if kind.is_binder() && kind.bound_names().contains(&name) => {}
            _ => {
                for child in kind.children() {
                    self.collect_bound(child, name, out);
                }
            }
        }
    }

    /// Rename a variable, or an abstraction together with every occurrence it binds
    pub fn rename(&mut self, id: NodeId, new_name: &str) -> Result<()> {
        let binder = match self.kind(id) {
            ExpressionNode::Var { .. } => None,
            ExpressionNode::Lam { binder, .. } => Some(binder.clone()),
            _ => {
                return Err(LambdaError::CantRename {
                    term: self.display(id).to_string(),
                });
            }
        };
        match binder {
            Some(old) => self.rename_bound(id, &old, new_name),
            None => {
                if let ExpressionNode::Var { name } = self.kind_mut(id) {
                    *name = new_name.to_string();
                }
            }
        }
        Ok(())
    }

    /// Rename the binding of `old` introduced by the binding form `binder`, and
    /// every occurrence it binds, to `new`
    pub(crate) fn rename_bound(&mut self, binder: NodeId, old: &str, new: &str) {
        for occurrence in self.bound_occurrences(binder, old) {
            if let ExpressionNode::Var { name } = self.kind_mut(occurrence) {
                *name = new.to_string();
            }
        }
        match self.kind_mut(binder) {
            ExpressionNode::Lam { binder: name, .. } if *name == old => *name = new.to_string(),
            ExpressionNode::LetIn { definitions, .. } => {
                for definition in definitions {
                    definition.pattern.rename(old, new);
                }
            }
            ExpressionNode::LetRec { definitions, .. } => {
                for definition in definitions.iter_mut().filter(|d| d.name == old) {
                    definition.name = new.to_string();
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Pattern;

    fn names(arena: &ExprArena, ids: impl IntoIterator<Item = NodeId>) -> Vec<String> {
        let mut out: Vec<String> = ids
            .into_iter()
            .map(|id| arena.display(id).to_string())
            .collect();
        out.sort();
        out
    }

    #[test]
    fn test_free_vars_of_var_is_itself() {
        let mut arena = ExprArena::new();
        let x = arena.var("x");
        let free = arena.free_vars(x);
        assert_eq!(free.len(), 1);
        assert!(free.contains(&x));
    }

    #[test]
    fn test_free_vars_by_occurrence() {
        // (x (λx.(x y))) x
        let mut arena = ExprArena::new();
        let x1 = arena.var("x");
        let x2 = arena.var("x");
        let y = arena.var("y");
        let inner = arena.app(x2, y);
        let lam = arena.lam("x", inner);
        let left = arena.app(x1, lam);
        let x3 = arena.var("x");
        let whole = arena.app(left, x3);

        let free = arena.free_vars(whole);
        assert_eq!(free.len(), 3);
        assert!(free.contains(&x1));
        assert!(free.contains(&x3));
        assert!(free.contains(&y));
        assert!(!free.contains(&x2));

        let lam_free = arena.free_vars(lam);
        assert_eq!(lam_free.len(), 1);
        assert!(lam_free.contains(&y));
    }

    #[test]
    fn test_let_scoping() {
        // let x := x in (x z)
        let mut arena = ExprArena::new();
        let outer_x = arena.var("x");
        let x = arena.var("x");
        let z = arena.var("z");
        let body = arena.app(x, z);
        let let_in = arena.let_in([(Pattern::Var("x".into()), outer_x)], body);
        assert_eq!(names(&arena, arena.free_vars(let_in)), vec!["x", "z"]);
        assert!(arena.free_vars(let_in).contains(&outer_x));

        // letrec f := (f g) in f
        let f1 = arena.var("f");
        let g = arena.var("g");
        let def = arena.app(f1, g);
        let f2 = arena.var("f");
        let letrec = arena.let_rec([("f".to_string(), def)], f2);
        assert_eq!(names(&arena, arena.free_vars(letrec)), vec!["g"]);
    }

    #[test]
    fn test_bound_occurrences_stop_at_rebinding() {
        // λx.(x (λx.x))
        let mut arena = ExprArena::new();
        let outer = arena.var("x");
        let inner = arena.var("x");
        let inner_lam = arena.lam("x", inner);
        let body = arena.app(outer, inner_lam);
        let lam = arena.lam("x", body);

        assert_eq!(arena.bound_occurrences(lam, "x"), vec![outer]);
        assert_eq!(arena.bound_occurrences(inner_lam, "x"), vec![inner]);
    }

    #[test]
    fn test_rename_cascades_to_bound_occurrences() {
        let mut arena = ExprArena::new();
        let outer = arena.var("x");
        let inner = arena.var("x");
        let inner_lam = arena.lam("x", inner);
        let y = arena.var("y");
        let app = arena.app(outer, y);
        let body = arena.app(app, inner_lam);
        let lam = arena.lam("x", body);

        arena.rename(lam, "T").unwrap();
        assert_eq!(arena.display(lam).to_string(), "(λT.((T y) (λx.x)))");

        arena.rename(y, "w").unwrap();
        assert_eq!(arena.display(lam).to_string(), "(λT.((T w) (λx.x)))");
    }

    #[test]
    fn test_rename_rejects_other_nodes() {
        let mut arena = ExprArena::new();
        let x = arena.var("x");
        let y = arena.var("y");
        let app = arena.app(x, y);
        let err = arena.rename(app, "z").unwrap_err();
        assert_eq!(err.kind(), "CantRename");
    }
}
