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

//! Capture-avoiding substitution
//!
//! [`ExprArena::substitute`] builds a fresh tree in which every free occurrence
//! of a mapped name is replaced by a copy of its term. Before descending into
//! a binding form whose binder would capture a free variable of an incoming
//! term, the binder is renamed in place (together with the occurrences it
//! binds) to a fresh name.

use crate::ast::names::fresh_name;
use crate::ast::{ExprArena, ExpressionNode, NodeId};
use rustc_hash::{FxHashMap, FxHashSet};

/// Mapping from variable names to replacement terms
///
/// Replacement terms stay owned by the caller; every use is a deep copy.
pub type SubstitutionMap = FxHashMap<String, NodeId>;

impl ExprArena {
    /// Substitute the terms of `map` for the free occurrences of their names in `id`
    ///
    /// The result is a new detached tree sharing no node with `id` or with the
    /// mapped terms. Binders of `id` may be renamed in place to avoid capture.
    pub fn substitute(&mut self, id: NodeId, map: &SubstitutionMap) -> NodeId {
        let kind = self.kind(id).clone();
        match kind {
            ExpressionNode::Var { name } => match map.get(&name) {
                Some(&term) => self.deep_clone(term),
                None => self.var(name),
            },
            ExpressionNode::Lam { .. } | ExpressionNode::LetRec { .. } => {
                let Some(inner) = self.enter_scope(id, map) else {
                    return self.deep_clone(id);
                };
                let renamed = self.kind(id).clone();
                let rebuilt = renamed.map_children(|child| self.substitute(child, &inner));
                self.alloc(rebuilt)
            }
            ExpressionNode::LetIn { body, .. } => {
                let inner = self.enter_scope(id, map);
                let renamed = self.kind(id).clone();
                let rebuilt = renamed.map_children(|child| {
                    if child != body {
                        self.substitute(child, map)
                    } else if let Some(inner) = &inner {
                        self.substitute(child, inner)
                    } else {
                        self.deep_clone(child)
                    }
                });
                self.alloc(rebuilt)
            }
            other => {
                let rebuilt = other.map_children(|child| self.substitute(child, map));
                self.alloc(rebuilt)
            }
        }
    }

    /// Restrict `map` to the scope of the binding form `id`, renaming its binders
    /// where they would capture. `None` when nothing is left to substitute.
    fn enter_scope(&mut self, id: NodeId, map: &SubstitutionMap) -> Option<SubstitutionMap> {
        let kind = self.kind(id);
        let mut binders: Vec<String> = Vec::new();
        for name in kind.bound_names() {
            if !binders.iter().any(|b| b == name) {
                binders.push(name.to_string());
            }
        }

        let inner: SubstitutionMap = map
            .iter()
            .filter(|(name, _)| !binders.contains(name))
            .map(|(name, term)| (name.clone(), *term))
            .collect();
        if inner.is_empty() {
            return None;
        }

        let mut scope_free: FxHashSet<String> = FxHashSet::default();
        for child in kind.scope_children() {
            scope_free.extend(self.free_var_names(child));
        }

        let mut unsafe_names: FxHashSet<String> = FxHashSet::default();
        for name in &scope_free {
            if binders.contains(name) {
                continue;
            }
            match inner.get(name) {
                Some(&term) => unsafe_names.extend(self.free_var_names(term)),
                None => {
                    unsafe_names.insert(name.clone());
                }
            }
        }

        let mut taken: FxHashSet<String> = unsafe_names.clone();
        taken.extend(scope_free);
        taken.extend(binders.iter().cloned());
        // a nested binder would capture the renamed occurrences beneath it
        for child in kind.scope_children() {
            for node in self.descendants(child) {
                taken.extend(self.kind(node).bound_names().into_iter().map(str::to_string));
            }
        }

        for binder in &binders {
            if unsafe_names.contains(binder) {
                let fresh = fresh_name(binder, |candidate| taken.contains(candidate));
                log::trace!("renaming binder {binder} to {fresh} to avoid capture");
                self.rename_bound(id, binder, &fresh);
                taken.insert(fresh);
            }
        }

        Some(inner)
    }
}
