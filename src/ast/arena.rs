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

//! Node arena with parent links
//!
//! Every term lives in an [`ExprArena`] and is addressed by a [`NodeId`].
//! Each slot records the node kind and the handle of its parent, so root
//! discovery and in-place splicing only ever rewrite index fields.
//!
//! Ownership rules:
//! - a node has at most one parent; the constructors reject children that are
//!   already attached somewhere else
//! - a node needed in two places must be copied with [`ExprArena::deep_clone`]
//! - released slots go on a free list and are reused; each reuse bumps the
//!   slot generation, so a stale handle can only fail, never alias a newer node

use super::expression::{
    Children, ErrorTerm, ExpressionNode, LiteralValue, LocalDefinition, NodeId, Pattern,
    RecursiveDefinition,
};
use super::operator::{BinaryOperator, UnaryOperator};
use std::ops::Index;

#[derive(Debug, Clone)]
struct Slot {
    kind: ExpressionNode,
    parent: Option<NodeId>,
    /// Allocation clock reading when the node was created
    born: u64,
}

#[derive(Debug, Clone, Default)]
struct Entry {
    generation: u32,
    slot: Option<Slot>,
}

/// Allocation point recorded by [`ExprArena::mark`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ArenaMark(u64);

/// Arena owning every node of one or more term trees
#[derive(Debug, Clone, Default)]
pub struct ExprArena {
    entries: Vec<Entry>,
    free: Vec<u32>,
    live: usize,
    clock: u64,
}

impl ExprArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty arena with room for `capacity` nodes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether no node is live
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of slots backing the arena, live or on the free list
    ///
    /// Vacated slots are reused, so this is the high-water mark of [`len`](Self::len).
    pub fn allocated(&self) -> usize {
        self.entries.len()
    }

    /// Whether `id` refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.live_slot(id).is_some()
    }

    fn live_slot(&self, id: NodeId) -> Option<&Slot> {
        self.entries
            .get(id.index())
            .filter(|entry| entry.generation == id.generation())
            .and_then(|entry| entry.slot.as_ref())
    }

    fn slot(&self, id: NodeId) -> &Slot {
        match self.live_slot(id) {
            Some(slot) => slot,
            None => panic!("node {id} is not live in this arena"),
        }
    }

    fn slot_mut(&mut self, id: NodeId) -> &mut Slot {
        match self
            .entries
            .get_mut(id.index())
            .filter(|entry| entry.generation == id.generation())
            .and_then(|entry| entry.slot.as_mut())
        {
            Some(slot) => slot,
            None => panic!("node {id} is not live in this arena"),
        }
    }

    /// Kind of a node
    ///
    /// # Panics
    ///
    /// Panics if `id` has been released.
    pub fn kind(&self, id: NodeId) -> &ExpressionNode {
        &self.slot(id).kind
    }

    /// Kind of a node, if it is live
    pub fn get(&self, id: NodeId) -> Option<&ExpressionNode> {
        self.live_slot(id).map(|slot| &slot.kind)
    }

    pub(crate) fn kind_mut(&mut self, id: NodeId) -> &mut ExpressionNode {
        &mut self.slot_mut(id).kind
    }

    /// Parent of a node, `None` at a root
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).parent
    }

    /// Follow parent links up to the root of the tree containing `id`
    pub fn root_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Children of a node, left to right
    pub fn children(&self, id: NodeId) -> Children {
        self.kind(id).children()
    }

    /// Allocate a node and attach its children to it
    ///
    /// # Panics
    ///
    /// Panics if a child is already attached to another parent.
    pub fn alloc(&mut self, kind: ExpressionNode) -> NodeId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.entries.push(Entry::default());
                (self.entries.len() - 1) as u32
            }
        };
        let id = NodeId::new(index, self.entries[index as usize].generation);
        for child in kind.children() {
            let slot = self.slot_mut(child);
            assert!(
                slot.parent.is_none(),
                "node {child} is already attached to {:?}",
                slot.parent
            );
            slot.parent = Some(id);
        }
        self.entries[index as usize].slot = Some(Slot {
            kind,
            parent: None,
            born: self.clock,
        });
        self.clock += 1;
        self.live += 1;
        id
    }

    /// `Var(name)`
    pub fn var(&mut self, name: impl Into<String>) -> NodeId {
        self.alloc(ExpressionNode::Var { name: name.into() })
    }

    /// `Lam(binder, body)`
    pub fn lam(&mut self, binder: impl Into<String>, body: NodeId) -> NodeId {
        self.alloc(ExpressionNode::Lam {
            binder: binder.into(),
            body,
        })
    }

    /// `App(operator, operand)`
    pub fn app(&mut self, operator: NodeId, operand: NodeId) -> NodeId {
        self.alloc(ExpressionNode::App { operator, operand })
    }

    /// Constant node
    pub fn literal(&mut self, value: LiteralValue) -> NodeId {
        self.alloc(ExpressionNode::Literal(value))
    }

    /// Boolean constant
    pub fn boolean(&mut self, value: bool) -> NodeId {
        self.literal(LiteralValue::Boolean(value))
    }

    /// Natural constant
    pub fn natural(&mut self, value: u64) -> NodeId {
        self.literal(LiteralValue::Natural(value))
    }

    /// `error` or `typeerror`
    pub fn error_term(&mut self, term: ErrorTerm) -> NodeId {
        self.alloc(ExpressionNode::Error(term))
    }

    pub fn unary_op(&mut self, op: UnaryOperator, operand: NodeId) -> NodeId {
        self.alloc(ExpressionNode::UnaryOp { op, operand })
    }

    pub fn binary_op(&mut self, op: BinaryOperator, left: NodeId, right: NodeId) -> NodeId {
        self.alloc(ExpressionNode::BinaryOp { op, left, right })
    }

    pub fn conditional(
        &mut self,
        condition: NodeId,
        then_branch: NodeId,
        else_branch: NodeId,
    ) -> NodeId {
        self.alloc(ExpressionNode::Conditional {
            condition,
            then_branch,
            else_branch,
        })
    }

    pub fn tuple(&mut self, items: impl IntoIterator<Item = NodeId>) -> NodeId {
        self.alloc(ExpressionNode::Tuple {
            items: items.into_iter().collect(),
        })
    }

    /// Projection of the `index`-th (1-based) component
    pub fn tuple_index(&mut self, tuple: NodeId, index: usize) -> NodeId {
        self.alloc(ExpressionNode::TupleIndex { tuple, index })
    }

    pub fn let_in(
        &mut self,
        definitions: impl IntoIterator<Item = (Pattern, NodeId)>,
        body: NodeId,
    ) -> NodeId {
        let definitions = definitions
            .into_iter()
            .map(|(pattern, value)| LocalDefinition { pattern, value })
            .collect();
        self.alloc(ExpressionNode::LetIn { definitions, body })
    }

    pub fn let_rec(
        &mut self,
        definitions: impl IntoIterator<Item = (String, NodeId)>,
        body: NodeId,
    ) -> NodeId {
        let definitions = definitions
            .into_iter()
            .map(|(name, value)| RecursiveDefinition { name, value })
            .collect();
        self.alloc(ExpressionNode::LetRec { definitions, body })
    }

    pub fn rec(&mut self, inner: NodeId) -> NodeId {
        self.alloc(ExpressionNode::Rec { inner })
    }

    /// Copy the subtree rooted at `id`. The copy has no parent and shares no node with the original.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let kind = self.kind(id).clone();
        let copied = kind.map_children(|child| self.deep_clone(child));
        self.alloc(copied)
    }

    /// Rewrite the link from `parent` to `old` so that it points at `new`
    ///
    /// `new` must be detached. Afterwards `old` is detached.
    ///
    /// # Panics
    ///
    /// Panics if `old` is not a child of `parent` or `new` is attached.
    pub fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        assert!(
            self.parent(new).is_none(),
            "replacement node {new} is already attached"
        );
        let replaced = self.kind_mut(parent).replace_child(old, new);
        assert!(replaced, "node {old} is not a child of {parent}");
        self.slot_mut(old).parent = None;
        self.slot_mut(new).parent = Some(parent);
    }

    /// Release the detached subtree rooted at `id`, vacating its slots
    ///
    /// # Panics
    ///
    /// Panics if `id` is still attached to a parent.
    pub fn release(&mut self, id: NodeId) {
        assert!(
            self.parent(id).is_none(),
            "cannot release node {id} while it is attached"
        );
        self.release_subtree(id);
    }

    fn release_subtree(&mut self, id: NodeId) {
        if !self.contains(id) {
            return;
        }
        if let Some(slot) = self.vacate(id.index()) {
            for child in slot.kind.children() {
                self.release_subtree(child);
            }
        }
    }

    /// Empty the slot at `index`, retire its generation and queue it for reuse
    fn vacate(&mut self, index: usize) -> Option<Slot> {
        let entry = self.entries.get_mut(index)?;
        let slot = entry.slot.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(index as u32);
        self.live -= 1;
        Some(slot)
    }

    /// Current allocation point, for a later [`discard_from`](Self::discard_from)
    pub(crate) fn mark(&self) -> ArenaMark {
        ArenaMark(self.clock)
    }

    /// Vacate every live node allocated at or after `mark`
    ///
    /// Only sound when no node allocated before `mark` links to one allocated after it,
    /// which holds for work that builds fresh trees next to untouched inputs.
    pub(crate) fn discard_from(&mut self, mark: ArenaMark) {
        for index in 0..self.entries.len() {
            let fresh = self.entries[index]
                .slot
                .as_ref()
                .is_some_and(|slot| slot.born >= mark.0);
            if fresh {
                self.vacate(index);
            }
        }
    }

    /// Live nodes of the subtree rooted at `id`, in pre-order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).into_iter().rev());
        }
        out
    }
}

impl Index<NodeId> for ExprArena {
    type Output = ExpressionNode;

    fn index(&self, id: NodeId) -> &ExpressionNode {
        self.kind(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_parents() {
        let mut arena = ExprArena::new();
        let x = arena.var("x");
        let body = arena.var("x");
        let lam = arena.lam("x", body);
        let app = arena.app(lam, x);

        assert_eq!(arena.parent(x), Some(app));
        assert_eq!(arena.parent(lam), Some(app));
        assert_eq!(arena.parent(body), Some(lam));
        assert_eq!(arena.parent(app), None);
        assert_eq!(arena.root_of(body), app);
        assert_eq!(arena.len(), 4);
    }

    #[test]
    #[should_panic(expected = "already attached")]
    fn test_double_parent_is_rejected() {
        let mut arena = ExprArena::new();
        let x = arena.var("x");
        let _lam = arena.lam("y", x);
        let _app = arena.app(x, x);
    }

    #[test]
    fn test_deep_clone_is_detached_and_disjoint() {
        let mut arena = ExprArena::new();
        let x = arena.var("x");
        let y = arena.var("y");
        let app = arena.app(x, y);
        let lam = arena.lam("x", app);

        let copy = arena.deep_clone(app);
        assert_eq!(arena.parent(copy), None);
        assert_ne!(copy, app);
        assert_eq!(arena.display(copy).to_string(), "(x y)");

        let original: Vec<_> = arena.descendants(lam);
        for node in arena.descendants(copy) {
            assert!(!original.contains(&node));
        }
    }

    #[test]
    fn test_replace_child_and_release() {
        let mut arena = ExprArena::new();
        let x = arena.var("x");
        let lam = arena.lam("x", x);
        let y = arena.var("y");

        arena.replace_child(lam, x, y);
        assert_eq!(arena.parent(y), Some(lam));
        assert_eq!(arena.parent(x), None);
        assert_eq!(arena.display(lam).to_string(), "(λx.y)");

        arena.release(x);
        assert!(!arena.contains(x));
        assert_eq!(arena.get(x), None);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_discard_from_mark() {
        let mut arena = ExprArena::new();
        let keep = arena.var("keep");
        let mark = arena.mark();
        let a = arena.var("a");
        let b = arena.lam("a", a);

        arena.discard_from(mark);
        assert!(arena.contains(keep));
        assert!(!arena.contains(b));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_discard_covers_reused_slots() {
        let mut arena = ExprArena::new();
        let keep = arena.var("keep");
        let gone = arena.var("gone");
        arena.release(gone);

        let mark = arena.mark();
        let reused = arena.var("fresh");
        assert_eq!(reused.index(), gone.index());

        arena.discard_from(mark);
        assert!(!arena.contains(reused));
        assert!(arena.contains(keep));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_released_slots_are_reused() {
        let mut arena = ExprArena::new();
        for _ in 0..100 {
            let x = arena.var("x");
            let y = arena.var("y");
            let app = arena.app(x, y);
            arena.release(app);
        }
        assert_eq!(arena.allocated(), 3);
        assert!(arena.is_empty());
    }

    #[test]
    fn test_stale_handle_does_not_alias() {
        let mut arena = ExprArena::new();
        let old = arena.var("old");
        arena.release(old);
        let new = arena.var("new");

        assert_eq!(new.index(), old.index());
        assert_ne!(new, old);
        assert!(!arena.contains(old));
        assert_eq!(arena.get(old), None);
        assert_eq!(arena.display(new).to_string(), "new");
    }

    #[test]
    #[should_panic(expected = "is not live")]
    fn test_stale_handle_panics() {
        let mut arena = ExprArena::new();
        let old = arena.var("old");
        arena.release(old);
        let _new = arena.var("new");
        let _ = arena.kind(old);
    }
}
