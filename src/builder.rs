//! Staged bulk assembly of ropes
//!
//! A builder grows two halves around a "tip". The prefix half is built left to
//! right by `insert_*_before_tip`, the suffix half right to left by
//! `insert_*_after_tip`. Each half holds, from finest to coarsest:
//!
//! - a seed: one pending element that the next element may still rebalance with
//! - a seedling: the leaf currently being filled
//! - saplings: sealed subtrees whose heights strictly decrease toward the tip
//!
//! Sealing a subtree propagates like a carry in binary addition, so appending
//! n elements costs O(n) overall and grafting a whole rope costs O(log n).

use std::mem;

use tracing::{debug, trace};

use crate::node::Node;
use crate::path::Path;
use crate::rope::Rope;
use crate::summary::Element;

/// Incremental rope constructor; see the module docs for the layout.
pub struct Builder<E: Element> {
    prefix_trees: Vec<Node<E>>,
    prefix_leaf: Node<E>,
    prefix: Option<E>,

    suffix: Option<E>,
    suffix_leaf: Node<E>,
    suffix_trees: Vec<Node<E>>,

    /// Generation tag of the rope this builder was split from, if any.
    lineage: Option<u64>,
}

impl<E: Element> Default for Builder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Element> Builder<E> {
    pub fn new() -> Self {
        Self {
            prefix_trees: Vec::new(),
            prefix_leaf: Node::create_leaf(),
            prefix: None,
            suffix: None,
            suffix_leaf: Node::create_leaf(),
            suffix_trees: Vec::new(),
            lineage: None,
        }
    }

    pub(crate) fn with_lineage(version: u64) -> Self {
        Self {
            lineage: Some(version),
            ..Self::new()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prefix.is_none()
            && self.suffix.is_none()
            && self.prefix_leaf.is_empty()
            && self.suffix_leaf.is_empty()
            && self.prefix_trees.is_empty()
            && self.suffix_trees.is_empty()
    }

    // === Prefix side ===

    /// Appends one element to the prefix. Empty elements are dropped.
    pub fn insert_before_tip(&mut self, mut item: E) {
        if item.is_empty() {
            return;
        }
        match self.prefix.take() {
            None => self.prefix = Some(item),
            Some(mut seed) => {
                if (seed.is_undersized() || item.is_undersized()) && seed.rebalance_next(&mut item)
                {
                    self.prefix = Some(seed);
                    return;
                }
                self.append_now(seed);
                self.prefix = Some(item);
            }
        }
    }

    pub fn extend_before_tip<I: IntoIterator<Item = E>>(&mut self, items: I) {
        for item in items {
            self.insert_before_tip(item);
        }
    }

    /// Appends a whole rope to the prefix in O(log n).
    pub fn insert_rope_before_tip(&mut self, rope: Rope<E>) {
        if let Some(root) = rope.into_root() {
            self.insert_node_before_tip(root);
        }
    }

    /// Moves an element into the seedling, sealing the seedling once full.
    fn append_now(&mut self, item: E) {
        self.prefix_leaf.append_item(item);
        if self.prefix_leaf.is_full() {
            let leaf = mem::replace(&mut self.prefix_leaf, Node::create_leaf());
            self.push_prefix_tree(leaf);
        }
    }

    fn seal_prefix_leaf(&mut self) {
        if !self.prefix_leaf.is_empty() {
            let leaf = mem::replace(&mut self.prefix_leaf, Node::create_leaf());
            self.push_prefix_tree(leaf);
        }
    }

    /// Pushes a sealed subtree, merging with saplings until heights strictly
    /// decrease toward the tip again.
    fn push_prefix_tree(&mut self, mut node: Node<E>) {
        while let Some(top) = self.prefix_trees.last() {
            let height = node.height();
            if top.height() > height + 1 || (top.height() == height + 1 && top.is_full()) {
                break;
            }
            let Some(top) = self.prefix_trees.pop() else {
                break;
            };
            trace!(top = top.height(), height, "prefix carry");
            node = Node::join(top, node);
        }
        debug_assert!(self
            .prefix_trees
            .last()
            .map_or(true, |top| top.height() > node.height()));
        self.prefix_trees.push(node);
    }

    /// Appends a whole subtree to the prefix.
    pub(crate) fn insert_node_before_tip(&mut self, node: Node<E>) {
        let mut node = node.collapsed();
        if node.is_empty() {
            return;
        }
        if node.is_leaf() && node.is_undersized() {
            for item in node.into_items() {
                self.insert_before_tip(item);
            }
            return;
        }
        if let Some(mut seed) = self.prefix.take() {
            let absorbed = (seed.is_undersized() || node.first_item().is_undersized())
                && node.update_first_item(|first| first.rebalance_prev(&mut seed));
            if !absorbed {
                self.append_now(seed);
            }
        }
        self.seal_prefix_leaf();
        self.push_prefix_tree(node);
    }

    // === Suffix side ===

    /// Prepends one element to the suffix. Empty elements are dropped.
    pub fn insert_after_tip(&mut self, mut item: E) {
        if item.is_empty() {
            return;
        }
        match self.suffix.take() {
            None => self.suffix = Some(item),
            Some(mut seed) => {
                if (seed.is_undersized() || item.is_undersized()) && seed.rebalance_prev(&mut item)
                {
                    self.suffix = Some(seed);
                    return;
                }
                self.prepend_now(seed);
                self.suffix = Some(item);
            }
        }
    }

    /// Prepends a whole rope to the suffix in O(log n).
    pub fn insert_rope_after_tip(&mut self, rope: Rope<E>) {
        if let Some(root) = rope.into_root() {
            self.insert_node_after_tip(root);
        }
    }

    fn prepend_now(&mut self, item: E) {
        self.suffix_leaf.insert_item(0, item);
        if self.suffix_leaf.is_full() {
            let leaf = mem::replace(&mut self.suffix_leaf, Node::create_leaf());
            self.push_suffix_tree(leaf);
        }
    }

    fn seal_suffix_leaf(&mut self) {
        if !self.suffix_leaf.is_empty() {
            let leaf = mem::replace(&mut self.suffix_leaf, Node::create_leaf());
            self.push_suffix_tree(leaf);
        }
    }

    fn push_suffix_tree(&mut self, mut node: Node<E>) {
        while let Some(top) = self.suffix_trees.last() {
            let height = node.height();
            if top.height() > height + 1 || (top.height() == height + 1 && top.is_full()) {
                break;
            }
            let Some(top) = self.suffix_trees.pop() else {
                break;
            };
            trace!(top = top.height(), height, "suffix carry");
            node = Node::join(node, top);
        }
        debug_assert!(self
            .suffix_trees
            .last()
            .map_or(true, |top| top.height() > node.height()));
        self.suffix_trees.push(node);
    }

    pub(crate) fn insert_node_after_tip(&mut self, node: Node<E>) {
        let mut node = node.collapsed();
        if node.is_empty() {
            return;
        }
        if node.is_leaf() && node.is_undersized() {
            for item in node.into_items().into_iter().rev() {
                self.insert_after_tip(item);
            }
            return;
        }
        if let Some(mut seed) = self.suffix.take() {
            let absorbed = (seed.is_undersized() || node.last_item().is_undersized())
                && node.update_last_item(|last| last.rebalance_next(&mut seed));
            if !absorbed {
                self.prepend_now(seed);
            }
        }
        self.seal_suffix_leaf();
        self.push_suffix_tree(node);
    }

    // === Finalization ===

    fn fold_prefix(&mut self) -> Node<E> {
        if let Some(seed) = self.prefix.take() {
            self.append_now(seed);
        }
        self.seal_prefix_leaf();
        let mut trees = mem::take(&mut self.prefix_trees);
        let mut acc = trees.pop().unwrap_or_else(Node::create_leaf);
        while let Some(tree) = trees.pop() {
            acc = Node::join(tree, acc);
        }
        acc.collapsed()
    }

    fn fold_suffix(&mut self) -> Node<E> {
        if let Some(seed) = self.suffix.take() {
            self.prepend_now(seed);
        }
        self.seal_suffix_leaf();
        let mut trees = mem::take(&mut self.suffix_trees);
        let mut acc = trees.pop().unwrap_or_else(Node::create_leaf);
        while let Some(tree) = trees.pop() {
            acc = Node::join(acc, tree);
        }
        acc.collapsed()
    }

    /// Lets the elements on either side of the tip trade content, removing
    /// the right one if it is absorbed.
    fn mend_seam(left: &mut Node<E>, right: &mut Node<E>) {
        if !left.last_item().is_undersized() && !right.first_item().is_undersized() {
            return;
        }
        let emptied =
            left.update_last_item(|last| right.update_first_item(|first| last.rebalance_next(first)));
        if emptied {
            trace!("seam absorbed right element");
            right.remove_at(Path::new(right.height()));
            *right = mem::replace(right, Node::create_leaf()).collapsed();
        }
    }

    /// Merges both halves into a single rope.
    pub fn finalize(mut self) -> Rope<E> {
        let mut left = self.fold_prefix();
        let mut right = self.fold_suffix();
        if !left.is_empty() && !right.is_empty() {
            Self::mend_seam(&mut left, &mut right);
        }
        let root = Node::join(left, right).collapsed();
        debug!(height = root.height(), count = root.child_count(), "builder finalized");
        let rope = Rope::from_root((!root.is_empty()).then_some(root), self.lineage);
        rope.check_after_mutation();
        rope
    }

    /// Finalizes the two halves as separate ropes, without mending the seam.
    pub(crate) fn finalize_halves(mut self) -> (Rope<E>, Rope<E>) {
        let left = self.fold_prefix();
        let right = self.fold_suffix();
        let left = Rope::from_root((!left.is_empty()).then_some(left), self.lineage);
        let right = Rope::from_root((!right.is_empty()).then_some(right), None);
        left.check_after_mutation();
        right.check_after_mutation();
        (left, right)
    }
}
