//! Tree nodes: leaves hold elements, inner nodes hold child nodes
//!
//! Each node owns an `Arc` to its storage plus the cached summary of its whole
//! subtree. Writes go through `Arc::make_mut`, so a shared node is copied
//! (children are only reference-bumped) right before it is modified, which
//! copies exactly the nodes along the path to the mutation.

use std::cmp::Ordering;
use std::mem;
use std::sync::{Arc, Weak};

use tracing::trace;

use crate::builder::Builder;
use crate::path::{Path, MAX_HEIGHT};
use crate::storage::Storage;
use crate::summary::{Element, Metric, Summary};
use crate::{MAX_NODE_SIZE, MIN_NODE_SIZE};

/// Tree node - either a leaf with elements or an inner node with children
pub(crate) enum Node<E: Element> {
    Leaf {
        items: Arc<Storage<E>>,
        summary: E::Summary,
    },
    Inner {
        children: Arc<Storage<Node<E>>>,
        summary: E::Summary,
    },
}

impl<E: Element> Clone for Node<E> {
    fn clone(&self) -> Self {
        match self {
            Node::Leaf { items, summary } => Node::Leaf {
                items: Arc::clone(items),
                summary: summary.clone(),
            },
            Node::Inner { children, summary } => Node::Inner {
                children: Arc::clone(children),
                summary: summary.clone(),
            },
        }
    }
}

#[inline]
fn node_summary<E: Element>(node: &Node<E>) -> E::Summary {
    node.summary().clone()
}

impl<E: Element> Node<E> {
    // === Construction ===

    pub(crate) fn create_leaf() -> Self {
        Node::Leaf {
            items: Arc::new(Storage::new(0)),
            summary: E::Summary::zero(),
        }
    }

    pub(crate) fn create_leaf_with(item: E) -> Self {
        let mut leaf = Self::create_leaf();
        leaf.append_item(item);
        leaf
    }

    pub(crate) fn create_inner(height: u8) -> Self {
        assert!(height > 0, "inner nodes have positive height");
        assert!(height <= MAX_HEIGHT, "tree height {} exceeds {}", height, MAX_HEIGHT);
        Node::Inner {
            children: Arc::new(Storage::new(height)),
            summary: E::Summary::zero(),
        }
    }

    /// New inner node one level above two siblings.
    pub(crate) fn create_inner_pair(left: Node<E>, right: Node<E>) -> Self {
        assert_eq!(left.height(), right.height(), "height mismatch");
        let mut node = Self::create_inner(left.height() + 1);
        node.append_node(left);
        node.append_node(right);
        node
    }

    pub(crate) fn from_leaf_storage(items: Storage<E>) -> Self {
        debug_assert_eq!(items.height(), 0);
        Node::Leaf {
            summary: items.sum(E::summary),
            items: Arc::new(items),
        }
    }

    pub(crate) fn from_inner_storage(children: Storage<Node<E>>) -> Self {
        debug_assert!(children.height() > 0);
        Node::Inner {
            summary: children.sum(node_summary),
            children: Arc::new(children),
        }
    }

    // === Header ===

    #[inline]
    pub(crate) fn height(&self) -> u8 {
        match self {
            Node::Leaf { .. } => 0,
            Node::Inner { children, .. } => children.height(),
        }
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    #[inline]
    pub(crate) fn summary(&self) -> &E::Summary {
        match self {
            Node::Leaf { summary, .. } | Node::Inner { summary, .. } => summary,
        }
    }

    #[inline]
    pub(crate) fn child_count(&self) -> usize {
        match self {
            Node::Leaf { items, .. } => items.len(),
            Node::Inner { children, .. } => children.len(),
        }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.child_count() == 0
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.child_count() == MAX_NODE_SIZE
    }

    #[inline]
    pub(crate) fn is_undersized(&self) -> bool {
        self.child_count() < MIN_NODE_SIZE
    }

    /// Unique access to a leaf's items, copying the storage if it is shared.
    fn unique_leaf(&mut self) -> (&mut Storage<E>, &mut E::Summary) {
        match self {
            Node::Leaf { items, summary } => (Arc::make_mut(items), summary),
            Node::Inner { .. } => panic!("expected a leaf node"),
        }
    }

    /// Unique access to an inner node's children, copying the storage if it is shared.
    fn unique_inner(&mut self) -> (&mut Storage<Node<E>>, &mut E::Summary) {
        match self {
            Node::Inner { children, summary } => (Arc::make_mut(children), summary),
            Node::Leaf { .. } => panic!("expected an inner node"),
        }
    }

    /// Drops single-child inner levels from the top of this subtree.
    pub(crate) fn collapsed(mut self) -> Self {
        loop {
            match self {
                Node::Inner { children, .. } if children.len() == 1 => {
                    let mut children = Arc::unwrap_or_clone(children);
                    self = children.remove_child(0);
                }
                node => return node,
            }
        }
    }

    // === Leaf mutators ===

    pub(crate) fn insert_item(&mut self, slot: usize, item: E) {
        let (items, summary) = self.unique_leaf();
        summary.add_summary(&item.summary());
        items.insert_child(slot, item);
    }

    pub(crate) fn append_item(&mut self, item: E) {
        let (items, summary) = self.unique_leaf();
        summary.add_summary(&item.summary());
        items.push_child(item);
    }

    pub(crate) fn remove_item(&mut self, slot: usize) -> E {
        let (items, summary) = self.unique_leaf();
        let item = items.remove_child(slot);
        summary.subtract_summary(&item.summary());
        item
    }

    // === Inner mutators ===

    pub(crate) fn insert_node(&mut self, slot: usize, node: Node<E>) {
        assert_eq!(node.height() + 1, self.height(), "height mismatch");
        let (children, summary) = self.unique_inner();
        summary.add_summary(node.summary());
        children.insert_child(slot, node);
    }

    pub(crate) fn append_node(&mut self, node: Node<E>) {
        assert_eq!(node.height() + 1, self.height(), "height mismatch");
        let (children, summary) = self.unique_inner();
        summary.add_summary(node.summary());
        children.push_child(node);
    }

    pub(crate) fn remove_node(&mut self, slot: usize) -> Node<E> {
        let (children, summary) = self.unique_inner();
        let node = children.remove_child(slot);
        summary.subtract_summary(node.summary());
        node
    }

    // === Whole-node operations ===

    /// Keeps the first `keeping` children and returns the rest as a new node.
    pub(crate) fn split(&mut self, keeping: usize) -> Self {
        debug_assert!(keeping <= self.child_count());
        let rest = if self.is_leaf() {
            let (items, _) = self.unique_leaf();
            Self::from_leaf_storage(items.split_off(keeping))
        } else {
            let (children, _) = self.unique_inner();
            Self::from_inner_storage(children.split_off(keeping))
        };
        match self {
            Node::Leaf { summary, .. } | Node::Inner { summary, .. } => {
                summary.subtract_summary(rest.summary());
            }
        }
        rest
    }

    /// Moves the first `count` children of `source` onto the end of `self`.
    fn append_moving_prefix_of(&mut self, source: &mut Self, count: usize) {
        match (self, source) {
            (
                Node::Leaf { items, summary },
                Node::Leaf {
                    items: source_items,
                    summary: source_summary,
                },
            ) => {
                let moved = Arc::make_mut(items).append_moving_prefix_of(
                    Arc::make_mut(source_items),
                    count,
                    E::summary,
                );
                summary.add_summary(&moved);
                source_summary.subtract_summary(&moved);
            }
            (
                Node::Inner { children, summary },
                Node::Inner {
                    children: source_children,
                    summary: source_summary,
                },
            ) => {
                let moved = Arc::make_mut(children).append_moving_prefix_of(
                    Arc::make_mut(source_children),
                    count,
                    node_summary,
                );
                summary.add_summary(&moved);
                source_summary.subtract_summary(&moved);
            }
            _ => panic!("height mismatch"),
        }
    }

    /// Moves the last `count` children of `source` onto the front of `self`.
    fn prepend_moving_suffix_of(&mut self, source: &mut Self, count: usize) {
        match (self, source) {
            (
                Node::Leaf { items, summary },
                Node::Leaf {
                    items: source_items,
                    summary: source_summary,
                },
            ) => {
                let moved = Arc::make_mut(items).prepend_moving_suffix_of(
                    Arc::make_mut(source_items),
                    count,
                    E::summary,
                );
                summary.add_summary(&moved);
                source_summary.subtract_summary(&moved);
            }
            (
                Node::Inner { children, summary },
                Node::Inner {
                    children: source_children,
                    summary: source_summary,
                },
            ) => {
                let moved = Arc::make_mut(children).prepend_moving_suffix_of(
                    Arc::make_mut(source_children),
                    count,
                    node_summary,
                );
                summary.add_summary(&moved);
                source_summary.subtract_summary(&moved);
            }
            _ => panic!("height mismatch"),
        }
    }

    /// Number of children the left node of a pair should end up with.
    fn balanced_left_count(total: usize) -> usize {
        if total <= MAX_NODE_SIZE {
            total
        } else if total / 2 >= MIN_NODE_SIZE {
            total / 2
        } else {
            MIN_NODE_SIZE
        }
    }

    /// Redistributes children between `self` and its right neighbor when
    /// either is undersized. Returns true if `right` ended up empty and must be
    /// removed by the caller.
    pub(crate) fn rebalance_next(&mut self, right: &mut Self) -> bool {
        assert_eq!(self.height(), right.height(), "height mismatch");
        if self.is_empty() {
            mem::swap(self, right);
            return true;
        }
        if !self.is_undersized() && !right.is_undersized() {
            return false;
        }
        let count = self.child_count();
        let target = Self::balanced_left_count(count + right.child_count());
        trace!(
            height = self.height(),
            left = count,
            right = right.child_count(),
            target,
            "rebalance with next"
        );
        match target.cmp(&count) {
            Ordering::Greater => self.append_moving_prefix_of(right, target - count),
            Ordering::Less => right.prepend_moving_suffix_of(self, count - target),
            Ordering::Equal => {}
        }
        right.is_empty()
    }

    /// Mirror of [`Self::rebalance_next`]: `left` precedes `self`. Returns
    /// true if `left` ended up empty.
    pub(crate) fn rebalance_prev(&mut self, left: &mut Self) -> bool {
        assert_eq!(self.height(), left.height(), "height mismatch");
        if self.is_empty() {
            mem::swap(self, left);
            return true;
        }
        if !self.is_undersized() && !left.is_undersized() {
            return false;
        }
        let left_count = left.child_count();
        let total = left_count + self.child_count();
        if total <= MAX_NODE_SIZE {
            trace!(height = self.height(), left = left_count, total, "merge with prev");
            self.prepend_moving_suffix_of(left, left_count);
            return true;
        }
        let target = Self::balanced_left_count(total);
        trace!(
            height = self.height(),
            left = left_count,
            right = self.child_count(),
            target,
            "rebalance with prev"
        );
        match target.cmp(&left_count) {
            Ordering::Greater => left.append_moving_prefix_of(self, target - left_count),
            Ordering::Less => self.prepend_moving_suffix_of(left, left_count - target),
            Ordering::Equal => {}
        }
        left.is_empty()
    }

    // === Grafting ===

    /// Appends a child, splitting off a right sibling if this node is full.
    fn append_node_or_split(&mut self, node: Node<E>) -> Option<Node<E>> {
        if !self.is_full() {
            self.append_node(node);
            return None;
        }
        let mut sibling = self.split(MAX_NODE_SIZE + 1 - MIN_NODE_SIZE);
        sibling.append_node(node);
        Some(sibling)
    }

    /// Prepends a child, splitting off a left sibling if this node is full.
    fn prepend_node_or_split(&mut self, node: Node<E>) -> Option<Node<E>> {
        if !self.is_full() {
            self.insert_node(0, node);
            return None;
        }
        let right = self.split(MIN_NODE_SIZE - 1);
        let mut sibling = mem::replace(self, right);
        sibling.insert_node(0, node);
        Some(sibling)
    }

    /// Attaches a strictly shorter subtree after the last element of this one.
    /// Returns an overflow sibling that belongs right after `self`.
    pub(crate) fn graft_last(&mut self, mut node: Node<E>) -> Option<Node<E>> {
        let height = self.height();
        debug_assert!(node.height() < height);
        let spill = {
            let (children, summary) = self.unique_inner();
            let last = children.child_mut(children.len() - 1);
            let before = last.summary().clone();
            let spill = if node.height() + 1 == height {
                if last.rebalance_next(&mut node) {
                    None
                } else {
                    Some(node)
                }
            } else {
                last.graft_last(node)
            };
            summary.subtract_summary(&before);
            summary.add_summary(last.summary());
            spill
        };
        spill.and_then(|extra| self.append_node_or_split(extra))
    }

    /// Attaches a strictly shorter subtree before the first element of this
    /// one. Returns an overflow sibling that belongs right before `self`.
    pub(crate) fn graft_first(&mut self, mut node: Node<E>) -> Option<Node<E>> {
        let height = self.height();
        debug_assert!(node.height() < height);
        let spill = {
            let (children, summary) = self.unique_inner();
            let first = children.child_mut(0);
            let before = first.summary().clone();
            let spill = if node.height() + 1 == height {
                if first.rebalance_prev(&mut node) {
                    None
                } else {
                    Some(node)
                }
            } else {
                first.graft_first(node)
            };
            summary.subtract_summary(&before);
            summary.add_summary(first.summary());
            spill
        };
        spill.and_then(|extra| self.prepend_node_or_split(extra))
    }

    /// Concatenates two subtrees; either root may be undersized.
    pub(crate) fn join(mut left: Node<E>, mut right: Node<E>) -> Node<E> {
        if left.is_empty() {
            return right;
        }
        if right.is_empty() {
            return left;
        }
        trace!(left = left.height(), right = right.height(), "join");
        match left.height().cmp(&right.height()) {
            Ordering::Equal => {
                if left.rebalance_next(&mut right) {
                    left
                } else {
                    Self::create_inner_pair(left, right)
                }
            }
            Ordering::Greater => match left.graft_last(right) {
                None => left,
                Some(spill) => Self::create_inner_pair(left, spill),
            },
            Ordering::Less => match right.graft_first(left) {
                None => right,
                Some(spill) => Self::create_inner_pair(spill, right),
            },
        }
    }

    // === Element access ===

    pub(crate) fn first_item(&self) -> &E {
        match self {
            Node::Leaf { items, .. } => items.child(0),
            Node::Inner { children, .. } => children.child(0).first_item(),
        }
    }

    pub(crate) fn last_item(&self) -> &E {
        match self {
            Node::Leaf { items, .. } => items.child(items.len() - 1),
            Node::Inner { children, .. } => children.child(children.len() - 1).last_item(),
        }
    }

    pub(crate) fn item(&self, path: Path) -> &E {
        let slot = path.slot(self.height());
        match self {
            Node::Leaf { items, .. } => items.child(slot),
            Node::Inner { children, .. } => children.child(slot).item(path),
        }
    }

    /// Mutates one element in place, picking a slot per level with `pick(height, child_count)`.
    /// Cached summaries along the way are adjusted by the observed delta.
    fn update_item_with<R>(
        &mut self,
        pick: &impl Fn(u8, usize) -> usize,
        body: impl FnOnce(&mut E) -> R,
    ) -> R {
        if self.is_leaf() {
            let (items, summary) = self.unique_leaf();
            let slot = pick(0, items.len());
            let item = items.child_mut(slot);
            let before = item.summary();
            let result = body(item);
            summary.subtract_summary(&before);
            summary.add_summary(&item.summary());
            return result;
        }
        let height = self.height();
        let (children, summary) = self.unique_inner();
        let slot = pick(height, children.len());
        let child = children.child_mut(slot);
        let before = child.summary().clone();
        let result = child.update_item_with(pick, body);
        summary.subtract_summary(&before);
        summary.add_summary(child.summary());
        result
    }

    pub(crate) fn update_item<R>(&mut self, path: Path, body: impl FnOnce(&mut E) -> R) -> R {
        self.update_item_with(&|height, _| path.slot(height), body)
    }

    pub(crate) fn update_first_item<R>(&mut self, body: impl FnOnce(&mut E) -> R) -> R {
        self.update_item_with(&|_, _| 0, body)
    }

    pub(crate) fn update_last_item<R>(&mut self, body: impl FnOnce(&mut E) -> R) -> R {
        self.update_item_with(&|_, count| count - 1, body)
    }

    // === Navigation ===

    /// Handle to the leaf addressed by `path`.
    pub(crate) fn leaf_at(&self, path: Path) -> Weak<Storage<E>> {
        match self {
            Node::Leaf { items, .. } => Arc::downgrade(items),
            Node::Inner { children, .. } => children.child(path.slot(self.height())).leaf_at(path),
        }
    }

    /// Points the levels below this node at its first element.
    pub(crate) fn descend_to_first(&self, path: &mut Path) -> Weak<Storage<E>> {
        match self {
            Node::Leaf { items, .. } => {
                path.set_slot(0, 0);
                Arc::downgrade(items)
            }
            Node::Inner { children, .. } => {
                path.set_slot(self.height(), 0);
                children.child(0).descend_to_first(path)
            }
        }
    }

    /// Points the levels below this node at its last element.
    pub(crate) fn descend_to_last(&self, path: &mut Path) -> Weak<Storage<E>> {
        match self {
            Node::Leaf { items, .. } => {
                path.set_slot(0, items.len() - 1);
                Arc::downgrade(items)
            }
            Node::Inner { children, .. } => {
                let slot = children.len() - 1;
                path.set_slot(self.height(), slot);
                children.child(slot).descend_to_last(path)
            }
        }
    }

    /// Advances `path` to the next element within this subtree. Returns the
    /// new leaf, or `None` if `path` addressed this subtree's last element.
    pub(crate) fn form_successor(&self, path: &mut Path) -> Option<Weak<Storage<E>>> {
        let height = self.height();
        let slot = path.slot(height);
        match self {
            Node::Leaf { items, .. } => {
                if slot + 1 < items.len() {
                    path.set_slot(0, slot + 1);
                    Some(Arc::downgrade(items))
                } else {
                    None
                }
            }
            Node::Inner { children, .. } => {
                if let Some(leaf) = children.child(slot).form_successor(path) {
                    return Some(leaf);
                }
                if slot + 1 < children.len() {
                    path.set_slot(height, slot + 1);
                    Some(children.child(slot + 1).descend_to_first(path))
                } else {
                    None
                }
            }
        }
    }

    /// Steps `path` back to the previous element within this subtree. A path
    /// whose slot at this level equals the child count addresses the end.
    pub(crate) fn form_predecessor(&self, path: &mut Path) -> Option<Weak<Storage<E>>> {
        let height = self.height();
        let slot = path.slot(height);
        match self {
            Node::Leaf { items, .. } => {
                if slot > 0 {
                    path.set_slot(0, slot - 1);
                    Some(Arc::downgrade(items))
                } else {
                    None
                }
            }
            Node::Inner { children, .. } => {
                if slot < children.len() {
                    if let Some(leaf) = children.child(slot).form_predecessor(path) {
                        return Some(leaf);
                    }
                }
                if slot > 0 {
                    path.set_slot(height, slot - 1);
                    Some(children.child(slot - 1).descend_to_last(path))
                } else {
                    None
                }
            }
        }
    }

    /// Descends to the element containing `offset` in `metric`, recording the
    /// route in `path`. Returns the leaf and the offset left inside the element.
    pub(crate) fn find<M: Metric<E>>(
        &self,
        mut offset: usize,
        metric: &M,
        prefer_end: bool,
        path: &mut Path,
    ) -> (Weak<Storage<E>>, usize) {
        let fits = |offset: usize, size: usize| offset < size || (prefer_end && offset == size);
        let mut node = self;
        loop {
            match node {
                Node::Inner { children, .. } => {
                    let mut slot = 0;
                    while slot + 1 < children.len() {
                        let size = metric.size(children.child(slot).summary());
                        if fits(offset, size) {
                            break;
                        }
                        offset -= size;
                        slot += 1;
                    }
                    path.set_slot(node.height(), slot);
                    node = children.child(slot);
                }
                Node::Leaf { items, .. } => {
                    let mut slot = 0;
                    while slot + 1 < items.len() {
                        let size = metric.size(&items.child(slot).summary());
                        if fits(offset, size) {
                            break;
                        }
                        offset -= size;
                        slot += 1;
                    }
                    path.set_slot(0, slot);
                    return (Arc::downgrade(items), offset);
                }
            }
        }
    }

    /// Sum of `metric` over everything before the element at `path`.
    pub(crate) fn offset_of<M: Metric<E>>(&self, path: Path, metric: &M) -> usize {
        let mut offset = 0;
        let mut node = self;
        loop {
            let slot = path.slot(node.height());
            match node {
                Node::Inner { children, .. } => {
                    for child in &children.children()[..slot] {
                        offset += metric.size(child.summary());
                    }
                    node = children.child(slot);
                }
                Node::Leaf { items, .. } => {
                    for item in &items.children()[..slot] {
                        offset += metric.size(&item.summary());
                    }
                    return offset;
                }
            }
        }
    }

    /// Path that inserts after the last element: every level points at its
    /// last child, except the leaf level which points one past the end.
    pub(crate) fn append_path(&self) -> Path {
        let mut path = Path::new(self.height());
        self.descend_to_last(&mut path);
        let last = path.slot(0);
        path.set_slot(0, last + 1);
        path
    }

    // === In-place insertion and removal ===

    /// Splits a full node ahead of inserting at `slot`, so both halves end up
    /// with at least `MIN_NODE_SIZE` children. Returns the right half and the
    /// insertion slot adjusted to whichever half receives the new child.
    fn split_for_insert(&mut self, slot: usize) -> (Node<E>, Option<usize>) {
        if slot < MIN_NODE_SIZE {
            (self.split(MIN_NODE_SIZE - 1), None)
        } else {
            (self.split(MIN_NODE_SIZE), Some(slot - MIN_NODE_SIZE))
        }
    }

    /// Inserts `item` before the element at `path`. Returns an overflow
    /// sibling that the caller places right after `self`.
    pub(crate) fn insert_at(&mut self, path: Path, item: E) -> Option<Node<E>> {
        let slot = path.slot(self.height());
        if self.is_leaf() {
            if !self.is_full() {
                self.insert_item(slot, item);
                return None;
            }
            let (mut right, right_slot) = self.split_for_insert(slot);
            match right_slot {
                Some(slot) => right.insert_item(slot, item),
                None => self.insert_item(slot, item),
            }
            return Some(right);
        }

        let spill = {
            let (children, summary) = self.unique_inner();
            let child = children.child_mut(slot);
            let before = child.summary().clone();
            let spill = child.insert_at(path, item);
            summary.subtract_summary(&before);
            summary.add_summary(child.summary());
            spill
        };
        let extra = spill?;
        if !self.is_full() {
            self.insert_node(slot + 1, extra);
            return None;
        }
        let (mut right, right_slot) = self.split_for_insert(slot + 1);
        match right_slot {
            Some(slot) => right.insert_node(slot, extra),
            None => self.insert_node(slot + 1, extra),
        }
        Some(right)
    }

    /// Removes the element at `path`, repairing any child left undersized.
    pub(crate) fn remove_at(&mut self, path: Path) -> E {
        let slot = path.slot(self.height());
        if self.is_leaf() {
            return self.remove_item(slot);
        }
        let (item, undersized) = {
            let (children, summary) = self.unique_inner();
            let child = children.child_mut(slot);
            let before = child.summary().clone();
            let item = child.remove_at(path);
            summary.subtract_summary(&before);
            summary.add_summary(child.summary());
            (item, child.is_undersized())
        };
        if undersized {
            self.fix_undersized_child(slot);
        }
        item
    }

    /// Rebalances the child at `slot` against a sibling, dropping whichever
    /// one ends up empty. The total summary of `self` is unaffected.
    fn fix_undersized_child(&mut self, slot: usize) {
        let (children, _) = self.unique_inner();
        if children.len() < 2 {
            return;
        }
        let emptied = if slot + 1 < children.len() {
            let (head, tail) = children.children_mut().split_at_mut(slot + 1);
            head[slot].rebalance_next(&mut tail[0]).then_some(slot + 1)
        } else {
            let (head, tail) = children.children_mut().split_at_mut(slot);
            tail[0].rebalance_prev(&mut head[slot - 1]).then_some(slot - 1)
        };
        if let Some(slot) = emptied {
            trace!(height = self.height(), slot, "merged undersized child");
            self.remove_node(slot);
        }
    }

    // === Splitting into a builder ===

    /// Hands everything before `path` to the prefix side of `builder`.
    pub(crate) fn collect_prefix(self, path: Path, builder: &mut Builder<E>) {
        let slot = path.slot(self.height());
        match self {
            Node::Leaf { items, .. } => {
                let head = match Arc::try_unwrap(items) {
                    Ok(mut items) => {
                        items.split_off(slot);
                        items
                    }
                    Err(shared) => shared.copy_slots(0..slot),
                };
                builder.insert_node_before_tip(Self::from_leaf_storage(head));
            }
            Node::Inner { children, .. } => {
                let (head, child) = match Arc::try_unwrap(children) {
                    Ok(mut children) => {
                        let mut rest = children.split_off(slot);
                        let child = (!rest.is_empty()).then(|| rest.remove_child(0));
                        (children, child)
                    }
                    Err(shared) => (
                        shared.copy_slots(0..slot),
                        shared.children().get(slot).cloned(),
                    ),
                };
                builder.insert_node_before_tip(Self::from_inner_storage(head));
                if let Some(child) = child {
                    child.collect_prefix(path, builder);
                }
            }
        }
    }

    /// Hands the element at `path` and everything after it to the suffix side
    /// of `builder`.
    pub(crate) fn collect_suffix(self, path: Path, builder: &mut Builder<E>) {
        let slot = path.slot(self.height());
        match self {
            Node::Leaf { items, .. } => {
                let tail = match Arc::try_unwrap(items) {
                    Ok(mut items) => items.split_off(slot),
                    Err(shared) => shared.copy_slots(slot..shared.len()),
                };
                builder.insert_node_after_tip(Self::from_leaf_storage(tail));
            }
            Node::Inner { children, .. } => {
                let (child, tail) = match Arc::try_unwrap(children) {
                    Ok(mut children) => {
                        let mut tail = children.split_off(slot);
                        let child = (!tail.is_empty()).then(|| tail.remove_child(0));
                        (child, tail)
                    }
                    Err(shared) => {
                        let start = (slot + 1).min(shared.len());
                        (
                            shared.children().get(slot).cloned(),
                            shared.copy_slots(start..shared.len()),
                        )
                    }
                };
                builder.insert_node_after_tip(Self::from_inner_storage(tail));
                if let Some(child) = child {
                    child.collect_suffix(path, builder);
                }
            }
        }
    }

    /// Moves the elements of a leaf out, in order.
    pub(crate) fn into_items(self) -> Vec<E> {
        match self {
            Node::Leaf { items, .. } => Arc::unwrap_or_clone(items).into_children().collect(),
            Node::Inner { .. } => panic!("expected a leaf node"),
        }
    }
}
