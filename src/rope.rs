//! The rope value: navigation, metric addressing and editing

use std::fmt;
use std::mem;
use std::ops::{self, Range};

use tracing::trace;

use crate::builder::Builder;
use crate::iter::Iter;
use crate::node::Node;
use crate::path::{Index, Path};
use crate::summary::{Element, Metric, Summary};

/// Persistent balanced sequence of elements with cached summaries.
///
/// Cloning is O(1) and shares all storage; both copies stay independent
/// because every write first makes the touched nodes unique.
pub struct Rope<E: Element> {
    root: Option<Node<E>>,
    /// Generation tag, bumped on every structural mutation
    version: u64,
}

impl<E: Element> Rope<E> {
    pub fn new() -> Self {
        Self {
            root: None,
            version: rand::random(),
        }
    }

    pub fn from_element(item: E) -> Self {
        let mut rope = Self::new();
        if !item.is_empty() {
            rope.root = Some(Node::create_leaf_with(item));
        }
        rope
    }

    /// Wraps a finished root. A rope derived from another continues its
    /// generation sequence; a fresh one gets a random tag.
    pub(crate) fn from_root(root: Option<Node<E>>, lineage: Option<u64>) -> Self {
        let version = match lineage {
            Some(version) => version.wrapping_add(1),
            None => rand::random(),
        };
        Self { root, version }
    }

    pub(crate) fn root(&self) -> Option<&Node<E>> {
        self.root.as_ref()
    }

    pub(crate) fn into_root(self) -> Option<Node<E>> {
        self.root
    }

    fn bump(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    fn set_root(&mut self, root: Node<E>) {
        let root = root.collapsed();
        self.root = (!root.is_empty()).then_some(root);
    }

    // === Queries ===

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Summary of all elements.
    pub fn summary(&self) -> E::Summary {
        self.root
            .as_ref()
            .map_or_else(E::Summary::zero, |root| root.summary().clone())
    }

    /// Total size in `metric`'s units.
    pub fn count<M: Metric<E>>(&self, metric: &M) -> usize {
        self.root
            .as_ref()
            .map_or(0, |root| metric.size(root.summary()))
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of levels above the leaves; 0 for empty and single-leaf ropes.
    pub fn height(&self) -> u8 {
        self.root.as_ref().map_or(0, Node::height)
    }

    pub fn first(&self) -> Option<&E> {
        self.root.as_ref().map(Node::first_item)
    }

    pub fn last(&self) -> Option<&E> {
        self.root.as_ref().map(Node::last_item)
    }

    pub fn iter(&self) -> Iter<'_, E> {
        Iter::new(self.root.as_ref())
    }

    // === Indices ===

    fn validate(&self, index: &Index<E>) {
        assert_eq!(
            index.version, self.version,
            "index is stale or belongs to another rope"
        );
    }

    fn end_path(&self) -> Path {
        let mut path = Path::new(self.height());
        if let Some(root) = &self.root {
            path.set_slot(root.height(), root.child_count());
        }
        path
    }

    /// Index of the first element; equals `end_index()` when empty.
    pub fn start_index(&self) -> Index<E> {
        match &self.root {
            None => self.end_index(),
            Some(root) => {
                let mut path = Path::new(root.height());
                let leaf = root.descend_to_first(&mut path);
                Index::new(self.version, path, Some(leaf))
            }
        }
    }

    /// Index one past the last element.
    pub fn end_index(&self) -> Index<E> {
        Index::new(self.version, self.end_path(), None)
    }

    pub fn is_end(&self, index: &Index<E>) -> bool {
        self.validate(index);
        match &self.root {
            None => true,
            Some(root) => index.path.slot(root.height()) == root.child_count(),
        }
    }

    /// Moves `index` to the next element, or to the end.
    pub fn form_index_after(&self, index: &mut Index<E>) {
        assert!(!self.is_end(index), "cannot advance past the end");
        if let Some(leaf) = index.leaf.as_ref().and_then(|leaf| leaf.upgrade()) {
            let slot = index.path.slot(0);
            if slot + 1 < leaf.len() {
                index.path.set_slot(0, slot + 1);
                return;
            }
        }
        let Some(root) = &self.root else {
            return;
        };
        match root.form_successor(&mut index.path) {
            Some(leaf) => index.leaf = Some(leaf),
            None => {
                index.path = self.end_path();
                index.leaf = None;
            }
        }
    }

    /// Moves `index` to the previous element.
    pub fn form_index_before(&self, index: &mut Index<E>) {
        self.validate(index);
        if let Some(leaf) = index.leaf.as_ref().and_then(|leaf| leaf.upgrade()) {
            let slot = index.path.slot(0);
            if slot > 0 && slot <= leaf.len() {
                index.path.set_slot(0, slot - 1);
                return;
            }
        }
        let Some(root) = &self.root else {
            panic!("cannot step back in an empty rope");
        };
        match root.form_predecessor(&mut index.path) {
            Some(leaf) => index.leaf = Some(leaf),
            None => panic!("cannot step back from the start"),
        }
    }

    pub fn index_after(&self, index: &Index<E>) -> Index<E> {
        let mut next = index.clone();
        self.form_index_after(&mut next);
        next
    }

    pub fn index_before(&self, index: &Index<E>) -> Index<E> {
        let mut prev = index.clone();
        self.form_index_before(&mut prev);
        prev
    }

    /// Element at `index`, or `None` at the end.
    pub fn get(&self, index: &Index<E>) -> Option<&E> {
        if self.is_end(index) {
            return None;
        }
        self.root.as_ref().map(|root| root.item(index.path))
    }

    // === Metric addressing ===

    /// Finds the element containing `offset` in `metric`'s units, returning
    /// its index and the offset left inside it. With `prefer_end`, an offset
    /// on an element boundary resolves to the end of the earlier element.
    pub fn find<M: Metric<E>>(
        &self,
        offset: usize,
        metric: &M,
        prefer_end: bool,
    ) -> (Index<E>, usize) {
        let total = self.count(metric);
        assert!(offset <= total, "offset {} out of bounds ({})", offset, total);
        let root = match &self.root {
            Some(root) if prefer_end || offset < total => root,
            _ => return (self.end_index(), 0),
        };
        let mut path = Path::new(root.height());
        let (leaf, remaining) = root.find(offset, metric, prefer_end, &mut path);
        (Index::new(self.version, path, Some(leaf)), remaining)
    }

    /// Offset of the start of the element at `index`.
    pub fn offset_of<M: Metric<E>>(&self, index: &Index<E>, metric: &M) -> usize {
        if self.is_end(index) {
            return self.count(metric);
        }
        self.root
            .as_ref()
            .map_or(0, |root| root.offset_of(index.path, metric))
    }

    /// Resolves `offset` to an element and a position inside it. The end
    /// offset maps to the end of the last element; `None` only when empty.
    pub fn locate<M: Metric<E>>(&self, offset: usize, metric: &M) -> Option<(Index<E>, E::Index)> {
        let at_end = offset == self.count(metric);
        let (index, remaining) = self.find(offset, metric, at_end);
        let element = self.get(&index)?;
        let position = metric.index(remaining, element);
        Some((index, position))
    }

    // === Editing ===

    /// Inserts `item` before the element at `index` (or at the end).
    ///
    /// An undersized item first tries to merge into its neighbors; whatever
    /// remains is inserted in place, splitting full nodes on the way up.
    /// Invalidates all indices.
    pub fn insert(&mut self, mut item: E, index: &Index<E>) {
        let at_end = self.is_end(index);
        if item.is_empty() {
            return;
        }
        self.bump();
        if self.root.is_none() {
            self.root = Some(Node::create_leaf_with(item));
            return;
        }
        let Some(root) = self.root.as_mut() else {
            return;
        };

        let path = if at_end { root.append_path() } else { index.path };
        let mut prev = path;
        if root.form_predecessor(&mut prev).is_some() {
            let absorbed = root.update_item(prev, |prev| {
                (prev.is_undersized() || item.is_undersized()) && prev.rebalance_next(&mut item)
            });
            if absorbed {
                trace!("insert absorbed by previous element");
                self.check_after_mutation();
                return;
            }
        }
        if !at_end {
            let absorbed = root.update_item(path, |next| {
                (next.is_undersized() || item.is_undersized()) && next.rebalance_prev(&mut item)
            });
            if absorbed {
                trace!("insert absorbed by next element");
                self.check_after_mutation();
                return;
            }
        }

        if let Some(spill) = root.insert_at(path, item) {
            let left = mem::replace(root, Node::create_leaf());
            *root = Node::create_inner_pair(left, spill);
        }
        self.check_after_mutation();
    }

    /// Inserts `item` at `offset`, splitting the element the offset falls
    /// inside of.
    pub fn insert_at<M: Metric<E>>(&mut self, item: E, offset: usize, metric: &M) {
        let (index, remaining) = self.find(offset, metric, false);
        if remaining == 0 {
            self.insert(item, &index);
            return;
        }
        let at = metric.index(remaining, &self[&index]);
        let (mut builder, mut head) = mem::take(self).builder_around(&index);
        let tail = head.split_at(at);
        builder.insert_before_tip(head);
        builder.insert_before_tip(item);
        builder.insert_before_tip(tail);
        *self = builder.finalize();
    }

    pub fn push(&mut self, item: E) {
        let end = self.end_index();
        self.insert(item, &end);
    }

    pub fn push_front(&mut self, item: E) {
        let start = self.start_index();
        self.insert(item, &start);
    }

    /// Removes and returns the element at `index`. Invalidates all indices.
    pub fn remove(&mut self, index: &Index<E>) -> E {
        assert!(!self.is_end(index), "cannot remove the end index");
        let Some(mut root) = self.root.take() else {
            panic!("cannot remove from an empty rope");
        };
        let item = root.remove_at(index.path);
        self.set_root(root);
        self.bump();
        self.check_after_mutation();
        item
    }

    /// Removes every element in `range`.
    pub fn remove_range(&mut self, range: Range<Index<E>>) {
        self.validate(&range.start);
        self.validate(&range.end);
        assert!(range.start <= range.end, "range start after end");
        if range.start == range.end {
            return;
        }
        let Some(root) = self.root.take() else {
            return;
        };
        let mut builder = Builder::with_lineage(self.version);
        root.clone().collect_prefix(range.start.path, &mut builder);
        root.collect_suffix(range.end.path, &mut builder);
        *self = builder.finalize();
    }

    /// Runs `f` on the element at `index`, keeping cached summaries in step.
    ///
    /// Does not invalidate indices unless `f` leaves the element empty, in
    /// which case it is removed and every index (including `index`) goes stale.
    pub fn update<R>(&mut self, index: &mut Index<E>, f: impl FnOnce(&mut E) -> R) -> R {
        assert!(!self.is_end(index), "cannot update the end index");
        let Some(root) = self.root.as_mut() else {
            panic!("cannot update an empty rope");
        };
        let (result, emptied) = root.update_item(index.path, |item| {
            let result = f(item);
            (result, item.is_empty())
        });
        if emptied {
            if let Some(mut root) = self.root.take() {
                root.remove_at(index.path);
                self.set_root(root);
            }
            self.bump();
            self.check_after_mutation();
        } else {
            index.leaf = Some(root.leaf_at(index.path));
        }
        result
    }

    /// Splits the rope at `index` into a builder whose prefix holds the
    /// elements before it and whose suffix holds the rest.
    pub fn builder_at(self, index: &Index<E>) -> Builder<E> {
        self.validate(index);
        let mut builder = Builder::with_lineage(self.version);
        if let Some(root) = self.root {
            root.clone().collect_prefix(index.path, &mut builder);
            root.collect_suffix(index.path, &mut builder);
        }
        builder
    }

    /// Like [`Self::builder_at`], but takes the element at `index` out and
    /// returns it separately.
    fn builder_around(self, index: &Index<E>) -> (Builder<E>, E) {
        assert!(!self.is_end(index), "no element at the end index");
        let mut builder = Builder::with_lineage(self.version);
        let end = self.end_path();
        let Some(root) = self.root else {
            panic!("no element in an empty rope");
        };
        let element = root.item(index.path).clone();
        let mut after = index.path;
        if root.form_successor(&mut after).is_none() {
            after = end;
        }
        root.clone().collect_prefix(index.path, &mut builder);
        root.collect_suffix(after, &mut builder);
        (builder, element)
    }

    /// Splits off everything from `index` onward.
    pub fn split_off(&mut self, index: &Index<E>) -> Rope<E> {
        let (left, right) = mem::take(self).builder_at(index).finalize_halves();
        *self = left;
        right
    }

    /// Splits off everything from `offset` onward, cutting the element the
    /// offset falls inside of.
    pub fn split_off_at<M: Metric<E>>(&mut self, offset: usize, metric: &M) -> Rope<E> {
        let (index, remaining) = self.find(offset, metric, false);
        if remaining == 0 {
            return self.split_off(&index);
        }
        let at = metric.index(remaining, &self[&index]);
        let (mut builder, mut head) = mem::take(self).builder_around(&index);
        let tail = head.split_at(at);
        builder.insert_before_tip(head);
        builder.insert_after_tip(tail);
        let (left, right) = builder.finalize_halves();
        *self = left;
        right
    }

    /// Appends all of `other` in O(log n).
    pub fn append(&mut self, other: Rope<E>) {
        let mut builder = Builder::with_lineage(self.version);
        builder.insert_rope_before_tip(mem::take(self));
        builder.insert_rope_before_tip(other);
        *self = builder.finalize();
    }

    /// Prepends all of `other` in O(log n).
    pub fn prepend(&mut self, other: Rope<E>) {
        let mut builder = Builder::with_lineage(self.version);
        builder.insert_rope_before_tip(other);
        builder.insert_rope_before_tip(mem::take(self));
        *self = builder.finalize();
    }

    pub fn join(mut left: Rope<E>, right: Rope<E>) -> Rope<E> {
        left.append(right);
        left
    }
}

impl<E: Element> Clone for Rope<E> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            version: self.version,
        }
    }
}

impl<E: Element> Default for Rope<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Element + fmt::Debug> fmt::Debug for Rope<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<E: Element + PartialEq> PartialEq for Rope<E> {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl<E: Element + Eq> Eq for Rope<E> {}

impl<E: Element> ops::Index<&Index<E>> for Rope<E> {
    type Output = E;

    fn index(&self, index: &Index<E>) -> &E {
        self.get(index)
            .unwrap_or_else(|| panic!("no element at the end index"))
    }
}

impl<E: Element> FromIterator<E> for Rope<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        let mut builder = Builder::new();
        builder.extend_before_tip(iter);
        builder.finalize()
    }
}

impl<E: Element> Extend<E> for Rope<E> {
    fn extend<I: IntoIterator<Item = E>>(&mut self, iter: I) {
        let mut builder = Builder::with_lineage(self.version);
        builder.insert_rope_before_tip(mem::take(self));
        builder.extend_before_tip(iter);
        *self = builder.finalize();
    }
}

impl<'a, E: Element> IntoIterator for &'a Rope<E> {
    type Item = &'a E;
    type IntoIter = Iter<'a, E>;

    fn into_iter(self) -> Iter<'a, E> {
        self.iter()
    }
}
