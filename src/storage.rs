//! Fixed-capacity child buffers backing every node
//!
//! A `Storage` is shared between tree values through an `Arc` and only written
//! after `Arc::make_mut` has made it unique. Children are moved between
//! buffers, never cloned, so redistributing a full node costs O(MAX_NODE_SIZE).

use arrayvec::ArrayVec;
use std::ops::Range;

use crate::summary::Summary;
use crate::MAX_NODE_SIZE;

/// Children of one node plus the node header.
#[derive(Clone)]
pub(crate) struct Storage<C> {
    height: u8,
    children: ArrayVec<C, MAX_NODE_SIZE>,
}

impl<C> Storage<C> {
    pub(crate) fn new(height: u8) -> Self {
        Self {
            height,
            children: ArrayVec::new(),
        }
    }

    #[inline]
    pub(crate) fn height(&self) -> u8 {
        self.height
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.children.is_full()
    }

    #[inline]
    pub(crate) fn children(&self) -> &[C] {
        &self.children
    }

    #[inline]
    pub(crate) fn children_mut(&mut self) -> &mut [C] {
        &mut self.children
    }

    #[inline]
    pub(crate) fn child(&self, slot: usize) -> &C {
        debug_assert!(slot < self.len(), "slot {} out of bounds ({})", slot, self.len());
        &self.children[slot]
    }

    #[inline]
    pub(crate) fn child_mut(&mut self, slot: usize) -> &mut C {
        debug_assert!(slot < self.len(), "slot {} out of bounds ({})", slot, self.len());
        &mut self.children[slot]
    }

    pub(crate) fn insert_child(&mut self, slot: usize, child: C) {
        debug_assert!(!self.is_full(), "insert into full storage");
        debug_assert!(slot <= self.len(), "slot {} out of bounds ({})", slot, self.len());
        self.children.insert(slot, child);
    }

    pub(crate) fn push_child(&mut self, child: C) {
        debug_assert!(!self.is_full(), "append to full storage");
        self.children.push(child);
    }

    pub(crate) fn remove_child(&mut self, slot: usize) -> C {
        debug_assert!(slot < self.len(), "slot {} out of bounds ({})", slot, self.len());
        self.children.remove(slot)
    }

    pub(crate) fn into_children(self) -> arrayvec::IntoIter<C, MAX_NODE_SIZE> {
        self.children.into_iter()
    }

    /// Moves children `[at..]` into a fresh storage of the same height.
    pub(crate) fn split_off(&mut self, at: usize) -> Self {
        debug_assert!(at <= self.len());
        Self {
            height: self.height,
            children: self.children.drain(at..).collect(),
        }
    }

    /// Sum of the summaries of all children.
    pub(crate) fn sum<S: Summary>(&self, summarize: impl Fn(&C) -> S) -> S {
        let mut sum = S::zero();
        for child in &self.children {
            sum.add_summary(&summarize(child));
        }
        sum
    }

    /// Moves the first `count` children of `source` to the end of `self`,
    /// returning the summary of the moved run.
    pub(crate) fn append_moving_prefix_of<S: Summary>(
        &mut self,
        source: &mut Self,
        count: usize,
        summarize: impl Fn(&C) -> S,
    ) -> S {
        debug_assert_eq!(self.height, source.height, "height mismatch");
        debug_assert!(count <= source.len());
        debug_assert!(self.len() + count <= MAX_NODE_SIZE);

        let mut moved = S::zero();
        for child in source.children.drain(..count) {
            moved.add_summary(&summarize(&child));
            self.children.push(child);
        }
        moved
    }

    /// Moves the last `count` children of `source` to the front of `self`,
    /// returning the summary of the moved run.
    pub(crate) fn prepend_moving_suffix_of<S: Summary>(
        &mut self,
        source: &mut Self,
        count: usize,
        summarize: impl Fn(&C) -> S,
    ) -> S {
        debug_assert_eq!(self.height, source.height, "height mismatch");
        debug_assert!(count <= source.len());
        debug_assert!(self.len() + count <= MAX_NODE_SIZE);

        let start = source.len() - count;
        let mut children: ArrayVec<C, MAX_NODE_SIZE> = source.children.drain(start..).collect();
        let mut moved = S::zero();
        for child in &children {
            moved.add_summary(&summarize(child));
        }
        children.extend(self.children.drain(..));
        self.children = children;
        moved
    }
}

impl<C: Clone> Storage<C> {
    /// Copies a contiguous run of children into a new buffer.
    pub(crate) fn copy_slots(&self, slots: Range<usize>) -> Self {
        debug_assert!(slots.start <= slots.end && slots.end <= self.len());
        Self {
            height: self.height,
            children: self.children[slots].iter().cloned().collect(),
        }
    }
}
