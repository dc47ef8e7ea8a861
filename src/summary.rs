//! Contracts every rope instantiation supplies: summaries, elements and metrics

use std::fmt;

/// Aggregated measure over a subtree, cached at every node.
///
/// Summaries form a commutative group: `add_summary` must be associative and
/// commutative with `zero()` as identity, and `subtract_summary` must undo it.
/// The tree relies on the inverse to adjust cached sums by a delta instead of
/// recomputing them from the children.
pub trait Summary: Clone + PartialEq + fmt::Debug {
    fn zero() -> Self;

    #[inline]
    fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    fn add_summary(&mut self, other: &Self);

    fn subtract_summary(&mut self, other: &Self);
}

/// A value stored in the rope.
///
/// Elements may be variable-sized (e.g. text chunks). The rebalancing hooks
/// let neighboring elements trade content so that undersized elements get
/// absorbed at edit boundaries.
pub trait Element: Clone {
    type Summary: Summary;

    /// Position inside a single element, as produced by [`Metric::index`].
    type Index: Copy + Ord + fmt::Debug;

    fn summary(&self) -> Self::Summary;

    fn is_empty(&self) -> bool;

    fn is_undersized(&self) -> bool;

    /// Moves content between `self` and the following element `next`.
    /// Returns true if `next` ended up empty; `self` is never left empty.
    fn rebalance_next(&mut self, next: &mut Self) -> bool;

    /// Moves content between `self` and the preceding element `prev`.
    /// Returns true if `prev` ended up empty; `self` is never left empty.
    fn rebalance_prev(&mut self, prev: &mut Self) -> bool;

    /// Truncates `self` at `index`, returning the removed tail.
    fn split_at(&mut self, index: Self::Index) -> Self;
}

/// Projection of a summary onto one coordinate system.
///
/// Several metrics can address the same rope (bytes, chars, lines...).
pub trait Metric<E: Element> {
    /// Size of a summarized run in this metric's units.
    fn size(&self, summary: &E::Summary) -> usize;

    /// Locates `offset` (in this metric's units) inside a single element.
    fn index(&self, offset: usize, element: &E) -> E::Index;
}
