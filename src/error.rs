use thiserror::Error;

/// Structural violation found by [`Rope::check_invariants`](crate::Rope::check_invariants).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantError {
    #[error("cached summary at height {height} is {found}, children sum to {expected}")]
    SummaryMismatch {
        height: u8,
        expected: String,
        found: String,
    },

    #[error("non-root node at height {height} has {count} children")]
    Undersized { height: u8, count: usize },

    #[error("node at height {height} has {count} children")]
    Oversized { height: u8, count: usize },

    #[error("expected a node of height {expected}, found height {found}")]
    Unbalanced { expected: u8, found: u8 },

    #[error("empty node at height {height}")]
    EmptyNode { height: u8 },

    #[error("empty element stored in a leaf")]
    EmptyElement,

    #[error("inner root has a single child")]
    DegenerateRoot,

    #[error("tree height {0} exceeds the addressable maximum")]
    HeightOverflow(u8),
}
