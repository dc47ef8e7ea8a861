//! Invariant checking and structural dumps for test harnesses

use std::fmt::{self, Write};

use tracing::error;

use crate::error::InvariantError;
use crate::node::Node;
use crate::path::MAX_HEIGHT;
use crate::rope::Rope;
use crate::summary::{Element, Summary};
use crate::{MAX_NODE_SIZE, MIN_NODE_SIZE};

impl<E: Element> Rope<E> {
    /// Walks the whole tree, recomputing every summary bottom-up and checking
    /// size bounds and leaf depth. O(n).
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let Some(root) = self.root() else {
            return Ok(());
        };
        let result = check_root(root);
        if let Err(err) = &result {
            error!(%err, height = root.height(), "rope invariant violated");
        }
        result
    }

    /// Panics on a violated invariant when built with `internal-checks`.
    #[inline]
    pub(crate) fn check_after_mutation(&self) {
        if cfg!(feature = "internal-checks") {
            if let Err(err) = self.check_invariants() {
                panic!("rope invariant violated: {}\n{}", err, self.shape());
            }
        }
    }

    /// Printable tree: one line per node with its summary, elements inline.
    pub fn dump(&self) -> String
    where
        E: fmt::Debug,
    {
        let mut out = String::new();
        match self.root() {
            None => out.push_str("(empty)\n"),
            Some(root) => root.dump_into(&mut out, 0),
        }
        out
    }

    /// Like `dump`, but without element contents.
    fn shape(&self) -> String {
        let mut out = String::new();
        if let Some(root) = self.root() {
            root.shape_into(&mut out, 0);
        }
        out
    }
}

fn check_root<E: Element>(root: &Node<E>) -> Result<(), InvariantError> {
    if root.height() > MAX_HEIGHT {
        return Err(InvariantError::HeightOverflow(root.height()));
    }
    if root.is_empty() {
        return Err(InvariantError::EmptyNode {
            height: root.height(),
        });
    }
    if !root.is_leaf() && root.child_count() == 1 {
        return Err(InvariantError::DegenerateRoot);
    }
    root.check(root.height(), true).map(|_| ())
}

impl<E: Element> Node<E> {
    fn check(&self, expected_height: u8, is_root: bool) -> Result<E::Summary, InvariantError> {
        let height = self.height();
        if height != expected_height {
            return Err(InvariantError::Unbalanced {
                expected: expected_height,
                found: height,
            });
        }
        let count = self.child_count();
        if count == 0 {
            return Err(InvariantError::EmptyNode { height });
        }
        if count > MAX_NODE_SIZE {
            return Err(InvariantError::Oversized { height, count });
        }
        if !is_root && count < MIN_NODE_SIZE {
            return Err(InvariantError::Undersized { height, count });
        }

        let mut sum = E::Summary::zero();
        match self {
            Node::Leaf { items, .. } => {
                for item in items.children() {
                    if item.is_empty() {
                        return Err(InvariantError::EmptyElement);
                    }
                    sum.add_summary(&item.summary());
                }
            }
            Node::Inner { children, .. } => {
                for child in children.children() {
                    sum.add_summary(&child.check(height - 1, false)?);
                }
            }
        }

        if sum != *self.summary() {
            return Err(InvariantError::SummaryMismatch {
                height,
                expected: format!("{:?}", sum),
                found: format!("{:?}", self.summary()),
            });
        }
        Ok(sum)
    }

    fn dump_into(&self, out: &mut String, depth: usize)
    where
        E: fmt::Debug,
    {
        let indent = "  ".repeat(depth);
        match self {
            Node::Leaf { items, summary } => {
                let _ = writeln!(out, "{}leaf {:?} {:?}", indent, summary, items.children());
            }
            Node::Inner { children, summary } => {
                let _ = writeln!(
                    out,
                    "{}inner h={} n={} {:?}",
                    indent,
                    self.height(),
                    children.len(),
                    summary
                );
                for child in children.children() {
                    child.dump_into(out, depth + 1);
                }
            }
        }
    }

    fn shape_into(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let _ = writeln!(
            out,
            "{}h={} n={} {:?}",
            indent,
            self.height(),
            self.child_count(),
            self.summary()
        );
        if let Node::Inner { children, .. } = self {
            for child in children.children() {
                child.shape_into(out, depth + 1);
            }
        }
    }
}
