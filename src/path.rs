//! Positions inside a rope: packed descent routes and cached-leaf indices

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Weak;

use crate::storage::Storage;
use crate::summary::Element;
use crate::MAX_NODE_SIZE;

const HEIGHT_BITS: u32 = 4;
const SLOT_BITS: u32 = 5;
const HEIGHT_MASK: u64 = (1 << HEIGHT_BITS) - 1;
const SLOT_MASK: u64 = (1 << SLOT_BITS) - 1;

/// Tallest tree a 64-bit path can address (one slot field per level).
pub const MAX_HEIGHT: u8 = ((64 - HEIGHT_BITS) / SLOT_BITS) as u8 - 1;

// A slot must be able to hold `child_count` for end positions.
const _: () = assert!(MAX_NODE_SIZE as u64 <= SLOT_MASK);
const _: () = assert!(MAX_HEIGHT as u64 <= HEIGHT_MASK);

/// Slot chosen at every level from the root down to a leaf, plus the height.
///
/// The root's slot occupies the most significant field, so comparing the raw
/// values of two paths over the same tree orders them by position.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Path(u64);

impl Path {
    pub(crate) fn new(height: u8) -> Self {
        assert!(height <= MAX_HEIGHT, "tree height {} exceeds {}", height, MAX_HEIGHT);
        Path(height as u64)
    }

    #[inline]
    pub(crate) fn height(self) -> u8 {
        (self.0 & HEIGHT_MASK) as u8
    }

    #[inline]
    fn shift(height: u8) -> u32 {
        HEIGHT_BITS + height as u32 * SLOT_BITS
    }

    #[inline]
    pub(crate) fn slot(self, height: u8) -> usize {
        debug_assert!(height <= self.height());
        ((self.0 >> Self::shift(height)) & SLOT_MASK) as usize
    }

    #[inline]
    pub(crate) fn set_slot(&mut self, height: u8, slot: usize) {
        debug_assert!(height <= self.height());
        debug_assert!(slot as u64 <= SLOT_MASK);
        let shift = Self::shift(height);
        self.0 = (self.0 & !(SLOT_MASK << shift)) | ((slot as u64) << shift);
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path(")?;
        for height in (0..=self.height()).rev() {
            write!(f, "{}", self.slot(height))?;
            if height > 0 {
                write!(f, ".")?;
            }
        }
        write!(f, ")")
    }
}

/// A position in a [`Rope`](crate::Rope).
///
/// Besides the path, an index caches a non-owning reference to the leaf it
/// addresses so stepping to a neighbor within that leaf is O(1). Indices are
/// tied to the rope version they were created from; any structural mutation
/// invalidates them.
pub struct Index<E: Element> {
    pub(crate) version: u64,
    pub(crate) path: Path,
    pub(crate) leaf: Option<Weak<Storage<E>>>,
}

impl<E: Element> Index<E> {
    pub(crate) fn new(version: u64, path: Path, leaf: Option<Weak<Storage<E>>>) -> Self {
        Self {
            version,
            path,
            leaf,
        }
    }
}

impl<E: Element> Clone for Index<E> {
    fn clone(&self) -> Self {
        Self {
            version: self.version,
            path: self.path,
            leaf: self.leaf.clone(),
        }
    }
}

impl<E: Element> PartialEq for Index<E> {
    fn eq(&self, other: &Self) -> bool {
        debug_assert_eq!(self.version, other.version, "comparing indices of different ropes");
        self.path == other.path
    }
}

impl<E: Element> Eq for Index<E> {}

impl<E: Element> PartialOrd for Index<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E: Element> Ord for Index<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        debug_assert_eq!(self.version, other.version, "comparing indices of different ropes");
        self.path.cmp(&other.path)
    }
}

impl<E: Element> Hash for Index<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl<E: Element> fmt::Debug for Index<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Index")
            .field("path", &self.path)
            .field("version", &self.version)
            .finish()
    }
}
