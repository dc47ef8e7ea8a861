//! In-order traversal

use std::iter::FusedIterator;
use std::slice;

use crate::node::Node;
use crate::summary::Element;

/// Borrowing iterator over the elements of a [`Rope`](crate::Rope).
pub struct Iter<'a, E: Element> {
    /// Unvisited siblings at each inner level above the current leaf
    stack: Vec<slice::Iter<'a, Node<E>>>,
    leaf: slice::Iter<'a, E>,
}

impl<'a, E: Element> Iter<'a, E> {
    pub(crate) fn new(root: Option<&'a Node<E>>) -> Self {
        let mut iter = Self {
            stack: Vec::new(),
            leaf: <&[E]>::default().iter(),
        };
        if let Some(root) = root {
            iter.descend(root);
        }
        iter
    }

    fn descend(&mut self, mut node: &'a Node<E>) {
        loop {
            match node {
                Node::Leaf { items, .. } => {
                    self.leaf = items.children().iter();
                    return;
                }
                Node::Inner { children, .. } => {
                    let mut siblings = children.children().iter();
                    let Some(first) = siblings.next() else {
                        return;
                    };
                    self.stack.push(siblings);
                    node = first;
                }
            }
        }
    }
}

impl<'a, E: Element> Iterator for Iter<'a, E> {
    type Item = &'a E;

    fn next(&mut self) -> Option<&'a E> {
        loop {
            if let Some(item) = self.leaf.next() {
                return Some(item);
            }
            let next = loop {
                let siblings = self.stack.last_mut()?;
                match siblings.next() {
                    Some(node) => break node,
                    None => {
                        self.stack.pop();
                    }
                }
            };
            self.descend(next);
        }
    }
}

impl<E: Element> FusedIterator for Iter<'_, E> {}
