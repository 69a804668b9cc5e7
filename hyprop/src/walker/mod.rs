//! Iterative walkers over the node arena of an [`Expression`].
//!
//! Two families of traversal are provided, both without recursion:
//! - [`walk`] / [`walk_mut`]: visitor-driven traversal. Each visited node decides which children
//!   are visited next and with which input, either immediately (depth-first) or deferred
//!   (breadth-first). Children that are not scheduled are pruned.
//! - [`inorder`] / [`preorder`]: plain index iterators for the fixed orders used by
//!   normalization and copying.
//!
//! Memory: one `VecDeque` (visitors) or one inline `SmallVec` stack (iterators), both O(depth)
//! for depth-first orders and O(width) for breadth-first.
//!
//! Example: count the leaves below the root
//! ```
//! use hyprop::parser::parse;
//! use hyprop::walker::walk;
//!
//! let e = parse("a>(b>a)").unwrap();
//! let mut leaves = 0usize;
//! walk(&e, 0, (), |_, node| {
//!     if node.term().is_leaf() {
//!         leaves += 1;
//!     }
//!     node.schedule_children_immediate(());
//! });
//! assert_eq!(leaves, 3);
//! ```
use std::collections::VecDeque;

use smallvec::SmallVec;

use crate::expr::{Expression, Node};
use crate::relation::{INVALID_INDEX, Relation};
use crate::term::Term;

type Schedule<I> = VecDeque<(usize, I)>;

/// Handle on the node being visited by [`walk`].
pub struct WalkerNode<'a, I> {
    index: usize,
    node: &'a Node,
    schedule: &'a mut Schedule<I>,
}

/// Handle on the node being visited by [`walk_mut`].
pub struct WalkerNodeMut<'a, I> {
    index: usize,
    node: &'a mut Node,
    schedule: &'a mut Schedule<I>,
}

macro_rules! impl_scheduling {
    ($handle:ident) => {
        impl<'a, I> $handle<'a, I> {
            /// Arena index of the visited node.
            #[inline]
            pub fn index(&self) -> usize {
                self.index
            }

            #[inline]
            pub fn term(&self) -> &Term {
                &self.node.term
            }

            #[inline]
            pub fn relation(&self) -> Relation {
                self.node.relation
            }

            #[inline]
            pub fn is_root(&self) -> bool {
                self.node.relation.parent() == INVALID_INDEX
            }

            /// Visit `child` next (LIFO/DFS). Invalid indices are ignored.
            pub fn schedule_immediate(&mut self, child: usize, input: I) {
                if child != INVALID_INDEX {
                    self.schedule.push_front((child, input));
                }
            }

            /// Visit `child` after everything already scheduled (FIFO/BFS).
            pub fn schedule_deferred(&mut self, child: usize, input: I) {
                if child != INVALID_INDEX {
                    self.schedule.push_back((child, input));
                }
            }

            /// Schedule both children depth-first, left child visited first.
            pub fn schedule_children_immediate(&mut self, input: I)
            where
                I: Clone,
            {
                let relation = self.node.relation;
                self.schedule_immediate(relation.right(), input.clone());
                self.schedule_immediate(relation.left(), input);
            }

            /// Schedule both children breadth-first, left child queued first.
            pub fn schedule_children_deferred(&mut self, input: I)
            where
                I: Clone,
            {
                let relation = self.node.relation;
                self.schedule_deferred(relation.left(), input.clone());
                self.schedule_deferred(relation.right(), input);
            }

            /// Drop every pending visit.
            pub fn break_(&mut self) {
                self.schedule.clear();
            }
        }
    };
}

impl_scheduling!(WalkerNode);
impl_scheduling!(WalkerNodeMut);

impl<'a, I> WalkerNodeMut<'a, I> {
    #[inline]
    pub fn term_mut(&mut self) -> &mut Term {
        &mut self.node.term
    }
}

/// Visit nodes of `expr` starting at `root`, letting the visitor schedule children.
///
/// Out-of-range roots visit nothing.
pub fn walk<I>(
    expr: &Expression,
    root: usize,
    input: I,
    mut visitor: impl FnMut(I, &mut WalkerNode<'_, I>),
) {
    let mut schedule: Schedule<I> = VecDeque::new();
    if root < expr.size() {
        schedule.push_back((root, input));
    }

    while let Some((index, input)) = schedule.pop_front() {
        let mut handle = WalkerNode {
            index,
            node: &expr.nodes[index],
            schedule: &mut schedule,
        };
        visitor(input, &mut handle);
    }
}

/// Same as [`walk`], with write access to the visited node's [`Term`].
///
/// The expression's cached rendering is invalidated.
pub fn walk_mut<I>(
    expr: &mut Expression,
    root: usize,
    input: I,
    mut visitor: impl FnMut(I, &mut WalkerNodeMut<'_, I>),
) {
    let mut schedule: Schedule<I> = VecDeque::new();
    if root < expr.size() {
        schedule.push_back((root, input));
    }

    while let Some((index, input)) = schedule.pop_front() {
        let mut handle = WalkerNodeMut {
            index,
            node: &mut expr.nodes[index],
            schedule: &mut schedule,
        };
        visitor(input, &mut handle);
    }
    expr.invalidate();
}

/// In-order (left, self, right) iterator over node indices.
pub struct Inorder<'e> {
    expr: &'e Expression,
    stack: SmallVec<[usize; 16]>,
    current: usize,
}

impl<'e> Iterator for Inorder<'e> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.current != INVALID_INDEX {
            self.stack.push(self.current);
            self.current = self.expr.subtree(self.current).left();
        }
        let index = self.stack.pop()?;
        self.current = self.expr.subtree(index).right();
        Some(index)
    }
}

/// Pre-order (self, left, right) iterator over node indices.
pub struct Preorder<'e> {
    expr: &'e Expression,
    stack: SmallVec<[usize; 16]>,
}

impl<'e> Iterator for Preorder<'e> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let index = self.stack.pop()?;
        let relation = self.expr.subtree(index);
        for child in [relation.right(), relation.left()] {
            if child != INVALID_INDEX {
                self.stack.push(child);
            }
        }
        Some(index)
    }
}

pub fn inorder(expr: &Expression, root: usize) -> Inorder<'_> {
    Inorder {
        expr,
        stack: SmallVec::new(),
        current: if root < expr.size() {
            root
        } else {
            INVALID_INDEX
        },
    }
}

pub fn preorder(expr: &Expression, root: usize) -> Preorder<'_> {
    let mut stack = SmallVec::new();
    if root < expr.size() {
        stack.push(root);
    }
    Preorder { expr, stack }
}
