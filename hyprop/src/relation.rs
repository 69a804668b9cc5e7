//! Index links between the nodes of an expression arena.
//!
//! Tree edges are plain indices into the owning [`Expression`](crate::expr::Expression)'s node
//! array. Index `0` is always the root, so the "no such node" sentinel is [`INVALID_INDEX`].

/// Sentinel for a missing link.
pub const INVALID_INDEX: usize = usize::MAX;

const SELF: usize = 0;
const LEFT: usize = 1;
const RIGHT: usize = 2;
const PARENT: usize = 3;

/// `(self, left, right, parent)` indices of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Relation {
    refs: [usize; 4],
}

impl Default for Relation {
    fn default() -> Self {
        Self::invalid()
    }
}

impl Relation {
    pub const fn new(this: usize, left: usize, right: usize, parent: usize) -> Self {
        Self {
            refs: [this, left, right, parent],
        }
    }

    /// Relation of a detached node: every link is invalid.
    pub const fn invalid() -> Self {
        Self::new(INVALID_INDEX, INVALID_INDEX, INVALID_INDEX, INVALID_INDEX)
    }

    /// Relation of a childless root at `index`.
    pub const fn leaf(index: usize) -> Self {
        Self::new(index, INVALID_INDEX, INVALID_INDEX, INVALID_INDEX)
    }

    #[inline]
    pub const fn self_index(&self) -> usize {
        self.refs[SELF]
    }

    #[inline]
    pub const fn left(&self) -> usize {
        self.refs[LEFT]
    }

    #[inline]
    pub const fn right(&self) -> usize {
        self.refs[RIGHT]
    }

    #[inline]
    pub const fn parent(&self) -> usize {
        self.refs[PARENT]
    }

    pub fn set_left(&mut self, index: usize) {
        self.refs[LEFT] = index;
    }

    pub fn set_right(&mut self, index: usize) {
        self.refs[RIGHT] = index;
    }

    pub fn set_parent(&mut self, index: usize) {
        self.refs[PARENT] = index;
    }

    pub const fn is_valid(&self) -> bool {
        self.refs[SELF] != INVALID_INDEX
    }

    pub const fn has_children(&self) -> bool {
        self.refs[LEFT] != INVALID_INDEX && self.refs[RIGHT] != INVALID_INDEX
    }

    /// Apply `map` to every valid link, leaving sentinels untouched.
    pub fn remapped(&self, map: impl Fn(usize) -> usize) -> Self {
        let mut refs = self.refs;
        for r in refs.iter_mut().filter(|r| **r != INVALID_INDEX) {
            *r = map(*r);
        }
        Self { refs }
    }

    /// Shift every valid link by `offset`.
    pub fn shifted(&self, offset: usize) -> Self {
        self.remapped(|r| r + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shifting_keeps_sentinels() {
        let r = Relation::new(0, 1, INVALID_INDEX, INVALID_INDEX).shifted(4);
        assert_eq!(r.self_index(), 4);
        assert_eq!(r.left(), 5);
        assert_eq!(r.right(), INVALID_INDEX);
        assert_eq!(r.parent(), INVALID_INDEX);
    }

    #[test]
    fn leaf_and_invalid() {
        assert!(Relation::leaf(0).is_valid());
        assert!(!Relation::leaf(0).has_children());
        assert!(!Relation::invalid().is_valid());
        assert_eq!(Relation::default(), Relation::invalid());
    }
}
