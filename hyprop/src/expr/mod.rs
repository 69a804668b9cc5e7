//! Formula trees stored as an index arena.
//!
//! Role
//! - [`Expression`] owns a contiguous vector of [`Node`]s. Node `0` is the root and tree edges are
//!   indices stored in each node's [`Relation`], never references.
//! - Every mutation happens in place and drops the cached rendering; every copy is a full clone of
//!   the node vector, so two live expressions never share storage.
//!
//! Layout
//! - [`Expression::construct`], [`Expression::copy_subtree`] and the parser produce nodes in
//!   pre-order. [`Expression::replace`] appends the spliced nodes at the end instead, which is still
//!   a valid tree but no longer canonical; [`Expression::copy_subtree`] of the root restores the
//!   canonical layout.
//!
//! Example
//! ```
//! use hyprop::expr::Expression;
//! use hyprop::term::{Operation, Term};
//!
//! let a = Expression::from_term(Term::variable(1));
//! let b = Expression::from_term(Term::variable(2));
//! let mut e = Expression::construct(&a, Operation::Implication, &b);
//! assert_eq!(e.string(), "a>b");
//!
//! e.negate(0);
//! assert_eq!(e.string(), "a*!b");
//! ```
pub mod pretty;

use std::cell::OnceCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;

use crate::relation::{INVALID_INDEX, Relation};
use crate::term::{Operation, Term, TermType, Value};
use crate::walker::{inorder, walk, walk_mut};

/// One arena slot: the label of the node and its links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Node {
    pub term: Term,
    pub relation: Relation,
}

impl Node {
    pub const fn new(term: Term, relation: Relation) -> Self {
        Self { term, relation }
    }
}

/// Propositional formula backed by a node arena.
#[derive(Clone, Default)]
pub struct Expression {
    pub(crate) nodes: Vec<Node>,
    rendered: OnceCell<String>,
}

impl Expression {
    /// Empty expression. Rule application uses it to signal "not applicable".
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-node expression.
    pub fn from_term(term: Term) -> Self {
        Self::from_nodes(vec![Node::new(term, Relation::leaf(0))])
    }

    pub(crate) fn from_nodes(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            rendered: OnceCell::new(),
        }
    }

    /// New root `op` over copies of `lhs` and `rhs`.
    ///
    /// The left operand is laid out at `1..`, the right one right after it. Both operands are
    /// expected to be non-empty.
    pub fn construct(lhs: &Expression, op: Operation, rhs: &Expression) -> Self {
        debug_assert!(!lhs.is_empty() && !rhs.is_empty(), "construct over empty operand");
        debug_assert!(op.is_binary(), "construct with non-binary operator {op:?}");

        let left_root = 1;
        let right_root = 1 + lhs.size();
        let mut nodes = Vec::with_capacity(1 + lhs.size() + rhs.size());
        nodes.push(Node::new(
            Term::function(op),
            Relation::new(0, left_root, right_root, INVALID_INDEX),
        ));

        for (offset, operand) in [(left_root, lhs), (right_root, rhs)] {
            nodes.extend(operand.nodes.iter().map(|node| {
                let mut relation = node.relation.shifted(offset);
                if relation.self_index() == offset {
                    relation.set_parent(0);
                }
                Node::new(node.term, relation)
            }));
        }

        Self::from_nodes(nodes)
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Label of the root node.
    #[inline]
    pub fn root(&self) -> Option<&Term> {
        self.term(0)
    }

    #[inline]
    pub fn term(&self, index: usize) -> Option<&Term> {
        self.nodes.get(index).map(|node| &node.term)
    }

    /// Links of the node at `index`; [`Relation::invalid`] when out of range.
    #[inline]
    pub fn subtree(&self, index: usize) -> Relation {
        self.nodes
            .get(index)
            .map_or_else(Relation::invalid, |node| node.relation)
    }

    #[inline]
    pub fn left(&self, index: usize) -> usize {
        self.subtree(index).left()
    }

    #[inline]
    pub fn right(&self, index: usize) -> usize {
        self.subtree(index).right()
    }

    /// Whether the root is a function node carrying `op`.
    pub fn is_rooted_at(&self, op: Operation) -> bool {
        self.root()
            .is_some_and(|term| term.is_function() && term.op == op)
    }

    pub(crate) fn invalidate(&mut self) {
        self.rendered.take();
    }

    /// Canonical textual form, computed once per mutation.
    ///
    /// In-order, with parentheses around every non-root function node: `(a>b)>!C`.
    pub fn string(&self) -> &str {
        self.rendered.get_or_init(|| {
            let mut out = String::with_capacity(self.size() * 2);
            if self.is_empty() {
                out.push_str("empty");
            } else {
                self.render_into(0, &mut out);
            }
            out
        })
    }

    fn render_into(&self, index: usize, out: &mut String) {
        use std::fmt::Write;

        let node = &self.nodes[index];
        match node.term.kind {
            TermType::Function => {
                let nested = index != 0;
                if nested {
                    out.push('(');
                }
                self.render_into(node.relation.left(), out);
                out.push_str(node.term.op.symbol());
                self.render_into(node.relation.right(), out);
                if nested {
                    out.push(')');
                }
            }
            TermType::Variable | TermType::Constant | TermType::None => {
                // Writing into a String never fails.
                let _ = write!(out, "{}", node.term);
            }
        }
    }

    /// Number of nodes whose operator is `op`.
    pub fn operations(&self, op: Operation) -> usize {
        self.nodes.iter().filter(|node| node.term.op == op).count()
    }

    /// Values of every variable leaf, in arena order, duplicates kept.
    pub fn variables(&self) -> Vec<Value> {
        self.nodes
            .iter()
            .filter(|node| node.term.is_variable())
            .map(|node| node.term.value)
            .collect()
    }

    /// Largest variable value, `0` when there are no variables.
    pub fn max_value(&self) -> Value {
        self.variables().into_iter().max().unwrap_or(0)
    }

    /// Smallest variable value.
    pub fn min_value(&self) -> Option<Value> {
        self.variables().into_iter().min()
    }

    /// Renumber variables `1..=k` by first in-order occurrence. Constants are untouched.
    pub fn normalize(&mut self) {
        let mut renumbering: HashMap<Value, Value> = HashMap::new();
        let order: Vec<usize> = inorder(self, 0).collect();
        for index in order {
            let term = &mut self.nodes[index].term;
            if !term.is_variable() {
                continue;
            }
            let next = renumbering.len() as Value + 1;
            term.value = *renumbering.entry(term.value).or_insert(next);
        }
        self.invalidate();
    }

    /// Rewrite every `A|B` into `!A>B`, top-down.
    pub fn standardize(&mut self) {
        let mut queue = VecDeque::from([0]);
        while let Some(index) = queue.pop_front() {
            let Some(node) = self.nodes.get_mut(index) else {
                continue;
            };
            if node.term.is_function() && node.term.op == Operation::Disjunction {
                node.term.op = Operation::Implication;
                let left = node.relation.left();
                self.negate(left);
            }

            let relation = self.subtree(index);
            for child in [relation.left(), relation.right()] {
                if child != INVALID_INDEX {
                    queue.push_back(child);
                }
            }
        }
        self.invalidate();
    }

    /// Retag every variable leaf as a constant.
    pub fn make_constant(&mut self) {
        for node in self.nodes.iter_mut().filter(|node| node.term.is_variable()) {
            node.term.kind = TermType::Constant;
        }
        self.invalidate();
    }

    /// Shift variables so the smallest one becomes `bound`.
    pub fn change_variables(&mut self, bound: Value) {
        let Some(min) = self.min_value() else {
            return;
        };
        let shift = bound - min;
        for node in self.nodes.iter_mut().filter(|node| node.term.is_variable()) {
            node.term.value += shift;
        }
        self.invalidate();
    }

    /// Logically negate the subtree at `index`, in place and breadth-first.
    ///
    /// Function nodes take [`Operation::opposite`] of their operator and push the negation to the
    /// right child (`>` and `*`), to both children (`|`), or nowhere (`+` and `=`).
    pub fn negate(&mut self, index: usize) {
        walk_mut(self, index, (), |_, node| match node.term().kind {
            TermType::Variable | TermType::Constant => node.term_mut().toggle_negation(),
            TermType::Function => {
                let old = node.term().op;
                node.term_mut().op = old.opposite();
                let relation = node.relation();
                match old {
                    Operation::Implication | Operation::Conjunction => {
                        node.schedule_deferred(relation.right(), ())
                    }
                    Operation::Disjunction => node.schedule_children_deferred(()),
                    Operation::Xor | Operation::Equivalent => {}
                    Operation::Nop | Operation::Negation => {
                        debug_assert!(false, "function node without a binary operator")
                    }
                }
            }
            TermType::None => {}
        });
    }

    /// Independent pre-order copy of the subtree at `index`.
    ///
    /// Out-of-range indices yield an empty expression.
    pub fn copy_subtree(&self, index: usize) -> Expression {
        let mut nodes: Vec<Node> = Vec::new();
        walk(self, index, INVALID_INDEX, |parent, node| {
            let copied = nodes.len();
            nodes.push(Node::new(
                *node.term(),
                Relation::new(copied, INVALID_INDEX, INVALID_INDEX, parent),
            ));
            if let Some(parent) = nodes.get_mut(parent) {
                if parent.relation.left() == INVALID_INDEX {
                    parent.relation.set_left(copied);
                } else {
                    parent.relation.set_right(copied);
                }
            }
            node.schedule_children_immediate(copied);
        });
        Self::from_nodes(nodes)
    }

    /// Whether any leaf carries the value of `term`, regardless of polarity or kind.
    pub fn contains(&self, term: &Term) -> bool {
        self.nodes
            .iter()
            .any(|node| node.term.is_leaf() && node.term.value == term.value)
    }

    /// Whether a variable leaf with `value` occurs.
    pub fn contains_variable(&self, value: Value) -> bool {
        self.nodes
            .iter()
            .any(|node| node.term.is_variable() && node.term.value == value)
    }

    /// Substitute `with` for every variable leaf `value`. Negated leaves receive a negated copy.
    ///
    /// Returns the number of leaves replaced.
    pub fn replace(&mut self, value: Value, with: &Expression) -> usize {
        if with.is_empty() {
            return 0;
        }

        let targets: Vec<usize> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.term.is_variable() && node.term.value == value)
            .map(|(index, _)| index)
            .collect();

        for &target in &targets {
            let mut spliced = with.clone();
            if self.nodes[target].term.is_negated() {
                spliced.negate(0);
            }

            // Root of the copy takes the leaf's slot, the rest is appended.
            let base = self.nodes.len();
            let place = |index: usize| if index == 0 { target } else { base + index - 1 };

            let root = spliced.nodes[0];
            let slot = &mut self.nodes[target];
            slot.term = root.term;
            let parent = slot.relation.parent();
            slot.relation = root.relation.remapped(place);
            slot.relation.set_parent(parent);

            self.nodes.extend(
                spliced.nodes[1..]
                    .iter()
                    .map(|node| Node::new(node.term, node.relation.remapped(place))),
            );
        }

        if !targets.is_empty() {
            self.invalidate();
        }
        targets.len()
    }

    /// Positional comparison over the node arrays.
    ///
    /// Links must match, function nodes must share their operator and leaves their value and
    /// polarity. Leaf kinds are compared unless `var_ignore` is set.
    pub fn equals(&self, other: &Expression, var_ignore: bool) -> bool {
        self.size() == other.size()
            && self.nodes.iter().zip(&other.nodes).all(|(l, r)| {
                if l.relation.left() != r.relation.left() || l.relation.right() != r.relation.right()
                {
                    return false;
                }
                match (l.term.is_function(), r.term.is_function()) {
                    (true, true) => l.term.op == r.term.op,
                    (false, false) => {
                        l.term.value == r.term.value
                            && l.term.op == r.term.op
                            && (var_ignore || l.term.kind == r.term.kind)
                    }
                    _ => false,
                }
            })
    }
}

impl From<Term> for Expression {
    fn from(term: Term) -> Self {
        Self::from_term(term)
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, false)
    }
}

impl Eq for Expression {}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.string())
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expression({})", self.string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn var(value: Value) -> Expression {
        Expression::from_term(Term::variable(value))
    }

    #[test]
    fn construct_reindexes_operands() {
        let lhs = parse("a>b").unwrap();
        let rhs = parse("!c").unwrap();
        let e = Expression::construct(&lhs, Operation::Conjunction, &rhs);

        assert_eq!(e.size(), 5);
        assert_eq!(e.string(), "(a>b)*!c");
        assert_eq!(e.left(0), 1);
        assert_eq!(e.right(0), 4);
        assert_eq!(e.subtree(1).parent(), 0);
        assert_eq!(e.subtree(2).parent(), 1);
        assert_eq!(e.subtree(4).parent(), 0);
        // Operands are untouched.
        assert_eq!(lhs.string(), "a>b");
    }

    #[test]
    fn rendering_and_cache_invalidation() {
        let mut e = parse("(a>b)>(c>a)").unwrap();
        assert_eq!(e.string(), "(a>b)>(c>a)");
        e.make_constant();
        assert_eq!(e.string(), "(A>B)>(C>A)");
        assert_eq!(Expression::new().string(), "empty");
        assert_eq!(format!("{e}"), "(A>B)>(C>A)");
    }

    #[test]
    fn counting_and_ranges() {
        let e = parse("(b>d)*(b>!c)").unwrap();
        assert_eq!(e.operations(Operation::Implication), 2);
        assert_eq!(e.operations(Operation::Conjunction), 1);
        assert_eq!(e.variables(), vec![2, 4, 2, 3]);
        assert_eq!(e.max_value(), 4);
        assert_eq!(e.min_value(), Some(2));

        let mut constant = e.clone();
        constant.make_constant();
        assert_eq!(constant.max_value(), 0);
        assert_eq!(constant.min_value(), None);
    }

    #[test]
    fn normalize_by_first_occurrence() {
        let mut e = parse("b>(a>b)").unwrap();
        e.normalize();
        assert_eq!(e.string(), "a>(b>a)");
        assert_eq!(e.variables(), vec![1, 2, 1]);

        let once = e.clone();
        e.normalize();
        assert_eq!(e, once);
    }

    #[test]
    fn normalize_skips_constants() {
        let mut e = Expression::construct(
            &Expression::from_term(Term::constant(5)),
            Operation::Implication,
            &var(9),
        );
        e.normalize();
        assert_eq!(e.string(), "E>a");
    }

    #[test]
    fn standardize_rewrites_disjunctions() {
        let mut e = parse("a|b").unwrap();
        e.standardize();
        assert_eq!(e.string(), "!a>b");

        let mut nested = parse("(a>b)|(c|d)").unwrap();
        nested.standardize();
        assert_eq!(nested.string(), "(a*!b)>(!c>d)");
        assert_eq!(nested.operations(Operation::Disjunction), 0);
    }

    #[test]
    fn change_variables_moves_the_minimum() {
        let mut e = parse("b>(c>b)").unwrap();
        e.change_variables(7);
        assert_eq!(e.min_value(), Some(7));
        assert_eq!(e.variables(), vec![7, 8, 7]);
    }

    #[test]
    fn negate_follows_the_opposite_table() {
        let mut e = parse("a>b").unwrap();
        e.negate(0);
        assert_eq!(e.string(), "a*!b");
        e.negate(0);
        assert_eq!(e.string(), "a>b");

        let mut d = parse("a|b").unwrap();
        d.negate(0);
        assert_eq!(d.string(), "!a*!b");

        let mut x = parse("a+b").unwrap();
        x.negate(0);
        assert_eq!(x.string(), "a=b");

        let mut inner = parse("a>(b>c)").unwrap();
        inner.negate(2);
        assert_eq!(inner.string(), "a>(b*!c)");
    }

    #[test]
    fn copy_subtree_is_independent_and_canonical() {
        let e = parse("a>((b*c)>!a)").unwrap();
        let mut copy = e.copy_subtree(e.right(0));
        assert_eq!(copy.string(), "(b*c)>!a");
        assert_eq!(copy.subtree(0).parent(), INVALID_INDEX);
        assert_eq!(copy, parse("(b*c)>!a").unwrap());

        copy.negate(0);
        assert_eq!(e.string(), "a>((b*c)>!a)");
        assert!(e.copy_subtree(100).is_empty());
    }

    #[test]
    fn contains_ignores_kind_and_polarity() {
        let e = parse("a>!b").unwrap();
        assert!(e.contains(&Term::constant(2)));
        assert!(e.contains(&Term::variable(1)));
        assert!(!e.contains(&Term::variable(3)));
        assert!(e.contains_variable(2));

        let mut frozen = e.clone();
        frozen.make_constant();
        assert!(!frozen.contains_variable(2));
        assert!(frozen.contains(&Term::variable(2)));
    }

    #[test]
    fn replace_splices_negated_copies() {
        let mut e = parse("a>(!a>b)").unwrap();
        let with = parse("c>d").unwrap();
        assert_eq!(e.replace(1, &with), 2);
        assert_eq!(e.string(), "(c>d)>((c*!d)>b)");

        // Appended layout, same formula once recopied.
        let canonical = e.copy_subtree(0);
        assert_eq!(canonical, parse("(c>d)>((c*!d)>b)").unwrap());
        for (index, node) in e.nodes().iter().enumerate() {
            let r = node.relation;
            assert_eq!(r.self_index(), index);
            if r.parent() != INVALID_INDEX {
                let p = e.subtree(r.parent());
                assert!(p.left() == index || p.right() == index);
            }
        }
    }

    #[test]
    fn replace_is_a_noop_without_occurrences() {
        let mut e = parse("a>b").unwrap();
        assert_eq!(e.replace(3, &var(1)), 0);
        assert_eq!(e.replace(1, &Expression::new()), 0);
        assert_eq!(e.string(), "a>b");
    }

    #[test]
    fn equality_is_positional() {
        let e = parse("a>b").unwrap();
        let mut frozen = e.clone();
        frozen.make_constant();

        assert_ne!(e, frozen);
        assert!(e.equals(&frozen, true));
        assert!(!e.equals(&parse("b>a").unwrap(), true));
        assert!(!e.equals(&parse("a*b").unwrap(), true));
        assert!(!e.equals(&parse("a>!b").unwrap(), true));
    }
}
