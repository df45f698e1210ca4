//! RedBlackTreeMap: insertion-balanced red-black tree over a node arena.
//!
//! Nodes live in a `SlotMap`; `left`/`right` are the owning links of the
//! tree shape and `parent` is a back link used only to climb during fixup
//! and rotation. Dropping the map drops the arena, which releases every node
//! at once.
//!
//! Invariants after every public call:
//! 1. The root is black.
//! 2. A red node never has a red parent.
//! 3. Every path from a node down to an empty child crosses the same number
//!    of black nodes.
//! 4. In-order traversal yields strictly ascending keys.
//!
//! Insertion descends iteratively; fixup climbs through parent links, so
//! neither depends on call-stack depth.

use crate::error::KeyNotFound;
use crate::guard::BusyFlag;
use crate::keyed_map::KeyedMap;
use core::borrow::Borrow;
use core::cell::Cell;
use core::cmp::Ordering;
use log::trace;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    struct NodeKey;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

#[derive(Debug)]
struct TreeNode<K, V> {
    key: K,
    value: V,
    color: Color,
    parent: Option<NodeKey>,
    left: Option<NodeKey>,
    right: Option<NodeKey>,
}

impl<K, V> TreeNode<K, V> {
    fn red(key: K, value: V, parent: Option<NodeKey>) -> Self {
        Self {
            key,
            value,
            color: Color::Red,
            parent,
            left: None,
            right: None,
        }
    }

    fn child(&self, side: Side) -> Option<NodeKey> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

enum Placement {
    Inserted(NodeKey),
    Updated(NodeKey),
}

#[derive(Debug)]
struct Tree<K, V> {
    nodes: SlotMap<NodeKey, TreeNode<K, V>>,
    root: Option<NodeKey>,
}

impl<K, V> Tree<K, V> {
    fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
        }
    }

    #[cfg(test)]
    fn color(&self, node: Option<NodeKey>) -> Color {
        node.map_or(Color::Black, |k| self.nodes[k].color)
    }

    fn parent(&self, node: NodeKey) -> Option<NodeKey> {
        self.nodes[node].parent
    }

    fn side_of(&self, node: NodeKey, parent: NodeKey) -> Side {
        if self.nodes[parent].left == Some(node) {
            Side::Left
        } else {
            Side::Right
        }
    }

    fn set_child(&mut self, parent: NodeKey, side: Side, child: Option<NodeKey>) {
        match side {
            Side::Left => self.nodes[parent].left = child,
            Side::Right => self.nodes[parent].right = child,
        }
    }

    /// Points whatever referenced `old` (its parent's child slot, or the
    /// root) at `new`.
    fn replace_in_parent(&mut self, old: NodeKey, new: NodeKey) {
        let parent = self.parent(old);
        self.nodes[new].parent = parent;
        match parent {
            None => self.root = Some(new),
            Some(p) => {
                let side = self.side_of(old, p);
                self.set_child(p, side, Some(new));
            }
        }
    }

    fn find<Q>(&self, q: &Q) -> Option<NodeKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut cursor = self.root;
        while let Some(k) = cursor {
            let node = &self.nodes[k];
            cursor = match q.cmp(node.key.borrow()) {
                Ordering::Equal => return Some(k),
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
        }
        None
    }

    /// Binary-search descent. An equal key has its value replaced; otherwise
    /// a red leaf is attached and the tree is rebalanced if its parent is red.
    fn insert(&mut self, key: K, value: V) -> Placement
    where
        K: Ord,
    {
        let Some(mut cursor) = self.root else {
            let mut root = TreeNode::red(key, value, None);
            root.color = Color::Black;
            let k = self.nodes.insert(root);
            self.root = Some(k);
            return Placement::Inserted(k);
        };

        let (parent, side) = loop {
            let node = &mut self.nodes[cursor];
            let side = match key.cmp(&node.key) {
                Ordering::Equal => {
                    node.value = value;
                    return Placement::Updated(cursor);
                }
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
            };
            match node.child(side) {
                Some(next) => cursor = next,
                None => break (cursor, side),
            }
        };

        let k = self.nodes.insert(TreeNode::red(key, value, Some(parent)));
        self.set_child(parent, side, Some(k));
        if self.nodes[parent].color == Color::Red {
            self.rebalance(k);
        }
        Placement::Inserted(k)
    }

    /// Restores the invariants above a red `node` whose parent is red.
    ///
    /// Black or missing uncle: one rotation repair ends the fixup. Red uncle:
    /// color flip, then continue from the grandparent if its parent is red.
    fn rebalance(&mut self, mut node: NodeKey) {
        loop {
            let Some(parent) = self.parent(node) else {
                return;
            };
            if self.nodes[parent].color == Color::Black {
                return;
            }
            let Some(grandparent) = self.parent(parent) else {
                // A red root cannot survive a public call.
                self.nodes[parent].color = Color::Black;
                return;
            };

            let parent_side = self.side_of(parent, grandparent);
            let uncle = match parent_side {
                Side::Left => self.nodes[grandparent].right,
                Side::Right => self.nodes[grandparent].left,
            };

            match uncle {
                Some(uncle) if self.nodes[uncle].color == Color::Red => {
                    trace!("color flip below {:?}", grandparent);
                    self.nodes[parent].color = Color::Black;
                    self.nodes[uncle].color = Color::Black;
                    if self.root == Some(grandparent) {
                        return;
                    }
                    self.nodes[grandparent].color = Color::Red;
                    node = grandparent;
                }
                _ => {
                    self.rotate(node, parent, parent_side, grandparent);
                    return;
                }
            }
        }
    }

    /// Single or double rotation for the four insertion shapes; the new
    /// local root becomes black and both its children red.
    fn rotate(&mut self, node: NodeKey, parent: NodeKey, parent_side: Side, grandparent: NodeKey) {
        let node_side = self.side_of(node, parent);
        trace!("rotation case {:?}-{:?} at {:?}", parent_side, node_side, grandparent);
        let subtree_root = match (parent_side, node_side) {
            (Side::Left, Side::Left) => {
                self.rotate_right(grandparent);
                parent
            }
            (Side::Right, Side::Right) => {
                self.rotate_left(grandparent);
                parent
            }
            (Side::Left, Side::Right) => {
                self.rotate_left(parent);
                self.rotate_right(grandparent);
                node
            }
            (Side::Right, Side::Left) => {
                self.rotate_right(parent);
                self.rotate_left(grandparent);
                node
            }
        };
        self.recolor_rotated(subtree_root);
    }

    fn recolor_rotated(&mut self, subtree_root: NodeKey) {
        self.nodes[subtree_root].color = Color::Black;
        let (left, right) = (self.nodes[subtree_root].left, self.nodes[subtree_root].right);
        for child in [left, right].into_iter().flatten() {
            self.nodes[child].color = Color::Red;
        }
    }

    /// `x`'s right child takes its place; `x` becomes that child's left.
    fn rotate_left(&mut self, x: NodeKey) {
        let y = self.nodes[x]
            .right
            .expect("rotate_left pivot must have a right child");
        let inner = self.nodes[y].left;
        self.nodes[x].right = inner;
        if let Some(inner) = inner {
            self.nodes[inner].parent = Some(x);
        }
        self.replace_in_parent(x, y);
        self.nodes[y].left = Some(x);
        self.nodes[x].parent = Some(y);
    }

    /// `x`'s left child takes its place; `x` becomes that child's right.
    fn rotate_right(&mut self, x: NodeKey) {
        let y = self.nodes[x]
            .left
            .expect("rotate_right pivot must have a left child");
        let inner = self.nodes[y].right;
        self.nodes[x].left = inner;
        if let Some(inner) = inner {
            self.nodes[inner].parent = Some(x);
        }
        self.replace_in_parent(x, y);
        self.nodes[y].right = Some(x);
        self.nodes[x].parent = Some(y);
    }
}

/// Ordered map kept balanced by red-black recoloring and rotation.
///
/// Keys are unique; inserting an existing key replaces its value without
/// touching the tree shape. There is no removal.
///
/// ```
/// use forecast_index::RedBlackTreeMap;
///
/// let mut m = RedBlackTreeMap::new();
/// for k in [10, 20, 30, 15, 25, 5] {
///     m.insert(k, k * 2);
/// }
/// assert_eq!(m.len(), 6);
/// assert_eq!(m.search(&15), Ok(&30));
/// assert!(m.search(&7).is_err());
/// ```
pub struct RedBlackTreeMap<K, V> {
    tree: Tree<K, V>,
    last: Cell<Option<NodeKey>>,
    busy: BusyFlag,
}

impl<K, V> Default for RedBlackTreeMap<K, V>
where
    K: Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> RedBlackTreeMap<K, V>
where
    K: Ord,
{
    pub fn new() -> Self {
        Self {
            tree: Tree::new(),
            last: Cell::new(None),
            busy: BusyFlag::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.nodes.is_empty()
    }

    /// Inserts or overwrites. Returns `true` if `key` was new.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let _busy = self.busy.enter("insert");
        match self.tree.insert(key, value) {
            Placement::Inserted(k) => {
                self.last.set(Some(k));
                true
            }
            Placement::Updated(k) => {
                self.last.set(Some(k));
                false
            }
        }
    }

    pub fn search<Q>(&self, q: &Q) -> Result<&V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let _busy = self.busy.enter("search");
        let k = self.locate(q).ok_or(KeyNotFound)?;
        self.tree.nodes.get(k).map(|n| &n.value).ok_or(KeyNotFound)
    }

    pub fn search_mut<Q>(&mut self, q: &Q) -> Result<&mut V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let _busy = self.busy.enter("search_mut");
        let k = self.locate(q).ok_or(KeyNotFound)?;
        self.tree
            .nodes
            .get_mut(k)
            .map(|n| &mut n.value)
            .ok_or(KeyNotFound)
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let _busy = self.busy.enter("contains");
        self.locate(q).is_some()
    }

    fn locate<Q>(&self, q: &Q) -> Option<NodeKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        if let Some(k) = self.last.get() {
            if self
                .tree
                .nodes
                .get(k)
                .is_some_and(|n| q.cmp(n.key.borrow()) == Ordering::Equal)
            {
                return Some(k);
            }
        }
        let found = self.tree.find(q);
        self.last.set(found);
        found
    }
}

impl<K, V> KeyedMap<K, V> for RedBlackTreeMap<K, V>
where
    K: Ord,
{
    fn insert(&mut self, key: K, value: V) -> bool {
        RedBlackTreeMap::insert(self, key, value)
    }

    fn search(&self, key: &K) -> Result<&V, KeyNotFound> {
        RedBlackTreeMap::search(self, key)
    }

    fn search_mut(&mut self, key: &K) -> Result<&mut V, KeyNotFound> {
        RedBlackTreeMap::search_mut(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        RedBlackTreeMap::contains(self, key)
    }

    fn len(&self) -> usize {
        RedBlackTreeMap::len(self)
    }
}

#[cfg(test)]
impl<K: Ord + Clone, V> RedBlackTreeMap<K, V> {
    pub(crate) fn in_order_keys(&self) -> Vec<K> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack = Vec::new();
        let mut cursor = self.tree.root;
        while cursor.is_some() || !stack.is_empty() {
            while let Some(k) = cursor {
                stack.push(k);
                cursor = self.tree.nodes[k].left;
            }
            if let Some(k) = stack.pop() {
                out.push(self.tree.nodes[k].key.clone());
                cursor = self.tree.nodes[k].right;
            }
        }
        out
    }

    /// Panics on any broken invariant; returns the black height of the root.
    pub(crate) fn assert_invariants(&self) -> usize {
        let Some(root) = self.tree.root else {
            assert_eq!(self.len(), 0);
            return 0;
        };
        assert_eq!(self.tree.nodes[root].color, Color::Black, "root must be black");
        assert!(self.tree.nodes[root].parent.is_none(), "root has a parent");
        let keys = self.in_order_keys();
        assert_eq!(keys.len(), self.len(), "every node is reachable from the root");
        assert!(keys.windows(2).all(|w| w[0] < w[1]), "keys are not ascending");
        self.black_height(root)
    }

    fn black_height(&self, k: NodeKey) -> usize {
        let node = &self.tree.nodes[k];
        for child in [node.left, node.right].into_iter().flatten() {
            assert_eq!(self.tree.nodes[child].parent, Some(k), "broken parent link");
            if node.color == Color::Red {
                assert_eq!(self.tree.nodes[child].color, Color::Black, "red node with red child");
            }
        }
        let left = node.left.map_or(0, |c| self.black_height(c));
        let right = node.right.map_or(0, |c| self.black_height(c));
        assert_eq!(left, right, "black height mismatch");
        left + usize::from(node.color == Color::Black)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn build(keys: &[i32]) -> RedBlackTreeMap<i32, i32> {
        let mut m = RedBlackTreeMap::new();
        for &k in keys {
            m.insert(k, k * 10);
        }
        m
    }

    #[test]
    fn empty_tree() {
        let m: RedBlackTreeMap<i32, i32> = RedBlackTreeMap::new();
        assert!(m.is_empty());
        assert_eq!(m.assert_invariants(), 0);
        assert_eq!(m.search(&1), Err(KeyNotFound));
    }

    #[test]
    fn first_insert_is_black_root() {
        let m = build(&[42]);
        let root = m.tree.root.unwrap();
        assert_eq!(m.tree.nodes[root].color, Color::Black);
        assert_eq!(m.len(), 1);
    }

    /// Scenario: 10, 20, 30, 15, 25, 5 exercises a rotation and a color flip.
    #[test]
    fn mixed_insertion_sequence() {
        let m = build(&[10, 20, 30, 15, 25, 5]);
        assert_eq!(m.in_order_keys(), vec![5, 10, 15, 20, 25, 30]);
        m.assert_invariants();
        let root = m.tree.root.unwrap();
        assert_eq!(m.tree.nodes[root].key, 20);
        for k in [5, 10, 15, 20, 25, 30] {
            assert_eq!(m.search(&k), Ok(&(k * 10)));
        }
    }

    #[rstest]
    #[case::left_left(&[30, 20, 10], 20)]
    #[case::right_right(&[10, 20, 30], 20)]
    #[case::left_right(&[30, 10, 20], 20)]
    #[case::right_left(&[10, 30, 20], 20)]
    fn each_rotation_shape_centers_the_middle_key(#[case] keys: &[i32], #[case] expected_root: i32) {
        let m = build(keys);
        m.assert_invariants();
        let root = m.tree.root.unwrap();
        assert_eq!(m.tree.nodes[root].key, expected_root);
        let node = &m.tree.nodes[root];
        assert_eq!(m.tree.color(node.left), Color::Red);
        assert_eq!(m.tree.color(node.right), Color::Red);
    }

    #[test]
    fn color_flip_at_root_keeps_root_black() {
        let m = build(&[20, 10, 30, 5]);
        m.assert_invariants();
        let root = m.tree.root.unwrap();
        assert_eq!(m.tree.nodes[root].color, Color::Black);
        let node = &m.tree.nodes[root];
        assert_eq!(m.tree.color(node.left), Color::Black);
        assert_eq!(m.tree.color(node.right), Color::Black);
    }

    #[rstest]
    #[case::ascending((0..512).collect::<Vec<_>>())]
    #[case::descending((0..512).rev().collect::<Vec<_>>())]
    #[case::zigzag((0..256).flat_map(|i| [i, 511 - i]).collect::<Vec<_>>())]
    fn adversarial_orders_stay_balanced(#[case] keys: Vec<i32>) {
        let m = build(&keys);
        let bh = m.assert_invariants();
        assert_eq!(m.len(), 512);
        // A valid tree of black height h holds fewer than 4^h nodes.
        assert!(bh >= 5, "black height {bh} too small for 512 nodes");
        assert_eq!(m.in_order_keys(), (0..512).collect::<Vec<_>>());
    }

    #[test]
    #[should_panic(expected = "rotate_left pivot must have a right child")]
    fn rotating_left_without_right_child_panics() {
        let mut m = build(&[2, 1]);
        let root = m.tree.root.unwrap();
        m.tree.rotate_left(root);
    }

    #[test]
    #[should_panic(expected = "rotate_right pivot must have a left child")]
    fn rotating_right_without_left_child_panics() {
        let mut m = build(&[1, 2]);
        let root = m.tree.root.unwrap();
        m.tree.rotate_right(root);
    }

    #[test]
    fn reinsert_updates_value_in_place() {
        let mut m = build(&[10, 20, 30]);
        let before = m.tree.root;
        assert!(!m.insert(20, 999));
        assert_eq!(m.tree.root, before);
        assert_eq!(m.len(), 3);
        assert_eq!(m.search(&20), Ok(&999));
        m.assert_invariants();
    }

    #[test]
    fn cache_tracks_hits_and_misses() {
        let m = build(&[1, 2, 3]);
        assert!(m.contains(&2));
        let cached = m.last.get().expect("hit is cached");
        assert_eq!(m.tree.nodes[cached].key, 2);
        assert!(!m.contains(&9));
        assert!(m.last.get().is_none());
        assert_eq!(m.search(&9), Err(KeyNotFound));
        assert_eq!(m.search(&3), Ok(&30));
        assert_eq!(m.tree.nodes[m.last.get().unwrap()].key, 3);
    }

    #[test]
    fn borrowed_lookup_with_str() {
        let mut m: RedBlackTreeMap<String, usize> = RedBlackTreeMap::new();
        m.insert("Austin,TX".to_string(), 1);
        m.insert("Boston,MA".to_string(), 2);
        assert!(m.contains("Austin,TX"));
        assert_eq!(m.search("Boston,MA"), Ok(&2));
        *m.search_mut("Boston,MA").unwrap() += 1;
        assert_eq!(m.search("Boston,MA"), Ok(&3));
        assert!(!m.contains("Denver,CO"));
    }

    #[test]
    fn map_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<RedBlackTreeMap<String, Vec<i32>>>();
    }
}
