//! An arena-backed, rooted tree with labels and edge lengths.

use crate::{newick, ParseError};

/// A node in a `Tree`.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// The label of the node, if one was given.
    label: Option<String>,
    /// The length of the edge above this node.
    length: f64,
    /// The index of the parent node in the arena.
    parent: Option<usize>,
    /// The indices of the children in the arena, in input order.
    children: Vec<usize>,
}

impl Node {
    /// Returns the label of the node, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Returns the length of the edge above the node.
    #[must_use]
    pub const fn length(&self) -> f64 {
        self.length
    }

    /// Returns the index of the parent node, if any.
    #[must_use]
    pub const fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Returns the indices of the children.
    #[must_use]
    pub fn children(&self) -> &[usize] {
        &self.children
    }

    /// Whether the node has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A rooted tree stored as an arena of `Node`s.
///
/// The root is always at index 0 and every child has a larger index than its
/// parent, i.e. the arena is in pre-order.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    /// The nodes of the tree.
    nodes: Vec<Node>,
}

impl Tree {
    /// Parses a tree from a Newick string.
    ///
    /// # Errors
    ///
    /// See [`newick::parse`](crate::newick::parse).
    pub fn from_newick(newick: &str) -> Result<Self, ParseError> {
        newick::parse(newick)
    }

    /// Creates a tree containing only a root node.
    pub(crate) fn with_root() -> Self {
        Self {
            nodes: vec![Node {
                label: None,
                length: 0.0,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Adds a child to `parent` and returns its index.
    pub(crate) fn add_child(&mut self, parent: usize) -> usize {
        let index = self.nodes.len();
        self.nodes.push(Node {
            label: None,
            length: 0.0,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(index);
        index
    }

    /// Sets the label of a node.
    pub(crate) fn set_label(&mut self, index: usize, label: String) {
        self.nodes[index].label = Some(label);
    }

    /// Sets the length of the edge above a node.
    pub(crate) fn set_length(&mut self, index: usize, length: f64) {
        self.nodes[index].length = length;
    }

    /// Returns the index of the root.
    #[must_use]
    pub const fn root(&self) -> usize {
        0
    }

    /// Returns all nodes in the arena.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns the node at `index`.
    ///
    /// # Panics
    ///
    /// If `index` is out of bounds.
    #[must_use]
    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes. Parsed trees always have a root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the indices of the leaves, left to right.
    pub fn leaves(&self) -> impl Iterator<Item = usize> + '_ {
        self.preorder().into_iter().filter(|&i| self.nodes[i].is_leaf())
    }

    /// Returns the number of leaves.
    #[must_use]
    pub fn num_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Returns the node indices in depth-first pre-order, children visited in
    /// input order.
    #[must_use]
    pub fn preorder(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(i) = stack.pop() {
            order.push(i);
            stack.extend(self.nodes[i].children.iter().rev());
        }
        order
    }

    /// Returns the node indices in depth-first post-order.
    #[must_use]
    pub fn postorder(&self) -> Vec<usize> {
        // Reversing a pre-order that visits children right to left gives a
        // left-to-right post-order.
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(i) = stack.pop() {
            order.push(i);
            stack.extend(self.nodes[i].children.iter());
        }
        order.reverse();
        order
    }

    /// Returns, for every node, the summed edge length from the root to that
    /// node. The root's own edge length is not counted.
    #[must_use]
    pub fn root_distances(&self) -> Vec<f64> {
        let mut distances = vec![0.0; self.nodes.len()];
        for i in self.preorder() {
            if let Some(p) = self.nodes[i].parent {
                distances[i] = distances[p] + self.nodes[i].length;
            }
        }
        distances
    }
}

#[cfg(test)]
mod tests {
    use super::Tree;

    #[test]
    fn traversal_orders() {
        let tree = Tree::from_newick("((A,B)X,C)R;").unwrap();
        let labels = |order: Vec<usize>| {
            order
                .into_iter()
                .map(|i| tree.node(i).label().unwrap_or("").to_string())
                .collect::<Vec<_>>()
        };

        assert_eq!(labels(tree.preorder()), ["R", "X", "A", "B", "C"]);
        assert_eq!(labels(tree.postorder()), ["A", "B", "X", "C", "R"]);
        assert_eq!(labels(tree.leaves().collect()), ["A", "B", "C"]);
    }

    #[test]
    fn root_distances_skip_root_edge() {
        let tree = Tree::from_newick("((A:1,B:2):3,C:4):10;").unwrap();
        let distances = tree.root_distances();
        let by_label = |l: &str| {
            let i = (0..tree.len()).find(|&i| tree.node(i).label() == Some(l)).unwrap();
            distances[i]
        };

        assert_eq!(distances[tree.root()], 0.0);
        assert_eq!(by_label("A"), 4.0);
        assert_eq!(by_label("B"), 5.0);
        assert_eq!(by_label("C"), 4.0);
    }
}
