use std::fmt::Debug;

use num_traits::SaturatingAdd;

use crate::space::Action;
use crate::space::Cost;
use crate::space::Path;
use crate::space::Space;
use crate::space::State;

/// A reference to a `SearchNode<St, A, C>` stored in a `SearchTree`.
///
/// Only handed out by `SearchTree::push`, so it's always valid for the tree
/// that produced it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SearchTreeIndex {
    index: usize,
}

impl SearchTreeIndex {
    #[inline(always)]
    fn new(index: usize) -> Self {
        Self { index }
    }
}

/// A step in a candidate path.
///
/// Nodes are never modified once built. The parent link also carries the
/// action taken from the parent, so only the root lacks both.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SearchNode<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    pub(crate) state: St,
    pub(crate) parent: Option<(SearchTreeIndex, A)>,
    pub(crate) g: C,
    pub(crate) h: C,
}

impl<St, A, C> SearchNode<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    /// A node with `g = h = 0`.
    #[must_use]
    pub fn new(state: St, parent: Option<(SearchTreeIndex, A)>) -> Self {
        Self {
            state,
            parent,
            g: C::zero(),
            h: C::zero(),
        }
    }

    /// A root node.
    #[must_use]
    pub fn new_start(state: St) -> Self {
        Self::new(state, None)
    }

    #[must_use]
    pub fn with_costs(self, g: C, h: C) -> Self {
        Self { g, h, ..self }
    }

    #[inline(always)]
    pub fn state(&self) -> &St {
        &self.state
    }
    #[inline(always)]
    pub fn parent(&self) -> Option<SearchTreeIndex> {
        self.parent.map(|(p, _)| p)
    }
    #[inline(always)]
    pub fn action(&self) -> Option<A> {
        self.parent.map(|(_, a)| a)
    }
    #[inline(always)]
    pub fn g(&self) -> C {
        self.g
    }
    #[inline(always)]
    pub fn h(&self) -> C {
        self.h
    }
    /// The total estimated cost through this node, `g + h`.
    #[inline(always)]
    pub fn f(&self) -> C {
        self.g.saturating_add(&self.h)
    }
}

/// All the nodes taken out of a frontier.
///
/// It only grows, and parents are pushed before their children, so following
/// parent links always terminates at a root.
pub struct SearchTree<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    nodes: Vec<SearchNode<St, A, C>>,
}

impl<St, A, C> SearchTree<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    #[inline(always)]
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    #[inline(always)]
    pub fn push(&mut self, node: SearchNode<St, A, C>) -> SearchTreeIndex {
        debug_assert!(
            node.parent().is_none_or(|p| p.index < self.nodes.len()),
            "Parents must be in the tree before their children"
        );
        let index = SearchTreeIndex::new(self.nodes.len());
        self.nodes.push(node);
        index
    }

    #[inline(always)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Rebuilds the path from the root of the node's branch up to the node.
    #[must_use]
    pub fn path<Sp: Space<St, A, C>>(
        &self,
        space: &Sp,
        mut node_index: SearchTreeIndex,
    ) -> Path<St, A, C> {
        let end = &self[node_index];
        let g = end.g;

        let mut steps = Vec::<(A, St, C)>::new();
        while let Some((parent_index, a)) = self[node_index].parent {
            debug_assert!(parent_index.index < node_index.index);
            let s = self[node_index].state;
            let c = space.cost(&self[parent_index].state, &a);
            steps.push((a, s, c));
            node_index = parent_index;
        }

        let mut path = Path::<St, A, C>::new_from_start(self[node_index].state);
        for (a, s, c) in steps.into_iter().rev() {
            path.append((a, s), c);
        }
        debug_assert_eq!(path.cost, g, "Path cost should match the node's g");
        path
    }
}

impl<St, A, C> Default for SearchTree<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl<St, A, C> std::ops::Index<SearchTreeIndex> for SearchTree<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    type Output = SearchNode<St, A, C>;

    #[inline(always)]
    fn index(&self, index: SearchTreeIndex) -> &Self::Output {
        &self.nodes[index.index]
    }
}

impl<St, A, C> std::fmt::Debug for SearchTree<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "SearchTree{{({} nodes)}}", self.len())
    }
}
