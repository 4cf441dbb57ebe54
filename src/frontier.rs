//! Open sets for graph search.
//!
//! A frontier holds the nodes that were discovered but not yet expanded. The
//! order in which it hands them back defines the search:
//!
//! - `StackFrontier`: LIFO, depth-first.
//! - `QueueFrontier`: FIFO, breadth-first.
//! - `CostOrderedFrontier`: lowest `f = g + h` first, best-first/A*.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::search::SearchNode;
use crate::space::Action;
use crate::space::Cost;
use crate::space::State;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrontierError {
    #[error("empty frontier")]
    Empty,
}

pub trait Frontier<St, A, C>: Default + std::fmt::Debug
where
    St: State,
    A: Action,
    C: Cost,
{
    /// Whether removal order depends on `h`.
    ///
    /// Searches skip computing heuristics for frontiers that ignore them.
    const USES_HEURISTIC: bool = false;

    fn add(&mut self, node: SearchNode<St, A, C>);

    /// Adds a node with an explicit priority.
    ///
    /// Only meaningful on ranked frontiers, the rest ignore the priority.
    fn add_with_priority(&mut self, node: SearchNode<St, A, C>, _priority: C) {
        self.add(node)
    }

    fn contains_state(&self, s: &St) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(&mut self) -> Result<SearchNode<St, A, C>, FrontierError>;
}

/// Counts the nodes held per State for `contains_state` lookups.
///
/// Searches never hold two nodes for one State, but a frontier on its own
/// may.
#[derive(Debug)]
struct StateCounts<St: State> {
    counts: FxHashMap<St, usize>,
}

impl<St: State> StateCounts<St> {
    fn insert(&mut self, s: St) {
        *self.counts.entry(s).or_insert(0) += 1;
    }

    fn remove(&mut self, s: &St) {
        if let Some(count) = self.counts.get_mut(s) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(s);
            }
        }
    }

    fn contains(&self, s: &St) -> bool {
        self.counts.contains_key(s)
    }
}

impl<St: State> Default for StateCounts<St> {
    fn default() -> Self {
        Self {
            counts: FxHashMap::default(),
        }
    }
}

/// LIFO frontier.
#[derive(Debug)]
pub struct StackFrontier<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    nodes: Vec<SearchNode<St, A, C>>,
    states: StateCounts<St>,
}

impl<St, A, C> Default for StackFrontier<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            states: StateCounts::default(),
        }
    }
}

impl<St, A, C> Frontier<St, A, C> for StackFrontier<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    fn add(&mut self, node: SearchNode<St, A, C>) {
        self.states.insert(node.state);
        self.nodes.push(node);
    }

    fn contains_state(&self, s: &St) -> bool {
        self.states.contains(s)
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn remove(&mut self) -> Result<SearchNode<St, A, C>, FrontierError> {
        let node = self.nodes.pop().ok_or(FrontierError::Empty)?;
        self.states.remove(&node.state);
        Ok(node)
    }
}

/// FIFO frontier.
#[derive(Debug)]
pub struct QueueFrontier<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    nodes: VecDeque<SearchNode<St, A, C>>,
    states: StateCounts<St>,
}

impl<St, A, C> Default for QueueFrontier<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    fn default() -> Self {
        Self {
            nodes: VecDeque::new(),
            states: StateCounts::default(),
        }
    }
}

impl<St, A, C> Frontier<St, A, C> for QueueFrontier<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    fn add(&mut self, node: SearchNode<St, A, C>) {
        self.states.insert(node.state);
        self.nodes.push_back(node);
    }

    fn contains_state(&self, s: &St) -> bool {
        self.states.contains(s)
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn remove(&mut self) -> Result<SearchNode<St, A, C>, FrontierError> {
        let node = self.nodes.pop_front().ok_or(FrontierError::Empty)?;
        self.states.remove(&node.state);
        Ok(node)
    }
}

/// The ranking tuple for cost-ordered search.
///
/// We prefer lower priorities, and tie break for earlier insertions so
/// equally good nodes come out in the order they were found.
///
/// ```
/// use maze_search::frontier::CostRank;
///
/// assert!(CostRank::new(3u32, 7) < CostRank::new(4u32, 0));
/// assert!(CostRank::new(4u32, 0) < CostRank::new(4u32, 1));
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct CostRank<C: Cost> {
    priority: C,
    insertion: u64,
}

impl<C: Cost> CostRank<C> {
    pub fn new(priority: C, insertion: u64) -> Self {
        Self {
            priority,
            insertion,
        }
    }
}

#[derive(Debug)]
struct RankedNode<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    rank: CostRank<C>,
    node: SearchNode<St, A, C>,
}

impl<St: State, A: Action, C: Cost> PartialEq for RankedNode<St, A, C> {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.rank.eq(&other.rank)
    }
}
impl<St: State, A: Action, C: Cost> Eq for RankedNode<St, A, C> {}

impl<St: State, A: Action, C: Cost> PartialOrd for RankedNode<St, A, C> {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<St: State, A: Action, C: Cost> Ord for RankedNode<St, A, C> {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank.cmp(&other.rank)
    }
}

/// Lowest-priority-first frontier.
///
/// `add` ranks nodes by `f`. Insertions are numbered so ties are resolved
/// FIFO and runs are reproducible.
#[derive(Debug)]
pub struct CostOrderedFrontier<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    /// `BinaryHeap` is a max-heap, hence the `Reverse`.
    open: BinaryHeap<Reverse<RankedNode<St, A, C>>>,
    states: StateCounts<St>,
    insertions: u64,
}

impl<St, A, C> Default for CostOrderedFrontier<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    fn default() -> Self {
        Self {
            open: BinaryHeap::new(),
            states: StateCounts::default(),
            insertions: 0,
        }
    }
}

impl<St, A, C> Frontier<St, A, C> for CostOrderedFrontier<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    const USES_HEURISTIC: bool = true;

    fn add(&mut self, node: SearchNode<St, A, C>) {
        self.add_with_priority(node, node.f())
    }

    fn add_with_priority(&mut self, node: SearchNode<St, A, C>, priority: C) {
        let rank = CostRank::new(priority, self.insertions);
        self.insertions += 1;
        self.states.insert(node.state);
        self.open.push(Reverse(RankedNode { rank, node }));
    }

    fn contains_state(&self, s: &St) -> bool {
        self.states.contains(s)
    }

    fn len(&self) -> usize {
        self.open.len()
    }

    fn remove(&mut self) -> Result<SearchNode<St, A, C>, FrontierError> {
        let Reverse(RankedNode { node, .. }) = self.open.pop().ok_or(FrontierError::Empty)?;
        self.states.remove(&node.state);
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::problems::maze_2d::Maze2DAction;
    use crate::problems::maze_2d::Maze2DCost;
    use crate::problems::maze_2d::Maze2DState;

    type Node = SearchNode<Maze2DState, Maze2DAction, Maze2DCost>;

    fn node(row: u32, col: u32) -> Node {
        Node::new_start(Maze2DState::new(row, col))
    }

    fn drain<F: Frontier<Maze2DState, Maze2DAction, Maze2DCost>>(
        frontier: &mut F,
    ) -> Vec<Maze2DState> {
        let mut states = vec![];
        while !frontier.is_empty() {
            states.push(*frontier.remove().unwrap().state());
        }
        states
    }

    #[test]
    fn stack_is_lifo() {
        let mut frontier = StackFrontier::default();
        frontier.add(node(0, 0));
        frontier.add(node(0, 1));
        frontier.add(node(0, 2));
        assert_eq!(frontier.len(), 3);

        assert_eq!(
            drain(&mut frontier),
            vec![
                Maze2DState::new(0, 2),
                Maze2DState::new(0, 1),
                Maze2DState::new(0, 0)
            ]
        );
    }

    #[test]
    fn queue_is_fifo() {
        let mut frontier = QueueFrontier::default();
        frontier.add(node(0, 0));
        frontier.add(node(0, 1));
        assert_eq!(frontier.remove().unwrap().state(), &Maze2DState::new(0, 0));
        frontier.add(node(0, 2));

        assert_eq!(
            drain(&mut frontier),
            vec![Maze2DState::new(0, 1), Maze2DState::new(0, 2)]
        );
    }

    #[test]
    fn cost_ordered_prefers_low_f() {
        let mut frontier = CostOrderedFrontier::default();
        frontier.add(node(0, 0).with_costs(3, 3));
        frontier.add(node(0, 1).with_costs(1, 1));
        frontier.add(node(0, 2).with_costs(4, 0));
        frontier.add(node(0, 3).with_costs(0, 5));

        assert_eq!(
            drain(&mut frontier),
            vec![
                Maze2DState::new(0, 1),
                Maze2DState::new(0, 2),
                Maze2DState::new(0, 3),
                Maze2DState::new(0, 0),
            ]
        );
    }

    #[test]
    fn cost_ordered_breaks_ties_by_insertion() {
        let mut frontier = CostOrderedFrontier::default();
        for col in 0..8 {
            frontier.add(node(0, col).with_costs(col, 8 - col));
        }

        let cols: Vec<u32> = drain(&mut frontier).iter().map(|s| s.col()).collect();
        assert_eq!(cols, (0..8).collect::<Vec<u32>>());
    }

    #[test]
    fn cost_ordered_explicit_priority() {
        let mut frontier = CostOrderedFrontier::default();
        frontier.add_with_priority(node(0, 0), 10);
        frontier.add_with_priority(node(0, 1), 2);
        frontier.add(node(0, 2).with_costs(3, 3));

        assert_eq!(
            drain(&mut frontier),
            vec![
                Maze2DState::new(0, 1),
                Maze2DState::new(0, 2),
                Maze2DState::new(0, 0),
            ]
        );
    }

    #[test]
    fn tracks_contained_states() {
        let mut frontier = QueueFrontier::default();
        let s = Maze2DState::new(1, 1);
        assert!(!frontier.contains_state(&s));

        frontier.add(node(1, 1));
        frontier.add(node(1, 1));
        assert!(frontier.contains_state(&s));
        assert!(!frontier.contains_state(&Maze2DState::new(0, 0)));

        frontier.remove().unwrap();
        assert!(frontier.contains_state(&s));
        frontier.remove().unwrap();
        assert!(!frontier.contains_state(&s));
    }

    #[test]
    fn empty_frontiers_fail_to_remove() {
        let mut stack = StackFrontier::<Maze2DState, Maze2DAction, Maze2DCost>::default();
        let mut queue = QueueFrontier::<Maze2DState, Maze2DAction, Maze2DCost>::default();
        let mut ranked = CostOrderedFrontier::<Maze2DState, Maze2DAction, Maze2DCost>::default();

        assert!(stack.is_empty());
        assert!(queue.is_empty());
        assert!(ranked.is_empty());
        assert_eq!(stack.remove(), Err(FrontierError::Empty));
        assert_eq!(queue.remove(), Err(FrontierError::Empty));
        assert_eq!(ranked.remove(), Err(FrontierError::Empty));
    }

    #[test]
    fn only_ranked_frontiers_use_heuristics() {
        type Stack = StackFrontier<Maze2DState, Maze2DAction, Maze2DCost>;
        type Queue = QueueFrontier<Maze2DState, Maze2DAction, Maze2DCost>;
        type Ranked = CostOrderedFrontier<Maze2DState, Maze2DAction, Maze2DCost>;

        assert!(!<Stack as Frontier<_, _, _>>::USES_HEURISTIC);
        assert!(!<Queue as Frontier<_, _, _>>::USES_HEURISTIC);
        assert!(<Ranked as Frontier<_, _, _>>::USES_HEURISTIC);
    }
}
