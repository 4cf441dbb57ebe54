use std::marker::PhantomData;

use derive_more::Display;
use num_traits::SaturatingAdd;
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::debug::type_name;
use crate::frontier::CostOrderedFrontier;
use crate::frontier::Frontier;
use crate::frontier::FrontierError;
use crate::frontier::QueueFrontier;
use crate::frontier::StackFrontier;
use crate::problem::Problem;
use crate::search::SearchNode;
use crate::search::SearchTree;
use crate::space::Action;
use crate::space::Cost;
use crate::space::ObjectiveHeuristic;
use crate::space::Path;
use crate::space::Space;
use crate::space::State;
use crate::space::ZeroHeuristic;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("No solution found after exploring {explored} states")]
    NoSolution { explored: usize },
    #[error("Step limit reached after exploring {explored} states")]
    StepLimitReached { explored: usize },
    #[error("The search already finished")]
    Finished,
    #[error("Frontier error: {0}")]
    Frontier(#[from] FrontierError),
}

/// Lifecycle of a `GraphSearch`.
///
/// `Ready -> Running -> {Solved, Failed}`. Both final states are terminal.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum SearchStatus {
    Ready,
    Running,
    Solved,
    Failed,
}

/// The outcome of a single `GraphSearch::step`.
#[derive(Debug, PartialEq, Eq)]
pub enum SearchStep<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    /// A non-goal State was taken from the frontier and expanded.
    Expanded(St),
    /// The goal was taken from the frontier.
    Solved(Path<St, A, C>),
}

/// A solved search.
#[derive(Debug)]
pub struct Solution<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    pub path: Path<St, A, C>,
    /// Number of nodes taken out of the frontier, the goal included.
    pub num_explored: usize,
    /// States expanded before reaching the goal.
    pub explored: FxHashSet<St>,
}

/// Graph search driven by a `Frontier`.
///
/// The frontier decides the search: a stack gives depth-first search, a
/// queue breadth-first search and a cost-ordered frontier A* (with `OH` as
/// heuristic). Expansion order otherwise only depends on the order of
/// `Space::neighbours`, so runs are reproducible.
///
/// A State is never held by both the frontier and the explored set, and
/// enters each at most once.
pub struct GraphSearch<F, OH, OP, Sp, St, A, C>
where
    F: Frontier<St, A, C>,
    OH: ObjectiveHeuristic<St, C>,
    OP: Problem<Sp, St, A, C>,
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    /// Nodes discovered but not yet expanded.
    frontier: F,
    /// Every node taken out of the frontier, linked to their parents.
    search_tree: SearchTree<St, A, C>,
    /// The "Closed Set".
    explored: FxHashSet<St>,
    num_explored: usize,
    status: SearchStatus,

    problem: OP,

    _phantom_heuristic: PhantomData<OH>,
    _phantom_space: PhantomData<Sp>,
}

impl<F, OH, OP, Sp, St, A, C> GraphSearch<F, OH, OP, Sp, St, A, C>
where
    F: Frontier<St, A, C>,
    OH: ObjectiveHeuristic<St, C>,
    OP: Problem<Sp, St, A, C>,
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    #[must_use]
    pub fn new(problem: OP) -> Self {
        Self {
            frontier: F::default(),
            search_tree: SearchTree::new(),
            explored: FxHashSet::default(),
            num_explored: 0,
            status: SearchStatus::Ready,

            problem,

            _phantom_heuristic: PhantomData,
            _phantom_space: PhantomData,
        }
    }

    /// Runs the search to completion.
    pub fn solve(self) -> Result<Solution<St, A, C>, SearchError> {
        self.run(None)
    }

    /// Runs the search, giving up after taking `max_steps` nodes out of the
    /// frontier without finding the goal.
    pub fn solve_with_limit(self, max_steps: usize) -> Result<Solution<St, A, C>, SearchError> {
        self.run(Some(max_steps))
    }

    fn run(mut self, max_steps: Option<usize>) -> Result<Solution<St, A, C>, SearchError> {
        loop {
            if max_steps.is_some_and(|limit| self.num_explored >= limit) {
                log::warn!("Giving up after exploring {} states", self.num_explored);
                return Err(SearchError::StepLimitReached {
                    explored: self.num_explored,
                });
            }

            match self.step()? {
                SearchStep::Expanded(_) => {}
                SearchStep::Solved(path) => {
                    return Ok(Solution {
                        path,
                        num_explored: self.num_explored,
                        explored: self.explored,
                    });
                }
            }
        }
    }

    /// Takes a single node out of the frontier.
    ///
    /// The first call seeds the frontier with the start State. Once the
    /// search is solved or failed, further calls return
    /// `SearchError::Finished`.
    pub fn step(&mut self) -> Result<SearchStep<St, A, C>, SearchError> {
        match self.status {
            SearchStatus::Ready => self.seed(),
            SearchStatus::Running => {}
            SearchStatus::Solved | SearchStatus::Failed => return Err(SearchError::Finished),
        }

        if self.frontier.is_empty() {
            self.status = SearchStatus::Failed;
            log::warn!(
                "No path to {:?} after exploring {} states",
                self.problem.goal(),
                self.num_explored
            );
            return Err(SearchError::NoSolution {
                explored: self.num_explored,
            });
        }

        let node = self.frontier.remove()?;
        self.num_explored += 1;
        let state = node.state;
        let node_index = self.search_tree.push(node);
        debug_assert_eq!(self.search_tree.len(), self.num_explored);

        if self.problem.is_goal(&state) {
            self.status = SearchStatus::Solved;
            let path = self.search_tree.path(self.problem.space(), node_index);
            log::debug!(
                "Solved after exploring {} states: {path}",
                self.num_explored
            );
            return Ok(SearchStep::Solved(path));
        }

        log::trace!("Expanding {state:?} (g={}, h={})", node.g, node.h);
        self.explored.insert(state);

        let goal = self.problem.goal();
        for (a, s) in self.problem.space().neighbours(&state) {
            if self.frontier.contains_state(&s) || self.explored.contains(&s) {
                continue;
            }

            let c: C = self.problem.space().cost(&state, &a);
            let g = node.g.saturating_add(&c);
            let h = self.h(&s, &goal);
            self.frontier
                .add(SearchNode::new(s, Some((node_index, a))).with_costs(g, h));
        }

        self.verify_frontier();
        Ok(SearchStep::Expanded(state))
    }

    /// Seeds the frontier with the start node.
    fn seed(&mut self) {
        debug_assert_eq!(self.status, SearchStatus::Ready);
        debug_assert!(self.frontier.is_empty());

        let start = self.problem.start();
        let goal = self.problem.goal();
        log::debug!(
            "Searching {start:?} -> {goal:?} with {}",
            type_name::<F>()
        );

        let node = SearchNode::new_start(start).with_costs(C::zero(), self.h(&start, &goal));
        self.frontier.add(node);
        self.status = SearchStatus::Running;
    }

    #[inline(always)]
    #[must_use]
    fn h(&self, s: &St, goal: &St) -> C {
        if F::USES_HEURISTIC {
            OH::h(s, goal)
        } else {
            C::zero()
        }
    }

    #[inline(always)]
    pub fn status(&self) -> SearchStatus {
        self.status
    }

    /// Number of nodes taken out of the frontier so far.
    #[inline(always)]
    pub fn num_explored(&self) -> usize {
        self.num_explored
    }

    #[inline(always)]
    pub fn explored(&self) -> &FxHashSet<St> {
        &self.explored
    }

    #[inline(always)]
    pub fn frontier(&self) -> &F {
        &self.frontier
    }

    #[inline(always)]
    pub fn problem(&self) -> &OP {
        &self.problem
    }

    #[inline(always)]
    #[cfg(not(feature = "verify"))]
    fn verify_frontier(&self) {
        // All good... (hopefully)
    }
    #[inline(always)]
    #[cfg(feature = "verify")]
    fn verify_frontier(&self) {
        for s in &self.explored {
            assert!(
                !self.frontier.contains_state(s),
                "{s:?} is both explored and in the frontier"
            );
        }
    }
}

impl<F, OH, OP, Sp, St, A, C> std::fmt::Debug for GraphSearch<F, OH, OP, Sp, St, A, C>
where
    F: Frontier<St, A, C>,
    OH: ObjectiveHeuristic<St, C>,
    OP: Problem<Sp, St, A, C>,
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct(&type_name::<Self>())
            .field("status", &self.status)
            .field("problem", &self.problem)
            .field("frontier", &self.frontier.len())
            .field("explored", &self.num_explored)
            .field("search_tree", &self.search_tree)
            .finish()
    }
}

/// Depth-first search. Finds a path, not necessarily a short one.
pub type DepthFirstSearch<OP, Sp, St, A, C> =
    GraphSearch<StackFrontier<St, A, C>, ZeroHeuristic, OP, Sp, St, A, C>;

/// Breadth-first search. Finds paths with the fewest steps.
pub type BreadthFirstSearch<OP, Sp, St, A, C> =
    GraphSearch<QueueFrontier<St, A, C>, ZeroHeuristic, OP, Sp, St, A, C>;

/// A* search. Finds optimal paths with admissible and consistent heuristics.
pub type AStarSearch<OH, OP, Sp, St, A, C> =
    GraphSearch<CostOrderedFrontier<St, A, C>, OH, OP, Sp, St, A, C>;

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;

    use indoc::indoc;
    use rand_chacha::ChaCha8Rng;
    use rand_chacha::rand_core::SeedableRng;
    use rustc_hash::FxHashMap;

    use crate::problems::maze_2d::Maze2DAStarSearch;
    use crate::problems::maze_2d::Maze2DAction;
    use crate::problems::maze_2d::Maze2DBreadthFirstSearch;
    use crate::problems::maze_2d::Maze2DCell;
    use crate::problems::maze_2d::Maze2DCost;
    use crate::problems::maze_2d::Maze2DDepthFirstSearch;
    use crate::problems::maze_2d::Maze2DProblem;
    use crate::problems::maze_2d::Maze2DSpace;
    use crate::problems::maze_2d::Maze2DState;

    type Maze2DSolution = Solution<Maze2DState, Maze2DAction, Maze2DCost>;

    fn s(row: u32, col: u32) -> Maze2DState {
        Maze2DState::new(row, col)
    }

    fn open_grid(
        height: usize,
        width: usize,
        start: Maze2DState,
        goal: Maze2DState,
    ) -> Maze2DProblem {
        let space = Maze2DSpace::new_from_map(vec![vec![Maze2DCell::Empty; width]; height]);
        Maze2DProblem::new(space, start, goal)
    }

    fn solve_all(problem: &Maze2DProblem) -> [Result<Maze2DSolution, SearchError>; 3] {
        [
            Maze2DDepthFirstSearch::new(problem.clone()).solve(),
            Maze2DBreadthFirstSearch::new(problem.clone()).solve(),
            Maze2DAStarSearch::new(problem.clone()).solve(),
        ]
    }

    /// Shortest distance to the goal, and number of reachable cells.
    fn bfs_oracle(problem: &Maze2DProblem) -> (Option<Maze2DCost>, usize) {
        let space = problem.space();
        let mut distance = FxHashMap::<Maze2DState, Maze2DCost>::default();
        let mut queue = VecDeque::from([problem.start()]);
        distance.insert(problem.start(), 0);

        while let Some(state) = queue.pop_front() {
            let d = distance[&state];
            for (_, next) in space.neighbours(&state) {
                if !distance.contains_key(&next) {
                    distance.insert(next, d + 1);
                    queue.push_back(next);
                }
            }
        }

        (distance.get(&problem.goal()).copied(), distance.len())
    }

    fn assert_simple_path(problem: &Maze2DProblem, solution: &Maze2DSolution) {
        let path = &solution.path;
        assert!(problem.space().valid_path(path), "Invalid {path}");
        assert_eq!(path.start, problem.start());
        assert_eq!(path.end(), problem.goal());

        let mut seen = FxHashSet::from_iter([path.start]);
        for state in &path.states {
            assert!(seen.insert(*state), "{state:?} repeats in {path}");
        }
    }

    #[test]
    fn bfs_open_grid() {
        let problem = open_grid(3, 3, s(0, 0), s(2, 2));
        let solution = Maze2DBreadthFirstSearch::new(problem.clone())
            .solve()
            .unwrap();

        assert_eq!(
            solution.path.states,
            vec![s(1, 0), s(2, 0), s(2, 1), s(2, 2)]
        );
        assert_eq!(
            solution.path.actions,
            vec![
                Maze2DAction::Down,
                Maze2DAction::Down,
                Maze2DAction::Right,
                Maze2DAction::Right
            ]
        );
        assert_eq!(solution.path.cost, 4);
        assert_eq!(solution.num_explored, 9);
        assert_eq!(solution.explored.len(), 8);
        assert!(!solution.explored.contains(&s(2, 2)));
        assert_simple_path(&problem, &solution);
    }

    #[test]
    fn dfs_open_grid() {
        let problem = open_grid(3, 3, s(0, 0), s(2, 2));
        let solution = Maze2DDepthFirstSearch::new(problem.clone()).solve().unwrap();

        assert_eq!(
            solution.path.states,
            vec![s(0, 1), s(0, 2), s(1, 2), s(2, 2)]
        );
        assert_eq!(
            solution.path.actions,
            vec![
                Maze2DAction::Right,
                Maze2DAction::Right,
                Maze2DAction::Down,
                Maze2DAction::Down
            ]
        );
        assert_eq!(solution.num_explored, 5);
        assert_simple_path(&problem, &solution);
    }

    #[test]
    fn astar_open_grid() {
        let problem = open_grid(3, 3, s(0, 0), s(2, 2));
        let solution = Maze2DAStarSearch::new(problem.clone()).solve().unwrap();

        assert_eq!(solution.path.len(), 4);
        assert_eq!(solution.path.cost, 4);
        assert!(solution.num_explored <= 9);
        assert_simple_path(&problem, &solution);
    }

    #[test]
    fn astar_follows_the_heuristic() {
        // Only cells in the start/goal row have f = 4, everything else is
        // worse.
        let problem = open_grid(5, 5, s(2, 0), s(2, 4));

        let astar = Maze2DAStarSearch::new(problem.clone()).solve().unwrap();
        assert_eq!(astar.num_explored, 5);
        assert_eq!(astar.path.states, vec![s(2, 1), s(2, 2), s(2, 3), s(2, 4)]);

        let bfs = Maze2DBreadthFirstSearch::new(problem).solve().unwrap();
        assert_eq!(bfs.path.cost, astar.path.cost);
        assert!(bfs.num_explored > astar.num_explored);
    }

    #[test]
    fn start_is_goal() {
        let problem = open_grid(3, 3, s(1, 1), s(1, 1));
        for solution in solve_all(&problem) {
            let solution = solution.unwrap();
            assert!(solution.path.is_empty());
            assert!(solution.path.states.is_empty());
            assert_eq!(solution.path.cost, 0);
            assert_eq!(solution.num_explored, 1);
            assert!(solution.explored.is_empty());
        }
    }

    #[test]
    fn walled_off_goal() {
        let problem = Maze2DProblem::try_from(indoc! {"
            A #B
              ##
        "})
        .unwrap();

        for result in solve_all(&problem) {
            assert_eq!(result.unwrap_err(), SearchError::NoSolution { explored: 4 });
        }
    }

    #[test]
    fn walls_force_detours() {
        let problem = Maze2DProblem::try_from(indoc! {"
            #######
            #A    #
            ##### #
            #B    #
            #######
        "})
        .unwrap();

        for solution in solve_all(&problem) {
            let solution = solution.unwrap();
            assert_eq!(solution.path.cost, 10);
            assert_simple_path(&problem, &solution);
        }
    }

    #[test]
    fn stepping_through_a_search() {
        let problem = open_grid(3, 3, s(0, 0), s(2, 2));
        let mut search = Maze2DBreadthFirstSearch::new(problem);
        assert_eq!(search.status(), SearchStatus::Ready);
        assert_eq!(search.num_explored(), 0);
        assert!(search.explored().is_empty());

        assert_eq!(search.step(), Ok(SearchStep::Expanded(s(0, 0))));
        assert_eq!(search.status(), SearchStatus::Running);
        assert_eq!(search.num_explored(), 1);
        assert!(search.explored().contains(&s(0, 0)));
        assert!(search.frontier().contains_state(&s(1, 0)));
        assert!(search.frontier().contains_state(&s(0, 1)));
        assert_eq!(search.frontier().len(), 2);

        let path = loop {
            match search.step().unwrap() {
                SearchStep::Expanded(state) => assert_ne!(state, s(2, 2)),
                SearchStep::Solved(path) => break path,
            }
        };
        assert_eq!(path.end(), s(2, 2));
        assert_eq!(search.status(), SearchStatus::Solved);
        assert_eq!(search.num_explored(), 9);
        assert_eq!(search.step(), Err(SearchError::Finished));
    }

    #[test]
    fn failed_searches_stay_failed() {
        let problem = Maze2DProblem::try_from("A#B").unwrap();
        let mut search = Maze2DAStarSearch::new(problem);

        assert_eq!(search.step(), Ok(SearchStep::Expanded(s(0, 0))));
        assert_eq!(
            search.step(),
            Err(SearchError::NoSolution { explored: 1 })
        );
        assert_eq!(search.status(), SearchStatus::Failed);
        assert_eq!(search.step(), Err(SearchError::Finished));
    }

    #[test]
    fn step_limits() {
        let problem = open_grid(3, 3, s(0, 0), s(2, 2));

        assert_eq!(
            Maze2DBreadthFirstSearch::new(problem.clone())
                .solve_with_limit(3)
                .unwrap_err(),
            SearchError::StepLimitReached { explored: 3 }
        );
        assert_eq!(
            Maze2DBreadthFirstSearch::new(problem.clone())
                .solve_with_limit(0)
                .unwrap_err(),
            SearchError::StepLimitReached { explored: 0 }
        );

        let solution = Maze2DBreadthFirstSearch::new(problem)
            .solve_with_limit(9)
            .unwrap();
        assert_eq!(solution.num_explored, 9);
    }

    #[test]
    fn dfs_is_reproducible() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let problem = Maze2DProblem::random(&mut rng, 12, 12, 0.2).unwrap();

        let trace = |problem: Maze2DProblem| {
            let mut search = Maze2DDepthFirstSearch::new(problem);
            let mut expanded = vec![];
            while let Ok(SearchStep::Expanded(state)) = search.step() {
                expanded.push(state);
            }
            expanded
        };

        let first = trace(problem.clone());
        assert!(!first.is_empty());
        for _ in 0..3 {
            assert_eq!(trace(problem.clone()), first);
        }
    }

    #[test]
    fn strategies_agree_on_random_mazes() {
        let mut solved = 0;
        for seed in 0..64 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let problem = Maze2DProblem::random(&mut rng, 10, 14, 0.3).unwrap();
            let (distance, reachable) = bfs_oracle(&problem);
            let [dfs, bfs, astar] = solve_all(&problem);

            match distance {
                None => {
                    let e = SearchError::NoSolution {
                        explored: reachable,
                    };
                    assert_eq!(dfs.unwrap_err(), e);
                    assert_eq!(bfs.unwrap_err(), e);
                    assert_eq!(astar.unwrap_err(), e);
                }
                Some(distance) => {
                    solved += 1;
                    let (dfs, bfs, astar) = (dfs.unwrap(), bfs.unwrap(), astar.unwrap());
                    for solution in [&dfs, &bfs, &astar] {
                        assert_simple_path(&problem, solution);
                        assert!(solution.num_explored <= reachable);
                    }

                    assert_eq!(bfs.path.len() as Maze2DCost, distance);
                    assert_eq!(bfs.path.cost, distance);
                    assert_eq!(astar.path.cost, distance);
                    assert!(dfs.path.cost >= distance);
                }
            }
        }
        assert!(solved > 0, "Random mazes should sometimes be solvable");
    }

    #[test]
    fn debug_output_names_the_strategy() {
        let problem = open_grid(2, 2, s(0, 0), s(1, 1));
        let search = Maze2DAStarSearch::new(problem);
        let debug = format!("{search:?}");
        assert!(debug.contains("CostOrderedFrontier"), "{debug}");
        assert!(debug.contains("Ready"), "{debug}");
    }
}
