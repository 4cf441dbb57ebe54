use std::path::PathBuf;

use derive_more::Display;
use thiserror::Error;

use crate::algorithms::graph_search::AStarSearch;
use crate::algorithms::graph_search::BreadthFirstSearch;
use crate::algorithms::graph_search::DepthFirstSearch;
use crate::problem::Problem;
use crate::space::Action;
use crate::space::Cost;
use crate::space::Neighbours;
use crate::space::ObjectiveHeuristic;
use crate::space::Path;
use crate::space::Space;
use crate::space::State;

pub type Coord = u32;

/// A cell in the maze, `(row, column)` from the top-left corner.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display("({row},{col})")]
pub struct Maze2DState {
    pub(crate) row: Coord,
    pub(crate) col: Coord,
}

impl Maze2DState {
    pub fn new(row: Coord, col: Coord) -> Maze2DState {
        Maze2DState { row, col }
    }
    pub fn new_from_usize(row: usize, col: usize) -> Option<Maze2DState> {
        Some(Maze2DState {
            row: Coord::try_from(row).ok()?,
            col: Coord::try_from(col).ok()?,
        })
    }

    #[inline(always)]
    pub fn row(&self) -> Coord {
        self.row
    }
    #[inline(always)]
    pub fn col(&self) -> Coord {
        self.col
    }

    pub(crate) fn safe_dimensions(height: usize, width: usize) -> bool {
        (height <= Coord::MAX as usize) && (width <= Coord::MAX as usize)
    }
}
impl State for Maze2DState {}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash)]
pub enum Maze2DAction {
    #[display("up")]
    Up, // row--
    #[display("down")]
    Down, // row++
    #[display("left")]
    Left, // col--
    #[display("right")]
    Right, // col++
}
impl Action for Maze2DAction {}

pub type Maze2DCost = u32;
impl Cost for Maze2DCost {}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum Maze2DCell {
    #[display(" ")]
    Empty,
    #[display("█")]
    Wall,
}

#[derive(Clone)]
pub struct Maze2DSpace {
    pub(crate) map: Vec<Vec<Maze2DCell>>,
}

impl Maze2DSpace {
    /// Builds a space from rows of cells.
    ///
    /// Rows are expected to have the same length.
    pub fn new_from_map(map: Vec<Vec<Maze2DCell>>) -> Self {
        debug_assert!(map.windows(2).all(|w| w[0].len() == w[1].len()));
        Self { map }
    }
    pub(crate) fn new_empty_with_dimensions(height: usize, width: usize) -> Self {
        Self {
            map: vec![vec![Maze2DCell::Empty; width]; height],
        }
    }

    #[inline(always)]
    pub fn at(&self, state: &Maze2DState) -> Option<Maze2DCell> {
        self.map
            .get(state.row as usize)
            .and_then(|line| line.get(state.col as usize))
            .copied()
    }

    /// The number of open cells.
    pub fn num_open(&self) -> usize {
        self.map
            .iter()
            .flatten()
            .filter(|c| **c == Maze2DCell::Empty)
            .count()
    }
}

impl Space<Maze2DState, Maze2DAction, Maze2DCost> for Maze2DSpace {
    fn dimensions(&self) -> (usize, usize) {
        (self.map.len(), self.map.first().map_or(0, Vec::len))
    }

    #[inline(always)]
    fn is_open(&self, state: &Maze2DState) -> bool {
        self.at(state) == Some(Maze2DCell::Empty)
    }

    /// Gets the open neighbours of a given position, in up, down, left, right
    /// order.
    fn neighbours(&self, state: &Maze2DState) -> Neighbours<Maze2DState, Maze2DAction> {
        let mut v = Neighbours::<Maze2DState, Maze2DAction>::new();
        let (row, col) = (state.row, state.col);

        #[rustfmt::skip]
        let candidates = [
            (Maze2DAction::Up,    row.checked_sub(1), Some(col)),
            (Maze2DAction::Down,  row.checked_add(1), Some(col)),
            (Maze2DAction::Left,  Some(row),          col.checked_sub(1)),
            (Maze2DAction::Right, Some(row),          col.checked_add(1)),
        ];
        for (action, row, col) in candidates {
            if let (Some(row), Some(col)) = (row, col) {
                let s = Maze2DState::new(row, col);
                if self.is_open(&s) {
                    v.push((action, s));
                }
            }
        }
        v
    }
}

impl std::fmt::Debug for Maze2DSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Maze2D{:?}", self.dimensions())
    }
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum Maze2DProblemCell {
    Cell(Maze2DCell),
    #[display("A")]
    Start,
    #[display("B")]
    Goal,
}

impl std::convert::From<char> for Maze2DProblemCell {
    /// Anything that's not a start, a goal, or a space is a wall.
    fn from(ch: char) -> Self {
        match ch {
            'A' => Maze2DProblemCell::Start,
            'B' => Maze2DProblemCell::Goal,
            ' ' => Maze2DProblemCell::Cell(Maze2DCell::Empty),
            _ => Maze2DProblemCell::Cell(Maze2DCell::Wall),
        }
    }
}

#[derive(Debug, Error)]
pub enum Maze2DProblemParseError {
    #[error("Empty input")]
    EmptyInput,
    #[error("Maze of {height}x{width} cells is too large")]
    TooLarge { height: usize, width: usize },
    #[error("Maze must have exactly one start point ('A'), found none")]
    MissingStart,
    #[error("Maze must have exactly one start point ('A'), found {first} and {second}")]
    MultipleStarts {
        first: Maze2DState,
        second: Maze2DState,
    },
    #[error("Maze must have exactly one goal point ('B'), found none")]
    MissingGoal,
    #[error("Maze must have exactly one goal point ('B'), found {first} and {second}")]
    MultipleGoals {
        first: Maze2DState,
        second: Maze2DState,
    },
    #[error("I/O error when loading '{p}': {e}")]
    IOError { p: PathBuf, e: std::io::Error },
}

#[derive(Clone, Debug)]
pub struct Maze2DProblem {
    space: Maze2DSpace,
    start: Maze2DState,
    goal: Maze2DState,
}

impl Maze2DProblem {
    pub fn new(space: Maze2DSpace, start: Maze2DState, goal: Maze2DState) -> Self {
        debug_assert!(space.is_open(&start));
        debug_assert!(space.is_open(&goal));
        Self { space, start, goal }
    }

    /// Generates a maze with walls placed with probability `wall_ratio`, and
    /// distinct random open start and goal cells.
    ///
    /// Gives up if the dimensions are unusable or there are fewer than 2 open
    /// cells.
    pub fn random<R: rand::Rng>(
        r: &mut R,
        height: usize,
        width: usize,
        wall_ratio: f64,
    ) -> Option<Maze2DProblem> {
        if height == 0 || width == 0 || !Maze2DState::safe_dimensions(height, width) {
            return None;
        }
        if !(0.0..=1.0).contains(&wall_ratio) {
            return None;
        }

        let mut space = Maze2DSpace::new_empty_with_dimensions(height, width);
        let mut open = vec![];
        for (row, line) in space.map.iter_mut().enumerate() {
            for (col, cell) in line.iter_mut().enumerate() {
                if r.random_bool(wall_ratio) {
                    *cell = Maze2DCell::Wall;
                } else {
                    open.push(Maze2DState::new_from_usize(row, col)?);
                }
            }
        }
        if open.len() < 2 {
            return None;
        }

        let start = r.random_range(0..open.len());
        let mut goal = r.random_range(0..open.len() - 1);
        if goal >= start {
            goal += 1;
        }

        Some(Maze2DProblem::new(space, open[start], open[goal]))
    }

    /// Draws the maze with the cells of a path marked with `*`.
    pub fn display_with_path<'a>(
        &'a self,
        path: &'a Path<Maze2DState, Maze2DAction, Maze2DCost>,
    ) -> Maze2DPathDisplay<'a> {
        Maze2DPathDisplay {
            problem: self,
            path: Some(path),
        }
    }
}

impl Problem<Maze2DSpace, Maze2DState, Maze2DAction, Maze2DCost> for Maze2DProblem {
    fn space(&self) -> &Maze2DSpace {
        &self.space
    }
    fn start(&self) -> Maze2DState {
        self.start
    }
    fn goal(&self) -> Maze2DState {
        self.goal
    }
}

impl std::convert::TryFrom<&str> for Maze2DProblem {
    type Error = Maze2DProblemParseError;

    /// Parses a maze where `A` is the start, `B` the goal, spaces are open
    /// and everything else is a wall.
    ///
    /// Short lines are padded with open cells up to the widest line.
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let lines: Vec<&str> = s.lines().collect();
        let height = lines.len();
        let width = lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);

        if height == 0 || width == 0 {
            return Err(Maze2DProblemParseError::EmptyInput);
        }
        if !Maze2DState::safe_dimensions(height, width) {
            return Err(Maze2DProblemParseError::TooLarge { height, width });
        }

        let mut space = Maze2DSpace::new_empty_with_dimensions(height, width);
        let mut start: Option<Maze2DState> = None;
        let mut goal: Option<Maze2DState> = None;

        for (row, line) in lines.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                let s = Maze2DState::new(row as Coord, col as Coord);
                space.map[row][col] = match Maze2DProblemCell::from(ch) {
                    Maze2DProblemCell::Start => {
                        if let Some(first) = start {
                            return Err(Maze2DProblemParseError::MultipleStarts {
                                first,
                                second: s,
                            });
                        }
                        start = Some(s);
                        Maze2DCell::Empty
                    }
                    Maze2DProblemCell::Goal => {
                        if let Some(first) = goal {
                            return Err(Maze2DProblemParseError::MultipleGoals {
                                first,
                                second: s,
                            });
                        }
                        goal = Some(s);
                        Maze2DCell::Empty
                    }
                    Maze2DProblemCell::Cell(c) => c,
                }
            }
        }

        let start = start.ok_or(Maze2DProblemParseError::MissingStart)?;
        let goal = goal.ok_or(Maze2DProblemParseError::MissingGoal)?;
        Ok(Maze2DProblem { space, start, goal })
    }
}

impl std::convert::TryFrom<&std::path::Path> for Maze2DProblem {
    type Error = Maze2DProblemParseError;

    fn try_from(p: &std::path::Path) -> Result<Self, Self::Error> {
        let contents =
            std::fs::read_to_string(p).map_err(|e| Maze2DProblemParseError::IOError {
                p: p.to_path_buf(),
                e,
            })?;
        Maze2DProblem::try_from(contents.as_str())
    }
}

/// Text rendering of a problem, optionally with a path drawn over it.
pub struct Maze2DPathDisplay<'a> {
    problem: &'a Maze2DProblem,
    path: Option<&'a Path<Maze2DState, Maze2DAction, Maze2DCost>>,
}

impl std::fmt::Display for Maze2DPathDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (row, line) in self.problem.space.map.iter().enumerate() {
            for (col, cell) in line.iter().enumerate() {
                let s = Maze2DState::new(row as Coord, col as Coord);

                if *cell == Maze2DCell::Wall {
                    write!(f, "{cell}")?;
                } else if s == self.problem.start {
                    write!(f, "{}", Maze2DProblemCell::Start)?;
                } else if s == self.problem.goal {
                    write!(f, "{}", Maze2DProblemCell::Goal)?;
                } else if self.path.is_some_and(|p| p.states.contains(&s)) {
                    write!(f, "*")?;
                } else {
                    write!(f, "{cell}")?;
                }
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl std::fmt::Display for Maze2DProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let view = Maze2DPathDisplay {
            problem: self,
            path: None,
        };
        std::fmt::Display::fmt(&view, f)
    }
}

/// The distance of following straight lines.
///
/// ```
/// use maze_search::problems::maze_2d::Maze2DState;
/// use maze_search::problems::maze_2d::manhattan_distance;
///
/// let a = Maze2DState::new(0, 4);
/// let b = Maze2DState::new(3, 1);
/// assert_eq!(manhattan_distance(&a, &b), 6);
/// assert_eq!(manhattan_distance(&b, &a), 6);
/// assert_eq!(manhattan_distance(&a, &a), 0);
/// ```
#[inline(always)]
pub fn manhattan_distance(a: &Maze2DState, b: &Maze2DState) -> Maze2DCost {
    a.row.abs_diff(b.row) + a.col.abs_diff(b.col)
}

#[derive(Debug)]
pub struct Maze2DHeuristicManhattanDistance;

impl ObjectiveHeuristic<Maze2DState, Maze2DCost> for Maze2DHeuristicManhattanDistance {
    #[inline(always)]
    fn h(s: &Maze2DState, goal: &Maze2DState) -> Maze2DCost {
        manhattan_distance(s, goal)
    }
}

pub type Maze2DDepthFirstSearch =
    DepthFirstSearch<Maze2DProblem, Maze2DSpace, Maze2DState, Maze2DAction, Maze2DCost>;
pub type Maze2DBreadthFirstSearch =
    BreadthFirstSearch<Maze2DProblem, Maze2DSpace, Maze2DState, Maze2DAction, Maze2DCost>;
pub type Maze2DAStarSearch = AStarSearch<
    Maze2DHeuristicManhattanDistance,
    Maze2DProblem,
    Maze2DSpace,
    Maze2DState,
    Maze2DAction,
    Maze2DCost,
>;
