//! Implementation of search spaces and problems.
//!
//! These expose a search space through the `Space` and `Problem` traits so
//! the algorithms can do pathfinding without knowing how states are laid out.

pub mod maze_2d;
