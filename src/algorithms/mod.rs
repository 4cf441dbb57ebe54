//! Implementation of search algorithms.
//!
//! A single graph search parametrised by its frontier covers depth-first,
//! breadth-first and A* search.

pub mod graph_search;
