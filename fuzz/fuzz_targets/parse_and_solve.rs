#![no_main]

use libfuzzer_sys::fuzz_target;

use maze_search::problem::Problem;
use maze_search::problems::maze_2d::Maze2DAStarSearch;
use maze_search::problems::maze_2d::Maze2DBreadthFirstSearch;
use maze_search::problems::maze_2d::Maze2DDepthFirstSearch;
use maze_search::problems::maze_2d::Maze2DProblem;
use maze_search::space::Space;

const MAX_CELLS: usize = 64 * 64;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(problem) = Maze2DProblem::try_from(text) else {
        return;
    };
    let (h, w) = problem.space().dimensions();
    if h * w > MAX_CELLS {
        return;
    }

    let bfs = Maze2DBreadthFirstSearch::new(problem.clone()).solve();
    let dfs = Maze2DDepthFirstSearch::new(problem.clone()).solve();
    let astar = Maze2DAStarSearch::new(problem.clone()).solve();

    // All strategies agree on solvability, and optimal ones on the length.
    assert_eq!(bfs.is_ok(), dfs.is_ok());
    assert_eq!(bfs.is_ok(), astar.is_ok());
    if let (Ok(bfs), Ok(dfs), Ok(astar)) = (bfs, dfs, astar) {
        assert_eq!(bfs.path.len(), astar.path.len());
        assert!(bfs.path.len() <= dfs.path.len());
        for path in [&bfs.path, &dfs.path, &astar.path] {
            assert!(problem.space().valid_path(path));
            assert_eq!(path.end(), problem.goal());
        }
    }
});
