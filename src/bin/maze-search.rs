use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anstream::eprintln;
use anstream::println;
use clap::Parser;
use clap::ValueEnum;
use derive_more::Display;
use owo_colors::OwoColorize;
use thiserror::Error;
use thousands::Separable;

use maze_search::algorithms::graph_search::SearchError;
use maze_search::algorithms::graph_search::Solution;
use maze_search::problem::Problem;
use maze_search::problems::maze_2d::Maze2DAStarSearch;
use maze_search::problems::maze_2d::Maze2DAction;
use maze_search::problems::maze_2d::Maze2DBreadthFirstSearch;
use maze_search::problems::maze_2d::Maze2DCost;
use maze_search::problems::maze_2d::Maze2DDepthFirstSearch;
use maze_search::problems::maze_2d::Maze2DProblem;
use maze_search::problems::maze_2d::Maze2DProblemParseError;
use maze_search::problems::maze_2d::Maze2DState;
use maze_search::render::Maze2DRenderer;
use maze_search::render::RenderError;
use maze_search::space::Space;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Depth-first search (stack frontier)
    #[display("depth-first search")]
    Dfs,
    /// Breadth-first search (queue frontier)
    #[display("breadth-first search")]
    Bfs,
    /// A* search with Manhattan distance (cost-ordered frontier)
    #[display("A*")]
    Astar,
}

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(long_version = maze_search::build::CLAP_LONG_VERSION)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Maze file. 'A' is the start, 'B' the goal, spaces are open.
    #[arg()]
    pub maze: PathBuf,

    #[arg(short, long, env = "MAZE_STRATEGY", value_enum, default_value_t = Strategy::Astar)]
    pub strategy: Strategy,

    /// Where to draw the solved maze.
    #[arg(short, long, env = "MAZE_IMAGE", default_value = "images/maze.png")]
    pub image: PathBuf,
    #[arg(long)]
    pub no_image: bool,
    /// Leave explored cells out of the image.
    #[arg(long)]
    pub no_explored: bool,

    /// Give up after exploring this many states.
    #[arg(long)]
    pub max_steps: Option<usize>,

    #[command(flatten)]
    color: colorchoice_clap::Color,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Parse(#[from] Maze2DProblemParseError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("I/O error: {0}")]
    IOError(#[from] std::io::Error),
}

fn solve(
    problem: Maze2DProblem,
    strategy: Strategy,
    max_steps: Option<usize>,
) -> Result<Solution<Maze2DState, Maze2DAction, Maze2DCost>, SearchError> {
    match (strategy, max_steps) {
        (Strategy::Dfs, None) => Maze2DDepthFirstSearch::new(problem).solve(),
        (Strategy::Dfs, Some(n)) => Maze2DDepthFirstSearch::new(problem).solve_with_limit(n),
        (Strategy::Bfs, None) => Maze2DBreadthFirstSearch::new(problem).solve(),
        (Strategy::Bfs, Some(n)) => Maze2DBreadthFirstSearch::new(problem).solve_with_limit(n),
        (Strategy::Astar, None) => Maze2DAStarSearch::new(problem).solve(),
        (Strategy::Astar, Some(n)) => Maze2DAStarSearch::new(problem).solve_with_limit(n),
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let problem = Maze2DProblem::try_from(args.maze.as_path())?;
    log::info!("Loaded {:?} from {:?}", problem.space().dimensions(), args.maze);
    println!("\n{problem}");

    println!("Solving with {}...", args.strategy.cyan());
    let solution = solve(problem.clone(), args.strategy, args.max_steps)?;

    println!(
        "States Explored: {}",
        solution.num_explored.separate_with_commas().yellow()
    );
    println!("Path length: {}", solution.path.len().green());
    println!("\n{}", problem.display_with_path(&solution.path));

    if !args.no_image {
        let mut renderer = Maze2DRenderer::new(&problem).with_path(&solution.path);
        if !args.no_explored {
            renderer = renderer.with_explored(&solution.explored);
        }
        renderer.save(&args.image)?;
        println!("Image written to {:?}", args.image.yellow());
    }

    std::io::stdout().flush()?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} - {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let args = Args::parse();
    args.color.write_global();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", "Error".red().bold());
            ExitCode::FAILURE
        }
    }
}
