//! Image rendering of solved mazes.

use std::path::PathBuf;

use image::Rgba;
use image::RgbaImage;
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::problem::Problem;
use crate::problems::maze_2d::Maze2DAction;
use crate::problems::maze_2d::Maze2DCell;
use crate::problems::maze_2d::Maze2DCost;
use crate::problems::maze_2d::Maze2DProblem;
use crate::problems::maze_2d::Maze2DState;
use crate::space::Path;
use crate::space::Space;

// Palette
const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, u8::MAX]);
const WALL: Rgba<u8> = Rgba([40, 40, 40, u8::MAX]);
const START: Rgba<u8> = Rgba([255, 0, 0, u8::MAX]);
const GOAL: Rgba<u8> = Rgba([0, 171, 28, u8::MAX]);
const SOLUTION: Rgba<u8> = Rgba([220, 235, 113, u8::MAX]);
const EXPLORED: Rgba<u8> = Rgba([212, 97, 85, u8::MAX]);
const EMPTY: Rgba<u8> = Rgba([237, 240, 252, u8::MAX]);

pub const DEFAULT_CELL_SIZE: u32 = 50;
pub const DEFAULT_CELL_BORDER: u32 = 2;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Maze of {height}x{width} cells is too large to render")]
    TooLarge { height: usize, width: usize },
    #[error("I/O error when writing '{p}': {e}")]
    IOError { p: PathBuf, e: std::io::Error },
    #[error("Image error when writing '{p}': {e}")]
    ImageError { p: PathBuf, e: image::ImageError },
}

/// Draws a maze as a grid of square cells.
///
/// Each cell is inset by a border that lets the black background show
/// through. The solution and explored cells are only drawn when given.
pub struct Maze2DRenderer<'a> {
    problem: &'a Maze2DProblem,
    path: Option<&'a Path<Maze2DState, Maze2DAction, Maze2DCost>>,
    explored: Option<&'a FxHashSet<Maze2DState>>,
    cell_size: u32,
    cell_border: u32,
}

impl<'a> Maze2DRenderer<'a> {
    pub fn new(problem: &'a Maze2DProblem) -> Self {
        Self {
            problem,
            path: None,
            explored: None,
            cell_size: DEFAULT_CELL_SIZE,
            cell_border: DEFAULT_CELL_BORDER,
        }
    }

    pub fn with_path(self, path: &'a Path<Maze2DState, Maze2DAction, Maze2DCost>) -> Self {
        Self {
            path: Some(path),
            ..self
        }
    }

    pub fn with_explored(self, explored: &'a FxHashSet<Maze2DState>) -> Self {
        Self {
            explored: Some(explored),
            ..self
        }
    }

    pub fn with_cell_size(self, cell_size: u32, cell_border: u32) -> Self {
        debug_assert!(2 * cell_border < cell_size, "Borders would hide cells");
        Self {
            cell_size,
            cell_border,
            ..self
        }
    }

    fn colour(&self, s: &Maze2DState) -> Rgba<u8> {
        if self.problem.space().at(s) != Some(Maze2DCell::Empty) {
            WALL
        } else if *s == self.problem.start() {
            START
        } else if *s == self.problem.goal() {
            GOAL
        } else if self.path.is_some_and(|p| p.states.contains(s)) {
            SOLUTION
        } else if self.explored.is_some_and(|e| e.contains(s)) {
            EXPLORED
        } else {
            EMPTY
        }
    }

    pub fn render(&self) -> Result<RgbaImage, RenderError> {
        let (height, width) = self.problem.space().dimensions();
        let too_large = || RenderError::TooLarge { height, width };
        let px = |cells: usize| {
            u32::try_from(cells)
                .ok()
                .and_then(|c| c.checked_mul(self.cell_size))
        };
        let img_width = px(width).ok_or_else(too_large)?;
        let img_height = px(height).ok_or_else(too_large)?;

        let mut img = RgbaImage::from_pixel(img_width, img_height, BACKGROUND);
        for row in 0..height {
            for col in 0..width {
                let s = Maze2DState::new_from_usize(row, col).ok_or_else(too_large)?;
                let colour = self.colour(&s);

                let x0 = s.col() * self.cell_size + self.cell_border;
                let y0 = s.row() * self.cell_size + self.cell_border;
                let x1 = (s.col() + 1) * self.cell_size - self.cell_border;
                let y1 = (s.row() + 1) * self.cell_size - self.cell_border;
                for y in y0..y1 {
                    for x in x0..x1 {
                        img.put_pixel(x, y, colour);
                    }
                }
            }
        }

        Ok(img)
    }

    /// Renders into an image file, creating its directory if needed.
    ///
    /// The format is picked from the extension.
    pub fn save(&self, p: &std::path::Path) -> Result<(), RenderError> {
        let img = self.render()?;

        if let Some(dir) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| RenderError::IOError {
                p: dir.to_path_buf(),
                e,
            })?;
        }
        img.save(p).map_err(|e| RenderError::ImageError {
            p: p.to_path_buf(),
            e,
        })?;

        log::info!("Wrote {}x{} image to {p:?}", img.width(), img.height());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn centre(row: u32, col: u32) -> (u32, u32) {
        let half = DEFAULT_CELL_SIZE / 2;
        (col * DEFAULT_CELL_SIZE + half, row * DEFAULT_CELL_SIZE + half)
    }

    fn colour_at(img: &RgbaImage, row: u32, col: u32) -> Rgba<u8> {
        let (x, y) = centre(row, col);
        *img.get_pixel(x, y)
    }

    #[test]
    fn renders_cells() {
        let problem = Maze2DProblem::try_from("A #\n  B\n").unwrap();
        let img = Maze2DRenderer::new(&problem).render().unwrap();

        assert_eq!(img.dimensions(), (150, 100));
        assert_eq!(colour_at(&img, 0, 0), START);
        assert_eq!(colour_at(&img, 0, 1), EMPTY);
        assert_eq!(colour_at(&img, 0, 2), WALL);
        assert_eq!(colour_at(&img, 1, 2), GOAL);

        // Borders
        assert_eq!(*img.get_pixel(0, 0), BACKGROUND);
        assert_eq!(*img.get_pixel(DEFAULT_CELL_SIZE - 1, 10), BACKGROUND);
        assert_eq!(*img.get_pixel(DEFAULT_CELL_BORDER, DEFAULT_CELL_BORDER), START);
    }

    #[test]
    fn renders_solution_over_explored() {
        let problem = Maze2DProblem::try_from("A  \n   \n  B\n").unwrap();
        let s = Maze2DState::new;

        let mut path = Path::new_from_start(s(0, 0));
        path.append((Maze2DAction::Right, s(0, 1)), 1);
        path.append((Maze2DAction::Right, s(0, 2)), 1);
        path.append((Maze2DAction::Down, s(1, 2)), 1);
        path.append((Maze2DAction::Down, s(2, 2)), 1);
        let explored = FxHashSet::from_iter([s(0, 0), s(0, 1), s(1, 0), s(0, 2), s(1, 2)]);

        let img = Maze2DRenderer::new(&problem)
            .with_path(&path)
            .with_explored(&explored)
            .render()
            .unwrap();
        assert_eq!(colour_at(&img, 0, 0), START);
        assert_eq!(colour_at(&img, 0, 1), SOLUTION);
        assert_eq!(colour_at(&img, 1, 2), SOLUTION);
        assert_eq!(colour_at(&img, 1, 0), EXPLORED);
        assert_eq!(colour_at(&img, 2, 0), EMPTY);
        assert_eq!(colour_at(&img, 2, 2), GOAL);

        let img = Maze2DRenderer::new(&problem)
            .with_explored(&explored)
            .render()
            .unwrap();
        assert_eq!(colour_at(&img, 0, 1), EXPLORED);
        assert_eq!(colour_at(&img, 2, 1), EMPTY);
    }

    #[test]
    fn custom_cell_sizes() {
        let problem = Maze2DProblem::try_from("AB").unwrap();
        let img = Maze2DRenderer::new(&problem)
            .with_cell_size(10, 1)
            .render()
            .unwrap();
        assert_eq!(img.dimensions(), (20, 10));
        assert_eq!(*img.get_pixel(0, 0), BACKGROUND);
        assert_eq!(*img.get_pixel(1, 1), START);
        assert_eq!(*img.get_pixel(11, 1), GOAL);
        assert_eq!(*img.get_pixel(19, 9), BACKGROUND);
    }

    #[test]
    fn saves_pngs() {
        let dir = std::env::temp_dir().join(format!("maze-search-render-{}", std::process::id()));
        let p = dir.join("nested").join("maze.png");
        let problem = Maze2DProblem::try_from("A #\n  B\n").unwrap();

        Maze2DRenderer::new(&problem).save(&p).unwrap();
        let img = image::open(&p).unwrap();
        assert_eq!((img.width(), img.height()), (150, 100));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
