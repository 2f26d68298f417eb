use crate::grid::CellState::{Alive, Dead};
use rand::Rng;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum CellState {
    #[default]
    Dead,
    Alive,
}

impl CellState {
    pub fn is_alive(self) -> bool {
        self == Alive
    }

    pub fn toggled(self) -> Self {
        match self {
            Alive => Dead,
            Dead => Alive,
        }
    }
}

/// Apply the Game of Life rule to a single cell.
pub fn next_state(state: CellState, live_neighbors: usize) -> CellState {
    match (state, live_neighbors) {
        (Alive, 2..=3) => Alive, // Survives
        (Dead, 3) => Alive,      // Becomes alive
        _ => Dead,               // Dies or remains dead
    }
}

/// A fixed-size grid of cells, indexed as `(x, y)` with `x` the column.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Vec<CellState>>,
    width: usize,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Grid {
            cells: vec![vec![Dead; width]; height],
            width,
        }
    }

    /// Build a grid with the given cells alive. Coordinates outside the grid are ignored.
    pub fn from_live_cells(width: usize, height: usize, live: &[(usize, usize)]) -> Self {
        let mut grid = Grid::new(width, height);
        for &(x, y) in live {
            grid.set(x, y, Alive);
        }
        grid
    }

    pub fn random<R: Rng>(width: usize, height: usize, density: f64, rng: &mut R) -> Self {
        let mut grid = Grid::new(width, height);
        grid.randomize(rng, density);
        grid
    }

    /// Replace every cell; each one comes back alive with probability `density`.
    /// Out-of-range densities are clamped to `0..=1`, and NaN counts as zero.
    pub fn randomize<R: Rng>(&mut self, rng: &mut R, density: f64) {
        let density = if density.is_nan() { 0.0 } else { density.clamp(0.0, 1.0) };
        let mut new_grid = Grid::new(self.width, self.height());

        for row in new_grid.cells.iter_mut() {
            for cell in row.iter_mut() {
                *cell = if rng.random_bool(density) { Alive } else { Dead };
            }
        }
        *self = new_grid;
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.cells.len()
    }

    pub fn rows(&self) -> &[Vec<CellState>] {
        &self.cells
    }

    pub fn get(&self, x: usize, y: usize) -> Option<CellState> {
        self.cells.get(y).and_then(|row| row.get(x)).copied()
    }

    /// Returns `false` when `(x, y)` is outside the grid.
    pub fn set(&mut self, x: usize, y: usize, state: CellState) -> bool {
        match self.cells.get_mut(y).and_then(|row| row.get_mut(x)) {
            Some(cell) => {
                *cell = state;
                true
            }
            None => false,
        }
    }

    /// Flip a cell and return its new state, or `None` when `(x, y)` is outside the grid.
    pub fn toggle(&mut self, x: usize, y: usize) -> Option<CellState> {
        let cell = self.cells.get_mut(y).and_then(|row| row.get_mut(x))?;
        *cell = cell.toggled();
        Some(*cell)
    }

    pub fn population(&self) -> usize {
        self.cells
            .iter()
            .map(|row| row.iter().filter(|cell| cell.is_alive()).count())
            .sum()
    }

    /// Compute the next generation without touching `self`.
    pub fn next_generation(&self) -> Grid {
        let cells = self
            .cells
            .iter()
            .enumerate()
            .map(|(y, row)| {
                row.iter()
                    .enumerate()
                    .map(|(x, &cell)| next_state(cell, self.live_neighbors(x, y)))
                    .collect()
            })
            .collect();

        Grid {
            cells,
            width: self.width,
        }
    }

    /// Advance the grid by one step. Returns `false` when the generation did not change.
    pub fn advance(&mut self) -> bool {
        let next_grid = self.next_generation();

        if *self == next_grid {
            return false;
        }
        *self = next_grid;
        true
    }

    /// Count the live cells around `(x, y)`; neighbors past the border are skipped.
    pub fn live_neighbors(&self, x: usize, y: usize) -> usize {
        let mut count = 0;

        for dy in [-1isize, 0, 1] {
            for dx in [-1isize, 0, 1] {
                if dx == 0 && dy == 0 {
                    continue;
                }

                let (Some(nx), Some(ny)) = (x.checked_add_signed(dx), y.checked_add_signed(dy)) else {
                    continue;
                };

                if self.get(nx, ny) == Some(Alive) {
                    count += 1;
                }
            }
        }

        count
    }
}
