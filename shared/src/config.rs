use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

pub const WINDOW_WIDTH: u32 = 800;
pub const WINDOW_HEIGHT: u32 = 600;
pub const CELL_SIZE: u32 = 10;
pub const FPS: u32 = 10;
pub const DENSITY: f64 = 0.5;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("cell size must be at least one pixel")]
    ZeroCellSize,
    #[error("cell size {cell_size} does not fit in a {width}x{height} window")]
    CellLargerThanWindow { cell_size: u32, width: u32, height: u32 },
    #[error("fps must be positive")]
    ZeroFps,
    #[error("density {0} is outside 0..=1")]
    DensityOutOfRange(f64),
}

/// Window, grid and pacing settings shared by both front ends.
#[derive(Debug, Clone, clap::Args)]
pub struct Config {
    /// Window width in pixels
    #[arg(long = "width", default_value_t = WINDOW_WIDTH)]
    pub window_width: u32,

    /// Window height in pixels
    #[arg(long = "height", default_value_t = WINDOW_HEIGHT)]
    pub window_height: u32,

    /// Edge length of one cell in pixels
    #[arg(long, default_value_t = CELL_SIZE)]
    pub cell_size: u32,

    /// Generations (and frames) per second
    #[arg(long, default_value_t = FPS)]
    pub fps: u32,

    /// Chance of a cell starting alive when the grid is seeded randomly
    #[arg(long, default_value_t = DENSITY)]
    pub density: f64,

    /// Seed for the random grid; taken from the OS when omitted
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_width: WINDOW_WIDTH,
            window_height: WINDOW_HEIGHT,
            cell_size: CELL_SIZE,
            fps: FPS,
            density: DENSITY,
            seed: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cell_size == 0 {
            return Err(ConfigError::ZeroCellSize);
        }
        if self.cell_size > self.window_width || self.cell_size > self.window_height {
            return Err(ConfigError::CellLargerThanWindow {
                cell_size: self.cell_size,
                width: self.window_width,
                height: self.window_height,
            });
        }
        if self.fps == 0 {
            return Err(ConfigError::ZeroFps);
        }
        if !(0.0..=1.0).contains(&self.density) {
            return Err(ConfigError::DensityOutOfRange(self.density));
        }
        Ok(())
    }

    pub fn grid_width(&self) -> usize {
        (self.window_width / self.cell_size.max(1)) as usize
    }

    pub fn grid_height(&self) -> usize {
        (self.window_height / self.cell_size.max(1)) as usize
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn defaults_give_80_by_60_grid() {
        let config = Config::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.grid_width(), 80);
        assert_eq!(config.grid_height(), 60);
        assert_eq!(config.frame_interval(), Duration::from_millis(100));
    }

    #[test]
    fn partial_cells_are_dropped() {
        let config = Config {
            window_width: 805,
            window_height: 599,
            ..Config::default()
        };
        assert_eq!(config.grid_width(), 80);
        assert_eq!(config.grid_height(), 59);
    }

    #[test]
    fn rejects_bad_values() {
        let zero_cell = Config { cell_size: 0, ..Config::default() };
        assert_eq!(zero_cell.validate(), Err(ConfigError::ZeroCellSize));

        let huge_cell = Config { cell_size: 700, ..Config::default() };
        assert!(matches!(huge_cell.validate(), Err(ConfigError::CellLargerThanWindow { .. })));

        let zero_fps = Config { fps: 0, ..Config::default() };
        assert_eq!(zero_fps.validate(), Err(ConfigError::ZeroFps));

        let density = Config { density: 1.5, ..Config::default() };
        assert_eq!(density.validate(), Err(ConfigError::DensityOutOfRange(1.5)));
    }

    #[test]
    fn seeded_rng_repeats() {
        let config = Config { seed: Some(42), ..Config::default() };
        let a: u64 = config.rng().random();
        let b: u64 = config.rng().random();
        assert_eq!(a, b);
    }
}
