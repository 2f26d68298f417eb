//! The pre-game flow: menu, optional manual placement, then the running simulation.

use log::{info, trace};
use rand::Rng;

use crate::grid::Grid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    ConfigureManually,
    StartGame,
}

impl MenuOption {
    pub const ALL: [MenuOption; 2] = [MenuOption::ConfigureManually, MenuOption::StartGame];

    pub fn label(self) -> &'static str {
        match self {
            MenuOption::ConfigureManually => "Configure Cells Manually",
            MenuOption::StartGame => "Start the Game",
        }
    }

    fn index(self) -> usize {
        match self {
            MenuOption::ConfigureManually => 0,
            MenuOption::StartGame => 1,
        }
    }

    fn offset(self, by: usize) -> Self {
        Self::ALL[(self.index() + by) % Self::ALL.len()]
    }

    pub fn next(self) -> Self {
        self.offset(1)
    }

    pub fn previous(self) -> Self {
        self.offset(Self::ALL.len() - 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Menu(MenuOption),
    /// Manual placement; remembers the most recently toggled cell.
    Placing { selected: Option<(usize, usize)> },
    Running,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Up,
    Down,
    Confirm,
    /// Pointer click on grid cell `(x, y)`.
    Toggle { x: usize, y: usize },
    Quit,
}

#[derive(Debug, Clone)]
pub struct Session {
    grid: Grid,
    phase: Phase,
    generation: u64,
}

impl Session {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            phase: Phase::Menu(MenuOption::ConfigureManually),
            generation: 0,
        }
    }

    /// Skip the menu and start stepping right away.
    pub fn running(grid: Grid) -> Self {
        Self {
            grid,
            phase: Phase::Running,
            generation: 0,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn handle(&mut self, input: Input) {
        let next = match (self.phase, input) {
            (Phase::Finished, _) => return,
            (_, Input::Quit) => Phase::Finished,
            (Phase::Menu(option), Input::Up) => Phase::Menu(option.previous()),
            (Phase::Menu(option), Input::Down) => Phase::Menu(option.next()),
            (Phase::Menu(MenuOption::ConfigureManually), Input::Confirm) => Phase::Placing { selected: None },
            (Phase::Menu(MenuOption::StartGame), Input::Confirm) => Phase::Running,
            (Phase::Placing { selected }, Input::Toggle { x, y }) => match self.grid.toggle(x, y) {
                Some(_) => Phase::Placing { selected: Some((x, y)) },
                None => Phase::Placing { selected },
            },
            (Phase::Placing { .. }, Input::Confirm) => Phase::Running,
            (phase, _) => phase,
        };

        if next != self.phase {
            match next {
                Phase::Menu(option) => info!("menu: {}", option.label()),
                Phase::Placing { selected: Some((x, y)) } => info!("toggled cell ({x}, {y})"),
                Phase::Placing { selected: None } => info!("placing cells"),
                Phase::Running => info!("running with {} live cells", self.grid.population()),
                Phase::Finished => info!("finished after {} generations", self.generation),
            }
            self.phase = next;
        }
    }

    /// Step the simulation once if it is running. Returns whether the grid changed.
    pub fn tick(&mut self) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        let changed = self.grid.advance();
        self.generation += 1;
        trace!("generation {}: {} live cells", self.generation, self.grid.population());
        changed
    }

    /// Replace the grid with a fresh random one and restart the generation count.
    pub fn reseed<R: Rng>(&mut self, rng: &mut R, density: f64) {
        self.grid.randomize(rng, density);
        self.generation = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CellState;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn menu_selection_wraps() {
        let mut session = Session::new(Grid::new(4, 4));
        assert_eq!(session.phase(), Phase::Menu(MenuOption::ConfigureManually));

        session.handle(Input::Up);
        assert_eq!(session.phase(), Phase::Menu(MenuOption::StartGame));
        session.handle(Input::Down);
        assert_eq!(session.phase(), Phase::Menu(MenuOption::ConfigureManually));
        session.handle(Input::Down);
        session.handle(Input::Down);
        assert_eq!(session.phase(), Phase::Menu(MenuOption::ConfigureManually));
    }

    #[test]
    fn start_game_goes_straight_to_running() {
        let mut session = Session::new(Grid::new(4, 4));
        session.handle(Input::Down);
        session.handle(Input::Confirm);
        assert_eq!(session.phase(), Phase::Running);
        assert_eq!(session.grid().population(), 0);
    }

    #[test]
    fn clicks_only_toggle_while_placing() {
        let mut session = Session::new(Grid::new(4, 4));
        session.handle(Input::Toggle { x: 1, y: 1 });
        assert_eq!(session.grid().population(), 0);

        session.handle(Input::Confirm);
        assert_eq!(session.phase(), Phase::Placing { selected: None });

        session.handle(Input::Toggle { x: 1, y: 1 });
        session.handle(Input::Toggle { x: 2, y: 3 });
        assert_eq!(session.grid().get(1, 1), Some(CellState::Alive));
        assert_eq!(session.phase(), Phase::Placing { selected: Some((2, 3)) });

        session.handle(Input::Toggle { x: 1, y: 1 });
        assert_eq!(session.grid().get(1, 1), Some(CellState::Dead));

        // outside the grid: ignored, selection kept
        session.handle(Input::Toggle { x: 9, y: 0 });
        assert_eq!(session.phase(), Phase::Placing { selected: Some((1, 1)) });
        assert_eq!(session.grid().population(), 1);

        session.handle(Input::Confirm);
        assert_eq!(session.phase(), Phase::Running);

        session.handle(Input::Toggle { x: 0, y: 0 });
        assert_eq!(session.grid().get(0, 0), Some(CellState::Dead));
    }

    #[test]
    fn arrows_are_ignored_while_placing() {
        let mut session = Session::new(Grid::new(4, 4));
        session.handle(Input::Confirm);
        session.handle(Input::Up);
        session.handle(Input::Down);
        assert_eq!(session.phase(), Phase::Placing { selected: None });
    }

    #[test]
    fn quit_from_every_phase() {
        let mut menu = Session::new(Grid::new(4, 4));
        menu.handle(Input::Quit);
        assert!(menu.is_finished());

        let mut placing = Session::new(Grid::new(4, 4));
        placing.handle(Input::Confirm);
        placing.handle(Input::Quit);
        assert!(placing.is_finished());

        let mut running = Session::running(Grid::new(4, 4));
        running.handle(Input::Quit);
        assert!(running.is_finished());

        running.handle(Input::Confirm);
        assert!(running.is_finished());
    }

    #[test]
    fn tick_only_steps_while_running() {
        let blinker = Grid::from_live_cells(5, 5, &[(1, 2), (2, 2), (3, 2)]);
        let mut session = Session::new(blinker.clone());

        assert!(!session.tick());
        assert_eq!(session.generation(), 0);
        assert_eq!(session.grid(), &blinker);

        session.handle(Input::Confirm);
        assert!(!session.tick());

        session.handle(Input::Confirm);
        assert!(session.tick());
        assert!(session.tick());
        assert_eq!(session.generation(), 2);
        assert_eq!(session.grid(), &blinker);

        session.handle(Input::Quit);
        assert!(!session.tick());
        assert_eq!(session.generation(), 2);
    }

    #[test]
    fn still_grid_keeps_counting_generations() {
        let mut session = Session::running(Grid::new(3, 3));
        assert!(!session.tick());
        assert!(!session.tick());
        assert_eq!(session.generation(), 2);
    }

    #[test]
    fn reseed_resets_generation() {
        let mut session = Session::running(Grid::new(10, 10));
        session.tick();
        session.reseed(&mut StdRng::seed_from_u64(3), 1.0);
        assert_eq!(session.generation(), 0);
        assert_eq!(session.grid().population(), 100);
        assert_eq!(session.phase(), Phase::Running);
    }
}
