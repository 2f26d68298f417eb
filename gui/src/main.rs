use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use eframe::egui;
use rand::rngs::StdRng;
use shared::config::Config;
use shared::grid::Grid;
use shared::session::{Input, Session};

const TITLE: &str = "Game of Life John Conway";

#[derive(Debug, Parser)]
#[command(name = "life-gui", about = "Randomly seeded Game of Life")]
struct Args {
    #[command(flatten)]
    config: Config,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    args.config.validate().context("invalid configuration")?;

    let config = args.config;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(TITLE)
            .with_inner_size([config.window_width as f32, config.window_height as f32])
            .with_resizable(false),
        ..Default::default()
    };

    eframe::run_native(
        TITLE,
        options,
        Box::new(|_cc| Ok(Box::new(GuiOfLife::new(config)))),
    )
    .map_err(|err| anyhow::anyhow!("failed to run window: {err}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Reseed,
    Quit,
}

/// Map this frame's key presses to an action; Escape wins over R.
fn key_action(pressed: impl Fn(egui::Key) -> bool) -> Option<KeyAction> {
    if pressed(egui::Key::Escape) {
        Some(KeyAction::Quit)
    } else if pressed(egui::Key::R) {
        Some(KeyAction::Reseed)
    } else {
        None
    }
}

struct GuiOfLife {
    session: Session,
    config: Config,
    rng: StdRng,
    last_step: Instant,
    interval: Duration,
}

impl GuiOfLife {
    fn new(config: Config) -> Self {
        let mut rng = config.rng();
        let grid = Grid::random(config.grid_width(), config.grid_height(), config.density, &mut rng);
        log::info!(
            "seeded {}x{} grid with {} live cells",
            grid.width(),
            grid.height(),
            grid.population()
        );

        Self {
            session: Session::running(grid),
            interval: config.frame_interval(),
            config,
            rng,
            last_step: Instant::now(),
        }
    }

    fn randomize(&mut self) {
        self.session.reseed(&mut self.rng, self.config.density);
        self.last_step = Instant::now();
        log::info!("reseeded with {} live cells", self.session.grid().population());
    }

    fn apply(&mut self, action: KeyAction) {
        match action {
            KeyAction::Reseed => self.randomize(),
            KeyAction::Quit => self.session.handle(Input::Quit),
        }
    }

    fn draw_grid(&self, ui: &mut egui::Ui) {
        let cell_size = self.config.cell_size as f32;
        let origin = ui.max_rect().min;
        let painter = ui.painter();

        for (y, row) in self.session.grid().rows().iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if !cell.is_alive() {
                    continue;
                }
                let pos = origin + egui::vec2(x as f32 * cell_size, y as f32 * cell_size);
                painter.rect_filled(
                    egui::Rect::from_min_size(pos, egui::vec2(cell_size, cell_size)),
                    0.0,
                    egui::Color32::WHITE,
                );
            }
        }
    }
}

impl eframe::App for GuiOfLife {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(action) = ctx.input(|i| key_action(|key| i.key_pressed(key))) {
            self.apply(action);
        }
        if self.session.is_finished() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::BLACK))
            .show(ctx, |ui| self.draw_grid(ui));

        if self.last_step.elapsed() >= self.interval {
            self.session.tick();
            self.last_step = Instant::now();
        }

        ctx.request_repaint_after(self.interval.saturating_sub(self.last_step.elapsed()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_app() -> GuiOfLife {
        GuiOfLife::new(Config {
            seed: Some(5),
            ..Config::default()
        })
    }

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(key_action(|key| key == egui::Key::R), Some(KeyAction::Reseed));
        assert_eq!(key_action(|key| key == egui::Key::Escape), Some(KeyAction::Quit));
        assert_eq!(key_action(|_| true), Some(KeyAction::Quit));
        assert_eq!(key_action(|key| key == egui::Key::Space), None);
        assert_eq!(key_action(|_| false), None);
    }

    #[test]
    fn seeds_a_running_grid_from_config() {
        let app = seeded_app();
        assert_eq!(app.session.grid().width(), 80);
        assert_eq!(app.session.grid().height(), 60);
        assert_eq!(app.session.grid(), seeded_app().session.grid());
        assert!(app.session.grid().population() > 0);
    }

    #[test]
    fn reseed_replaces_grid_and_restarts_count() {
        let mut app = seeded_app();
        let first = app.session.grid().clone();
        app.session.tick();
        assert_eq!(app.session.generation(), 1);

        app.apply(KeyAction::Reseed);
        assert_eq!(app.session.generation(), 0);
        assert_ne!(app.session.grid(), &first);
        assert!(!app.session.is_finished());
    }

    #[test]
    fn quit_finishes_session() {
        let mut app = seeded_app();
        app.apply(KeyAction::Quit);
        assert!(app.session.is_finished());
        assert!(!app.session.tick());
    }
}
