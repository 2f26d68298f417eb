mod frame;
mod render;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use shared::config::Config;
use shared::grid::Grid;
use shared::session::{Input, Session};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::frame::{FrameBuilder, Layout};
use crate::render::Renderer;

const TITLE: &str = "Game of Life John Conway";

#[derive(Debug, Parser)]
#[command(name = "life-gui-wgpu", about = "Game of Life with a start menu and manual cell placement")]
struct Args {
    #[command(flatten)]
    config: Config,
}

struct GameOfLifeApp {
    session: Session,
    frame: FrameBuilder,
    window_size: PhysicalSize<u32>,
    scale_factor: f64,
    cursor_position: Option<[f32; 2]>,
    last_step: Instant,
}

impl GameOfLifeApp {
    fn new(grid: Grid, window_size: PhysicalSize<u32>, scale_factor: f64) -> Self {
        let cells = grid.width() * grid.height();
        Self {
            session: Session::new(grid),
            frame: FrameBuilder::with_capacity(cells),
            window_size,
            scale_factor,
            cursor_position: None,
            last_step: Instant::now(),
        }
    }

    /// Step the session once `interval` has passed since the last step.
    fn step_if_due(&mut self, now: Instant, interval: Duration) -> bool {
        if now.saturating_duration_since(self.last_step) < interval {
            return false;
        }
        self.last_step = now;
        self.session.tick();
        true
    }

    fn window_extent(&self) -> [f32; 2] {
        [self.window_size.width.max(1) as f32, self.window_size.height.max(1) as f32]
    }

    fn layout(&self) -> Layout {
        let grid = self.session.grid();
        Layout::new(self.window_extent(), grid.width(), grid.height())
    }

    fn handle_click(&mut self) {
        let Some(position) = self.cursor_position else {
            return;
        };
        if let Some((x, y)) = self.layout().cell_at(position) {
            self.session.handle(Input::Toggle { x, y });
        }
    }

    fn build_frame(&mut self) -> (&[frame::CellInstance], &[frame::Vertex]) {
        let extent = self.window_extent();
        self.frame.build(&self.session, extent, self.scale_factor as f32)
    }
}

fn input_for_key(key: &Key) -> Option<Input> {
    match key {
        Key::Named(NamedKey::ArrowUp) => Some(Input::Up),
        Key::Named(NamedKey::ArrowDown) => Some(Input::Down),
        Key::Named(NamedKey::Enter) => Some(Input::Confirm),
        Key::Named(NamedKey::Escape) => Some(Input::Quit),
        _ => None,
    }
}

struct LifeWindow {
    config: Config,
    window_attrs: WindowAttributes,
    window: Option<Arc<Window>>,
    window_id: Option<WindowId>,
    renderer: Option<Renderer>,
    app: Option<GameOfLifeApp>,
    frame_interval: Duration,
    next_frame: Instant,
    frame_count: u32,
    last_fps_log: Instant,
    startup_error: Option<anyhow::Error>,
}

impl LifeWindow {
    fn new(config: Config) -> Self {
        let attrs = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(LogicalSize::new(config.window_width, config.window_height))
            .with_resizable(false);
        Self {
            frame_interval: config.frame_interval(),
            config,
            window_attrs: attrs,
            window: None,
            window_id: None,
            renderer: None,
            app: None,
            next_frame: Instant::now(),
            frame_count: 0,
            last_fps_log: Instant::now(),
            startup_error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window = event_loop
            .create_window(self.window_attrs.clone())
            .context("create window")?;
        let window = Arc::new(window);

        let grid = Grid::new(self.config.grid_width(), self.config.grid_height());
        let renderer = pollster::block_on(Renderer::new(window.clone(), grid.width() * grid.height()))
            .context("create renderer")?;
        let app = GameOfLifeApp::new(grid, renderer.size, window.scale_factor());
        log::info!(
            "window {}x{} (scale {}), grid {}x{}",
            renderer.size.width,
            renderer.size.height,
            window.scale_factor(),
            self.config.grid_width(),
            self.config.grid_height()
        );
        window.request_redraw();

        self.window_id = Some(window.id());
        self.window = Some(window);
        self.renderer = Some(renderer);
        self.app = Some(app);
        Ok(())
    }

    fn handle_input(&mut self, event_loop: &ActiveEventLoop, input: Input) {
        if let Some(app) = self.app.as_mut() {
            app.session.handle(input);
            if app.session.is_finished() {
                event_loop.exit();
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(renderer), Some(app)) = (self.renderer.as_mut(), self.app.as_mut()) else {
            return;
        };

        let (cells, ui_vertices) = app.build_frame();
        match renderer.render(cells, ui_vertices) {
            Ok(()) => {
                self.frame_count += 1;
                let elapsed = self.last_fps_log.elapsed();
                if elapsed >= Duration::from_secs(1) {
                    let fps = self.frame_count as f64 / elapsed.as_secs_f64();
                    log::debug!("fps: {:.1}, generation {}", fps, app.session.generation());
                    self.frame_count = 0;
                    self.last_fps_log = Instant::now();
                }
            }
            Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("out of GPU memory");
                event_loop.exit();
            }
            Err(err) => log::warn!("skipping frame: {err}"),
        }

        // draw, then step
        app.step_if_due(Instant::now(), self.frame_interval);
    }
}

impl ApplicationHandler<()> for LifeWindow {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.start(event_loop) {
            log::error!("startup failed: {err:#}");
            self.startup_error = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if Some(window_id) != self.window_id {
            return;
        }
        match event {
            WindowEvent::CloseRequested => self.handle_input(event_loop, Input::Quit),
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size);
                }
                if let Some(app) = self.app.as_mut() {
                    app.window_size = size;
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Some(app) = self.app.as_mut() {
                    app.scale_factor = scale_factor;
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(app) = self.app.as_mut() {
                    app.cursor_position = Some([position.x as f32, position.y as f32]);
                }
            }
            WindowEvent::CursorLeft { .. } => {
                if let Some(app) = self.app.as_mut() {
                    app.cursor_position = None;
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(app) = self.app.as_mut() {
                    app.handle_click();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    if let Some(input) = input_for_key(&event.logical_key) {
                        self.handle_input(event_loop, input);
                    }
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_frame {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            self.next_frame = now + self.frame_interval;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    args.config.validate().context("invalid configuration")?;

    let event_loop = EventLoop::new().context("create event loop")?;
    let mut window = LifeWindow::new(args.config);
    event_loop.run_app(&mut window)?;

    match window.startup_error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
