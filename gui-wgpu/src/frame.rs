//! Turns a [`Session`] into the cell instances and UI triangles the renderer draws.

use bytemuck::{Pod, Zeroable};
use shared::session::{MenuOption, Phase, Session};

const WHITE: [f32; 3] = [1.0, 1.0, 1.0];
const RED: [f32; 3] = [1.0, 0.0, 0.0];
const GREEN: [f32; 3] = [0.0, 1.0, 0.0];

const MENU_TEXT_SCALE: f32 = 4.0;
const MENU_LINE_OFFSET: f32 = 50.0;
const OUTLINE_WIDTH: f32 = 3.0;
const FONT_WIDTH: usize = 5;
const FONT_HEIGHT: usize = 7;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    position: [f32; 2],
    color: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CellInstance {
    min: [f32; 2],
    max: [f32; 2],
    color: [f32; 3],
    _pad: f32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rect {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl Rect {
    pub fn contains(&self, point: [f32; 2]) -> bool {
        point[0] >= self.min[0] && point[0] < self.max[0] && point[1] >= self.min[1] && point[1] < self.max[1]
    }
}

/// Where the grid sits inside the window, in physical pixels.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Layout {
    pub cell_size: f32,
    pub offset: [f32; 2],
    columns: usize,
    rows: usize,
}

impl Layout {
    pub fn new(window_size: [f32; 2], columns: usize, rows: usize) -> Self {
        let [width, height] = window_size;
        let cell_size = (width / columns.max(1) as f32).min(height / rows.max(1) as f32).max(1.0);
        let offset = [
            (width - cell_size * columns as f32) * 0.5,
            (height - cell_size * rows as f32) * 0.5,
        ];
        Self { cell_size, offset, columns, rows }
    }

    pub fn cell_rect(&self, x: usize, y: usize) -> Rect {
        let min = [
            self.offset[0] + x as f32 * self.cell_size,
            self.offset[1] + y as f32 * self.cell_size,
        ];
        Rect {
            min,
            max: [min[0] + self.cell_size, min[1] + self.cell_size],
        }
    }

    /// The cell under `point`, if any.
    pub fn cell_at(&self, point: [f32; 2]) -> Option<(usize, usize)> {
        let bounds = Rect {
            min: self.offset,
            max: [
                self.offset[0] + self.cell_size * self.columns as f32,
                self.offset[1] + self.cell_size * self.rows as f32,
            ],
        };
        if !bounds.contains(point) {
            return None;
        }
        let x = ((point[0] - self.offset[0]) / self.cell_size) as usize;
        let y = ((point[1] - self.offset[1]) / self.cell_size) as usize;
        Some((x.min(self.columns - 1), y.min(self.rows - 1)))
    }
}

#[derive(Default)]
pub struct FrameBuilder {
    instances: Vec<CellInstance>,
    ui_vertices: Vec<Vertex>,
}

impl FrameBuilder {
    pub fn with_capacity(cells: usize) -> Self {
        Self {
            instances: Vec::with_capacity(cells),
            ui_vertices: Vec::with_capacity(2048),
        }
    }

    /// `window_size` is physical; `scale_factor` converts the menu's logical sizes to it.
    pub fn build(&mut self, session: &Session, window_size: [f32; 2], scale_factor: f32) -> (&[CellInstance], &[Vertex]) {
        self.instances.clear();
        self.ui_vertices.clear();

        match session.phase() {
            Phase::Menu(selected) => self.push_menu(selected, window_size, scale_factor),
            Phase::Placing { selected } => {
                let layout = self.push_cells(session, window_size);
                if let Some((x, y)) = selected {
                    let outline = OUTLINE_WIDTH * scale_factor;
                    push_outline(&mut self.ui_vertices, layout.cell_rect(x, y), outline, RED, window_size);
                }
            }
            Phase::Running | Phase::Finished => {
                self.push_cells(session, window_size);
            }
        }

        (&self.instances, &self.ui_vertices)
    }

    fn push_cells(&mut self, session: &Session, window_size: [f32; 2]) -> Layout {
        let grid = session.grid();
        let layout = Layout::new(window_size, grid.width(), grid.height());
        let [width, height] = window_size;

        for (y, row) in grid.rows().iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                // the clear color already paints dead cells
                if !cell.is_alive() {
                    continue;
                }
                let rect = layout.cell_rect(x, y);
                self.instances.push(CellInstance {
                    min: [to_ndc(rect.min[0], width), to_ndc_y(rect.min[1], height)],
                    max: [to_ndc(rect.max[0], width), to_ndc_y(rect.max[1], height)],
                    color: WHITE,
                    _pad: 0.0,
                });
            }
        }
        layout
    }

    fn push_menu(&mut self, selected: MenuOption, window_size: [f32; 2], scale_factor: f32) {
        let [width, height] = window_size;
        let scale = MENU_TEXT_SCALE * scale_factor;

        for (index, option) in MenuOption::ALL.into_iter().enumerate() {
            let line_offset = if index == 0 { -MENU_LINE_OFFSET } else { MENU_LINE_OFFSET };
            let text = option.label();
            let origin = [
                (width - text_pixel_width(text) * scale) * 0.5,
                height * 0.5 + line_offset * scale_factor,
            ];
            let color = if option == selected { WHITE } else { GREEN };
            draw_text(&mut self.ui_vertices, text, origin, scale, color, window_size);
        }
    }
}

fn push_rect(vertices: &mut Vec<Vertex>, rect: Rect, color: [f32; 3], window_size: [f32; 2]) {
    let [width, height] = window_size;
    let x0 = to_ndc(rect.min[0], width);
    let y0 = to_ndc_y(rect.min[1], height);
    let x1 = to_ndc(rect.max[0], width);
    let y1 = to_ndc_y(rect.max[1], height);

    vertices.push(Vertex { position: [x0, y1], color });
    vertices.push(Vertex { position: [x1, y1], color });
    vertices.push(Vertex { position: [x0, y0], color });
    vertices.push(Vertex { position: [x0, y0], color });
    vertices.push(Vertex { position: [x1, y1], color });
    vertices.push(Vertex { position: [x1, y0], color });
}

fn push_outline(vertices: &mut Vec<Vertex>, rect: Rect, thickness: f32, color: [f32; 3], window_size: [f32; 2]) {
    let Rect { min, max } = rect;
    let edges = [
        Rect { min, max: [max[0], min[1] + thickness] },
        Rect { min: [min[0], max[1] - thickness], max },
        Rect { min, max: [min[0] + thickness, max[1]] },
        Rect { min: [max[0] - thickness, min[1]], max },
    ];
    for edge in edges {
        push_rect(vertices, edge, color, window_size);
    }
}

fn to_ndc(x: f32, width: f32) -> f32 {
    (x / width) * 2.0 - 1.0
}

fn to_ndc_y(y: f32, height: f32) -> f32 {
    1.0 - (y / height) * 2.0
}

/// Width of `text` in font units; multiply by the draw scale for pixels.
fn text_pixel_width(text: &str) -> f32 {
    let mut units = 0.0;
    for ch in text.to_uppercase().chars() {
        if ch == ' ' || glyph_bits(ch).is_some() {
            units += (FONT_WIDTH as f32) + 1.0;
        }
    }
    (units - 1.0).max(0.0)
}

fn draw_text(vertices: &mut Vec<Vertex>, text: &str, origin: [f32; 2], scale: f32, color: [f32; 3], window_size: [f32; 2]) {
    let mut cursor_x = origin[0];
    for ch in text.to_uppercase().chars() {
        if ch == ' ' {
            cursor_x += (FONT_WIDTH as f32 + 1.0) * scale;
            continue;
        }
        let Some(rows) = glyph_bits(ch) else {
            continue;
        };
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..FONT_WIDTH {
                if (bits >> (FONT_WIDTH - 1 - col)) & 1 == 1 {
                    let rect = Rect {
                        min: [cursor_x + col as f32 * scale, origin[1] + row as f32 * scale],
                        max: [cursor_x + (col as f32 + 1.0) * scale, origin[1] + (row as f32 + 1.0) * scale],
                    };
                    push_rect(vertices, rect, color, window_size);
                }
            }
        }
        cursor_x += (FONT_WIDTH as f32 + 1.0) * scale;
    }
}

fn glyph_bits(ch: char) -> Option<[u8; FONT_HEIGHT]> {
    match ch {
        'A' => Some([0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
        'C' => Some([0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110]),
        'E' => Some([0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111]),
        'F' => Some([0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000]),
        'G' => Some([0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111]),
        'H' => Some([0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
        'I' => Some([0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b11111]),
        'L' => Some([0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111]),
        'M' => Some([0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001]),
        'N' => Some([0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001]),
        'O' => Some([0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
        'R' => Some([0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001]),
        'S' => Some([0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110]),
        'T' => Some([0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100]),
        'U' => Some([0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
        'Y' => Some([0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::grid::Grid;
    use shared::session::Input;

    const WINDOW: [f32; 2] = [800.0, 600.0];

    #[test]
    fn default_window_has_ten_pixel_cells() {
        let layout = Layout::new(WINDOW, 80, 60);
        assert_eq!(layout.cell_size, 10.0);
        assert_eq!(layout.offset, [0.0, 0.0]);
        assert_eq!(layout.cell_at([15.0, 25.0]), Some((1, 2)));
        assert_eq!(layout.cell_at([799.5, 599.5]), Some((79, 59)));
        assert_eq!(layout.cell_at([800.0, 10.0]), None);
        assert_eq!(layout.cell_at([-1.0, 10.0]), None);
    }

    #[test]
    fn hidpi_layout_scales_cells() {
        let layout = Layout::new([1600.0, 1200.0], 80, 60);
        assert_eq!(layout.cell_size, 20.0);
        assert_eq!(layout.cell_at([35.0, 45.0]), Some((1, 2)));
    }

    #[test]
    fn cell_at_inverts_cell_rect() {
        // 900 wide leaves a 50px margin on either side
        let layout = Layout::new([900.0, 600.0], 80, 60);
        assert_eq!(layout.offset, [50.0, 0.0]);
        assert_eq!(layout.cell_at([25.0, 100.0]), None);

        for (x, y) in [(0, 0), (13, 7), (79, 59)] {
            let rect = layout.cell_rect(x, y);
            let center = [(rect.min[0] + rect.max[0]) * 0.5, (rect.min[1] + rect.max[1]) * 0.5];
            assert!(rect.contains(center));
            assert_eq!(layout.cell_at(center), Some((x, y)));
            assert_eq!(layout.cell_at(rect.min), Some((x, y)));
        }
    }

    #[test]
    fn menu_draws_only_text() {
        let session = Session::new(Grid::new(80, 60));
        let mut frame = FrameBuilder::default();
        let (cells, ui) = frame.build(&session, WINDOW, 1.0);
        assert!(cells.is_empty());
        assert!(!ui.is_empty());
        assert_eq!(ui.len() % 6, 0);

        // selected line is white, the other green
        assert!(ui.iter().any(|vertex| vertex.color == WHITE));
        assert!(ui.iter().any(|vertex| vertex.color == GREEN));
    }

    #[test]
    fn running_draws_one_instance_per_live_cell() {
        let grid = Grid::from_live_cells(80, 60, &[(0, 0), (10, 10), (79, 59)]);
        let session = Session::running(grid);
        let mut frame = FrameBuilder::with_capacity(80 * 60);
        let (cells, ui) = frame.build(&session, WINDOW, 1.0);
        assert_eq!(cells.len(), 3);
        assert!(ui.is_empty());

        assert_eq!(cells[0].min, [-1.0, 1.0]);
        assert_eq!(cells[2].max, [1.0, -1.0]);
    }

    #[test]
    fn placing_outlines_last_toggled_cell() {
        let mut session = Session::new(Grid::new(80, 60));
        session.handle(Input::Confirm);

        let mut frame = FrameBuilder::default();
        let (_, ui) = frame.build(&session, WINDOW, 1.0);
        assert!(ui.is_empty());

        session.handle(Input::Toggle { x: 4, y: 5 });
        let (cells, ui) = frame.build(&session, WINDOW, 1.0);
        assert_eq!(cells.len(), 1);
        assert_eq!(ui.len(), 4 * 6);
        assert!(ui.iter().all(|vertex| vertex.color == RED));
    }

    #[test]
    fn menu_labels_have_glyphs() {
        for option in MenuOption::ALL {
            for ch in option.label().to_uppercase().chars() {
                assert!(ch == ' ' || glyph_bits(ch).is_some(), "missing glyph {ch:?}");
            }
        }
    }

    #[test]
    fn text_width_counts_spacing() {
        assert_eq!(text_pixel_width(""), 0.0);
        assert_eq!(text_pixel_width("A"), 5.0);
        assert_eq!(text_pixel_width("AA"), 11.0);
        assert_eq!(text_pixel_width("A A"), 17.0);
    }
}
