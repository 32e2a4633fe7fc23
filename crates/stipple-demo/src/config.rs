use std::ops::Range;

use stipple_engine::coords::ColorRgba;

/// Demo tuning knobs.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Dots added per Space press.
    pub dots_per_press: usize,
    pub radius: Range<f32>,
    pub hardness: Range<f32>,
    /// Quad angle speed in radians per second.
    pub rotation_speed: f32,
    /// Cells per side of the procedural checkerboard.
    pub checker_cells: u32,
    /// Pixels per checkerboard cell.
    pub checker_cell_px: u32,
    pub clear: ColorRgba,
    pub canvas_size: u32,
    pub canvas_clear: ColorRgba,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            dots_per_press: 1000,
            radius: 0.01..0.1,
            hardness: 0.0..0.1,
            rotation_speed: 0.5,
            checker_cells: 8,
            checker_cell_px: 16,
            clear: ColorRgba::new(0.1, 0.2, 0.3, 1.0),
            canvas_size: stipple_engine::render::DEFAULT_CANVAS_SIZE,
            canvas_clear: ColorRgba::new(0.02, 0.02, 0.02, 1.0),
        }
    }
}
