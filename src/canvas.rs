// ============================================================================
// CANVAS BUFFER PAIR - ping-pong surfaces for the feedback transform
// ============================================================================
//
// Two equally sized RGBA images alternate roles.  `active` is what the user
// paints into and what gets presented; `work` is the scratch target of the
// next transform pass.  After a pass writes `work` the roles flip, which is a
// single index toggle rather than a buffer copy.

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::error::EditorError;
use crate::transform::PixelTransform;

/// Fixed canvas dimensions, shared by both buffers for the whole run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }
}

// ============================================================================
// FEEDBACK SCHEDULE
// ============================================================================

/// Fixed-cadence step counter deciding when a transform pass runs.
///
/// The counter advances on every step, paused or not, so resuming keeps the
/// original phase: with cadence 10 passes only ever land on multiples of 10.
#[derive(Clone, Debug)]
pub struct FeedbackSchedule {
    counter: u64,
    cadence: u64,
    paused: bool,
    passes: u64,
}

impl FeedbackSchedule {
    /// `cadence` of zero is treated as one (fire every step).
    pub fn new(cadence: u32) -> Self {
        Self {
            counter: 0,
            cadence: cadence.max(1) as u64,
            paused: false,
            passes: 0,
        }
    }

    /// Advance one step and report whether a pass is due on it.
    pub fn advance(&mut self) -> bool {
        self.counter += 1;
        self.counter % self.cadence == 0 && !self.paused
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool { self.paused }
    pub fn counter(&self) -> u64 { self.counter }
    pub fn cadence(&self) -> u64 { self.cadence }
    pub fn passes(&self) -> u64 { self.passes }
}

// ============================================================================
// BUFFER PAIR
// ============================================================================

pub struct CanvasPair {
    size: CanvasSize,
    buffers: [RgbaImage; 2],
    active: usize,
    erase_color: Rgba<u8>,
    schedule: FeedbackSchedule,
    transform: Box<dyn PixelTransform>,
}

impl CanvasPair {
    /// Both buffers start filled with `erase_color`.
    pub fn new(
        size: CanvasSize,
        cadence: u32,
        erase_color: Rgba<u8>,
        transform: Box<dyn PixelTransform>,
    ) -> Self {
        let blank = RgbaImage::from_pixel(size.width, size.height, erase_color);
        Self {
            size,
            buffers: [blank.clone(), blank],
            active: 0,
            erase_color,
            schedule: FeedbackSchedule::new(cadence),
            transform,
        }
    }

    pub fn size(&self) -> CanvasSize { self.size }
    pub fn active_index(&self) -> usize { self.active }
    pub fn active(&self) -> &RgbaImage { &self.buffers[self.active] }
    pub fn work(&self) -> &RgbaImage { &self.buffers[1 - self.active] }
    pub fn schedule(&self) -> &FeedbackSchedule { &self.schedule }
    pub fn schedule_mut(&mut self) -> &mut FeedbackSchedule { &mut self.schedule }
    pub fn transform_name(&self) -> &str { self.transform.name() }

    /// Write one pixel into the active buffer.  Returns `false` (and writes
    /// nothing) when the coordinate lies outside the canvas.
    pub fn paint(&mut self, x: i32, y: i32, color: Rgba<u8>) -> bool {
        if !self.size.contains(x, y) {
            return false;
        }
        self.buffers[self.active].put_pixel(x as u32, y as u32, color);
        true
    }

    /// Fill the half-open rectangle `[x0, x1) × [y0, y1)`, clipped to the canvas.
    pub fn fill_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba<u8>) {
        let w = self.size.width as i32;
        let h = self.size.height as i32;
        for y in y0.max(0)..y1.min(h) {
            for x in x0.max(0)..x1.min(w) {
                self.buffers[self.active].put_pixel(x as u32, y as u32, color);
            }
        }
    }

    /// Reset the active buffer to the erase colour.  Not gated by the schedule.
    pub fn clear(&mut self) {
        fill_image(&mut self.buffers[self.active], self.erase_color);
    }

    /// Advance the schedule and run a transform pass if one is due.
    /// Returns whether a pass ran.
    pub fn step(&mut self) -> Result<bool, EditorError> {
        if !self.schedule.advance() {
            return Ok(false);
        }
        self.run_pass()?;
        Ok(true)
    }

    /// Render `active` through the transform into `work`, then swap roles.
    fn run_pass(&mut self) -> Result<(), EditorError> {
        let [first, second] = &mut self.buffers;
        let (src, dst) = if self.active == 0 {
            (&*first, second)
        } else {
            (&*second, first)
        };

        if !self.transform.fills_target() {
            fill_image(dst, self.erase_color);
        }
        self.transform.apply(src, dst)?;

        if dst.dimensions() != (self.size.width, self.size.height) {
            return Err(EditorError::TransformPass(format!(
                "'{}' produced a {}x{} image for a {}x{} canvas",
                self.transform.name(),
                dst.width(),
                dst.height(),
                self.size.width,
                self.size.height
            )));
        }

        self.active = 1 - self.active;
        self.schedule.passes += 1;
        Ok(())
    }
}

/// Overwrite every pixel of `img` with `color`, rows in parallel.
pub fn fill_image(img: &mut RgbaImage, color: Rgba<u8>) {
    let row_bytes = img.width() as usize * 4;
    if row_bytes == 0 {
        return;
    }
    img.par_chunks_mut(row_bytes).for_each(|row| {
        for px in row.chunks_exact_mut(4) {
            px.copy_from_slice(&color.0);
        }
    });
}
