// ============================================================================
// INPUT CONTROLLER - device state -> strokes, pan, zoom, pause, clear
// ============================================================================

use image::Rgba;

use crate::canvas::CanvasPair;
use crate::line::draw_line;
use crate::viewport::ViewportState;
use crate::log_info;

/// Device state sampled for one simulation step.
///
/// `pointer` is in screen space (see viewport.rs).  The two edge flags and
/// `wheel` are one-shot: the shell latches them until a step consumes them.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputFrame {
    pub pointer: (i32, i32),
    pub paint_held: bool,
    pub erase_held: bool,
    pub pan_held: bool,
    pub toggle_pause: bool,
    pub clear: bool,
    /// Wheel notches this step, positive zooms in.
    pub wheel: f32,
}

impl InputFrame {
    pub fn at(x: i32, y: i32) -> Self {
        Self { pointer: (x, y), ..Self::default() }
    }
}

/// What the held buttons mean this step.  Paint wins over erase, erase over pan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrokeMode {
    Paint,
    Erase,
    Pan,
    Idle,
}

impl StrokeMode {
    pub fn from_frame(frame: &InputFrame) -> Self {
        if frame.paint_held {
            StrokeMode::Paint
        } else if frame.erase_held {
            StrokeMode::Erase
        } else if frame.pan_held {
            StrokeMode::Pan
        } else {
            StrokeMode::Idle
        }
    }
}

/// Paint and erase colours.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub paint: Rgba<u8>,
    pub erase: Rgba<u8>,
}

/// Last sampled pointer position, kept in screen space so the previous
/// sample is re-mapped with the current step's zoom and pan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointerTrace {
    previous: (i32, i32),
}

impl PointerTrace {
    pub fn new(start: (i32, i32)) -> Self {
        Self { previous: start }
    }

    pub fn previous(&self) -> (i32, i32) {
        self.previous
    }

    pub fn record(&mut self, pointer: (i32, i32)) {
        self.previous = pointer;
    }
}

#[derive(Clone, Debug)]
pub struct InputController {
    trace: PointerTrace,
    palette: Palette,
}

impl InputController {
    pub fn new(palette: Palette) -> Self {
        Self { trace: PointerTrace::default(), palette }
    }

    pub fn trace(&self) -> &PointerTrace {
        &self.trace
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    /// Apply one frame of input.  Order matters and follows the step loop:
    /// pause edge, clear edge, the stroke/pan action, zoom, then the trace.
    pub fn apply(
        &mut self,
        frame: &InputFrame,
        viewport: &mut ViewportState,
        canvas: &mut CanvasPair,
    ) -> StrokeMode {
        let size = canvas.size();

        if frame.toggle_pause {
            let paused = canvas.schedule_mut().toggle_pause();
            log_info!("Feedback {}", if paused { "paused" } else { "resumed" });
        }
        if frame.clear {
            canvas.clear();
        }

        let mode = StrokeMode::from_frame(frame);
        match mode {
            StrokeMode::Paint | StrokeMode::Erase => {
                let color = if mode == StrokeMode::Paint {
                    self.palette.paint
                } else {
                    self.palette.erase
                };
                let (prev_x, prev_y) = self.trace.previous();
                let (x0, y0) = viewport.to_canvas(frame.pointer.0, frame.pointer.1, size);
                let (x1, y1) = viewport.to_canvas(prev_x, prev_y, size);
                draw_line(x0, y0, x1, y1, |x, y| {
                    canvas.paint(x, y, color);
                });
            }
            StrokeMode::Pan => {
                let (prev_x, prev_y) = self.trace.previous();
                viewport.pan(frame.pointer.0 - prev_x, frame.pointer.1 - prev_y, size);
            }
            StrokeMode::Idle => {}
        }

        viewport.zoom(frame.wheel, size);
        self.trace.record(frame.pointer);
        mode
    }
}
