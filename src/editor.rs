// ============================================================================
// EDITOR STATE - the single owned value the step loop threads through
// ============================================================================

use crate::canvas::{CanvasPair, CanvasSize};
use crate::config::EditorConfig;
use crate::error::EditorError;
use crate::input::{InputController, InputFrame, Palette, StrokeMode};
use crate::transform::PixelTransform;
use crate::viewport::ViewportState;
use crate::log_info;

/// Demo block painted at startup: x in [100, 130), y in [10, 20).
pub const DEMO_BLOCK: (i32, i32, i32, i32) = (100, 10, 130, 20);

/// What happened during one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepOutcome {
    pub mode: StrokeMode,
    pub pass_ran: bool,
}

pub struct EditorState {
    canvas: CanvasPair,
    viewport: ViewportState,
    input: InputController,
}

impl EditorState {
    pub fn new(config: &EditorConfig, transform: Box<dyn PixelTransform>) -> Self {
        let size = CanvasSize::new(config.width, config.height);
        let mut canvas = CanvasPair::new(size, config.cadence, config.erase_color, transform);
        if config.demo_block {
            let (x0, y0, x1, y1) = DEMO_BLOCK;
            canvas.fill_rect(x0, y0, x1, y1, config.paint_color);
        }
        log_info!(
            "Editor ready: {}x{} canvas, pass every {} steps via '{}'",
            size.width,
            size.height,
            canvas.schedule().cadence(),
            canvas.transform_name()
        );

        let mut viewport = ViewportState::new(config.initial_scale);
        viewport.clamp_offset(size);

        Self {
            canvas,
            viewport,
            input: InputController::new(Palette {
                paint: config.paint_color,
                erase: config.erase_color,
            }),
        }
    }

    pub fn canvas(&self) -> &CanvasPair { &self.canvas }
    pub fn canvas_mut(&mut self) -> &mut CanvasPair { &mut self.canvas }
    pub fn viewport(&self) -> &ViewportState { &self.viewport }
    pub fn input(&self) -> &InputController { &self.input }
    pub fn size(&self) -> CanvasSize { self.canvas.size() }

    /// Run one simulation step: input first, then the scheduled pass, so a
    /// stroke made on a pass step is included in that pass.
    pub fn step(&mut self, frame: &InputFrame) -> Result<StepOutcome, EditorError> {
        let mode = self.input.apply(frame, &mut self.viewport, &mut self.canvas);
        let pass_ran = self.canvas.step()?;
        Ok(StepOutcome { mode, pass_ran })
    }
}
