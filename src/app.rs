// ============================================================================
// APP - eframe shell: fixed-tick driver, input sampling, presentation
// ============================================================================

use std::time::{Duration, Instant};

use eframe::egui;
use egui::{Color32, ColorImage, Pos2, Rect, TextureHandle, TextureOptions};

use crate::canvas::CanvasSize;
use crate::editor::EditorState;
use crate::input::InputFrame;
use crate::{log_err, log_info, logger};

/// Steps run per UI frame at most; the remaining backlog is dropped.
const MAX_STEPS_PER_FRAME: u32 = 8;

/// egui reports wheel motion in points; one notch is about this many.
const POINTS_PER_WHEEL_NOTCH: f32 = 50.0;

/// Converts wall-clock time into whole simulation steps.
#[derive(Clone, Copy, Debug)]
pub struct TickClock {
    tick: Duration,
    accumulator: Duration,
}

impl TickClock {
    pub fn new(tick: Duration) -> Self {
        Self { tick: tick.max(Duration::from_nanos(1)), accumulator: Duration::ZERO }
    }

    /// Add `elapsed` and return how many steps are due this frame.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulator += elapsed;
        let mut due = 0;
        while self.accumulator >= self.tick && due < MAX_STEPS_PER_FRAME {
            self.accumulator -= self.tick;
            due += 1;
        }
        if due == MAX_STEPS_PER_FRAME && self.accumulator >= self.tick {
            self.accumulator = Duration::ZERO;
        }
        due
    }
}

/// One-shot input seen between steps, held until a step consumes it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PendingEdges {
    toggle_pause: bool,
    clear: bool,
    wheel: f32,
}

impl PendingEdges {
    pub fn latch(&mut self, toggle_pause: bool, clear: bool, wheel_points: f32) {
        // Two toggles before the next step cancel out.
        self.toggle_pause ^= toggle_pause;
        self.clear |= clear;
        self.wheel += wheel_points / POINTS_PER_WHEEL_NOTCH;
    }

    /// Move the latched edges into `frame` and reset.
    pub fn drain_into(&mut self, frame: &mut InputFrame) {
        frame.toggle_pause = self.toggle_pause;
        frame.clear = self.clear;
        frame.wheel = self.wheel;
        *self = Self::default();
    }
}

/// True when `key` went down this frame.  Auto-repeat presses from a held
/// key do not count, so holding Space toggles pause once.
pub fn fresh_press(events: &[egui::Event], key: egui::Key) -> bool {
    events.iter().any(|e| {
        matches!(e, egui::Event::Key { key: k, pressed: true, repeat: false, .. } if *k == key)
    })
}

/// Map a position inside `rect` to screen space, which spans the canvas
/// extent across the surface.
pub fn surface_to_screen(pos: Pos2, rect: Rect, size: CanvasSize) -> (i32, i32) {
    let w = rect.width().max(1.0);
    let h = rect.height().max(1.0);
    let sx = (pos.x - rect.min.x) / w * size.width as f32;
    let sy = (pos.y - rect.min.y) / h * size.height as f32;
    (sx.floor() as i32, sy.floor() as i32)
}

pub struct PixelizeApp {
    editor: EditorState,
    clock: TickClock,
    last_frame: Instant,
    edges: PendingEdges,
    /// Last pointer position in screen space; kept while the pointer is outside.
    pointer: (i32, i32),
    canvas_rect: Rect,
    texture: Option<TextureHandle>,
    /// Set once a pass fails; the window is closing.
    halted: bool,
}

impl PixelizeApp {
    pub fn new(editor: EditorState, tick: Duration) -> Self {
        let size = editor.size();
        Self {
            editor,
            clock: TickClock::new(tick),
            last_frame: Instant::now(),
            edges: PendingEdges::default(),
            pointer: (0, 0),
            canvas_rect: Rect::from_min_size(
                Pos2::ZERO,
                egui::vec2(size.width as f32, size.height as f32),
            ),
            texture: None,
            halted: false,
        }
    }

    /// Read device state for this frame: held buttons are sampled, edges latched.
    fn sample_input(&mut self, ctx: &egui::Context) -> InputFrame {
        let size = self.editor.size();
        let rect = self.canvas_rect;
        let (pos, primary, secondary, middle, pause, clear, wheel) = ctx.input(|i| {
            (
                i.pointer.latest_pos(),
                i.pointer.primary_down(),
                i.pointer.secondary_down(),
                i.pointer.middle_down(),
                fresh_press(&i.events, egui::Key::Space),
                fresh_press(&i.events, egui::Key::C),
                i.scroll_delta.y,
            )
        });
        if let Some(pos) = pos {
            self.pointer = surface_to_screen(pos, rect, size);
        }
        self.edges.latch(pause, clear, wheel);

        InputFrame {
            pointer: self.pointer,
            paint_held: primary,
            erase_held: secondary,
            pan_held: middle,
            ..InputFrame::default()
        }
    }

    fn run_steps(&mut self, ctx: &egui::Context, held: InputFrame) {
        let now = Instant::now();
        let due = self.clock.advance(now - self.last_frame);
        self.last_frame = now;

        for _ in 0..due {
            let mut frame = held;
            self.edges.drain_into(&mut frame);
            if let Err(e) = self.editor.step(&frame) {
                log_err!("Step failed, shutting down: {}", e);
                eprintln!("pixelize: {e}");
                if let Some(path) = logger::log_path() {
                    eprintln!("pixelize: session log at {}", path.display());
                }
                self.halted = true;
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                return;
            }
        }
    }

    fn upload_frame(&mut self, ctx: &egui::Context) {
        let active = self.editor.canvas().active();
        let image = ColorImage::from_rgba_unmultiplied(
            [active.width() as usize, active.height() as usize],
            active.as_raw(),
        );
        match &mut self.texture {
            Some(tex) => tex.set(image, TextureOptions::NEAREST),
            None => {
                self.texture = Some(ctx.load_texture("pixelize-canvas", image, TextureOptions::NEAREST));
            }
        }
    }
}

impl eframe::App for PixelizeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.halted {
            return;
        }

        let held = self.sample_input(ctx);
        self.run_steps(ctx, held);
        if self.halted {
            return;
        }
        self.upload_frame(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(Color32::BLACK))
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                self.canvas_rect = rect;
                if let Some(tex) = &self.texture {
                    let ([u0, v0], [u1, v1]) = self.editor.viewport().uv_rect(self.editor.size());
                    let uv = Rect::from_min_max(Pos2::new(u0, v0), Pos2::new(u1, v1));
                    ui.painter().image(tex.id(), rect, uv, Color32::WHITE);
                }
                if self.editor.canvas().schedule().is_paused() {
                    ui.painter().text(
                        rect.left_top() + egui::vec2(8.0, 8.0),
                        egui::Align2::LEFT_TOP,
                        "paused",
                        egui::FontId::monospace(14.0),
                        Color32::WHITE,
                    );
                }
            });

        ctx.request_repaint();
    }
}

impl Drop for PixelizeApp {
    fn drop(&mut self) {
        let schedule = self.editor.canvas().schedule();
        log_info!(
            "Session ended after {} steps, {} passes",
            schedule.counter(),
            schedule.passes()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::transform::CpuPixelize;

    #[test]
    fn clock_emits_whole_ticks_and_keeps_remainder() {
        let mut clock = TickClock::new(Duration::from_millis(10));
        assert_eq!(clock.advance(Duration::from_millis(25)), 2);
        assert_eq!(clock.advance(Duration::from_millis(4)), 0);
        assert_eq!(clock.advance(Duration::from_millis(1)), 1);
    }

    #[test]
    fn clock_drops_backlog_after_a_stall() {
        let mut clock = TickClock::new(Duration::from_millis(10));
        assert_eq!(clock.advance(Duration::from_secs(5)), MAX_STEPS_PER_FRAME);
        assert_eq!(clock.advance(Duration::from_millis(9)), 0);
    }

    #[test]
    fn edges_are_consumed_once() {
        let mut edges = PendingEdges::default();
        edges.latch(true, false, 25.0);
        edges.latch(false, true, 25.0);

        let mut frame = InputFrame::default();
        edges.drain_into(&mut frame);
        assert!(frame.toggle_pause && frame.clear);
        assert_eq!(frame.wheel, 1.0);

        let mut next = InputFrame::default();
        edges.drain_into(&mut next);
        assert_eq!(next, InputFrame::default());
    }

    #[test]
    fn double_toggle_between_steps_cancels() {
        let mut edges = PendingEdges::default();
        edges.latch(true, false, 0.0);
        edges.latch(true, false, 0.0);
        let mut frame = InputFrame::default();
        edges.drain_into(&mut frame);
        assert!(!frame.toggle_pause);
    }

    fn key(key: egui::Key, pressed: bool, repeat: bool) -> egui::Event {
        egui::Event::Key { key, pressed, repeat, modifiers: egui::Modifiers::NONE }
    }

    #[test]
    fn only_initial_key_down_counts_as_a_press() {
        use egui::Key;
        assert!(fresh_press(&[key(Key::C, true, false)], Key::C));
        assert!(!fresh_press(&[key(Key::C, true, true)], Key::C));
        assert!(!fresh_press(&[key(Key::C, false, false)], Key::C));
        assert!(!fresh_press(&[key(Key::Space, true, false)], Key::C));
    }

    #[test]
    fn holding_space_toggles_pause_once() {
        let config = EditorConfig { width: 8, height: 8, demo_block: false, ..EditorConfig::default() };
        let editor = EditorState::new(&config, Box::new(CpuPixelize::new(2)));
        let mut app = PixelizeApp::new(editor, Duration::from_millis(10));
        let ctx = egui::Context::default();

        // Space held across four frames: egui marks every press after the
        // first as a repeat because the key never went up.
        let mut toggles = 0;
        for _ in 0..4 {
            let raw = egui::RawInput {
                events: vec![key(egui::Key::Space, true, false)],
                ..Default::default()
            };
            let _ = ctx.run(raw, |ctx| {
                app.sample_input(ctx);
            });
            let mut frame = InputFrame::default();
            app.edges.drain_into(&mut frame);
            if frame.toggle_pause {
                toggles += 1;
            }
        }
        assert_eq!(toggles, 1);
    }

    #[test]
    fn surface_positions_scale_to_canvas_extent() {
        let size = CanvasSize::new(1024, 768);
        let rect = Rect::from_min_size(Pos2::new(10.0, 20.0), egui::vec2(512.0, 384.0));
        assert_eq!(surface_to_screen(Pos2::new(10.0, 20.0), rect, size), (0, 0));
        assert_eq!(surface_to_screen(Pos2::new(60.0, 25.0), rect, size), (100, 10));
        assert_eq!(surface_to_screen(Pos2::new(0.0, 0.0), rect, size), (-20, -40));
    }
}
