//! End-to-end editor scenarios driven through the public library API with a
//! deterministic CPU transform in place of the GPU program.

use image::{Rgba, RgbaImage};

use pixelize::config::EditorConfig;
use pixelize::editor::EditorState;
use pixelize::error::EditorError;
use pixelize::input::{InputFrame, StrokeMode};
use pixelize::line::draw_line;
use pixelize::transform::{CpuPixelize, PixelTransform};
use pixelize::viewport::{MAX_SCALE, MIN_SCALE};

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Copies the source and counts how often it ran.
struct CopyPass {
    calls: std::rc::Rc<std::cell::Cell<u32>>,
}

impl PixelTransform for CopyPass {
    fn name(&self) -> &str {
        "copy"
    }

    fn apply(&mut self, src: &RgbaImage, dst: &mut RgbaImage) -> Result<(), EditorError> {
        self.calls.set(self.calls.get() + 1);
        dst.copy_from_slice(src.as_raw());
        Ok(())
    }
}

fn reference_config() -> EditorConfig {
    EditorConfig {
        demo_block: false,
        ..EditorConfig::default()
    }
}

fn counting_editor(config: &EditorConfig) -> (EditorState, std::rc::Rc<std::cell::Cell<u32>>) {
    let calls = std::rc::Rc::new(std::cell::Cell::new(0));
    let editor = EditorState::new(config, Box::new(CopyPass { calls: calls.clone() }));
    (editor, calls)
}

fn idle() -> InputFrame {
    InputFrame::at(0, 0)
}

#[test]
fn paint_drag_marks_the_line_and_first_pass_lands_on_step_ten() {
    let config = reference_config();
    let (mut editor, calls) = counting_editor(&config);

    // Step 1: pointer arrives at the stroke start without a button held.
    editor.step(&InputFrame::at(100, 10)).unwrap();
    // Step 2: drag to (130, 19) with paint held.
    let drag = InputFrame { paint_held: true, ..InputFrame::at(130, 19) };
    let outcome = editor.step(&drag).unwrap();
    assert_eq!(outcome.mode, StrokeMode::Paint);
    assert!(!outcome.pass_ran);

    let mut expected = Vec::new();
    draw_line(130, 19, 100, 10, |x, y| expected.push((x, y)));
    assert_eq!(expected.len(), 31);
    for &(x, y) in &expected {
        assert_eq!(*editor.canvas().active().get_pixel(x as u32, y as u32), RED, "({x},{y})");
    }
    let red = editor.canvas().active().pixels().filter(|p| **p == RED).count();
    assert_eq!(red, expected.len());

    for step in 3..=9 {
        let outcome = editor.step(&idle()).unwrap();
        assert!(!outcome.pass_ran, "no pass expected on step {step}");
    }
    assert_eq!(editor.canvas().active_index(), 0);

    let outcome = editor.step(&idle()).unwrap();
    assert!(outcome.pass_ran);
    assert_eq!(calls.get(), 1);
    assert_eq!(editor.canvas().schedule().passes(), 1);
    assert_eq!(editor.canvas().active_index(), 1);

    // The copy carried the stroke into the new active buffer.
    for &(x, y) in &expected {
        assert_eq!(*editor.canvas().active().get_pixel(x as u32, y as u32), RED);
    }
}

#[test]
fn stroke_on_a_pass_step_is_seen_by_that_pass() {
    let config = EditorConfig { cadence: 2, ..reference_config() };
    let (mut editor, _) = counting_editor(&config);

    editor.step(&InputFrame::at(40, 40)).unwrap();
    let paint = InputFrame { paint_held: true, ..InputFrame::at(40, 40) };
    let outcome = editor.step(&paint).unwrap();

    assert!(outcome.pass_ran);
    assert_eq!(*editor.canvas().active().get_pixel(40, 40), RED);
}

#[test]
fn clear_wipes_the_active_buffer_even_when_paused() {
    let config = EditorConfig { demo_block: true, ..reference_config() };
    let (mut editor, calls) = counting_editor(&config);
    assert!(editor.canvas().active().pixels().any(|p| *p == RED));

    editor.step(&InputFrame { toggle_pause: true, ..idle() }).unwrap();
    editor.step(&InputFrame { clear: true, ..idle() }).unwrap();

    assert!(editor.canvas().schedule().is_paused());
    assert!(editor.canvas().active().pixels().all(|p| *p == config.erase_color));
    assert_eq!(calls.get(), 0);
}

#[test]
fn pausing_keeps_the_original_phase() {
    let config = EditorConfig { cadence: 10, ..reference_config() };
    let (mut editor, _) = counting_editor(&config);

    let mut pass_steps = Vec::new();
    for step in 1..=40u64 {
        let mut frame = idle();
        // Pause over steps 8..=23, covering the step-10 and step-20 passes.
        frame.toggle_pause = step == 8 || step == 24;
        if editor.step(&frame).unwrap().pass_ran {
            pass_steps.push(step);
        }
    }
    assert_eq!(pass_steps, vec![30, 40]);
    assert_eq!(editor.canvas().schedule().counter(), 40);
}

#[test]
fn viewport_stays_clamped_through_zoom_and_pan() {
    let config = reference_config();
    let (mut editor, _) = counting_editor(&config);
    let size = editor.size();

    let frames = [
        InputFrame { wheel: 40.0, ..InputFrame::at(500, 400) },
        InputFrame { pan_held: true, ..InputFrame::at(-3000, -3000) },
        InputFrame { wheel: 500.0, ..InputFrame::at(0, 0) },
        InputFrame { pan_held: true, ..InputFrame::at(5000, 5000) },
        InputFrame { wheel: -35.0, ..InputFrame::at(10, 10) },
        InputFrame { pan_held: true, ..InputFrame::at(-9000, 20) },
        InputFrame { wheel: -1000.0, ..InputFrame::at(0, 0) },
    ];
    for frame in &frames {
        editor.step(frame).unwrap();
        let vp = editor.viewport();
        assert!((MIN_SCALE..=MAX_SCALE).contains(&vp.scale()));
        let (ox, oy) = vp.offset();
        let max_x = size.width as i32 - (size.width as f32 / vp.scale()) as i32;
        let max_y = size.height as i32 - (size.height as f32 / vp.scale()) as i32;
        assert!((0..=max_x).contains(&ox), "offset_x {ox} > {max_x}");
        assert!((0..=max_y).contains(&oy), "offset_y {oy} > {max_y}");
    }
    assert_eq!(editor.viewport().scale(), MIN_SCALE);
    assert_eq!(editor.viewport().offset(), (0, 0));
}

#[test]
fn cpu_pixelize_averages_the_stroke_into_cells() {
    let config = EditorConfig { cadence: 1, pixel_size: 4, ..reference_config() };
    let mut editor = EditorState::new(&config, Box::new(CpuPixelize::new(config.pixel_size)));

    editor.step(&InputFrame::at(0, 0)).unwrap();
    // A fresh pass ran on step 1; paint one pixel, which the step-2 pass spreads
    // over its 4x4 cell at 1/16 strength.
    let paint = InputFrame { paint_held: true, ..InputFrame::at(0, 0) };
    editor.step(&paint).unwrap();

    let active = editor.canvas().active();
    let cell = *active.get_pixel(3, 3);
    assert_eq!(cell, *active.get_pixel(0, 0));
    assert!(cell[0] > 0 && cell[0] < 255);
    assert_eq!(*active.get_pixel(4, 0), config.erase_color);
}
