// ============================================================================
// VIEWPORT - zoom/pan state and screen <-> canvas mapping
// ============================================================================
//
// Screen space spans the canvas extent across the output surface at zoom 1.
// At zoom `s` the surface shows a window of `extent / s` canvas pixels
// starting at the pan offset.  All mutation goes through `pan` and `zoom`,
// which clamp, so scale and offsets are always valid for the canvas.

use crate::canvas::CanvasSize;

pub const MIN_SCALE: f32 = 1.0;
pub const MAX_SCALE: f32 = 10.0;

/// Pan moves the view by half the raw pointer delta.
pub const PAN_DAMPING: i32 = 2;

/// One wheel notch changes the scale by 1/10.
pub const ZOOM_STEP_DIVISOR: f32 = 10.0;

/// Canvas-space rectangle, `[x, x + width) × [y, y + height)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportState {
    scale: f32,
    offset_x: i32,
    offset_y: i32,
}

/// Number of canvas pixels visible along an axis of length `extent` at `scale`.
/// Never less than one, so a canvas smaller than the zoom still shows a pixel.
fn visible_extent(extent: u32, scale: f32) -> i32 {
    ((extent as f32 / scale) as i32).max(1)
}

impl ViewportState {
    /// Start at `scale` (clamped) with the view anchored at the canvas origin.
    pub fn new(scale: f32) -> Self {
        let scale = if scale.is_finite() { scale.clamp(MIN_SCALE, MAX_SCALE) } else { MIN_SCALE };
        Self { scale, offset_x: 0, offset_y: 0 }
    }

    pub fn scale(&self) -> f32 { self.scale }
    pub fn offset(&self) -> (i32, i32) { (self.offset_x, self.offset_y) }

    /// Map a screen-space point to canvas space with the current zoom and pan.
    /// Points outside the surface map outside the canvas; callers clip.
    pub fn to_canvas(&self, sx: i32, sy: i32, size: CanvasSize) -> (i32, i32) {
        let scaled_w = size.width as f32 / self.scale;
        let scaled_h = size.height as f32 / self.scale;
        let cx = self.offset_x + (scaled_w * sx as f32 / size.width as f32) as i32;
        let cy = self.offset_y + (scaled_h * sy as f32 / size.height as f32) as i32;
        (cx, cy)
    }

    /// The part of the canvas currently shown, clipped to the canvas.
    pub fn visible_rect(&self, size: CanvasSize) -> ViewRect {
        let x = self.offset_x.clamp(0, size.width as i32) as u32;
        let y = self.offset_y.clamp(0, size.height as i32) as u32;
        let w = visible_extent(size.width, self.scale).max(0) as u32;
        let h = visible_extent(size.height, self.scale).max(0) as u32;
        ViewRect {
            x,
            y,
            width: w.min(size.width - x),
            height: h.min(size.height - y),
        }
    }

    /// Visible rectangle as normalized texture coordinates `[min, max]`.
    pub fn uv_rect(&self, size: CanvasSize) -> ([f32; 2], [f32; 2]) {
        let r = self.visible_rect(size);
        let (w, h) = (size.width.max(1) as f32, size.height.max(1) as f32);
        (
            [r.x as f32 / w, r.y as f32 / h],
            [(r.x + r.width) as f32 / w, (r.y + r.height) as f32 / h],
        )
    }

    /// Keep `0 <= offset <= extent - extent / scale` on both axes.
    pub fn clamp_offset(&mut self, size: CanvasSize) {
        let max_x = (size.width as i32 - visible_extent(size.width, self.scale)).max(0);
        let max_y = (size.height as i32 - visible_extent(size.height, self.scale)).max(0);
        self.offset_x = self.offset_x.clamp(0, max_x);
        self.offset_y = self.offset_y.clamp(0, max_y);
    }

    /// Drag the view by a raw screen-space pointer delta.
    pub fn pan(&mut self, dx: i32, dy: i32, size: CanvasSize) {
        self.offset_x = self.offset_x.saturating_sub(dx / PAN_DAMPING);
        self.offset_y = self.offset_y.saturating_sub(dy / PAN_DAMPING);
        self.clamp_offset(size);
    }

    /// Apply a wheel delta in notches; positive zooms in.
    pub fn zoom(&mut self, wheel: f32, size: CanvasSize) {
        if wheel == 0.0 || !wheel.is_finite() {
            return;
        }
        self.scale = (self.scale + wheel / ZOOM_STEP_DIVISOR).clamp(MIN_SCALE, MAX_SCALE);
        self.clamp_offset(size);
    }
}

impl Default for ViewportState {
    fn default() -> Self {
        Self::new(MIN_SCALE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: CanvasSize = CanvasSize { width: 1024, height: 768 };

    fn assert_valid(vp: &ViewportState) {
        assert!((MIN_SCALE..=MAX_SCALE).contains(&vp.scale()));
        let (ox, oy) = vp.offset();
        let max_x = SIZE.width as i32 - visible_extent(SIZE.width, vp.scale());
        let max_y = SIZE.height as i32 - visible_extent(SIZE.height, vp.scale());
        assert!(ox >= 0 && ox <= max_x, "offset_x {ox} outside [0, {max_x}]");
        assert!(oy >= 0 && oy <= max_y, "offset_y {oy} outside [0, {max_y}]");
    }

    #[test]
    fn identity_mapping_at_scale_one() {
        let vp = ViewportState::new(1.0);
        assert_eq!(vp.to_canvas(100, 10, SIZE), (100, 10));
        assert_eq!(vp.to_canvas(1023, 767, SIZE), (1023, 767));
        assert_eq!(vp.to_canvas(-5, 900, SIZE), (-5, 900));
    }

    #[test]
    fn zoomed_mapping_divides_and_adds_offset() {
        let mut vp = ViewportState::new(2.0);
        assert_eq!(vp.to_canvas(100, 50, SIZE), (50, 25));
        vp.pan(-200, -100, SIZE); // offset += (100, 50)
        assert_eq!(vp.offset(), (100, 50));
        assert_eq!(vp.to_canvas(100, 50, SIZE), (150, 75));
    }

    #[test]
    fn pan_is_damped_by_half_and_truncates() {
        let mut vp = ViewportState::new(4.0);
        vp.pan(-21, -3, SIZE);
        assert_eq!(vp.offset(), (10, 1));
        vp.pan(1, 1, SIZE); // 1 / 2 == 0
        assert_eq!(vp.offset(), (10, 1));
    }

    #[test]
    fn offset_collapses_at_scale_one() {
        let mut vp = ViewportState::new(1.0);
        vp.pan(-500, -500, SIZE);
        assert_eq!(vp.offset(), (0, 0));
    }

    #[test]
    fn pan_stops_at_far_edge() {
        let mut vp = ViewportState::new(2.0);
        vp.pan(-100_000, -100_000, SIZE);
        assert_eq!(vp.offset(), (512, 384));
        vp.pan(100_000, 100_000, SIZE);
        assert_eq!(vp.offset(), (0, 0));
    }

    #[test]
    fn canvas_smaller_than_zoom_keeps_one_visible_pixel() {
        let tiny = CanvasSize::new(1, 1);
        let mut vp = ViewportState::new(10.0);
        vp.pan(-100, -100, tiny);
        assert_eq!(vp.offset(), (0, 0));
        assert_eq!(vp.visible_rect(tiny), ViewRect { x: 0, y: 0, width: 1, height: 1 });
        assert_eq!(vp.uv_rect(tiny), ([0.0, 0.0], [1.0, 1.0]));
        assert!(tiny.contains(vp.to_canvas(0, 0, tiny).0, vp.to_canvas(0, 0, tiny).1));

        let strip = CanvasSize::new(300, 5);
        vp.pan(-10_000, -10_000, strip);
        assert_eq!(vp.offset(), (270, 4));
        assert_eq!(vp.visible_rect(strip), ViewRect { x: 270, y: 4, width: 30, height: 1 });
    }

    #[test]
    fn zoom_steps_by_tenths_and_clamps() {
        let mut vp = ViewportState::new(1.0);
        vp.zoom(5.0, SIZE);
        assert!((vp.scale() - 1.5).abs() < 1e-6);
        vp.zoom(1000.0, SIZE);
        assert_eq!(vp.scale(), MAX_SCALE);
        vp.zoom(-1000.0, SIZE);
        assert_eq!(vp.scale(), MIN_SCALE);
        vp.zoom(f32::NAN, SIZE);
        assert_eq!(vp.scale(), MIN_SCALE);
    }

    #[test]
    fn zooming_out_pulls_offset_back_in_range() {
        let mut vp = ViewportState::new(10.0);
        vp.pan(-100_000, -100_000, SIZE);
        assert_eq!(vp.offset(), (1024 - 102, 768 - 76));
        vp.zoom(-80.0, SIZE); // back to 2.0
        assert_valid(&vp);
        assert_eq!(vp.offset(), (512, 384));
    }

    #[test]
    fn offsets_stay_valid_under_mixed_input() {
        let mut vp = ViewportState::new(1.0);
        let moves = [
            (3.0, -400, 120),
            (7.0, 900, -33),
            (-2.5, -1500, -1500),
            (20.0, 77, 4000),
            (-4.0, -9, -9),
            (-100.0, 300, 300),
            (0.1, -3000, -3000),
        ];
        for &(wheel, dx, dy) in &moves {
            vp.zoom(wheel, SIZE);
            assert_valid(&vp);
            vp.pan(dx, dy, SIZE);
            assert_valid(&vp);
        }
    }

    #[test]
    fn visible_rect_and_uv_follow_the_view() {
        let mut vp = ViewportState::new(4.0);
        vp.pan(-64, -32, SIZE);
        let r = vp.visible_rect(SIZE);
        assert_eq!(r, ViewRect { x: 32, y: 16, width: 256, height: 192 });
        let (min, max) = vp.uv_rect(SIZE);
        assert_eq!(min, [32.0 / 1024.0, 16.0 / 768.0]);
        assert_eq!(max, [288.0 / 1024.0, 208.0 / 768.0]);

        let full = ViewportState::new(1.0).visible_rect(SIZE);
        assert_eq!(full, ViewRect { x: 0, y: 0, width: 1024, height: 768 });
    }

    #[test]
    fn non_finite_initial_scale_falls_back_to_one() {
        assert_eq!(ViewportState::new(f32::INFINITY).scale(), MIN_SCALE);
        assert_eq!(ViewportState::new(0.2).scale(), MIN_SCALE);
        assert_eq!(ViewportState::new(42.0).scale(), MAX_SCALE);
    }
}
