// ============================================================================
// LINE RASTERIZER - integer Bresenham segments for freehand strokes
// ============================================================================
//
// The pointer is only sampled once per simulation step, so a fast drag can
// jump dozens of pixels between samples.  Each stroke segment is filled with
// the 8-connected line between the two samples so the stroke never has gaps.

/// Visit every pixel on the 8-connected line from `(x0, y0)` to `(x1, y1)`.
///
/// Both endpoints are included and each coordinate is visited exactly once.
/// A zero-length segment visits its single point.  The error term is kept in
/// `i64` so endpoints anywhere in the `i32` range cannot overflow.
pub fn draw_line<F: FnMut(i32, i32)>(x0: i32, y0: i32, x1: i32, y1: i32, mut plot: F) {
    let dx = (x1 as i64 - x0 as i64).abs();
    let dy = -(y1 as i64 - y0 as i64).abs();
    let sx: i32 = if x0 < x1 { 1 } else { -1 };
    let sy: i32 = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let (mut x, mut y) = (x0, y0);
    loop {
        plot(x, y);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}
