//! Geometry routines shared across the renderer.
//!
//! Provides the affine matrix algebra driving both coordinate systems
//! (user space and text space), rectangle helpers, the 2D scale
//! decomposition used by tiling patterns, and path bounding boxes.

/// A 2D point (x, y).
pub type Point = (f64, f64);

/// A rectangle defined by (x0, y0, x1, y1).
pub type Rect = (f64, f64, f64, f64);

/// A 6-element affine transformation matrix (a, b, c, d, e, f).
/// Transforms point (x, y) to (ax + cy + e, bx + dy + f).
pub type Matrix = (f64, f64, f64, f64, f64, f64);

/// Identity transformation matrix.
pub const MATRIX_IDENTITY: Matrix = (1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

/// Default font unit-to-text-space scale (1/1000).
pub const FONT_IDENTITY_MATRIX: Matrix = (0.001, 0.0, 0.0, 0.001, 0.0, 0.0);

/// Multiplies two matrices so that `m1` is applied first, then `m0`.
///
/// Right-composing a matrix onto a CTM is `mult_matrix(m, ctm)`.
pub fn mult_matrix(m1: Matrix, m0: Matrix) -> Matrix {
    let (a1, b1, c1, d1, e1, f1) = m1;
    let (a0, b0, c0, d0, e0, f0) = m0;
    (
        a0 * a1 + c0 * b1,
        b0 * a1 + d0 * b1,
        a0 * c1 + c0 * d1,
        b0 * c1 + d0 * d1,
        a0 * e1 + c0 * f1 + e0,
        b0 * e1 + d0 * f1 + f0,
    )
}

/// Applies a matrix to a point.
pub fn apply_matrix_pt(m: Matrix, v: Point) -> Point {
    let (a, b, c, d, e, f) = m;
    let (x, y) = v;
    (a * x + c * y + e, b * x + d * y + f)
}

/// Applies a matrix to a rectangle.
///
/// The result is the axis-aligned rectangle that tightly fits the
/// transformed corners, not a rotated rectangle.
pub fn apply_matrix_rect(m: Matrix, rect: Rect) -> Rect {
    let (x0, y0, x1, y1) = rect;
    let corners = [
        apply_matrix_pt(m, (x0, y0)),
        apply_matrix_pt(m, (x1, y0)),
        apply_matrix_pt(m, (x1, y1)),
        apply_matrix_pt(m, (x0, y1)),
    ];
    get_bound(corners)
}

/// Inverts a 2x3 affine matrix. Returns `None` when the linear part is
/// singular.
pub fn invert_matrix(m: Matrix) -> Option<Matrix> {
    let (a, b, c, d, e, f) = m;
    let det = a * d - b * c;
    if det == 0.0 {
        return None;
    }
    Some((
        d / det,
        -b / det,
        -c / det,
        a / det,
        (c * f - d * e) / det,
        (b * e - a * f) / det,
    ))
}

/// Extracts the singular values of the linear part of a matrix, largest
/// first. The eigenvalues of `M^T M` come from the characteristic
/// quadratic; a zero eigenvalue falls back to 1 so degenerate pattern
/// matrices never divide by zero downstream.
pub fn singular_values(m: Matrix) -> (f64, f64) {
    let (m0, m1, m2, m3, _, _) = m;
    let a = m0 * m0 + m1 * m1;
    let b = m0 * m2 + m1 * m3;
    let c = m2 * m0 + m3 * m1;
    let d = m2 * m2 + m3 * m3;
    let first = (a + d) / 2.0;
    let second = ((a + d) * (a + d) - 4.0 * (a * d - c * b)).max(0.0).sqrt() / 2.0;
    let mut sx = first + second;
    let mut sy = first - second;
    if sx == 0.0 {
        sx = 1.0;
    }
    if sy == 0.0 {
        sy = 1.0;
    }
    (sx.sqrt(), sy.sqrt())
}

/// Orders a rectangle so that x0 <= x1 and y0 <= y1.
pub fn normalize_rect(rect: Rect) -> Rect {
    let (x0, y0, x1, y1) = rect;
    (x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
}

/// Computes a minimal rectangle that covers all the points.
pub fn get_bound<I: IntoIterator<Item = Point>>(pts: I) -> Rect {
    let mut x0 = f64::MAX;
    let mut y0 = f64::MAX;
    let mut x1 = -f64::MAX;
    let mut y1 = -f64::MAX;

    for (x, y) in pts {
        x0 = x0.min(x);
        y0 = y0.min(y);
        x1 = x1.max(x);
        y1 = y1.max(y);
    }

    (x0, y0, x1, y1)
}

/// Path segment for graphics operations, in user-space coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// Move to point (x, y)
    MoveTo(f64, f64),
    /// Line to point (x, y)
    LineTo(f64, f64),
    /// Cubic bezier curve (x1, y1, x2, y2, x3, y3)
    CurveTo(f64, f64, f64, f64, f64, f64),
    /// Close path
    ClosePath,
}

/// Computes the bounding box of a path after transforming it by `m`,
/// including cubic Bezier extrema. Returns `None` for an empty path.
pub fn path_bbox(segments: &[PathSegment], m: Matrix) -> Option<Rect> {
    let mut pts: Vec<Point> = Vec::new();
    let mut cur = (0.0, 0.0);

    for seg in segments {
        match *seg {
            PathSegment::MoveTo(x, y) | PathSegment::LineTo(x, y) => {
                cur = apply_matrix_pt(m, (x, y));
                pts.push(cur);
            }
            PathSegment::CurveTo(x1, y1, x2, y2, x3, y3) => {
                let p0 = cur;
                let p1 = apply_matrix_pt(m, (x1, y1));
                let p2 = apply_matrix_pt(m, (x2, y2));
                let p3 = apply_matrix_pt(m, (x3, y3));
                pts.push(p3);
                let mut visit = |t: f64| {
                    pts.push((
                        cubic_at(p0.0, p1.0, p2.0, p3.0, t),
                        cubic_at(p0.1, p1.1, p2.1, p3.1, t),
                    ));
                };
                cubic_extrema(p0.0, p1.0, p2.0, p3.0, &mut visit);
                cubic_extrema(p0.1, p1.1, p2.1, p3.1, &mut visit);
                cur = p3;
            }
            PathSegment::ClosePath => {}
        }
    }

    if pts.is_empty() {
        return None;
    }
    Some(get_bound(pts))
}

/// Evaluates one coordinate of a cubic Bezier at parameter `t`.
fn cubic_at(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Finds the interior parameters where the cubic's derivative along one
/// axis vanishes and feeds them to `visit`.
fn cubic_extrema(p0: f64, p1: f64, p2: f64, p3: f64, visit: &mut impl FnMut(f64)) {
    // Derivative is a quadratic: at^2 + bt + c.
    let a = 3.0 * (-p0 + 3.0 * p1 - 3.0 * p2 + p3);
    let b = 6.0 * (p0 - 2.0 * p1 + p2);
    let c = 3.0 * (p1 - p0);

    if a == 0.0 {
        if b != 0.0 {
            let t = -c / b;
            if t > 0.0 && t < 1.0 {
                visit(t);
            }
        }
        return;
    }

    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return;
    }
    let sqrt_disc = disc.sqrt();
    for t in [(-b + sqrt_disc) / (2.0 * a), (-b - sqrt_disc) / (2.0 * a)] {
        if t > 0.0 && t < 1.0 {
            visit(t);
        }
    }
}
