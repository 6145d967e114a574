//! Numeric and transform formatting for SVG attribute values.
//!
//! Output strings must be deterministic and as short as sufficient so
//! repeated renders of the same page serialize identically.

use crate::utils::Matrix;

/// Formats a float with up to ten decimal places, trimming trailing
/// zeros (and a trailing dot) so integers print bare.
pub fn pf(value: f64) -> String {
    // Negative zero would otherwise print as "-0".
    let value = if value == 0.0 { 0.0 } else { value };
    if value.fract() == 0.0 {
        return format!("{value}");
    }
    let s = format!("{value:.10}");
    let s = s.trim_end_matches('0');
    s.trim_end_matches('.').to_string()
}

/// Formats a matrix as an SVG `transform` value, recognizing the
/// identity, pure-scale, pure-rotation, and pure-translation cases.
pub fn pm(m: Matrix) -> String {
    let (a, b, c, d, e, f) = m;
    if e == 0.0 && f == 0.0 {
        if b == 0.0 && c == 0.0 {
            if a == 1.0 && d == 1.0 {
                return String::new();
            }
            return format!("scale({} {})", pf(a), pf(d));
        }
        if a == d && b == -c {
            let angle = a.acos() * 180.0 / std::f64::consts::PI;
            return format!("rotate({})", pf(angle));
        }
    } else if a == 1.0 && b == 0.0 && c == 0.0 && d == 1.0 {
        return format!("translate({} {})", pf(e), pf(f));
    }
    format!(
        "matrix({} {} {} {} {} {})",
        pf(a),
        pf(b),
        pf(c),
        pf(d),
        pf(e),
        pf(f)
    )
}

/// Formats 0-255 RGB components as a lowercase hex color.
pub fn make_hex_color(r: f64, g: f64, b: f64) -> String {
    format!(
        "#{:02x}{:02x}{:02x}",
        r.round().clamp(0.0, 255.0) as u8,
        g.round().clamp(0.0, 255.0) as u8,
        b.round().clamp(0.0, 255.0) as u8
    )
}
