#![allow(dead_code)]

use ndarray::Array2;

/// Sampled 2D Gaussian of unit peak centered at `(cy, cx)` (row, col).
pub fn gaussian_spot(h: usize, w: usize, cy: f64, cx: f64, sigma: f64) -> Array2<f64> {
    let s2 = 2.0 * sigma * sigma;
    Array2::from_shape_fn((h, w), |(r, c)| {
        let dy = r as f64 - cy;
        let dx = c as f64 - cx;
        (-(dy * dy + dx * dx) / s2).exp()
    })
}

/// Bilinear sample with zero outside the image.
pub fn bilinear_sample(data: &Array2<f64>, y: f64, x: f64) -> f64 {
    let (h, w) = data.dim();

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let sample = |r: i64, c: i64| -> f64 {
        if r >= 0 && r < h as i64 && c >= 0 && c < w as i64 {
            data[[r as usize, c as usize]]
        } else {
            0.0
        }
    };

    sample(y0, x0) * (1.0 - fx) * (1.0 - fy)
        + sample(y0, x0 + 1) * fx * (1.0 - fy)
        + sample(y0 + 1, x0) * (1.0 - fx) * fy
        + sample(y0 + 1, x0 + 1) * fx * fy
}

/// Shift an array by `(dy, dx)` using bilinear interpolation.
pub fn shift_array(data: &Array2<f64>, dy: f64, dx: f64) -> Array2<f64> {
    let (h, w) = data.dim();
    Array2::from_shape_fn((h, w), |(r, c)| {
        bilinear_sample(data, r as f64 - dy, c as f64 - dx)
    })
}

/// Scale and round to 16-bit counts.
pub fn to_u16(data: &Array2<f64>, scale: f64) -> Array2<u16> {
    data.mapv(|v| (v * scale).round().clamp(0.0, u16::MAX as f64) as u16)
}

/// Deterministic non-negative test pattern, no RNG needed.
pub fn pattern(h: usize, w: usize) -> Array2<f64> {
    Array2::from_shape_fn((h, w), |(r, c)| ((r * 7 + c * 13 + r * c) % 11) as f64 / 10.0)
}
