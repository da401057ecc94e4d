//! Sub-pixel translation via the Fourier shift theorem.
//!
//! Shifting a signal by `d` multiplies bin `k` of its spectrum by
//! `exp(-i * w_k * d)`, where `w_k` is the bin's signed angular frequency.
//! Derivatives with respect to `d` therefore only scale each bin by
//! `-i * w_k`, which is what makes the cost gradient and Hessian analytic.

use std::f64::consts::TAU;

use ndarray::{Array2, Zip};
use num_complex::Complex64;

use crate::frame::FocusOffset;

/// Signed angular frequency of every bin of an `n`-point DFT, in FFT order.
pub fn angular_frequencies(n: usize) -> Vec<f64> {
    let positive = n.div_ceil(2);
    (0..n)
        .map(|k| {
            let signed = if k < positive {
                k as f64
            } else {
                k as f64 - n as f64
            };
            TAU * signed / n as f64
        })
        .collect()
}

/// Spectrum of the target image translated by the last requested offset.
///
/// The cache key is the exact offset pair; any different offset recomputes
/// the whole spectrum.
pub struct FourierShift {
    freq_y: Vec<f64>,
    freq_x: Vec<f64>,
    phase_y: Vec<Complex64>,
    phase_x: Vec<Complex64>,
    shifted: Array2<Complex64>,
    key: Option<FocusOffset>,
    updates: usize,
}

impl FourierShift {
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            freq_y: angular_frequencies(height),
            freq_x: angular_frequencies(width),
            phase_y: vec![Complex64::new(1.0, 0.0); height],
            phase_x: vec![Complex64::new(1.0, 0.0); width],
            shifted: Array2::zeros((height, width)),
            key: None,
            updates: 0,
        }
    }

    pub fn freq_y(&self) -> &[f64] {
        &self.freq_y
    }

    pub fn freq_x(&self) -> &[f64] {
        &self.freq_x
    }

    pub fn shifted(&self) -> &Array2<Complex64> {
        &self.shifted
    }

    /// Number of times the shifted spectrum has been rebuilt.
    pub fn updates(&self) -> usize {
        self.updates
    }

    /// Forget the cached offset, e.g. after the target spectrum changed.
    pub fn invalidate(&mut self) {
        self.key = None;
    }

    /// Make `shifted()` hold `target` translated by `offset`.
    ///
    /// Returns `true` when the spectrum had to be recomputed.
    pub fn update(&mut self, target: &Array2<Complex64>, offset: FocusOffset) -> bool {
        if self.key == Some(offset) {
            return false;
        }

        for (phase, &w) in self.phase_y.iter_mut().zip(&self.freq_y) {
            *phase = Complex64::from_polar(1.0, -w * offset.dy);
        }
        for (phase, &w) in self.phase_x.iter_mut().zip(&self.freq_x) {
            *phase = Complex64::from_polar(1.0, -w * offset.dx);
        }

        let phase_y = &self.phase_y;
        let phase_x = &self.phase_x;
        Zip::indexed(&mut self.shifted)
            .and(target)
            .for_each(|(row, col), out, &t| {
                *out = t * phase_y[row] * phase_x[col];
            });

        self.key = Some(offset);
        self.updates += 1;
        true
    }
}
