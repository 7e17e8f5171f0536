//! Short-term analysis framing shared by the acoustic analyses.
//!
//! Frames are centred in the signal: with `n` frames of step `dt`, the first
//! frame sits at `(duration - (n - 1) * dt) / 2`.

use std::f64::consts::PI;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameGrid {
    pub count: usize,
    pub first_time: f64,
    pub step: f64,
}

impl FrameGrid {
    /// Returns `None` when the signal is shorter than one window.
    pub fn new(duration: f64, window: f64, step: f64) -> Option<Self> {
        if step <= 0.0 || window > duration {
            return None;
        }
        let count = ((duration - window) / step).floor() as usize + 1;
        let first_time = 0.5 * (duration - (count - 1) as f64 * step);
        Some(Self { count, first_time, step })
    }

    pub fn time(&self, frame: usize) -> f64 {
        self.first_time + frame as f64 * self.step
    }
}

/// Copy `len` samples centred on `time`, zero-filled where the span runs off
/// either end of the signal.
pub fn centered_segment(samples: &[f64], sample_rate: f64, time: f64, len: usize) -> Vec<f64> {
    let center = (time * sample_rate).round() as isize;
    let start = center - (len / 2) as isize;
    (0..len as isize)
        .map(|i| {
            let idx = start + i;
            if idx >= 0 && (idx as usize) < samples.len() {
                samples[idx as usize]
            } else {
                0.0
            }
        })
        .collect()
}

/// Largest absolute deviation from the segment mean.
pub fn local_peak(segment: &[f64]) -> f64 {
    let mean = mean(segment);
    segment.iter().fold(0.0f64, |m, s| m.max((s - mean).abs()))
}

pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

pub fn subtract_mean(xs: &mut [f64]) {
    let m = mean(xs);
    for x in xs.iter_mut() {
        *x -= m;
    }
}

pub fn hann_window(size: usize) -> Vec<f64> {
    if size < 2 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / (size - 1) as f64).cos()))
        .collect()
}

/// Gaussian window with edges at `exp(-12)`, rescaled to reach zero.
pub fn gaussian_window(size: usize) -> Vec<f64> {
    let edge = (-12.0f64).exp();
    let mid = 0.5 * (size as f64 + 1.0);
    let half = 0.5 * size as f64;
    (1..=size)
        .map(|i| {
            let x = (i as f64 - mid) / half;
            (((-12.0 * x * x).exp()) - edge) / (1.0 - edge)
        })
        .collect()
}

pub fn kaiser_window(size: usize, beta: f64) -> Vec<f64> {
    if size < 2 {
        return vec![1.0; size];
    }
    let denom = bessel_i0(beta);
    let half = (size - 1) as f64 / 2.0;
    (0..size)
        .map(|i| {
            let x = (i as f64 - half) / half;
            bessel_i0(beta * (1.0 - x * x).max(0.0).sqrt()) / denom
        })
        .collect()
}

/// Modified Bessel function of the first kind, order zero (power series).
pub fn bessel_i0(x: f64) -> f64 {
    let half = x / 2.0;
    let mut sum = 1.0;
    let mut term = 1.0;
    for k in 1..200 {
        term *= half / k as f64;
        let sq = term * term;
        sum += sq;
        if sq < sum * 1e-17 {
            break;
        }
    }
    sum
}
