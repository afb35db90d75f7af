//! Real-input spectral primitives shared by the cycle detector, the
//! resonance engine and the pulse pattern matcher.
//!
//! The transform is the one-sided DFT of a real series: bins `0..=n/2` of
//! the full complex FFT, with bin frequencies `k / n` (unit sample spacing).

use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;

/// One spectral component: frequency in cycles per round, phase in radians,
/// physical amplitude (`2 * |X_k| / n`).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Harmonic {
    pub frequency: f64,
    pub phase: f64,
    pub amplitude: f64,
}

/// One-sided spectrum of a real-valued series (bins `0..=n/2`).
pub fn rfft(series: &[f64]) -> Vec<Complex64> {
    let n = series.len();
    if n == 0 {
        return Vec::new();
    }
    let mut buf: Vec<Complex64> = series.iter().map(|&v| Complex64::new(v, 0.0)).collect();
    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(n).process(&mut buf);
    buf.truncate(n / 2 + 1);
    buf
}

/// Frequencies of the one-sided bins for an `n`-sample series.
pub fn bin_frequencies(n: usize) -> Vec<f64> {
    (0..=n / 2).map(|k| k as f64 / n as f64).collect()
}

/// Series minus its mean; removes the DC component before spectral analysis.
pub fn mean_centered(series: &[f64]) -> Vec<f64> {
    if series.is_empty() {
        return Vec::new();
    }
    let m = series.iter().sum::<f64>() / series.len() as f64;
    series.iter().map(|v| v - m).collect()
}

/// Index of the maximum-magnitude bin, excluding the DC bin. None when the
/// spectrum has no non-DC bins.
pub fn dominant_bin(spectrum: &[Complex64]) -> Option<usize> {
    if spectrum.len() < 2 {
        return None;
    }
    let mut best = 1;
    let mut best_mag = spectrum[1].norm();
    for (k, c) in spectrum.iter().enumerate().skip(2) {
        let mag = c.norm();
        if mag > best_mag {
            best = k;
            best_mag = mag;
        }
    }
    Some(best)
}

/// Indices of the `k` largest-magnitude non-DC bins, strongest first.
pub fn top_bins(spectrum: &[Complex64], k: usize) -> Vec<usize> {
    let mut indexed: Vec<(usize, f64)> = spectrum
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, c)| (i, c.norm()))
        .collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    indexed.into_iter().take(k).map(|(i, _)| i).collect()
}

/// Builds the [`Harmonic`] for bin `idx` of an `n`-sample series' spectrum.
pub fn harmonic_at(spectrum: &[Complex64], n: usize, idx: usize) -> Harmonic {
    let freqs_step = 1.0 / n as f64;
    Harmonic {
        frequency: idx as f64 * freqs_step,
        phase: spectrum[idx].arg(),
        amplitude: 2.0 * spectrum[idx].norm() / n as f64,
    }
}
