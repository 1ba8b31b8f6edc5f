//! Filter design and zero-phase application.
//!
//! Butterworth designs come from sci-rs in second-order-section form and are
//! applied with `sosfiltfilt`, the scipy-compatible forward-backward pass
//! with odd reflection padding. Group delay cancels exactly, which the
//! downstream morphology measurements rely on.

use sci_rs::signal::filter::design::{
    butter_dyn, DigitalFilter, FilterBandType, FilterOutputType, Sos, SosFormatFilter,
};
use sci_rs::signal::filter::sosfiltfilt_dyn;
use std::f64::consts::PI;

use crate::error::{CardiaError, Result};

/// Design a Butterworth bandpass in SOS form.
///
/// `order` follows the scipy convention: an order-4 bandpass yields an
/// 8-pole cascade (4 sections).
pub fn bandpass_sos(order: usize, low_hz: f64, high_hz: f64, fs: f64) -> Result<Vec<Sos<f64>>> {
    let nyquist = fs / 2.0;
    if !(low_hz > 0.0 && low_hz < high_hz && high_hz < nyquist) {
        return Err(CardiaError::BadConfig(format!(
            "bandpass cutoffs {}-{} Hz are invalid at fs {} Hz",
            low_hz, high_hz, fs
        )));
    }
    let filter = butter_dyn(
        order,
        vec![low_hz, high_hz],
        Some(FilterBandType::Bandpass),
        Some(false),
        Some(FilterOutputType::Sos),
        Some(fs),
    );
    let DigitalFilter::Sos(SosFormatFilter { sos }) = filter else {
        return Err(CardiaError::BadConfig(
            "butterworth design did not return second-order sections".into(),
        ));
    };
    Ok(sos)
}

/// Design a single-biquad notch (scipy `iirnotch`) at `freq_hz` with quality
/// factor `q`.
pub fn notch_sos(freq_hz: f64, q: f64, fs: f64) -> Result<Vec<Sos<f64>>> {
    if fs <= 0.0 || q <= 0.0 {
        return Err(CardiaError::BadConfig(format!(
            "notch requires positive fs and Q, got fs {} Q {}",
            fs, q
        )));
    }
    let w0 = 2.0 * freq_hz / fs;
    if !(w0 > 0.0 && w0 < 1.0) {
        return Err(CardiaError::BadConfig(format!(
            "notch frequency {} Hz is outside (0, Nyquist) at fs {} Hz",
            freq_hz, fs
        )));
    }
    let bw = (w0 / q) * PI;
    let w0 = w0 * PI;
    let beta = (bw / 2.0).tan();
    let gain = 1.0 / (1.0 + beta);

    let b = [gain, -2.0 * gain * w0.cos(), gain];
    let a = [1.0, -2.0 * gain * w0.cos(), 2.0 * gain - 1.0];
    Ok(vec![Sos::new(b, a)])
}

/// Zero-phase filtering: forward-backward pass over the whole sequence.
pub fn filtfilt(data: &[f64], sos: &[Sos<f64>]) -> Vec<f64> {
    if data.is_empty() {
        return Vec::new();
    }
    sosfiltfilt_dyn(data.iter(), sos)
}

/// Minimum input length `sosfiltfilt` accepts for a cascade of `sections`
/// biquads (one more than the reflection pad on each side).
pub fn min_filtfilt_len(sections: usize) -> usize {
    3 * (2 * sections + 1) + 1
}

/// Centered uniform moving average with nearest-value edge extension.
pub fn centered_moving_average(data: &[f64], win: usize) -> Vec<f64> {
    let n = data.len();
    if n == 0 {
        return Vec::new();
    }
    let win = win.max(1);
    let half = win / 2;
    let mut out = vec![0.0; n];
    for (i, slot) in out.iter_mut().enumerate() {
        let start = i as isize - half as isize;
        let mut acc = 0.0;
        for j in start..start + win as isize {
            let idx = j.clamp(0, n as isize - 1) as usize;
            acc += data[idx];
        }
        *slot = acc / win as f64;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bandpass_rejects_bad_cutoffs() {
        assert!(bandpass_sos(4, 0.5, 40.0, 250.0).is_ok());
        assert!(bandpass_sos(4, 0.5, 40.0, 60.0).is_err());
        assert!(bandpass_sos(4, 40.0, 0.5, 250.0).is_err());
        assert!(bandpass_sos(4, 0.0, 40.0, 250.0).is_err());
    }

    #[test]
    fn notch_has_unity_dc_gain() {
        let sos = notch_sos(60.0, 30.0, 250.0).unwrap();
        // H(z=1) = (b0 + b1 + b2) / (a0 + a1 + a2) must be ~1: the notch
        // only carves out the target frequency.
        let s = &sos[0];
        let num: f64 = s.b.iter().sum();
        let den: f64 = s.a.iter().sum();
        assert!((num / den - 1.0).abs() < 1e-9);
    }

    #[test]
    fn notch_rejects_frequency_beyond_nyquist() {
        assert!(notch_sos(60.0, 30.0, 100.0).is_err());
        assert!(notch_sos(60.0, 30.0, 120.0).is_err());
    }

    #[test]
    fn moving_average_flattens_constant_signal() {
        let data = vec![2.5; 32];
        let out = centered_moving_average(&data, 7);
        assert_eq!(out.len(), 32);
        for v in out {
            assert!((v - 2.5).abs() < 1e-12);
        }
    }

    #[test]
    fn moving_average_extends_edges_with_nearest_value() {
        // A step at the start: the first output uses the first sample for
        // every out-of-range tap.
        let data = vec![1.0, 1.0, 1.0, 5.0, 5.0];
        let out = centered_moving_average(&data, 3);
        assert!((out[0] - 1.0).abs() < 1e-12);
        assert!((out[4] - 5.0).abs() < 1e-12);
    }
}
