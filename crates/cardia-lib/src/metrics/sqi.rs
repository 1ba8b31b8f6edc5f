//! Beat-referenced signal-quality indices.
//!
//! Quality is graded against the detected beats rather than generic
//! waveform statistics: how far the QRS windows stand out of the
//! isoelectric floor, how consistent the R amplitudes and RR intervals
//! are, how much energy sits in the QRS band, and whether any
//! single-sample jump outruns the QRS amplitude scale (electrode
//! artifacts step faster than the heart can).

use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};

use crate::signal::RRSeries;
use crate::stats;

/// Half-width of the beat window around each R peak (seconds); matches the
/// detector's R relocation radius.
const BEAT_WINDOW_S: f64 = 0.08;
/// QRS energy band (Hz), same band the detector isolates.
const QRS_BAND_LOW_HZ: f64 = 5.0;
const QRS_BAND_HIGH_HZ: f64 = 15.0;
/// A single-sample jump beyond this fraction of the mean R amplitude is an
/// artifact; physiological QRS slopes stay well under it.
const ARTIFACT_JUMP_FRACTION: f64 = 0.5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SqiMetrics {
    /// Mean power inside the beat windows over mean power outside them.
    pub beat_snr: f64,
    /// Coefficient of variation of the R-peak amplitudes.
    pub r_amplitude_cv: f64,
    /// Coefficient of variation of the RR intervals.
    pub rr_cv: f64,
    /// Fraction of total spectral power inside the QRS band.
    pub qrs_band_power_ratio: f64,
    /// Fraction of adjacent-sample jumps exceeding the R amplitude scale.
    pub artifact_ratio: f64,
}

impl SqiMetrics {
    /// Acceptance gate: beats clearly above the floor, stable amplitude
    /// and timing, and no visible electrode artifacts.
    pub fn is_acceptable(&self) -> bool {
        self.beat_snr >= 5.0
            && self.r_amplitude_cv <= 0.5
            && self.rr_cv <= 0.2
            && self.artifact_ratio <= 0.01
    }

    fn zero() -> Self {
        Self {
            beat_snr: 0.0,
            r_amplitude_cv: 0.0,
            rr_cv: 0.0,
            qrs_band_power_ratio: 0.0,
            artifact_ratio: 0.0,
        }
    }
}

/// Grade a cleaned recording against its detected R-peaks.
///
/// With no detected beats every index is zero: the quality of an empty
/// detection is undefined, not good.
pub fn evaluate_sqi(cleaned: &[f64], r_peaks: &[usize], fs: f64) -> SqiMetrics {
    if cleaned.is_empty() || r_peaks.is_empty() {
        return SqiMetrics::zero();
    }

    let half = (BEAT_WINDOW_S * fs).round().max(1.0) as usize;
    let amplitudes: Vec<f64> = r_peaks.iter().map(|&r| cleaned[r]).collect();
    let mean_amplitude = stats::mean(&amplitudes);
    let r_amplitude_cv = if mean_amplitude > 0.0 {
        stats::std_dev(&amplitudes) / mean_amplitude
    } else {
        0.0
    };

    let rr = RRSeries::from_peaks(r_peaks, fs);
    let mean_rr = stats::mean(&rr.rr);
    let rr_cv = if mean_rr > 0.0 {
        stats::std_dev(&rr.rr) / mean_rr
    } else {
        0.0
    };

    SqiMetrics {
        beat_snr: beat_snr(cleaned, r_peaks, half),
        r_amplitude_cv,
        rr_cv,
        qrs_band_power_ratio: qrs_band_power_ratio(cleaned, fs),
        artifact_ratio: artifact_ratio(cleaned, mean_amplitude),
    }
}

/// Mean squared amplitude inside the beat windows over the same measure on
/// the isoelectric remainder.
fn beat_snr(cleaned: &[f64], r_peaks: &[usize], half: usize) -> f64 {
    let n = cleaned.len();
    let mut in_beat = vec![false; n];
    for &r in r_peaks {
        for flag in in_beat
            .iter_mut()
            .take((r + half + 1).min(n))
            .skip(r.saturating_sub(half))
        {
            *flag = true;
        }
    }

    let mut beat_acc = 0.0;
    let mut beat_count = 0usize;
    let mut floor_acc = 0.0;
    let mut floor_count = 0usize;
    for (i, &x) in cleaned.iter().enumerate() {
        if in_beat[i] {
            beat_acc += x * x;
            beat_count += 1;
        } else {
            floor_acc += x * x;
            floor_count += 1;
        }
    }
    if beat_count == 0 {
        return 0.0;
    }
    let beat_power = beat_acc / beat_count as f64;
    let floor_power = (floor_acc / floor_count.max(1) as f64).max(1e-12);
    beat_power / floor_power
}

/// Fraction of spectral power falling in the QRS band.
fn qrs_band_power_ratio(cleaned: &[f64], fs: f64) -> f64 {
    let n = cleaned.len();
    if n == 0 {
        return 0.0;
    }
    let mut planner = RealFftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    let mut buffer = cleaned.to_vec();
    let mut spectrum = fft.make_output_vec();
    if fft.process(&mut buffer, &mut spectrum).is_err() {
        return 0.0;
    }
    let mut total = 0.0;
    let mut in_band = 0.0;
    for (i, c) in spectrum.iter().enumerate() {
        let power = c.norm_sqr();
        total += power;
        let freq = i as f64 * fs / n as f64;
        if freq >= QRS_BAND_LOW_HZ && freq <= QRS_BAND_HIGH_HZ {
            in_band += power;
        }
    }
    if total == 0.0 {
        return 0.0;
    }
    in_band / total
}

/// Fraction of adjacent-sample jumps larger than the R amplitude scale.
fn artifact_ratio(cleaned: &[f64], mean_r_amplitude: f64) -> f64 {
    if cleaned.len() < 2 || mean_r_amplitude <= 0.0 {
        return 0.0;
    }
    let threshold = ARTIFACT_JUMP_FRACTION * mean_r_amplitude;
    let jumps = cleaned.len() - 1;
    let spikes = cleaned
        .windows(2)
        .filter(|w| (w[1] - w[0]).abs() > threshold)
        .count();
    spikes as f64 / jumps as f64
}
