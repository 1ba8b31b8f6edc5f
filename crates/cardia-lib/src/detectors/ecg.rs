//! Pan-Tompkins QRS detection.
//!
//! The classic cascade: QRS-band bandpass, five-point derivative, squaring,
//! moving-window integration, then adaptive thresholding over the
//! integrated envelope. Detections are relocated to the true R maximum in
//! the cleaned signal, which undoes the group delay of the boxcar
//! integrator.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::filters::{bandpass_sos, filtfilt, min_filtfilt_len};
use crate::stats;

/// Tunables for the QRS detector.
#[derive(Debug, Clone, Copy)]
pub struct DetectorConfig {
    /// QRS band lower edge (Hz).
    pub qrs_low_hz: f64,
    /// QRS band upper edge (Hz).
    pub qrs_high_hz: f64,
    /// Butterworth order of the QRS band filter.
    pub qrs_order: usize,
    /// Moving-window integration length (seconds).
    pub integration_window_s: f64,
    /// Refractory period (seconds); no two peaks may be closer.
    pub refractory_s: f64,
    /// Half-width of the R relocation search (seconds).
    pub search_radius_s: f64,
    /// Percentile of the integrated envelope seeding the threshold.
    pub threshold_percentile: f64,
    /// Fraction of the percentile used as the initial threshold.
    pub threshold_seed: f64,
    /// Weight of the signal-peak mean in the threshold update.
    pub threshold_signal_weight: f64,
    /// Accept a relocated peak only above this multiple of the cleaned
    /// signal's standard deviation.
    pub amplitude_gate: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            qrs_low_hz: 5.0,
            qrs_high_hz: 15.0,
            qrs_order: 2,
            integration_window_s: 0.120,
            refractory_s: 0.2,
            search_radius_s: 0.08,
            threshold_percentile: 98.0,
            threshold_seed: 0.6,
            threshold_signal_weight: 0.40,
            amplitude_gate: 0.5,
        }
    }
}

/// Summary of one detection run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DetectionMetrics {
    pub num_peaks: usize,
    pub avg_bpm: f64,
    pub avg_rr_s: f64,
    pub rr_std_s: f64,
    pub final_threshold: f64,
}

impl DetectionMetrics {
    fn from_peaks(peaks: &[usize], fs: f64, final_threshold: f64) -> Self {
        let rr: Vec<f64> = peaks.windows(2).map(|w| (w[1] - w[0]) as f64 / fs).collect();
        let avg_rr_s = stats::mean(&rr);
        Self {
            num_peaks: peaks.len(),
            avg_bpm: if rr.is_empty() { 0.0 } else { 60.0 / avg_rr_s },
            avg_rr_s,
            rr_std_s: stats::std_dev(&rr),
            final_threshold,
        }
    }
}

/// Detect R-peaks in a cleaned recording.
///
/// Never fails: an undetectable signal yields an empty index list. The
/// returned indices are strictly increasing and at least one refractory
/// period apart.
pub fn detect_r_peaks(cleaned: &[f64], fs: f64) -> (Vec<usize>, DetectionMetrics) {
    detect_r_peaks_with_config(cleaned, fs, &DetectorConfig::default())
}

pub fn detect_r_peaks_with_config(
    cleaned: &[f64],
    fs: f64,
    cfg: &DetectorConfig,
) -> (Vec<usize>, DetectionMetrics) {
    let empty = (Vec::new(), DetectionMetrics::from_peaks(&[], fs, 0.0));

    let band = match bandpass_sos(cfg.qrs_order, cfg.qrs_low_hz, cfg.qrs_high_hz, fs) {
        Ok(sos) => sos,
        Err(err) => {
            warn!("QRS band filter unavailable at fs {}: {}", fs, err);
            return empty;
        }
    };
    if cleaned.len() < min_filtfilt_len(band.len()) {
        return empty;
    }

    let qrs_band = filtfilt(cleaned, &band);
    let derivative = five_point_derivative(&qrs_band, fs);
    let squared: Vec<f64> = derivative.iter().map(|d| d * d).collect();
    let win = (cfg.integration_window_s * fs).round().max(1.0) as usize;
    let integrated = stats::boxcar_convolve_same(&squared, win);

    let (peaks, final_threshold) = threshold_peaks(cleaned, &integrated, fs, cfg);
    let metrics = DetectionMetrics::from_peaks(&peaks, fs, final_threshold);
    debug!(
        "detector: {} peaks, avg {:.1} bpm, threshold {:.3e}",
        metrics.num_peaks, metrics.avg_bpm, metrics.final_threshold
    );
    (peaks, metrics)
}

/// Five-point derivative with fs/8 scaling; the outer two samples at each
/// end stay zero.
fn five_point_derivative(xs: &[f64], fs: f64) -> Vec<f64> {
    let n = xs.len();
    let mut out = vec![0.0; n];
    if n < 5 {
        return out;
    }
    for i in 2..n - 2 {
        out[i] = (-xs[i - 2] - 2.0 * xs[i - 1] + 2.0 * xs[i + 1] + xs[i + 2]) * fs / 8.0;
    }
    out
}

/// Adaptive thresholding over the integrated envelope.
///
/// Candidates are strict local maxima. An above-threshold candidate outside
/// the refractory window is relocated to the cleaned signal's maximum
/// within `search_radius_s` and accepted if it clears the amplitude gate;
/// below-threshold maxima feed the noise history. The threshold tracks
/// `mean(noise[-8:]) + w * (mean(signal[-8:]) - mean(noise[-8:]))`.
fn threshold_peaks(
    cleaned: &[f64],
    integrated: &[f64],
    fs: f64,
    cfg: &DetectorConfig,
) -> (Vec<usize>, f64) {
    let n = integrated.len();
    if n < 3 {
        return (Vec::new(), 0.0);
    }

    let refractory = (cfg.refractory_s * fs).round().max(1.0) as usize;
    let search = (cfg.search_radius_s * fs).round().max(1.0) as usize;
    let gate = cfg.amplitude_gate * stats::std_dev(cleaned);

    let mut threshold = cfg.threshold_seed * stats::percentile(integrated, cfg.threshold_percentile);
    let mut signal_peaks: Vec<f64> = Vec::new();
    let mut noise_peaks: Vec<f64> = Vec::new();
    let mut r_peaks: Vec<usize> = Vec::new();
    let mut last_candidate = 0usize;

    let mut i = 1;
    while i + 1 < n {
        let v = integrated[i];
        let is_local_max = v > integrated[i - 1] && v > integrated[i + 1];
        if is_local_max {
            let refractory_open = r_peaks.is_empty() || i - last_candidate > refractory;
            if v > threshold && refractory_open {
                let lo = i.saturating_sub(search);
                let hi = (i + search).min(cleaned.len());
                // unwrap is safe: lo < hi always holds here
                let actual = lo + stats::argmax(&cleaned[lo..hi]).unwrap();

                let spacing_ok = r_peaks
                    .last()
                    .map(|&prev| actual > prev && actual - prev >= refractory)
                    .unwrap_or(true);
                if cleaned[actual] > gate && spacing_ok {
                    r_peaks.push(actual);
                    signal_peaks.push(v);
                    let noise_est = mean_tail(&noise_peaks, 8);
                    let signal_est = mean_tail(&signal_peaks, 8);
                    threshold =
                        noise_est + cfg.threshold_signal_weight * (signal_est - noise_est);
                    last_candidate = i;
                    i += refractory;
                    continue;
                }
            } else if v <= threshold {
                noise_peaks.push(v);
            }
        }
        i += 1;
    }

    (r_peaks, threshold)
}

/// Mean of the last `k` entries; 0.0 when empty.
fn mean_tail(xs: &[f64], k: usize) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let start = xs.len().saturating_sub(k);
    stats::mean(&xs[start..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::{preprocess, PreprocessConfig};
    use crate::sim::{synthetic_ecg, SimConfig};

    fn cleaned_metronome(bpm: f64) -> (Vec<f64>, f64) {
        let ts = synthetic_ecg(&SimConfig {
            bpm,
            ..SimConfig::default()
        });
        let (cleaned, _) = preprocess(&ts.data, ts.fs, &PreprocessConfig::default()).unwrap();
        (cleaned, ts.fs)
    }

    #[test]
    fn finds_every_metronome_beat() {
        let (cleaned, fs) = cleaned_metronome(60.0);
        let (peaks, metrics) = detect_r_peaks(&cleaned, fs);
        assert_eq!(peaks.len(), 10);
        assert!(metrics.avg_bpm > 59.5 && metrics.avg_bpm < 60.5, "avg_bpm {}", metrics.avg_bpm);
    }

    #[test]
    fn peaks_are_monotonic_and_respect_refractory() {
        let (cleaned, fs) = cleaned_metronome(120.0);
        let (peaks, _) = detect_r_peaks(&cleaned, fs);
        let refractory = (0.2 * fs).round() as usize;
        for w in peaks.windows(2) {
            assert!(w[1] > w[0]);
            assert!(w[1] - w[0] >= refractory);
        }
        assert!(peaks.iter().all(|&p| p < cleaned.len()));
    }

    #[test]
    fn detection_is_scale_invariant() {
        let (cleaned, fs) = cleaned_metronome(60.0);
        let scaled: Vec<f64> = cleaned.iter().map(|v| v * 2.5).collect();
        let (peaks_a, ma) = detect_r_peaks(&cleaned, fs);
        let (peaks_b, mb) = detect_r_peaks(&scaled, fs);
        assert_eq!(peaks_a, peaks_b);
        assert!((ma.avg_bpm - mb.avg_bpm).abs() < 1e-9);
    }

    #[test]
    fn prepended_zeros_shift_peaks() {
        let (cleaned, fs) = cleaned_metronome(60.0);
        let k = 300usize;
        let mut shifted = vec![0.0; k];
        shifted.extend_from_slice(&cleaned);
        let (peaks_a, _) = detect_r_peaks(&cleaned, fs);
        let (peaks_b, _) = detect_r_peaks(&shifted, fs);
        assert_eq!(peaks_a.len(), peaks_b.len());
        for (a, b) in peaks_a.iter().zip(&peaks_b) {
            assert_eq!(a + k, *b);
        }
    }

    #[test]
    fn flat_line_yields_no_peaks() {
        let (peaks, metrics) = detect_r_peaks(&vec![0.0; 2500], 250.0);
        assert!(peaks.is_empty());
        assert_eq!(metrics.num_peaks, 0);
        assert_eq!(metrics.avg_bpm, 0.0);
    }

    #[test]
    fn derivative_boundaries_are_zero() {
        let xs: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let d = five_point_derivative(&xs, 8.0);
        assert_eq!(d[0], 0.0);
        assert_eq!(d[1], 0.0);
        assert_eq!(d[18], 0.0);
        assert_eq!(d[19], 0.0);
        // unit-slope ramp: the kernel sums to 8, scaled by fs/8 -> fs
        assert!((d[5] - 8.0).abs() < 1e-12);
    }
}
