//! Time-domain heart-rate variability.

use serde::{Deserialize, Serialize};

use crate::stats;

/// NN acceptance window (ms); RR intervals outside count as ectopic.
const NN_MIN_MS: f64 = 300.0;
const NN_MAX_MS: f64 = 1500.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HrvMetrics {
    pub sdnn_ms: f64,
    pub rmssd_ms: f64,
    pub sdsd_ms: f64,
    pub pnn50: f64,
    pub mean_nn_ms: f64,
    pub cv_percent: f64,
    pub nn_count: usize,
    pub ectopic_removed: usize,
    pub interpretation: String,
}

impl HrvMetrics {
    fn zeroed(interpretation: &str) -> Self {
        Self {
            sdnn_ms: 0.0,
            rmssd_ms: 0.0,
            sdsd_ms: 0.0,
            pnn50: 0.0,
            mean_nn_ms: 0.0,
            cv_percent: 0.0,
            nn_count: 0,
            ectopic_removed: 0,
            interpretation: interpretation.to_string(),
        }
    }
}

/// Compute HRV statistics from detected R-peaks.
pub fn hrv_metrics(r_peaks: &[usize], fs: f64) -> HrvMetrics {
    if r_peaks.len() < 3 {
        return HrvMetrics::zeroed("Insufficient data");
    }
    let rr_ms: Vec<f64> = r_peaks
        .windows(2)
        .map(|w| (w[1] - w[0]) as f64 * 1000.0 / fs)
        .collect();
    hrv_from_rr_ms(&rr_ms)
}

/// Compute HRV statistics from an RR-interval list in milliseconds.
///
/// Intervals outside the NN window are dropped as ectopic before any
/// statistic is formed; SDNN carries Bessel's correction, the other
/// spreads are population estimates.
pub fn hrv_from_rr_ms(rr_ms: &[f64]) -> HrvMetrics {
    if rr_ms.len() < 2 {
        return HrvMetrics::zeroed("Insufficient data");
    }

    let nn: Vec<f64> = rr_ms
        .iter()
        .copied()
        .filter(|&rr| rr > NN_MIN_MS && rr < NN_MAX_MS)
        .collect();
    let ectopic_removed = rr_ms.len() - nn.len();

    if nn.len() < 2 {
        let mut metrics = HrvMetrics::zeroed("High noise level - unstable RR");
        metrics.ectopic_removed = ectopic_removed;
        return metrics;
    }

    let diff_nn: Vec<f64> = nn.windows(2).map(|w| w[1] - w[0]).collect();
    let sdnn_ms = stats::std_dev_sample(&nn);
    let rmssd_ms = (diff_nn.iter().map(|d| d * d).sum::<f64>() / diff_nn.len() as f64).sqrt();
    let sdsd_ms = stats::std_dev(&diff_nn);
    let over_50 = diff_nn.iter().filter(|d| d.abs() > 50.0).count();
    let pnn50 = 100.0 * over_50 as f64 / diff_nn.len() as f64;
    let mean_nn_ms = stats::mean(&nn);
    let cv_percent = if mean_nn_ms > 0.0 {
        100.0 * sdnn_ms / mean_nn_ms
    } else {
        0.0
    };

    let interpretation = if sdnn_ms < 20.0 {
        "Low HRV (Reduced variability)"
    } else if sdnn_ms < 100.0 {
        "Normal range for short-term recording"
    } else {
        "High Variability"
    };

    HrvMetrics {
        sdnn_ms,
        rmssd_ms,
        sdsd_ms,
        pnn50,
        mean_nn_ms,
        cv_percent,
        nn_count: nn.len(),
        ectopic_removed,
        interpretation: interpretation.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steady_rr_has_no_variability() {
        let hrv = hrv_from_rr_ms(&[1000.0; 10]);
        assert_eq!(hrv.sdnn_ms, 0.0);
        assert_eq!(hrv.rmssd_ms, 0.0);
        assert_eq!(hrv.pnn50, 0.0);
        assert_eq!(hrv.nn_count, 10);
        assert_eq!(hrv.interpretation, "Low HRV (Reduced variability)");
    }

    #[test]
    fn pnn50_counts_large_steps() {
        // diffs: +100, -100, +100 -> all exceed 50 ms
        let hrv = hrv_from_rr_ms(&[900.0, 1000.0, 900.0, 1000.0]);
        assert!((hrv.pnn50 - 100.0).abs() < 1e-9);
        assert!(hrv.rmssd_ms > 99.0);
    }

    #[test]
    fn ectopic_intervals_are_removed() {
        let hrv = hrv_from_rr_ms(&[1000.0, 2000.0, 1000.0, 250.0, 1000.0]);
        assert_eq!(hrv.ectopic_removed, 2);
        assert_eq!(hrv.nn_count, 3);
    }

    #[test]
    fn all_ectopic_reads_as_unstable() {
        let hrv = hrv_from_rr_ms(&[2000.0, 2000.0, 2000.0]);
        assert_eq!(hrv.nn_count, 0);
        assert_eq!(hrv.ectopic_removed, 3);
        assert_eq!(hrv.interpretation, "High noise level - unstable RR");
        assert_eq!(hrv.sdnn_ms, 0.0);
    }

    #[test]
    fn few_peaks_is_insufficient() {
        let hrv = hrv_metrics(&[0, 250], 250.0);
        assert_eq!(hrv.interpretation, "Insufficient data");
    }

    #[test]
    fn sdnn_uses_bessel_correction() {
        let hrv = hrv_from_rr_ms(&[900.0, 1100.0]);
        // sample std of {900, 1100} is sqrt(2) * 100
        assert!((hrv.sdnn_ms - 141.4213562373095).abs() < 1e-6);
        assert_eq!(hrv.interpretation, "High Variability");
    }

    #[test]
    fn bounds_hold_for_mixed_series() {
        let hrv = hrv_from_rr_ms(&[800.0, 850.0, 910.0, 790.0, 880.0, 940.0]);
        assert!(hrv.sdnn_ms >= 0.0);
        assert!(hrv.pnn50 >= 0.0 && hrv.pnn50 <= 100.0);
        assert!(hrv.cv_percent > 0.0);
    }
}
