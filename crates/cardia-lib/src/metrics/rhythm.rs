//! Rhythm classification from R-peak timing.

use serde::{Deserialize, Serialize};

use crate::stats;

/// RR-interval statistics backing the rhythm label.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RhythmMetrics {
    /// Coefficient of variation of the RR intervals.
    pub cv: f64,
    /// Mean of the instantaneous heart rates (bpm).
    pub mean_hr: f64,
    pub mean_rr_ms: f64,
    pub std_rr_ms: f64,
}

impl RhythmMetrics {
    fn zero() -> Self {
        Self {
            cv: 0.0,
            mean_hr: 0.0,
            mean_rr_ms: 0.0,
            std_rr_ms: 0.0,
        }
    }
}

/// Label the rhythm from R-peak timing alone.
///
/// Irregularity dominates the rate tiers: a severely variable rhythm is
/// flagged regardless of its mean rate, and a normal-rate rhythm with
/// moderate variability is downgraded to borderline.
pub fn classify_rhythm(r_peaks: &[usize], fs: f64) -> (String, RhythmMetrics) {
    if r_peaks.len() < 3 {
        return ("Insufficient data".to_string(), RhythmMetrics::zero());
    }

    let rr: Vec<f64> = r_peaks.windows(2).map(|w| (w[1] - w[0]) as f64 / fs).collect();
    let mean_rr = stats::mean(&rr);
    let std_rr = stats::std_dev(&rr);
    let cv = if mean_rr > 0.0 { std_rr / mean_rr } else { 0.0 };
    let rates: Vec<f64> = rr.iter().map(|r| 60.0 / r).collect();
    let mean_hr = stats::mean(&rates);

    let metrics = RhythmMetrics {
        cv,
        mean_hr,
        mean_rr_ms: mean_rr * 1000.0,
        std_rr_ms: std_rr * 1000.0,
    };

    let label = if cv >= 0.15 {
        "Flagged: Irregular Rhythm"
    } else if mean_hr < 60.0 {
        "Bradycardia"
    } else if mean_hr > 100.0 {
        "Tachycardia"
    } else if cv >= 0.08 {
        "Borderline: Mild Irregularity"
    } else {
        "Normal Sinus Rhythm"
    };
    (label.to_string(), metrics)
}
