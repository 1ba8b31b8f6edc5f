//! Signal conditioning ahead of QRS detection.
//!
//! Bandpass, powerline notch and baseline wander removal, all zero-phase,
//! plus an SNR-based quality estimate of the result.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{CardiaError, Result};
use crate::filters::{bandpass_sos, centered_moving_average, filtfilt, min_filtfilt_len, notch_sos};
use crate::stats;

/// Tunables for the preprocessing stage.
#[derive(Debug, Clone, Copy)]
pub struct PreprocessConfig {
    /// Lower bandpass cutoff (Hz).
    pub bandpass_low_hz: f64,
    /// Upper bandpass cutoff (Hz).
    pub bandpass_high_hz: f64,
    /// Butterworth order (scipy convention; 4 gives an 8-pole bandpass).
    /// Raising the order also raises the minimum input length the
    /// forward-backward pass accepts.
    pub bandpass_order: usize,
    /// Powerline notch frequency (Hz).
    pub notch_hz: f64,
    /// Notch quality factor.
    pub notch_q: f64,
    /// Baseline wander moving-average window (seconds).
    pub baseline_window_s: f64,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            bandpass_low_hz: 0.5,
            bandpass_high_hz: 40.0,
            bandpass_order: 4,
            notch_hz: 60.0,
            notch_q: 30.0,
            baseline_window_s: 0.2,
        }
    }
}

/// Quality estimate of one preprocessing run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FilterMetrics {
    pub snr_db: f64,
    /// 0-100, derived from the SNR.
    pub confidence_score: f64,
    pub signal_std: f64,
}

/// Clean one recording: bandpass, notch, baseline removal.
///
/// Length-preserving; the input is untouched. The returned metrics grade
/// how much of the raw signal survived the cleaning.
///
/// The minimum accepted length is construction-dependent: the
/// forward-backward pass needs `3 * (2 * sections + 1) + 1` samples for
/// the designed bandpass cascade (28 with the default 4-section design),
/// or the baseline window plus one, whichever is larger. That can exceed
/// the nominal `3 * filter_order` rule of thumb; the effective bound is
/// reported in `InsufficientData::required`.
pub fn preprocess(samples: &[f64], fs: f64, cfg: &PreprocessConfig) -> Result<(Vec<f64>, FilterMetrics)> {
    if !fs.is_finite() || fs <= 1.0 {
        return Err(CardiaError::BadConfig(format!(
            "sampling frequency must exceed 1 Hz, got {}",
            fs
        )));
    }

    let bandpass = bandpass_sos(cfg.bandpass_order, cfg.bandpass_low_hz, cfg.bandpass_high_hz, fs)?;
    let window = (cfg.baseline_window_s * fs).round().max(1.0) as usize;
    let required = min_filtfilt_len(bandpass.len()).max(window + 1);
    if samples.len() < required {
        return Err(CardiaError::InsufficientData {
            required,
            available: samples.len(),
        });
    }

    let bandpassed = filtfilt(samples, &bandpass);

    // The notch only exists below Nyquist; at low sampling rates the
    // bandpass has already removed everything up there.
    let notched = match notch_sos(cfg.notch_hz, cfg.notch_q, fs) {
        Ok(sos) => filtfilt(&bandpassed, &sos),
        Err(_) => {
            debug!("skipping {} Hz notch: at or above Nyquist for fs {}", cfg.notch_hz, fs);
            bandpassed
        }
    };

    let baseline = centered_moving_average(&notched, window);
    let cleaned: Vec<f64> = notched.iter().zip(&baseline).map(|(x, b)| x - b).collect();
    if cleaned.iter().any(|v| !v.is_finite()) {
        return Err(CardiaError::NumericFailure { stage: "preprocess" });
    }

    let residual: Vec<f64> = samples.iter().zip(&cleaned).map(|(x, c)| x - c).collect();
    let signal_var = stats::variance(&cleaned);
    let noise_var = stats::variance(&residual);
    let snr_db = if noise_var == 0.0 {
        100.0
    } else {
        10.0 * (signal_var / noise_var).log10()
    };
    let metrics = FilterMetrics {
        snr_db,
        confidence_score: ((snr_db - 5.0) * 5.0).clamp(0.0, 100.0),
        signal_std: stats::std_dev(&cleaned),
    };
    debug!(
        "preprocess: {} samples, snr {:.1} dB, confidence {:.0}",
        samples.len(),
        metrics.snr_db,
        metrics.confidence_score
    );
    Ok((cleaned, metrics))
}
