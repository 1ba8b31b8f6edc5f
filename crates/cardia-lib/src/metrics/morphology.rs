//! Waveform morphology: QRS duration and the QT interval.
//!
//! QRS bounds come from slope flattening on either side of the R peak; the
//! T-wave end is found with the tangent method, extrapolating the steepest
//! descent after the T peak down to the baseline.

use serde::{Deserialize, Serialize};

use crate::stats;

/// Adjacent-sample difference (mV) below which the waveform counts as flat.
const FLAT_SLOPE_MV: f64 = 0.005;

/// QRS search window before the R peak (seconds).
const QRS_PRE_S: f64 = 0.05;
/// QRS search window after the R peak (seconds).
const QRS_POST_S: f64 = 0.08;

/// T-wave search window start after the R peak (seconds).
const T_SEARCH_START_S: f64 = 0.04;
/// T-wave search window end after the R peak (seconds).
const T_SEARCH_END_S: f64 = 0.45;
/// Length of the descent-slope scan after the T peak (seconds).
const T_SLOPE_SPAN_S: f64 = 0.1;
/// QT onset before the R peak (seconds).
const Q_LEAD_S: f64 = 0.03;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrsMetrics {
    pub mean_qrs_ms: f64,
    pub std_qrs_ms: f64,
    pub interpretation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QtMetrics {
    pub mean_qt_ms: f64,
    pub mean_qtc_bazett_ms: f64,
    pub risk_flag: bool,
    pub interpretation: String,
}

/// Measure QRS duration around each detected R peak.
pub fn measure_qrs_width(cleaned: &[f64], r_peaks: &[usize], fs: f64) -> QrsMetrics {
    let pre = (QRS_PRE_S * fs).round() as usize;
    let post = (QRS_POST_S * fs).round() as usize;

    let mut widths = Vec::new();
    for &r in r_peaks {
        let start = r.saturating_sub(pre);
        let end = (r + post).min(cleaned.len());
        let seg = &cleaned[start..end];
        if seg.len() < 5 {
            continue;
        }
        let r_local = r - start;

        let q_onset = find_q_onset(seg, r_local);
        let s_offset = find_s_offset(seg, r_local);

        let width_ms = (s_offset.saturating_sub(q_onset)) as f64 * 1000.0 / fs;
        if width_ms > 40.0 && width_ms < 200.0 {
            widths.push(width_ms);
        }
    }

    if widths.is_empty() {
        return QrsMetrics {
            mean_qrs_ms: 80.0,
            std_qrs_ms: 0.0,
            interpretation: "Could not detect".to_string(),
        };
    }

    let mean_qrs_ms = stats::mean(&widths);
    let interpretation = if mean_qrs_ms >= 120.0 {
        "Wide QRS (BBB/Ventricular)"
    } else if mean_qrs_ms <= 60.0 {
        "Narrow (Normal)"
    } else {
        "Normal"
    };
    QrsMetrics {
        mean_qrs_ms,
        std_qrs_ms: stats::std_dev(&widths),
        interpretation: interpretation.to_string(),
    }
}

/// Scan backwards from the R peak for the first flat step; only indices
/// more than two samples before R qualify. Falls back to the segment start.
fn find_q_onset(seg: &[f64], r_local: usize) -> usize {
    let mut i = r_local;
    while i >= 1 {
        if (i as isize) < r_local as isize - 2 && (seg[i] - seg[i - 1]).abs() < FLAT_SLOPE_MV {
            return i;
        }
        i -= 1;
    }
    0
}

/// Find the S trough after the R peak, then scan forward for the first flat
/// step. Falls back to the segment end.
fn find_s_offset(seg: &[f64], r_local: usize) -> usize {
    // r_local < seg.len() is guaranteed by the caller's window arithmetic
    let trough = r_local + stats::argmin(&seg[r_local..]).unwrap_or(0);
    let mut i = trough;
    while i + 1 < seg.len() {
        if (seg[i + 1] - seg[i]).abs() < FLAT_SLOPE_MV {
            return i;
        }
        i += 1;
    }
    seg.len() - 1
}

/// Measure the QT interval over consecutive beat pairs and apply Bazett's
/// rate correction.
pub fn measure_qt(cleaned: &[f64], r_peaks: &[usize], fs: f64) -> QtMetrics {
    let n = cleaned.len();
    let t_start_off = (T_SEARCH_START_S * fs).round() as usize;
    let t_end_off = (T_SEARCH_END_S * fs).round() as usize;
    let slope_span = (T_SLOPE_SPAN_S * fs).round() as usize;
    let q_lead = (Q_LEAD_S * fs).round();

    let mut qt_list = Vec::new();
    for pair in r_peaks.windows(2) {
        let r = pair[0];
        let t_start = r + t_start_off;
        let t_stop = r + t_end_off;
        if t_stop > n || t_start >= t_stop {
            continue;
        }

        let t_peak = t_start + match stats::argmax(&cleaned[t_start..t_stop]) {
            Some(idx) => idx,
            None => continue,
        };

        let slope_end = (t_peak + slope_span).min(n);
        if slope_end <= t_peak + 1 {
            continue;
        }
        let descent = &cleaned[t_peak..slope_end];
        let diffs: Vec<f64> = descent.windows(2).map(|w| w[1] - w[0]).collect();
        let k = match stats::argmin(&diffs) {
            Some(idx) => idx,
            None => continue,
        };
        let max_slope = diffs[k];
        if max_slope == 0.0 {
            continue;
        }

        // Extrapolate the steepest tangent down to the baseline crossing.
        let t_end = (t_peak + k) as f64 - cleaned[t_peak + k] / max_slope;
        let q_start = r as f64 - q_lead;
        let qt_ms = (t_end - q_start) * 1000.0 / fs;
        if qt_ms > 200.0 && qt_ms < 600.0 {
            qt_list.push(qt_ms);
        }
    }

    let mean_qt_ms = stats::mean(&qt_list);
    let rr: Vec<f64> = r_peaks.windows(2).map(|w| (w[1] - w[0]) as f64 / fs).collect();
    let mean_rr_s = if rr.is_empty() { 1.0 } else { stats::mean(&rr) };
    let mean_qtc_bazett_ms = mean_qt_ms / mean_rr_s.sqrt();

    let interpretation = if qt_list.is_empty() {
        "N/A"
    } else if mean_qtc_bazett_ms < 450.0 {
        "Normal"
    } else if mean_qtc_bazett_ms < 500.0 {
        "Prolonged QTc"
    } else {
        "High Risk (Long QT)"
    };
    QtMetrics {
        mean_qt_ms,
        mean_qtc_bazett_ms,
        risk_flag: mean_qtc_bazett_ms > 470.0,
        interpretation: interpretation.to_string(),
    }
}
