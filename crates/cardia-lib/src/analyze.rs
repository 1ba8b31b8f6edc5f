//! Single-shot analysis entry point.
//!
//! `analyze` runs the full pipeline: preprocessing, R-peak detection, then
//! rhythm, morphology and HRV in any order (they only read the cleaned
//! signal and the peaks), and finally the clinical interpreter.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::detectors::ecg::{detect_r_peaks_with_config, DetectionMetrics, DetectorConfig};
use crate::error::{CardiaError, Result};
use crate::interpret::interpret;
use crate::metrics::hrv::{hrv_metrics, HrvMetrics};
use crate::metrics::morphology::{measure_qrs_width, measure_qt, QrsMetrics, QtMetrics};
use crate::metrics::rhythm::{classify_rhythm, RhythmMetrics};
use crate::preprocess::{preprocess, FilterMetrics, PreprocessConfig};

/// Per-call options.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeOptions {
    /// Log each stage at info level instead of debug.
    pub verbose: bool,
}

/// Full pipeline configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzerConfig {
    pub preprocess: PreprocessConfig,
    pub detector: DetectorConfig,
}

/// Everything one run produces. Owned by the caller; serializes flat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub cleaned_signal: Vec<f64>,
    pub r_peak_indices: Vec<usize>,
    pub sample_rate: f64,
    pub num_samples: usize,
    pub filter_metrics: FilterMetrics,
    pub detection_metrics: DetectionMetrics,
    pub arrhythmia_metrics: RhythmMetrics,
    pub qrs_metrics: QrsMetrics,
    pub qt_metrics: QtMetrics,
    pub hrv_metrics: HrvMetrics,
    pub rhythm_status: String,
    pub clinical_warnings: Vec<String>,
}

/// Run the full analysis with default configuration.
pub fn analyze(samples: &[f64], fs: f64, opts: &AnalyzeOptions) -> Result<AnalysisResult> {
    analyze_with_config(samples, fs, &AnalyzerConfig::default(), opts)
}

pub fn analyze_with_config(
    samples: &[f64],
    fs: f64,
    cfg: &AnalyzerConfig,
    opts: &AnalyzeOptions,
) -> Result<AnalysisResult> {
    if !fs.is_finite() || fs <= 1.0 {
        return Err(CardiaError::BadConfig(format!(
            "sampling frequency must exceed 1 Hz, got {}",
            fs
        )));
    }
    if let Some(pos) = samples.iter().position(|v| !v.is_finite()) {
        return Err(CardiaError::BadConfig(format!(
            "non-finite sample at index {}",
            pos
        )));
    }

    let stage = |msg: &str| {
        if opts.verbose {
            info!("{}", msg);
        } else {
            debug!("{}", msg);
        }
    };

    stage("preprocessing");
    let (cleaned, filter_metrics) = preprocess(samples, fs, &cfg.preprocess)?;

    stage("detecting R-peaks");
    let (r_peaks, detection_metrics) = detect_r_peaks_with_config(&cleaned, fs, &cfg.detector);

    stage("classifying rhythm");
    let (rhythm_label, arrhythmia_metrics) = classify_rhythm(&r_peaks, fs);

    stage("measuring morphology");
    let qrs_metrics = measure_qrs_width(&cleaned, &r_peaks, fs);
    let qt_metrics = measure_qt(&cleaned, &r_peaks, fs);

    stage("computing HRV");
    let hrv = hrv_metrics(&r_peaks, fs);

    stage("interpreting");
    let (rhythm_status, clinical_warnings) = interpret(
        &rhythm_label,
        &qrs_metrics,
        &qt_metrics,
        &hrv,
        detection_metrics.avg_bpm,
    );

    let mut result = AnalysisResult {
        cleaned_signal: cleaned,
        r_peak_indices: r_peaks,
        sample_rate: fs,
        num_samples: samples.len(),
        filter_metrics,
        detection_metrics,
        arrhythmia_metrics,
        qrs_metrics,
        qt_metrics,
        hrv_metrics: hrv,
        rhythm_status,
        clinical_warnings,
    };
    let fixed = result.sanitize();
    if fixed > 0 {
        result
            .clinical_warnings
            .push("Numeric instability detected - affected metrics were zeroed".to_string());
    }
    Ok(result)
}

impl AnalysisResult {
    /// Replace every non-finite value with 0.0; returns how many were hit.
    /// Downstream numeric failure is non-fatal, but the output contract
    /// requires finite fields.
    fn sanitize(&mut self) -> usize {
        let mut fixed = 0usize;
        let mut fix = |v: &mut f64| {
            if !v.is_finite() {
                *v = 0.0;
                fixed += 1;
            }
        };

        for v in &mut self.cleaned_signal {
            fix(v);
        }
        fix(&mut self.filter_metrics.snr_db);
        fix(&mut self.filter_metrics.confidence_score);
        fix(&mut self.filter_metrics.signal_std);
        fix(&mut self.detection_metrics.avg_bpm);
        fix(&mut self.detection_metrics.avg_rr_s);
        fix(&mut self.detection_metrics.rr_std_s);
        fix(&mut self.detection_metrics.final_threshold);
        fix(&mut self.arrhythmia_metrics.cv);
        fix(&mut self.arrhythmia_metrics.mean_hr);
        fix(&mut self.arrhythmia_metrics.mean_rr_ms);
        fix(&mut self.arrhythmia_metrics.std_rr_ms);
        fix(&mut self.qrs_metrics.mean_qrs_ms);
        fix(&mut self.qrs_metrics.std_qrs_ms);
        fix(&mut self.qt_metrics.mean_qt_ms);
        fix(&mut self.qt_metrics.mean_qtc_bazett_ms);
        fix(&mut self.hrv_metrics.sdnn_ms);
        fix(&mut self.hrv_metrics.rmssd_ms);
        fix(&mut self.hrv_metrics.sdsd_ms);
        fix(&mut self.hrv_metrics.pnn50);
        fix(&mut self.hrv_metrics.mean_nn_ms);
        fix(&mut self.hrv_metrics.cv_percent);
        fixed
    }
}
