//! Clinical interpretation: merge rate, morphology and HRV into the final
//! rhythm label and warning list.

use crate::metrics::hrv::HrvMetrics;
use crate::metrics::morphology::{QrsMetrics, QtMetrics};

/// Apply the override/warning rules in clinical priority order.
///
/// Rules read disjoint fields, so their relative order only matters for
/// the warning sequence, which is part of the contract.
pub fn interpret(
    rhythm_label: &str,
    qrs: &QrsMetrics,
    qt: &QtMetrics,
    hrv: &HrvMetrics,
    avg_bpm: f64,
) -> (String, Vec<String>) {
    let mut label = rhythm_label.to_string();
    let mut warnings = Vec::new();

    if qrs.mean_qrs_ms > 120.0 && avg_bpm > 100.0 {
        label = "Wide-Complex Tachycardia - URGENT EVALUATION".to_string();
        warnings.push("Wide QRS with tachycardia requires immediate assessment".to_string());
    } else if qrs.mean_qrs_ms > 120.0 {
        warnings.push(qrs.interpretation.clone());
    }

    if qt.risk_flag {
        warnings.push(qt.interpretation.clone());
    }

    if hrv.sdnn_ms > 0.0 && hrv.sdnn_ms < 50.0 {
        warnings.push("Low HRV detected - consider cardiac risk assessment".to_string());
    }

    (label, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qrs(mean: f64) -> QrsMetrics {
        QrsMetrics {
            mean_qrs_ms: mean,
            std_qrs_ms: 0.0,
            interpretation: if mean >= 120.0 {
                "Wide QRS (BBB/Ventricular)".to_string()
            } else {
                "Normal".to_string()
            },
        }
    }

    fn qt(risk: bool) -> QtMetrics {
        QtMetrics {
            mean_qt_ms: 400.0,
            mean_qtc_bazett_ms: if risk { 480.0 } else { 420.0 },
            risk_flag: risk,
            interpretation: if risk { "Prolonged QTc".to_string() } else { "Normal".to_string() },
        }
    }

    fn hrv(sdnn: f64) -> HrvMetrics {
        HrvMetrics {
            sdnn_ms: sdnn,
            rmssd_ms: 0.0,
            sdsd_ms: 0.0,
            pnn50: 0.0,
            mean_nn_ms: 1000.0,
            cv_percent: 0.0,
            nn_count: 10,
            ectopic_removed: 0,
            interpretation: String::new(),
        }
    }

    #[test]
    fn wide_qrs_with_tachycardia_overrides_label() {
        let (label, warnings) = interpret("Tachycardia", &qrs(140.0), &qt(false), &hrv(60.0), 130.0);
        assert_eq!(label, "Wide-Complex Tachycardia - URGENT EVALUATION");
        assert_eq!(warnings, vec!["Wide QRS with tachycardia requires immediate assessment"]);
    }

    #[test]
    fn wide_qrs_alone_only_warns() {
        let (label, warnings) = interpret("Bradycardia", &qrs(140.0), &qt(false), &hrv(60.0), 45.0);
        assert_eq!(label, "Bradycardia");
        assert_eq!(warnings, vec!["Wide QRS (BBB/Ventricular)"]);
    }

    #[test]
    fn qt_risk_appends_interpretation() {
        let (label, warnings) =
            interpret("Normal Sinus Rhythm", &qrs(90.0), &qt(true), &hrv(60.0), 70.0);
        assert_eq!(label, "Normal Sinus Rhythm");
        assert_eq!(warnings, vec!["Prolonged QTc"]);
    }

    #[test]
    fn low_hrv_warns_but_zero_hrv_does_not() {
        let (_, warnings) = interpret("Normal Sinus Rhythm", &qrs(90.0), &qt(false), &hrv(30.0), 70.0);
        assert_eq!(warnings, vec!["Low HRV detected - consider cardiac risk assessment"]);
        let (_, warnings) = interpret("Normal Sinus Rhythm", &qrs(90.0), &qt(false), &hrv(0.0), 70.0);
        assert!(warnings.is_empty());
    }

    #[test]
    fn warnings_stack_in_rule_order() {
        let (label, warnings) = interpret("Tachycardia", &qrs(140.0), &qt(true), &hrv(30.0), 130.0);
        assert_eq!(label, "Wide-Complex Tachycardia - URGENT EVALUATION");
        assert_eq!(
            warnings,
            vec![
                "Wide QRS with tachycardia requires immediate assessment",
                "Prolonged QTc",
                "Low HRV detected - consider cardiac risk assessment",
            ]
        );
    }
}
