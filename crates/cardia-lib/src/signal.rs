use serde::{Deserialize, Serialize};

/// Uniformly sampled voltage trace in millivolts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Sampling frequency in Hz
    pub fs: f64,
    /// Samples in mV
    pub data: Vec<f64>,
}

impl TimeSeries {
    pub fn new(fs: f64, data: Vec<f64>) -> Self {
        Self { fs, data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn duration_s(&self) -> f64 {
        self.data.len() as f64 / self.fs
    }
}

/// Inter-beat (RR) intervals in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RRSeries {
    pub rr: Vec<f64>,
}

impl RRSeries {
    /// Intervals between consecutive R-peak sample indices.
    pub fn from_peaks(peaks: &[usize], fs: f64) -> Self {
        let rr = peaks.windows(2).map(|w| (w[1] - w[0]) as f64 / fs).collect();
        Self { rr }
    }

    /// The same intervals in milliseconds.
    pub fn to_ms(&self) -> Vec<f64> {
        self.rr.iter().map(|s| s * 1000.0).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rr_from_peaks_matches_spacing() {
        let rr = RRSeries::from_peaks(&[0, 250, 500, 800], 250.0);
        assert_eq!(rr.rr.len(), 3);
        assert!((rr.rr[0] - 1.0).abs() < 1e-12);
        assert!((rr.rr[2] - 1.2).abs() < 1e-12);
        assert!((rr.to_ms()[0] - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn duration_uses_fs() {
        let ts = TimeSeries::new(250.0, vec![0.0; 500]);
        assert!((ts.duration_s() - 2.0).abs() < 1e-12);
    }
}
