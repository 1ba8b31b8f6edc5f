//! Newline-delimited sample series.
//!
//! One float per line, in millivolts; blank lines and `#` comments are
//! skipped. Values are validated finite here so the core never sees NaN.

use anyhow::{Context, Result};
use std::path::Path;

/// Parse a newline-delimited series of f64 values.
pub fn parse_series(text: &str) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let value: f64 = trimmed
            .parse()
            .with_context(|| format!("line {} is not a number: {}", idx + 1, trimmed))?;
        if !value.is_finite() {
            anyhow::bail!("line {} is not finite: {}", idx + 1, trimmed);
        }
        out.push(value);
    }
    if out.is_empty() {
        anyhow::bail!("no numeric samples found");
    }
    Ok(out)
}

/// Read a newline-delimited series from disk.
pub fn read_series(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_series(&text)
}

/// Write a series back out, one value per line.
pub fn write_series(path: &Path, values: &[f64]) -> Result<()> {
    let mut body = String::with_capacity(values.len() * 12);
    for v in values {
        body.push_str(&v.to_string());
        body.push('\n');
    }
    std::fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_values_and_skips_comments() {
        let parsed = parse_series("# header\n1.5\n\n-0.25\n2e-3\n").unwrap();
        assert_eq!(parsed, vec![1.5, -0.25, 0.002]);
    }

    #[test]
    fn rejects_non_numeric_lines() {
        assert!(parse_series("1.0\noops\n").is_err());
    }

    #[test]
    fn rejects_non_finite_values() {
        assert!(parse_series("1.0\nNaN\n").is_err());
        assert!(parse_series("inf\n").is_err());
    }

    #[test]
    fn rejects_empty_input() {
        assert!(parse_series("# only comments\n").is_err());
    }
}
