//! Single-column CSV reader.

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::path::Path;

/// Read one named column of a headed CSV as an f64 series.
///
/// Header matching is case-insensitive. Values must be finite.
pub fn read_csv_column(path: &Path, column: &str) -> Result<Vec<f64>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers = reader.headers()?.clone();
    let col = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(column))
        .with_context(|| format!("missing column '{}'", column))?;

    let mut values = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading row {}", idx + 1))?;
        let field = record
            .get(col)
            .ok_or_else(|| anyhow::anyhow!("row {} is missing column '{}'", idx + 1, column))?;
        let value: f64 = field
            .parse()
            .with_context(|| format!("row {}: '{}' is not a number", idx + 1, field))?;
        if !value.is_finite() {
            anyhow::bail!("row {}: value is not finite", idx + 1);
        }
        values.push(value);
    }
    if values.is_empty() {
        anyhow::bail!("no rows in {}", path.display());
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_named_column() {
        let dir = std::env::temp_dir().join("cardia-csv-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("lead.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "time,Lead1\n0.0,0.1\n0.004,0.2\n0.008,-0.05").unwrap();
        let values = read_csv_column(&path, "lead1").unwrap();
        assert_eq!(values, vec![0.1, 0.2, -0.05]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_column_is_an_error() {
        let dir = std::env::temp_dir().join("cardia-csv-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("nocol.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();
        assert!(read_csv_column(&path, "voltage").is_err());
        std::fs::remove_file(&path).ok();
    }
}
