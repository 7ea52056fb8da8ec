use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::warn;

use crate::data::{Column, Dataset};
use crate::parser::parse_scalar;

/// Read a CSV table with a header row into a dataset named `id`.
///
/// Short rows are kept as-is, so the affected columns come out ragged and the
/// dataset is reported as malformed later. Fields past the header width are
/// dropped.
pub fn read_csv<R: Read>(id: &str, reader: R) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut columns: Vec<Column> = headers
        .iter()
        .map(|name| Column::new(name.clone(), Vec::new()))
        .collect();

    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV record {}", line + 1))?;
        if record.len() > headers.len() {
            warn!(dataset = id, record = line + 1, "Ignoring fields beyond the header row");
        }
        for (column, field) in columns.iter_mut().zip(record.iter()) {
            column.values.push(parse_scalar(field));
        }
    }

    Ok(Dataset::new(id, columns))
}

/// Read a CSV file; the dataset is named after the file stem.
pub fn read_csv_path(path: &Path) -> Result<Dataset> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    read_csv(&dataset_id(path), file).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn dataset_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;
    use crate::error::ShapeError;

    #[test]
    fn test_read_csv_parses_cells() {
        let csv = "Year,Revenue,Margin\nFY 2024,\"₹23,204\",17%\nFY 2025,(971),-\n";
        let ds = read_csv("financials", csv.as_bytes()).unwrap();

        assert_eq!(ds.id(), "financials");
        assert_eq!(ds.row_count(), 2);
        let names: Vec<&str> = ds.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Year", "Revenue", "Margin"]);

        let revenue = ds.column("Revenue").unwrap();
        assert_eq!(revenue.values, vec![Value::Number(23204.0), Value::Number(-971.0)]);
        let margin = ds.column("Margin").unwrap();
        assert_eq!(margin.values, vec![Value::Number(17.0), Value::Missing]);
        assert_eq!(ds.column("Year").unwrap().values[0], Value::Text("FY 2024".to_string()));
    }

    #[test]
    fn test_short_rows_become_ragged() {
        let csv = "A,B\n1,2\n3\n";
        let ds = read_csv("short", csv.as_bytes()).unwrap();
        assert!(matches!(ds.validate(), Err(ShapeError::RaggedColumns { .. })));
    }

    #[test]
    fn test_header_only_is_empty() {
        let ds = read_csv("empty", "A,B\n".as_bytes()).unwrap();
        assert_eq!(ds.row_count(), 0);
        assert!(matches!(ds.validate(), Err(ShapeError::EmptyDataset { .. })));
    }

    #[test]
    fn test_read_csv_path_uses_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shareholding.csv");
        std::fs::write(&path, "Holder,Percentage\nPromoters,50.1\n").unwrap();

        let ds = read_csv_path(&path).unwrap();
        assert_eq!(ds.id(), "shareholding");
        assert!(read_csv_path(&dir.path().join("missing.csv")).is_err());
    }
}
