//! Import of locally exported per-symbol series files.
//!
//! Each file holds one symbol's raw series in long form, one observation
//! per row (`date,field,value`), with the symbol taken from the file stem
//! so `MBBM.KL.csv` imports as `MBBM.KL`. Rows with a blank value are
//! kept as nulls and flow through assembly like any provider null.

use crate::schema::{Field, FieldSeries, Observation};
use crate::store::assemble::assemble_symbol;
use crate::store::wide::WideFrame;
use crate::store::StoreError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct LongRow {
    date: String,
    field: String,
    value: Option<f64>,
}

/// Read one long-format series file into per-field series. Unknown field
/// names are a parse error, not silently dropped.
pub fn read_field_series_csv(path: &Path) -> Result<Vec<FieldSeries>, StoreError> {
    let mut rdr = csv::Reader::from_path(path)
        .map_err(|e| StoreError::Read(format!("{}: {e}", path.display())))?;

    let mut by_field: BTreeMap<Field, Vec<Observation>> = BTreeMap::new();
    for result in rdr.deserialize() {
        let row: LongRow =
            result.map_err(|e| StoreError::Parse(format!("{}: {e}", path.display())))?;
        let field: Field = row
            .field
            .parse()
            .map_err(|e| StoreError::Parse(format!("{}: {e}", path.display())))?;
        by_field
            .entry(field)
            .or_default()
            .push(Observation::new(row.date, row.value));
    }

    Ok(by_field
        .into_iter()
        .map(|(field, points)| FieldSeries::new(field, points))
        .collect())
}

/// Import every `*.csv` in a directory, assembling each file into its
/// symbol's columns and unioning the results into one batch frame.
pub fn import_dir(dir: &Path) -> Result<WideFrame, StoreError> {
    let entries =
        fs::read_dir(dir).map_err(|e| StoreError::Read(format!("{}: {e}", dir.display())))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StoreError::Read(format!("{}: {e}", dir.display())))?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "csv") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut batch = WideFrame::new();
    for path in paths {
        let Some(symbol) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let series = read_field_series_csv(&path)?;
        batch.union(assemble_symbol(symbol, &series));
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::env;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_dir() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = env::temp_dir().join(format!("newslab_import_{}_{id}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn long_rows_group_into_field_series() {
        let dir = temp_dir();
        let path = dir.join("MBBM.KL.csv");
        fs::write(
            &path,
            "date,field,value\n\
             2020-01-02,CLOSE,8.50\n\
             2020-01-03,CLOSE,8.60\n\
             2020-01-02,VOLUME,1000\n\
             2020-01-03,PE,\n",
        )
        .unwrap();

        let series = read_field_series_csv(&path).unwrap();

        assert_eq!(series.len(), 3);
        let close = series.iter().find(|s| s.field == Field::Close).unwrap();
        assert_eq!(close.points.len(), 2);
        let pe = series.iter().find(|s| s.field == Field::Pe).unwrap();
        assert_eq!(pe.points[0].value, None);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn unknown_field_name_is_an_error() {
        let dir = temp_dir();
        let path = dir.join("MBBM.KL.csv");
        fs::write(&path, "date,field,value\n2020-01-02,ADJ_CLOSE,8.50\n").unwrap();

        assert!(read_field_series_csv(&path).is_err());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn import_dir_takes_symbol_from_file_stem() {
        let dir = temp_dir();
        fs::write(
            dir.join("MBBM.KL.csv"),
            "date,field,value\n2020-01-02,CLOSE,8.50\n",
        )
        .unwrap();
        fs::write(
            dir.join("PUBM.KL.csv"),
            "date,field,value\n2020-01-02,CLOSE,19.80\n",
        )
        .unwrap();
        fs::write(dir.join("notes.txt"), "not a snapshot").unwrap();

        let batch = import_dir(&dir).unwrap();

        // File stems survive intact, dots included.
        assert!(batch.contains_symbol("MBBM.KL"));
        assert!(batch.contains_symbol("PUBM.KL"));
        assert_eq!(
            batch.series("MBBM.KL", Field::Close).unwrap().get(&d("2020-01-02")),
            Some(&8.5)
        );

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn import_missing_dir_is_an_error() {
        let dir = temp_dir().join("nope");
        assert!(import_dir(&dir).is_err());
    }
}
