use std::fs;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;

use crate::error::{Result, RubricError};
use crate::models::Cell;

/// A named grid of cells, anchored at A1.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

/// Sheets of one workbook in workbook order.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// Opens a spreadsheet file, or a directory holding one `.csv` file per sheet.
    pub fn open(path: &Path) -> Result<Self> {
        if path.is_dir() {
            Self::from_csv_dir(path)
        } else {
            Self::from_spreadsheet(path)
        }
    }

    pub fn from_spreadsheet(path: &Path) -> Result<Self> {
        let workbook_error = |source| RubricError::Workbook {
            path: path.to_path_buf(),
            source,
        };

        let mut workbook = open_workbook_auto(path).map_err(workbook_error)?;
        let mut sheets = Vec::new();

        for name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&name).map_err(workbook_error)?;
            let (row_offset, col_offset) = range
                .start()
                .map(|(row, col)| (row as usize, col as usize))
                .unwrap_or_default();

            let mut rows = vec![Vec::new(); row_offset];
            for row in range.rows() {
                let mut cells = vec![Cell::Empty; col_offset];
                cells.extend(row.iter().map(cell_from_data));
                rows.push(cells);
            }

            debug!(sheet = %name, rows = rows.len(), "read sheet");
            sheets.push(Sheet { name, rows });
        }

        Ok(Self { sheets })
    }

    /// Each `*.csv` file in `dir` becomes a sheet named after its file stem.
    ///
    /// Empty lines are skipped by the reader and do not count as rows, which
    /// shifts the offsets `header_skip_rows` relies on. Blank rows must be
    /// written as bare delimiters (`,,,`), as spreadsheet exports do.
    pub fn from_csv_dir(dir: &Path) -> Result<Self> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
            })
            .collect();
        paths.sort();

        let mut sheets = Vec::new();
        for path in paths {
            let name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            let rows = read_csv_rows(&path)?;
            debug!(sheet = %name, rows = rows.len(), "read csv sheet");
            sheets.push(Sheet { name, rows });
        }

        Ok(Self { sheets })
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str())
    }
}

fn read_csv_rows(path: &Path) -> Result<Vec<Vec<Cell>>> {
    let csv_error = |source| RubricError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        rows.push(record.iter().map(Cell::parse).collect());
    }
    Ok(rows)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(value) => Cell::Number(*value as f64),
        Data::Float(value) => Cell::Number(*value),
        Data::String(text) if text.trim().is_empty() => Cell::Empty,
        Data::String(text) => Cell::Text(text.clone()),
        // Dates, booleans and error values are never scores.
        other => Cell::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn csv_directory_becomes_sorted_sheets() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Aktivitet 2.csv"), "a,b\n1,2.5\n").unwrap();
        fs::write(dir.path().join("Aktivitet 1.csv"), "x\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let workbook = Workbook::open(dir.path()).unwrap();
        let names: Vec<&str> = workbook.sheet_names().collect();
        assert_eq!(names, vec!["Aktivitet 1", "Aktivitet 2"]);

        let sheet = &workbook.sheets()[1];
        assert_eq!(sheet.rows[0][0], Cell::Text("a".to_string()));
        assert_eq!(sheet.rows[1][1], Cell::Number(2.5));
    }

    #[test]
    fn ragged_csv_rows_are_accepted() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("sheet.csv"), "a\n\"b, c\",,3\n").unwrap();

        let workbook = Workbook::from_csv_dir(dir.path()).unwrap();
        let rows = &workbook.sheets()[0].rows;
        assert_eq!(rows[0].len(), 1);
        assert_eq!(
            rows[1],
            vec![
                Cell::Text("b, c".to_string()),
                Cell::Empty,
                Cell::Number(3.0)
            ]
        );
    }

    #[test]
    fn csv_words_that_look_like_floats_stay_text() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("sheet.csv"), "Kategori,Nan,Inf\nRapport,nan,Infinity\n").unwrap();

        let workbook = Workbook::from_csv_dir(dir.path()).unwrap();
        let rows = &workbook.sheets()[0].rows;
        let header: Vec<Option<String>> = rows[0].iter().map(Cell::key).collect();
        assert_eq!(
            header,
            vec![
                Some("Kategori".to_string()),
                Some("Nan".to_string()),
                Some("Inf".to_string()),
            ]
        );
        let comments: Vec<Option<&str>> = rows[1].iter().map(Cell::as_text).collect();
        assert_eq!(comments, vec![Some("Rapport"), Some("nan"), Some("Infinity")]);
    }

    #[test]
    fn spreadsheet_values_map_to_cells() {
        assert_eq!(cell_from_data(&Data::Int(3)), Cell::Number(3.0));
        assert_eq!(cell_from_data(&Data::Float(1.5)), Cell::Number(1.5));
        assert_eq!(cell_from_data(&Data::Empty), Cell::Empty);
        assert_eq!(
            cell_from_data(&Data::Bool(true)),
            Cell::Text("true".to_string())
        );
    }

    #[test]
    fn missing_spreadsheet_is_a_workbook_error() {
        let dir = tempdir().unwrap();
        let err = Workbook::open(&dir.path().join("missing.xlsx")).unwrap_err();
        assert!(matches!(err, RubricError::Workbook { .. }));
    }
}
