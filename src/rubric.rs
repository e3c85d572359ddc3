//! Rubric sheets parsed into aligned points and comments tables.
//!
//! A rubric sheet holds the same criteria twice: first with the score each
//! student got, then (below the comments marker) with the free-text comment for
//! each score. Both regions are sorted by criterion so row `i` of the points
//! table and row `i` of the comments table always describe the same criterion.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::achievement::Level;
use crate::config::RubricSchema;
use crate::error::{Result, RubricError};
use crate::models::{Cell, Criterion, RubricRow, StudentColumn};
use crate::workbook::{Sheet, Workbook};

/// All rubric sheets of a workbook, keyed by activity number.
#[derive(Debug, Clone)]
pub struct RubricBook {
    rubrics: Vec<Rubric>,
}

impl RubricBook {
    pub fn from_workbook(workbook: &Workbook, schema: &RubricSchema) -> Result<Self> {
        let sheets: Vec<&Sheet> = workbook
            .sheets()
            .iter()
            .filter(|sheet| is_rubric_sheet(&sheet.name, schema))
            .collect();

        let mut ids = Vec::with_capacity(sheets.len());
        let mut seen: HashMap<u32, &str> = HashMap::new();
        for sheet in &sheets {
            let id = activity_id(&sheet.name)?;
            if let Some(first) = seen.insert(id, &sheet.name) {
                return Err(RubricError::DuplicateActivity {
                    id,
                    first: first.to_string(),
                    second: sheet.name.clone(),
                });
            }
            ids.push(id);
        }

        let rubrics = sheets
            .into_iter()
            .zip(ids)
            .map(|(sheet, id)| Rubric::parse(id, sheet, schema))
            .collect::<Result<Vec<_>>>()?;

        info!(activities = ?rubrics.iter().map(Rubric::id).collect::<Vec<_>>(), "loaded rubrics");
        Ok(Self { rubrics })
    }

    pub fn activity_ids(&self) -> Vec<u32> {
        self.rubrics.iter().map(Rubric::id).collect()
    }

    pub fn rubrics(&self) -> &[Rubric] {
        &self.rubrics
    }

    pub fn activity(&self, id: u32) -> Result<&Rubric> {
        self.rubrics
            .iter()
            .find(|rubric| rubric.id == id)
            .ok_or_else(|| RubricError::UnknownActivity {
                id,
                known: self.activity_ids(),
            })
    }
}

fn is_rubric_sheet(name: &str, schema: &RubricSchema) -> bool {
    name.contains(&schema.activity_token) && name.contains(&schema.rubric_token)
}

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid activity number pattern"));

/// First run of ASCII digits in a sheet name.
pub fn activity_id(sheet_name: &str) -> Result<u32> {
    DIGITS
        .find(sheet_name)
        .and_then(|found| found.as_str().parse().ok())
        .ok_or_else(|| RubricError::MissingActivityId {
            sheet: sheet_name.to_string(),
        })
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    category: usize,
    kind: usize,
    theme: usize,
    low: usize,
    mid: usize,
    high: usize,
}

impl Columns {
    fn resolve(sheet: &str, header: &[String], schema: &RubricSchema) -> Result<Self> {
        let find = |name: &str| {
            header
                .iter()
                .position(|column| column == name)
                .ok_or_else(|| RubricError::MissingColumn {
                    sheet: sheet.to_string(),
                    column: name.to_string(),
                })
        };

        Ok(Self {
            category: find(&schema.category_column)?,
            kind: find(&schema.criterion_type_column)?,
            theme: find(&schema.criterion_theme_column)?,
            low: find(&schema.level_columns.low)?,
            mid: find(&schema.level_columns.mid)?,
            high: find(&schema.level_columns.high)?,
        })
    }

    fn level(&self, level: Level) -> usize {
        match level {
            Level::Low => self.low,
            Level::Mid => self.mid,
            Level::High => self.high,
        }
    }

    fn criterion(&self, cells: &[Cell]) -> Option<Criterion> {
        let key = |column: usize| cells.get(column).and_then(Cell::key);
        Some(Criterion {
            category: key(self.category)?,
            kind: key(self.kind),
            theme: key(self.theme),
        })
    }
}

/// One activity: a points table and a comments table with identical row order.
#[derive(Debug, Clone)]
pub struct Rubric {
    id: u32,
    sheet: String,
    columns: Columns,
    students: Vec<StudentColumn>,
    points: Vec<RubricRow>,
    comments: Vec<RubricRow>,
}

impl Rubric {
    pub fn parse(id: u32, sheet: &Sheet, schema: &RubricSchema) -> Result<Self> {
        let header_row = sheet
            .rows
            .get(schema.header_skip_rows)
            .ok_or_else(|| RubricError::MissingHeader {
                sheet: sheet.name.clone(),
                skipped: schema.header_skip_rows,
            })?;
        let header: Vec<String> = header_row
            .iter()
            .map(|cell| cell.key().unwrap_or_default())
            .collect();
        let columns = Columns::resolve(&sheet.name, &header, schema)?;

        let students = header
            .iter()
            .enumerate()
            .skip(schema.criteria_columns)
            .filter(|(_, name)| !name.is_empty())
            .map(|(column, name)| StudentColumn {
                name: name.clone(),
                column,
            })
            .collect();

        let body = &sheet.rows[schema.header_skip_rows + 1..];
        let markers: Vec<usize> = body
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                row.get(columns.category)
                    .and_then(Cell::key)
                    .is_some_and(|value| value == schema.comments_marker)
            })
            .map(|(index, _)| index)
            .collect();
        let &[marker] = markers.as_slice() else {
            return Err(RubricError::CommentsMarker {
                sheet: sheet.name.clone(),
                marker: schema.comments_marker.clone(),
                found: markers.len(),
            });
        };

        let points_end = marker.saturating_sub(schema.points_trailing_rows);
        let comments_start = (marker + 1 + schema.comments_leading_rows).min(body.len());

        let points = region(&body[..points_end], &columns);
        let comments = region(&body[comments_start..], &columns);
        check_alignment(&sheet.name, &points, &comments)?;

        debug!(
            activity = id,
            sheet = %sheet.name,
            criteria = points.len(),
            "parsed rubric"
        );

        Ok(Self {
            id,
            sheet: sheet.name.clone(),
            columns,
            students,
            points,
            comments,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn students(&self) -> impl Iterator<Item = &str> {
        self.students.iter().map(|student| student.name.as_str())
    }

    /// Criteria in canonical order.
    pub fn criteria(&self) -> impl Iterator<Item = &Criterion> {
        self.points.iter().map(|row| &row.criterion)
    }

    pub fn points(&self) -> &[RubricRow] {
        &self.points
    }

    pub fn comments(&self) -> &[RubricRow] {
        &self.comments
    }

    /// Categories in table order, each listed once.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        for criterion in self.criteria() {
            if !categories.contains(&criterion.category.as_str()) {
                categories.push(&criterion.category);
            }
        }
        categories
    }

    pub fn criteria_in<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Criterion> {
        self.criteria()
            .filter(move |criterion| criterion.category == category)
    }

    fn student_column(&self, student: &str) -> Result<usize> {
        self.students
            .iter()
            .find(|column| column.name == student)
            .map(|column| column.column)
            .ok_or_else(|| RubricError::UnknownStudent {
                student: student.to_string(),
                activity: self.id,
            })
    }

    /// Raw score cells for a student in canonical order.
    pub fn student_points(&self, student: &str) -> Result<Vec<&Cell>> {
        let column = self.student_column(student)?;
        Ok(self.points.iter().map(|row| row.cell(column)).collect())
    }

    /// Scores for a student; every cell must hold a finite number.
    pub fn student_scores(&self, student: &str) -> Result<Vec<f64>> {
        let column = self.student_column(student)?;
        self.points
            .iter()
            .map(|row| match row.cell(column) {
                Cell::Number(score) if !score.is_nan() => Ok(*score),
                other => Err(RubricError::InvalidScore {
                    student: student.to_string(),
                    criterion: row.criterion.to_string(),
                    value: other.to_string(),
                }),
            })
            .collect()
    }

    /// Free-text comments for a student; cells without text are `None`.
    pub fn student_comments(&self, student: &str) -> Result<Vec<Option<&str>>> {
        let column = self.student_column(student)?;
        Ok(self
            .comments
            .iter()
            .map(|row| row.cell(column).as_text())
            .collect())
    }

    /// Generic description of `level` for the criterion at `row`.
    pub fn description(&self, row: usize, level: Level) -> Result<&str> {
        let missing = || RubricError::MissingDescription {
            sheet: self.sheet.clone(),
            criterion: self
                .points
                .get(row)
                .map(|row| row.criterion.to_string())
                .unwrap_or_else(|| format!("row {row}")),
            level: format!("{level:?}"),
        };

        self.points
            .get(row)
            .and_then(|points| points.cell(self.columns.level(level)).as_text())
            .ok_or_else(missing)
    }
}

fn region(rows: &[Vec<Cell>], columns: &Columns) -> Vec<RubricRow> {
    let mut region: Vec<RubricRow> = rows
        .iter()
        .filter_map(|cells| {
            columns.criterion(cells).map(|criterion| RubricRow {
                criterion,
                cells: cells.clone(),
            })
        })
        .collect();
    region.sort_by(|a, b| a.criterion.cmp(&b.criterion));
    region
}

fn check_alignment(sheet: &str, points: &[RubricRow], comments: &[RubricRow]) -> Result<()> {
    if points.len() != comments.len() {
        return Err(RubricError::RegionMismatch {
            sheet: sheet.to_string(),
            detail: format!(
                "{} criteria with points but {} with comments",
                points.len(),
                comments.len()
            ),
        });
    }

    if let Some((p, c)) = points
        .iter()
        .zip(comments)
        .find(|(p, c)| p.criterion != c.criterion)
    {
        return Err(RubricError::RegionMismatch {
            sheet: sheet.to_string(),
            detail: format!("{} has no matching comment row ({})", p.criterion, c.criterion),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture_rows, rubric_sheet, text_row};

    fn load(sheets: Vec<Sheet>) -> Result<RubricBook> {
        RubricBook::from_workbook(&Workbook::from_sheets(sheets), &RubricSchema::default())
    }

    #[test]
    fn finds_rubric_sheets_by_name() {
        let book = load(vec![
            rubric_sheet("Aktivitet 3 vurderingsrubrikk", fixture_rows()),
            rubric_sheet("Oversikt", vec![]),
            rubric_sheet("Aktivitet 1 vurderingsrubrikk", fixture_rows()),
        ])
        .unwrap();
        assert_eq!(book.activity_ids(), vec![3, 1]);
        assert_eq!(book.activity(1).unwrap().sheet_name(), "Aktivitet 1 vurderingsrubrikk");
    }

    #[test]
    fn activity_id_is_first_number_in_name() {
        assert_eq!(activity_id("Aktivitet 12 vurderingsrubrikk v2").unwrap(), 12);
        assert!(matches!(
            activity_id("Aktivitet vurderingsrubrikk"),
            Err(RubricError::MissingActivityId { .. })
        ));
    }

    #[test]
    fn activity_id_ignores_non_ascii_digits() {
        assert_eq!(activity_id("Aktivitet \u{0663} 4 vurderingsrubrikk").unwrap(), 4);
        assert!(activity_id("Aktivitet \u{0663} vurderingsrubrikk").is_err());
    }

    #[test]
    fn duplicate_activity_ids_fail_loading() {
        let err = load(vec![
            rubric_sheet("Aktivitet 2 vurderingsrubrikk", fixture_rows()),
            rubric_sheet("Aktivitet 02 vurderingsrubrikk (kopi)", fixture_rows()),
        ])
        .unwrap_err();
        assert!(matches!(err, RubricError::DuplicateActivity { id: 2, .. }));
    }

    #[test]
    fn unknown_activity_lists_known_ids() {
        let book = load(vec![
            rubric_sheet("Aktivitet 1 vurderingsrubrikk", fixture_rows()),
            rubric_sheet("Aktivitet 4 vurderingsrubrikk", fixture_rows()),
        ])
        .unwrap();
        match book.activity(7) {
            Err(RubricError::UnknownActivity { id, known }) => {
                assert_eq!(id, 7);
                assert_eq!(known, vec![1, 4]);
            }
            other => panic!("expected unknown activity, got {other:?}"),
        }
    }

    #[test]
    fn points_and_comments_share_row_order() {
        let book = load(vec![rubric_sheet(
            "Aktivitet 1 vurderingsrubrikk",
            fixture_rows(),
        )])
        .unwrap();
        let rubric = book.activity(1).unwrap();

        let points: Vec<&Criterion> = rubric.points().iter().map(|row| &row.criterion).collect();
        let comments: Vec<&Criterion> =
            rubric.comments().iter().map(|row| &row.criterion).collect();
        assert_eq!(points, comments);

        let titles: Vec<&str> = rubric.criteria().map(Criterion::title).collect();
        assert_eq!(titles, vec!["Lesbarhet", "Struktur", "Analyse"]);
        assert_eq!(rubric.categories(), vec!["Kode", "Rapport"]);
        assert_eq!(rubric.criteria_in("Rapport").count(), 2);
    }

    #[test]
    fn students_follow_criteria_columns() {
        let book = load(vec![rubric_sheet(
            "Aktivitet 1 vurderingsrubrikk",
            fixture_rows(),
        )])
        .unwrap();
        let students: Vec<&str> = book.activity(1).unwrap().students().collect();
        assert_eq!(students, vec!["Nordmann, Kari", "Hansen, Ola", "Berg, Ida"]);
    }

    #[test]
    fn student_tables_are_aligned() {
        let book = load(vec![rubric_sheet(
            "Aktivitet 1 vurderingsrubrikk",
            fixture_rows(),
        )])
        .unwrap();
        let rubric = book.activity(1).unwrap();

        assert_eq!(rubric.student_scores("Hansen, Ola").unwrap(), vec![2.5, 2.0, 1.5]);
        assert_eq!(
            rubric.student_comments("Nordmann, Kari").unwrap(),
            vec![None, Some("Mangler innholdsfortegnelse"), None]
        );
        assert_eq!(rubric.description(2, Level::High).unwrap(), "God analyse");
    }

    #[test]
    fn missing_score_is_reported_per_student() {
        let book = load(vec![rubric_sheet(
            "Aktivitet 1 vurderingsrubrikk",
            fixture_rows(),
        )])
        .unwrap();
        let rubric = book.activity(1).unwrap();

        let err = rubric.student_scores("Berg, Ida").unwrap_err();
        assert!(matches!(err, RubricError::InvalidScore { ref student, .. } if student == "Berg, Ida"));
        assert_eq!(rubric.student_points("Berg, Ida").unwrap()[1], &Cell::Empty);
        assert!(matches!(
            rubric.student_scores("Ukjent"),
            Err(RubricError::UnknownStudent { .. })
        ));
    }

    #[test]
    fn marker_must_appear_exactly_once() {
        let mut rows = fixture_rows();
        rows.retain(|row| {
            row.first().and_then(Cell::key).as_deref()
                != Some("Spesifikke kommentarer til hvert punkt")
        });
        let err = load(vec![rubric_sheet("Aktivitet 1 vurderingsrubrikk", rows)]).unwrap_err();
        assert!(matches!(err, RubricError::CommentsMarker { found: 0, .. }));

        let mut rows = fixture_rows();
        rows.push(text_row(&["Spesifikke kommentarer til hvert punkt"]));
        let err = load(vec![rubric_sheet("Aktivitet 1 vurderingsrubrikk", rows)]).unwrap_err();
        assert!(matches!(err, RubricError::CommentsMarker { found: 2, .. }));
    }

    #[test]
    fn mismatched_regions_are_rejected() {
        let mut rows = fixture_rows();
        rows.pop();
        let err = load(vec![rubric_sheet("Aktivitet 1 vurderingsrubrikk", rows)]).unwrap_err();
        assert!(matches!(err, RubricError::RegionMismatch { .. }));
    }

    #[test]
    fn missing_level_column_is_reported() {
        let mut rows = fixture_rows();
        rows[2][4] = Cell::Text("Middels".to_string());
        let err = load(vec![rubric_sheet("Aktivitet 1 vurderingsrubrikk", rows)]).unwrap_err();
        assert!(
            matches!(err, RubricError::MissingColumn { ref column, .. } if column == "Middels måloppnåelse")
        );
    }
}
