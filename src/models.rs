use std::cmp::Ordering;
use std::fmt;

/// A single spreadsheet cell after loading.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Parses a raw text field the way a spreadsheet would show it.
    pub fn parse(raw: &str) -> Cell {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Cell::Number(value),
            _ => Cell::Text(raw.to_string()),
        }
    }

    /// Non-blank text content. Numbers are not text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(text) if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        }
    }

    /// Text used for keys and headers: trimmed text or the formatted number.
    pub fn key(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Cell::Number(value) => Some(format_number(*value)),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(value) => write!(f, "{}", format_number(*value)),
            Cell::Text(text) => write!(f, "{text}"),
        }
    }
}

fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Formats a score with at least one decimal, so `2` reads `2.0` and `2.5` stays `2.5`.
pub fn format_score(score: f64) -> String {
    if score.is_finite() && score.fract() == 0.0 {
        format!("{score:.1}")
    } else {
        format!("{score}")
    }
}

/// The (category, criterion-type, criterion-theme) triple identifying a rubric row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
    pub category: String,
    pub kind: Option<String>,
    pub theme: Option<String>,
}

impl Criterion {
    /// Heading text for the criterion; falls back to the type when the theme is blank.
    pub fn title(&self) -> &str {
        self.theme
            .as_deref()
            .or(self.kind.as_deref())
            .unwrap_or_default()
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} / {}",
            self.category,
            self.kind.as_deref().unwrap_or("-"),
            self.theme.as_deref().unwrap_or("-")
        )
    }
}

impl Ord for Criterion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.category
            .cmp(&other.category)
            .then_with(|| missing_last(&self.kind, &other.kind))
            .then_with(|| missing_last(&self.theme, &other.theme))
    }
}

impl PartialOrd for Criterion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Blank key cells sort after every filled one.
fn missing_last(a: &Option<String>, b: &Option<String>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// One criterion row of a rubric region, with every cell of the sheet row.
#[derive(Debug, Clone)]
pub struct RubricRow {
    pub criterion: Criterion,
    pub cells: Vec<Cell>,
}

impl RubricRow {
    pub fn cell(&self, column: usize) -> &Cell {
        self.cells.get(column).unwrap_or(&Cell::Empty)
    }
}

/// A student column in the rubric header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentColumn {
    pub name: String,
    pub column: usize,
}

/// Course identity printed in titles and used in output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseInfo {
    pub code: String,
    pub semester: String,
}

impl CourseInfo {
    pub fn new(code: impl Into<String>, semester: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            semester: semester.into(),
        }
    }
}
