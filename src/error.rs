//! Error types for loading rubrics and producing reports.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = RubricError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum RubricError {
    #[error("failed to read workbook {path:?}: {source}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("failed to read sheet {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("duplicate activity number {id} in sheets {first:?} and {second:?}")]
    DuplicateActivity {
        id: u32,
        first: String,
        second: String,
    },

    #[error("activity number {id} doesn't exist. Activity numbers that do exist are {known:?}")]
    UnknownActivity { id: u32, known: Vec<u32> },

    #[error("rubric sheet {sheet:?} has no activity number in its name")]
    MissingActivityId { sheet: String },

    #[error("sheet {sheet:?} has no header row after {skipped} skipped rows")]
    MissingHeader { sheet: String, skipped: usize },

    #[error("sheet {sheet:?} has no {column:?} column")]
    MissingColumn { sheet: String, column: String },

    #[error("sheet {sheet:?} must contain the comments marker {marker:?} exactly once, found {found}")]
    CommentsMarker {
        sheet: String,
        marker: String,
        found: usize,
    },

    #[error("points and comments regions of sheet {sheet:?} do not line up: {detail}")]
    RegionMismatch { sheet: String, detail: String },

    #[error("student {student:?} not found in activity {activity}")]
    UnknownStudent { student: String, activity: u32 },

    #[error("missing or non-numeric score {value:?} for {student:?} on {criterion}")]
    InvalidScore {
        student: String,
        criterion: String,
        value: String,
    },

    #[error("score {score} is outside the 0-3 range")]
    ScoreOutOfRange { score: f64 },

    #[error("no {level:?} description for {criterion} in sheet {sheet:?}")]
    MissingDescription {
        sheet: String,
        criterion: String,
        level: String,
    },

    #[error("document conversion of {path:?} failed: {reason}")]
    Conversion { path: PathBuf, reason: String },
}
