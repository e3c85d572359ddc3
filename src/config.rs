//! Configuration for rubric layout, report wording and export.
//!
//! Everything can be overridden from a TOML file; any key left out keeps its
//! default. The defaults match the Norwegian rubric workbooks the tool was
//! built for.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::achievement::Level;
use crate::error::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub schema: RubricSchema,
    pub report: ReportConfig,
    pub export: ExportConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

/// One label per achievement level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelLabels {
    pub low: String,
    pub mid: String,
    pub high: String,
}

impl LevelLabels {
    pub fn get(&self, level: Level) -> &str {
        match level {
            Level::Low => &self.low,
            Level::Mid => &self.mid,
            Level::High => &self.high,
        }
    }
}

impl Default for LevelLabels {
    fn default() -> Self {
        Self {
            low: "Lav måloppnåelse".to_string(),
            mid: "Middels måloppnåelse".to_string(),
            high: "Høy måloppnåelse".to_string(),
        }
    }
}

/// Layout of a rubric sheet.
///
/// A rubric sheet has `header_skip_rows` rows of preamble, one header row, the
/// points region, `points_trailing_rows` separator rows, a row whose category
/// cell holds `comments_marker`, `comments_leading_rows` rows (normally a
/// repeated header) and finally the comments region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RubricSchema {
    /// Sheet names must contain this and `rubric_token` to be read as rubrics.
    pub activity_token: String,
    pub rubric_token: String,
    pub header_skip_rows: usize,
    /// Leading columns describing criteria; every later column is a student.
    pub criteria_columns: usize,
    pub category_column: String,
    pub criterion_type_column: String,
    pub criterion_theme_column: String,
    /// Header names of the generic description column for each level.
    pub level_columns: LevelLabels,
    pub comments_marker: String,
    pub points_trailing_rows: usize,
    pub comments_leading_rows: usize,
}

impl Default for RubricSchema {
    fn default() -> Self {
        Self {
            activity_token: "Aktivitet".to_string(),
            rubric_token: "vurderingsrubrikk".to_string(),
            header_skip_rows: 2,
            criteria_columns: 9,
            category_column: "Kategori".to_string(),
            criterion_type_column: "Kriterietype".to_string(),
            criterion_theme_column: "Vurderingskriterium".to_string(),
            level_columns: LevelLabels::default(),
            comments_marker: "Spesifikke kommentarer til hvert punkt".to_string(),
            points_trailing_rows: 1,
            comments_leading_rows: 1,
        }
    }
}

/// Wording and separators used by the report composer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub title_prefix: String,
    pub activity_word: String,
    pub levels: LevelLabels,
    pub achievement: String,
    /// Prefix for a single-level label.
    pub combine_single_prefix: String,
    /// Prefix for a two-level label.
    pub combine_start: String,
    /// Joins the two halves of a two-level label.
    pub combine_separator: String,
    pub summary: String,
    pub category_label: String,
    pub criterion_label: String,
    pub table_score: String,
    pub points: String,
    pub reason_for_lower_score: String,
    pub intermediate_performance: String,
    pub performance: String,
    pub page_break: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title_prefix: "Vurdering i".to_string(),
            activity_word: "aktivitet".to_string(),
            levels: LevelLabels::default(),
            achievement: "Måloppnåelse".to_string(),
            combine_single_prefix: String::new(),
            combine_start: String::new(),
            combine_separator: "-".to_string(),
            summary: "Oppsummering".to_string(),
            category_label: "Kategori".to_string(),
            criterion_label: "Vurderingskriterium".to_string(),
            table_score: "Score".to_string(),
            points: "poeng".to_string(),
            reason_for_lower_score: "Avvik fra høyeste måloppnåelse og/eller andre kommentarer"
                .to_string(),
            intermediate_performance: "På dette vurderingskriteret har du prestert et sted mellom følgende måloppnåelsebeskrivelser:".to_string(),
            performance: "Følgende måloppnåelsebeskrivelse er omtrent beskrivende for prestasjonen din på dette vurderingskriteriet:".to_string(),
            page_break: "\\pagebreak".to_string(),
        }
    }
}

/// Output naming and document conversion settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub activity_label: String,
    pub report_label: String,
    pub temp_dir: String,
    pub pandoc: String,
    pub pandoc_args: Vec<String>,
    pub toc_arg: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            activity_label: "Aktivitet".to_string(),
            report_label: "Vurderingsrapport".to_string(),
            temp_dir: "tmp".to_string(),
            pandoc: "pandoc".to_string(),
            pandoc_args: [
                "--mathjax",
                "-V",
                "geometry:margin=2.5cm",
                "--highlight-style=pygments",
                "--include-in-header=config/header.tex",
                "--include-after-body=config/after-body.tex",
                "--pdf-engine=xelatex",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            toc_arg: "--table-of-contents".to_string(),
        }
    }
}
