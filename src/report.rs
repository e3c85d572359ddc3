use std::fmt::Write;

use crate::achievement::{Achievement, ScoreColor};
use crate::config::ReportConfig;
use crate::error::Result;
use crate::models::{format_score, CourseInfo, Criterion};
use crate::rubric::Rubric;

/// Toggles for the parts of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub summary_table: bool,
    pub colors: bool,
    pub include_scores: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            summary_table: true,
            colors: true,
            include_scores: false,
        }
    }
}

/// Generic achievement description(s) that apply to a score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenericComment {
    Single(String),
    Combo(String, String),
}

impl GenericComment {
    pub fn for_row(rubric: &Rubric, row: usize, achievement: Achievement) -> Result<Self> {
        Ok(match achievement {
            Achievement::Single(level) => {
                GenericComment::Single(rubric.description(row, level)?.to_string())
            }
            Achievement::Between(low, high) => GenericComment::Combo(
                rubric.description(row, low)?.to_string(),
                rubric.description(row, high)?.to_string(),
            ),
        })
    }

    pub fn render(&self, config: &ReportConfig) -> String {
        match self {
            GenericComment::Single(text) => {
                format!("{}\n\n> *{}*\n\n", config.performance, text)
            }
            GenericComment::Combo(low, high) => format!(
                "{}\n\n> *{}*\n\n> *{}*\n\n",
                config.intermediate_performance, low, high
            ),
        }
    }
}

/// Everything the report says about one criterion for one student.
#[derive(Debug, Clone)]
pub struct CriterionAssessment<'a> {
    pub criterion: &'a Criterion,
    pub score: f64,
    pub achievement: Achievement,
    pub generic: GenericComment,
    pub comment: Option<&'a str>,
}

impl CriterionAssessment<'_> {
    fn color(&self) -> ScoreColor {
        ScoreColor::from_score(self.score)
    }
}

pub struct ReportComposer<'a> {
    config: &'a ReportConfig,
}

impl<'a> ReportComposer<'a> {
    pub fn new(config: &'a ReportConfig) -> Self {
        Self { config }
    }

    /// Scores, levels and comments for `student`, in canonical criterion order.
    pub fn assess<'r>(
        &self,
        rubric: &'r Rubric,
        student: &str,
    ) -> Result<Vec<CriterionAssessment<'r>>> {
        let scores = rubric.student_scores(student)?;
        let comments = rubric.student_comments(student)?;

        rubric
            .criteria()
            .zip(scores)
            .zip(comments)
            .enumerate()
            .map(|(row, ((criterion, score), comment))| -> Result<CriterionAssessment<'r>> {
                let achievement = Achievement::from_score(score)?;
                Ok(CriterionAssessment {
                    criterion,
                    score,
                    achievement,
                    generic: GenericComment::for_row(rubric, row, achievement)?,
                    comment,
                })
            })
            .collect()
    }

    pub fn compose(
        &self,
        rubric: &Rubric,
        student: &str,
        course: &CourseInfo,
        options: &ReportOptions,
    ) -> Result<String> {
        let assessments = self.assess(rubric, student)?;
        let config = self.config;
        let mut output = String::new();

        let _ = write!(
            output,
            "# {} {}, {} {} {} ({})\n\n",
            config.title_prefix,
            course.code,
            course.semester,
            config.activity_word,
            rubric.id(),
            student
        );

        if options.summary_table {
            let _ = write!(output, "## {}\n\n", config.summary);
            output.push_str(&self.summary_table(&assessments, options));
            output.push_str("\n\n");
            output.push_str(&config.page_break);
        }

        for group in assessments.chunk_by(|a, b| a.criterion.category == b.criterion.category) {
            let _ = writeln!(
                output,
                "\n# {}: {}",
                config.category_label, group[0].criterion.category
            );

            for assessment in group {
                output.push_str(&self.criterion_heading(assessment, options));
                output.push_str("\n\n");
                output.push_str(&assessment.generic.render(config));

                if let Some(comment) = assessment.comment {
                    let _ = write!(output, "**{}**: {}", config.reason_for_lower_score, comment);
                }
                output.push('\n');
            }

            output.push('\n');
        }

        Ok(output)
    }

    fn criterion_heading(
        &self,
        assessment: &CriterionAssessment<'_>,
        options: &ReportOptions,
    ) -> String {
        let mut bracket = assessment.achievement.label(self.config);
        if options.include_scores {
            let _ = write!(
                bracket,
                ", {} {}",
                format_score(assessment.score),
                self.config.points
            );
        }

        let heading = format!("{} [{}]", assessment.criterion.title(), bracket);
        if options.colors {
            format!("\n## {}", assessment.color().paint(&heading))
        } else {
            format!("\n## {heading}")
        }
    }

    /// Markdown table of category, criterion and achievement (plus score).
    pub fn summary_table(
        &self,
        assessments: &[CriterionAssessment<'_>],
        options: &ReportOptions,
    ) -> String {
        let config = self.config;
        let mut table = String::new();

        if options.include_scores {
            let _ = writeln!(
                table,
                "|{} | {} | {} | {} |",
                config.category_label,
                config.criterion_label,
                config.achievement,
                config.table_score
            );
            let _ = writeln!(table, "|--- | --- | --- | --- |");
        } else {
            let _ = writeln!(
                table,
                "|{} | {} | {} |",
                config.category_label, config.criterion_label, config.achievement
            );
            let _ = writeln!(table, "|--- | --- | --- |");
        }

        for assessment in assessments {
            let color = assessment.color();
            let mut level = assessment.achievement.label(config);
            let mut score = format_score(assessment.score);
            if options.colors {
                level = color.paint(&level);
                score = color.paint(&score);
            }

            let _ = write!(
                table,
                "|{} | {} | {} |",
                assessment.criterion.category,
                assessment.criterion.title(),
                level
            );
            if options.include_scores {
                let _ = write!(table, " {score} |");
            }
            table.push('\n');
        }

        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievement::Level;
    use crate::config::RubricSchema;
    use crate::error::RubricError;
    use crate::rubric::RubricBook;
    use crate::testing::{fixture_rows, rubric_sheet};
    use crate::workbook::Workbook;

    fn rubric() -> Rubric {
        let workbook = Workbook::from_sheets(vec![rubric_sheet(
            "Aktivitet 2 vurderingsrubrikk",
            fixture_rows(),
        )]);
        let book = RubricBook::from_workbook(&workbook, &RubricSchema::default()).unwrap();
        book.activity(2).unwrap().clone()
    }

    fn course() -> CourseInfo {
        CourseInfo::new("ING1001", "H2026")
    }

    #[test]
    fn generic_comment_picks_one_or_two_descriptions() {
        let rubric = rubric();
        assert_eq!(
            GenericComment::for_row(&rubric, 0, Achievement::Single(Level::High)).unwrap(),
            GenericComment::Single("Lesbar".to_string())
        );
        assert_eq!(
            GenericComment::for_row(&rubric, 1, Achievement::Between(Level::Low, Level::Mid))
                .unwrap(),
            GenericComment::Combo("Rotete".to_string(), "Ryddig nok".to_string())
        );
    }

    #[test]
    fn combo_comment_uses_intermediate_wording() {
        let config = ReportConfig::default();
        let rendered =
            GenericComment::Combo("Rotete".to_string(), "Ryddig nok".to_string()).render(&config);
        assert!(rendered.starts_with(&config.intermediate_performance));
        assert!(rendered.contains("> *Rotete*\n\n> *Ryddig nok*\n\n"));
    }

    #[test]
    fn report_has_title_sections_and_comments() {
        let config = ReportConfig::default();
        let composer = ReportComposer::new(&config);
        let report = composer
            .compose(&rubric(), "Nordmann, Kari", &course(), &ReportOptions::default())
            .unwrap();

        assert!(report.starts_with(
            "# Vurdering i ING1001, H2026 aktivitet 2 (Nordmann, Kari)\n\n## Oppsummering\n\n"
        ));
        assert!(report.contains("\\pagebreak"));
        assert!(report.contains("\n# Kategori: Kode\n"));
        assert!(report.contains("\n# Kategori: Rapport\n"));
        assert!(report.contains("\n## \\textcolor{Green}{Lesbarhet [høy måloppnåelse]}\n\n"));
        assert!(report.contains("\n## \\textcolor{Red}{Struktur [lav måloppnåelse]}\n\n"));
        assert!(report.contains(
            "**Avvik fra høyeste måloppnåelse og/eller andre kommentarer**: Mangler innholdsfortegnelse\n"
        ));
        assert_eq!(report.matches("**Avvik").count(), 1);

        let kode = report.find("# Kategori: Kode").unwrap();
        let rapport = report.find("# Kategori: Rapport").unwrap();
        assert!(kode < rapport);
    }

    #[test]
    fn intermediate_scores_render_both_levels() {
        let config = ReportConfig::default();
        let composer = ReportComposer::new(&config);
        let options = ReportOptions {
            colors: false,
            ..ReportOptions::default()
        };
        let report = composer
            .compose(&rubric(), "Hansen, Ola", &course(), &options)
            .unwrap();

        assert!(report.contains("\n## Lesbarhet [middels-høy måloppnåelse]\n\n"));
        assert!(report.contains(&format!(
            "{}\n\n> *Delvis lesbar*\n\n> *Lesbar*\n\n",
            config.intermediate_performance
        )));
        assert!(report.contains("\n## Analyse [lav-middels måloppnåelse]\n\n"));
        assert!(!report.contains("\\textcolor"));
    }

    #[test]
    fn summary_table_lists_every_criterion() {
        let config = ReportConfig::default();
        let composer = ReportComposer::new(&config);
        let rubric = rubric();
        let assessments = composer.assess(&rubric, "Hansen, Ola").unwrap();
        let options = ReportOptions {
            include_scores: true,
            ..ReportOptions::default()
        };

        let table = composer.summary_table(&assessments, &options);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "|Kategori | Vurderingskriterium | Måloppnåelse | Score |");
        assert_eq!(
            lines[3],
            "|Rapport | Struktur | \\textcolor{Orange}{middels måloppnåelse} | \\textcolor{Orange}{2.0} |"
        );
    }

    #[test]
    fn scores_can_be_shown_in_headings() {
        let config = ReportConfig::default();
        let composer = ReportComposer::new(&config);
        let options = ReportOptions {
            summary_table: false,
            colors: false,
            include_scores: true,
        };
        let report = composer
            .compose(&rubric(), "Hansen, Ola", &course(), &options)
            .unwrap();

        assert!(report.contains("\n## Struktur [middels måloppnåelse, 2.0 poeng]\n\n"));
        assert!(!report.contains("Oppsummering"));
    }

    #[test]
    fn missing_score_blocks_the_report() {
        let config = ReportConfig::default();
        let composer = ReportComposer::new(&config);
        let err = composer
            .compose(&rubric(), "Berg, Ida", &course(), &ReportOptions::default())
            .unwrap_err();
        assert!(matches!(err, RubricError::InvalidScore { .. }));
    }
}
