use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::CourseInfo;
use crate::report::{ReportComposer, ReportOptions};
use crate::rubric::Rubric;

/// Receives each composed report.
pub trait ReportSink {
    fn accept(&mut self, rubric: &Rubric, student: &str, report: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Scores,
    Compose,
    Export,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentFailure {
    pub student: String,
    pub stage: FailureStage,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub activity: u32,
    pub generated: Vec<String>,
    pub failed: Vec<StudentFailure>,
}

impl BatchOutcome {
    pub fn failed_students(&self) -> Vec<&str> {
        self.failed
            .iter()
            .map(|failure| failure.student.as_str())
            .collect()
    }
}

pub struct BatchRunner<'a> {
    composer: ReportComposer<'a>,
    course: &'a CourseInfo,
    options: ReportOptions,
}

impl<'a> BatchRunner<'a> {
    pub fn new(
        composer: ReportComposer<'a>,
        course: &'a CourseInfo,
        options: ReportOptions,
    ) -> Self {
        Self {
            composer,
            course,
            options,
        }
    }

    /// Generates a report for every student of `rubric`.
    ///
    /// A student whose scores are missing or non-numeric is skipped; export
    /// failures are recorded the same way. Neither stops the batch.
    pub fn run(&self, rubric: &Rubric, sink: &mut dyn ReportSink) -> BatchOutcome {
        let mut outcome = BatchOutcome {
            activity: rubric.id(),
            ..BatchOutcome::default()
        };

        for student in rubric.students() {
            if let Err(err) = rubric.student_scores(student) {
                warn!(student, error = %err, "report generation failed: missing or incomplete scores");
                outcome.failed.push(failure(student, FailureStage::Scores, &err));
                continue;
            }

            let report = match self
                .composer
                .compose(rubric, student, self.course, &self.options)
            {
                Ok(report) => report,
                Err(err) => {
                    warn!(student, error = %err, "report generation failed");
                    outcome.failed.push(failure(student, FailureStage::Compose, &err));
                    continue;
                }
            };

            match sink.accept(rubric, student, &report) {
                Ok(()) => {
                    info!(student, activity = rubric.id(), "generated report");
                    outcome.generated.push(student.to_string());
                }
                Err(err) => {
                    warn!(student, error = %err, "export failed");
                    outcome.failed.push(failure(student, FailureStage::Export, &err));
                }
            }
        }

        if !outcome.failed.is_empty() {
            warn!(
                students = ?outcome.failed_students(),
                "reports could not be generated for some students"
            );
        }

        outcome
    }
}

fn failure(student: &str, stage: FailureStage, err: &dyn std::error::Error) -> StudentFailure {
    StudentFailure {
        student: student.to_string(),
        stage,
        reason: err.to_string(),
    }
}
