//! Writing composed reports to disk and converting them to PDF.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use pulldown_cmark::{html, Options, Parser};
use tracing::{debug, info};

use crate::batch::ReportSink;
use crate::config::ExportConfig;
use crate::error::{Result, RubricError};
use crate::models::CourseInfo;
use crate::rubric::Rubric;

/// Converts a Markdown file into a distributable document.
pub trait DocumentConverter {
    fn convert(&self, markdown: &Path, output: &Path, toc: bool) -> Result<()>;
}

/// Runs pandoc as an external process.
#[derive(Debug, Clone)]
pub struct PandocConverter {
    program: String,
    args: Vec<String>,
    toc_arg: String,
}

impl PandocConverter {
    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            program: config.pandoc.clone(),
            args: config.pandoc_args.clone(),
            toc_arg: config.toc_arg.clone(),
        }
    }

    /// Arguments for one conversion; built fresh each call.
    pub fn command_args(&self, markdown: &Path, output: &Path, toc: bool) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--from=markdown".into(),
            "--output".into(),
            output.as_os_str().to_owned(),
        ];
        args.extend(self.args.iter().map(OsString::from));
        if toc {
            args.push(OsString::from(&self.toc_arg));
        }
        args.push(markdown.as_os_str().to_owned());
        args
    }
}

impl DocumentConverter for PandocConverter {
    fn convert(&self, markdown: &Path, output: &Path, toc: bool) -> Result<()> {
        let conversion_error = |reason: String| RubricError::Conversion {
            path: markdown.to_path_buf(),
            reason,
        };

        let result = Command::new(&self.program)
            .args(self.command_args(markdown, output, toc))
            .output()
            .map_err(|err| conversion_error(format!("could not run {}: {err}", self.program)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(conversion_error(format!(
                "{} exited with {}: {}",
                self.program,
                result.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

/// Per-run export switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub out_dir: PathBuf,
    pub temp: bool,
    pub timestamp: bool,
    pub remove_intermediate: bool,
    pub toc: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            temp: false,
            timestamp: true,
            remove_intermediate: true,
            toc: false,
        }
    }
}

/// Directory and file stem of one student's report files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub dir: PathBuf,
    pub stem: String,
}

impl ExportPaths {
    pub fn file(&self, extension: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", self.stem, extension))
    }
}

/// Files left on disk after an export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportedReport {
    pub pdf: Option<PathBuf>,
    pub intermediates: Vec<PathBuf>,
}

pub struct Exporter {
    config: ExportConfig,
    course: CourseInfo,
    options: ExportOptions,
    converter: Option<Box<dyn DocumentConverter>>,
}

impl Exporter {
    /// `converter: None` writes only the Markdown, text and HTML files and keeps them.
    pub fn new(
        config: ExportConfig,
        course: CourseInfo,
        options: ExportOptions,
        converter: Option<Box<dyn DocumentConverter>>,
    ) -> Self {
        Self {
            config,
            course,
            options,
            converter,
        }
    }

    pub fn paths(&self, activity: u32, student: &str, now: DateTime<Utc>) -> ExportPaths {
        let activity_dir = format!("{}_{}", self.config.activity_label, activity);

        let mut dir = self.options.out_dir.clone();
        if self.options.temp {
            dir.push(&self.config.temp_dir);
        }
        dir.push(&self.course.code);
        dir.push(&self.course.semester);
        dir.push(&activity_dir);
        dir.push(dir_safe_name(student));

        let mut stem = format!(
            "{}_{}_{}_{}_{}",
            self.config.report_label,
            self.course.code,
            self.course.semester,
            activity_dir,
            file_safe_name(student)
        );
        if self.options.temp {
            stem.push_str("_tmp");
        }
        if self.options.timestamp {
            stem.push_str(&now.format("_%Y%m%d_%H%M%S").to_string());
        }

        ExportPaths { dir, stem }
    }

    pub fn export(&self, activity: u32, student: &str, markdown: &str) -> Result<ExportedReport> {
        let paths = self.paths(activity, student, Utc::now());
        fs::create_dir_all(&paths.dir)?;

        let md = paths.file("md");
        let txt = paths.file("txt");
        let html_path = paths.file("html");

        fs::write(&md, markdown)?;
        fs::write(&txt, markdown)?;
        fs::write(&html_path, render_html(markdown))?;
        debug!(path = %md.display(), "wrote intermediate files");

        let intermediates = vec![txt, md.clone(), html_path];

        let Some(converter) = &self.converter else {
            return Ok(ExportedReport {
                pdf: None,
                intermediates,
            });
        };

        let pdf = paths.file("pdf");
        converter.convert(&md, &pdf, self.options.toc)?;
        info!(path = %pdf.display(), "wrote report");

        if self.options.remove_intermediate {
            for path in &intermediates {
                fs::remove_file(path)?;
            }
            return Ok(ExportedReport {
                pdf: Some(pdf),
                intermediates: Vec::new(),
            });
        }

        Ok(ExportedReport {
            pdf: Some(pdf),
            intermediates,
        })
    }
}

impl ReportSink for Exporter {
    fn accept(&mut self, rubric: &Rubric, student: &str, report: &str) -> Result<()> {
        self.export(rubric.id(), student, report).map(|_| ())
    }
}

/// Student name as used in file names: spaces become `_`, commas are dropped.
pub fn file_safe_name(student: &str) -> String {
    dir_safe_name(student).replace(' ', "_").replace(',', "")
}

/// Keeps the student's name readable as a single path component inside the
/// activity directory.
pub fn dir_safe_name(student: &str) -> String {
    let name: String = student
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            other => other,
        })
        .collect();
    if name.trim().chars().all(|c| c == '.') {
        name.replace('.', "_")
    } else {
        name
    }
}

pub fn render_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES);
    let mut output = String::new();
    html::push_html(&mut output, parser);
    output
}
