use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};

use rubric_reports::batch::BatchRunner;
use rubric_reports::config::AppConfig;
use rubric_reports::export::{DocumentConverter, ExportOptions, Exporter, PandocConverter};
use rubric_reports::logging;
use rubric_reports::models::CourseInfo;
use rubric_reports::report::{ReportComposer, ReportOptions};
use rubric_reports::rubric::RubricBook;
use rubric_reports::workbook::Workbook;

#[derive(Parser)]
#[command(name = "rubric-reports")]
#[command(version, about = "Per-student evaluation reports from spreadsheet rubrics", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Log level or filter directive (e.g. `debug`, `rubric_reports=trace`)
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
    /// TOML file overriding sheet layout, report wording and export settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CourseArgs {
    /// Spreadsheet file, or a directory with one CSV file per sheet
    #[arg(long)]
    workbook: PathBuf,
    #[arg(long)]
    activity: u32,
    /// Course code, e.g. ING1001
    #[arg(long)]
    course: String,
    /// Semester label, e.g. H2026
    #[arg(long)]
    semester: String,
}

#[derive(Args)]
struct ReportFlags {
    /// Leave out the summary table
    #[arg(long)]
    no_summary: bool,
    /// Plain headings and table cells without score colours
    #[arg(long)]
    no_colors: bool,
    /// Show numeric scores next to achievement levels
    #[arg(long)]
    include_scores: bool,
}

impl ReportFlags {
    fn options(&self) -> ReportOptions {
        ReportOptions {
            summary_table: !self.no_summary,
            colors: !self.no_colors,
            include_scores: self.include_scores,
        }
    }
}

#[derive(Args)]
struct ExportFlags {
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// Write under the temporary directory and mark files as temporary
    #[arg(long)]
    temp: bool,
    /// Leave the timestamp out of file names
    #[arg(long)]
    no_timestamp: bool,
    /// Keep the Markdown, text and HTML files next to the PDF
    #[arg(long)]
    keep_intermediate: bool,
    /// Add a table of contents to the PDF
    #[arg(long)]
    toc: bool,
    /// Skip PDF conversion and keep only Markdown, text and HTML
    #[arg(long)]
    no_pdf: bool,
    /// pandoc executable to use
    #[arg(long)]
    pandoc: Option<String>,
}

impl ExportFlags {
    fn exporter(&self, config: &AppConfig, course: CourseInfo) -> Exporter {
        let mut export_config = config.export.clone();
        if let Some(pandoc) = &self.pandoc {
            export_config.pandoc = pandoc.clone();
        }

        let converter: Option<Box<dyn DocumentConverter>> = if self.no_pdf {
            None
        } else {
            Some(Box::new(PandocConverter::from_config(&export_config)))
        };

        let options = ExportOptions {
            out_dir: self.out_dir.clone(),
            temp: self.temp,
            timestamp: !self.no_timestamp,
            remove_intermediate: !self.keep_intermediate,
            toc: self.toc,
        };

        Exporter::new(export_config, course, options, converter)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List rubric activities, criteria and students in a workbook
    Activities {
        #[arg(long)]
        workbook: PathBuf,
    },
    /// Print one student's report as Markdown
    Preview {
        #[command(flatten)]
        course: CourseArgs,
        #[arg(long)]
        student: String,
        #[command(flatten)]
        report: ReportFlags,
    },
    /// Generate and export one student's report
    Report {
        #[command(flatten)]
        course: CourseArgs,
        #[arg(long)]
        student: String,
        #[command(flatten)]
        report: ReportFlags,
        #[command(flatten)]
        export: ExportFlags,
    },
    /// Generate and export reports for every student of an activity
    Batch {
        #[command(flatten)]
        course: CourseArgs,
        #[command(flatten)]
        report: ReportFlags,
        #[command(flatten)]
        export: ExportFlags,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
}

fn load_rubrics(path: &Path, config: &AppConfig) -> anyhow::Result<RubricBook> {
    let workbook = Workbook::open(path)
        .with_context(|| format!("failed to open workbook {}", path.display()))?;
    let book = RubricBook::from_workbook(&workbook, &config.schema)
        .with_context(|| format!("failed to load rubrics from {}", path.display()))?;
    Ok(book)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose, cli.log_level.as_deref(), cli.log_json)
        .map_err(|err| anyhow!(err))
        .context("failed to initialise logging")?;

    let config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Activities { workbook } => {
            let book = load_rubrics(&workbook, &config)?;
            if book.rubrics().is_empty() {
                println!("No rubric sheets found.");
                return Ok(());
            }

            for rubric in book.rubrics() {
                let students: Vec<&str> = rubric.students().collect();
                println!(
                    "Activity {} ({}): {} criteria in {} categories, {} students",
                    rubric.id(),
                    rubric.sheet_name(),
                    rubric.len(),
                    rubric.categories().len(),
                    students.len()
                );
                for student in students {
                    println!("- {student}");
                }
            }
        }
        Commands::Preview {
            course,
            student,
            report,
        } => {
            let book = load_rubrics(&course.workbook, &config)?;
            let rubric = book.activity(course.activity)?;
            let info = CourseInfo::new(course.course, course.semester);
            let markdown = ReportComposer::new(&config.report)
                .compose(rubric, &student, &info, &report.options())?;
            print!("{markdown}");
        }
        Commands::Report {
            course,
            student,
            report,
            export,
        } => {
            let book = load_rubrics(&course.workbook, &config)?;
            let rubric = book.activity(course.activity)?;
            let info = CourseInfo::new(course.course, course.semester);
            let markdown = ReportComposer::new(&config.report)
                .compose(rubric, &student, &info, &report.options())
                .with_context(|| format!("report generation failed for {student}"))?;

            let exporter = export.exporter(&config, info);
            let exported = exporter
                .export(rubric.id(), &student, &markdown)
                .with_context(|| format!("export failed for {student}"))?;

            match exported.pdf {
                Some(pdf) => println!("Report written to {}.", pdf.display()),
                None => {
                    for path in exported.intermediates {
                        println!("Wrote {}.", path.display());
                    }
                }
            }
        }
        Commands::Batch {
            course,
            report,
            export,
            json,
        } => {
            let book = load_rubrics(&course.workbook, &config)?;
            let rubric = book.activity(course.activity)?;
            let info = CourseInfo::new(course.course, course.semester);

            let mut exporter = export.exporter(&config, info.clone());
            let runner = BatchRunner::new(
                ReportComposer::new(&config.report),
                &info,
                report.options(),
            );
            let outcome = runner.run(rubric, &mut exporter);

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
                return Ok(());
            }

            for student in &outcome.generated {
                println!("SUCCESS: generated report for {student}");
            }
            if outcome.failed.is_empty() {
                println!("Reports generated for all {} students.", outcome.generated.len());
            } else {
                println!("Reports could not be generated for the following students:");
                for failure in &outcome.failed {
                    println!("- {} ({:?}): {}", failure.student, failure.stage, failure.reason);
                }
            }
        }
    }

    Ok(())
}
