//! Per-student evaluation reports from spreadsheet grading rubrics.
//!
//! A workbook holds one rubric sheet per activity. [`rubric::RubricBook`] reads
//! those sheets into aligned points/comments tables, [`report::ReportComposer`]
//! turns one student's column into a Markdown report, and [`export::Exporter`]
//! writes it to disk and converts it with pandoc.

pub mod achievement;
pub mod batch;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod report;
pub mod rubric;
pub mod workbook;

#[cfg(test)]
mod testing;
