//! Read-only diagnostics for `.hsf` farming-rule files.
//!
//! [`decode()`] turns a file into a [`model::RuleDocument`], [`analyze()`] runs
//! the statistics passes over it, and [`report`] packages the result for
//! front-ends.

pub mod analyze;
pub mod config;
pub mod decode;
pub mod error;
pub mod model;
pub mod report;
pub mod schema;

use anyhow::Context;

pub use crate::{
    analyze::{analyze, analyze_with, Findings, Pass, PassSet},
    config::{AnalyzeOptions, Config},
    decode::{decode, decode_file, DecodedFile},
    error::{DecodeError, SchemaError},
    model::RuleDocument,
    report::Report,
    schema::Schema,
};

/// Decode `opts.path` and run the selected passes with the built-in schema.
pub fn analyze_file(opts: &AnalyzeOptions) -> anyhow::Result<Report> {
    let decoded = decode_file(&opts.path)?;
    analyze_decoded(decoded, &opts.passes)
}

pub fn analyze_decoded(decoded: DecodedFile, passes: &PassSet) -> anyhow::Result<Report> {
    let findings = analyze_with(&decoded.document, Schema::hsf(), passes)
        .with_context(|| format!("failed to analyze {}", decoded.source.path))?;

    tracing::info!(
        path = %decoded.source.path,
        rules = findings.rule_count,
        passes = findings.passes_run.len(),
        skipped = findings.skipped.len(),
        "analysis finished"
    );

    Ok(Report::new(decoded.source, findings))
}
