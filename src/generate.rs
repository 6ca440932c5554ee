//! Run orchestration: load a settled schema, render every table, write files.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, error, info};

use crate::emit::{render_model, write_model, RenderedModel, WriteOutcome};
use crate::error::{EmitError, ModelgenError, Result};
use crate::schema::TableSchema;
use crate::source::SchemaSource;

/// Outcome of one generation run.
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    /// Tables that were skipped, with the reason.
    pub failed: Vec<(String, EmitError)>,
}

impl GenerationReport {
    pub fn succeeded(&self) -> usize {
        self.written.len() + self.unchanged.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Render and write models for an already settled table list.
///
/// A table that fails to render or write is logged and recorded in the
/// report; only failing to create `output_dir` aborts.
pub fn emit_all(tables: &[TableSchema], output_dir: &Path, origin: &str) -> Result<GenerationReport> {
    std::fs::create_dir_all(output_dir).map_err(|source| ModelgenError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let rendered: Vec<std::result::Result<RenderedModel, EmitError>> = tables
        .par_iter()
        .map(|table| render_model(table, origin))
        .collect();

    let mut report = GenerationReport::default();
    for (table, model) in tables.iter().zip(rendered) {
        match model.and_then(|model| write_model(output_dir, &model)) {
            Ok(WriteOutcome::Written(path)) => {
                info!(table = %table.name(), path = %path.display(), "model written");
                report.written.push(path);
            }
            Ok(WriteOutcome::Unchanged(path)) => {
                debug!(table = %table.name(), path = %path.display(), "model unchanged");
                report.unchanged.push(path);
            }
            Err(err) => {
                error!(table = %table.name(), error = %err, "model generation failed, table skipped");
                report.failed.push((table.name().to_string(), err));
            }
        }
    }

    Ok(report)
}

/// Load tables from `source` and emit one model per table into `output_dir`.
pub async fn generate<S: SchemaSource>(source: &S, output_dir: &Path) -> Result<GenerationReport> {
    info!(source = source.label(), output = %output_dir.display(), "generating models");
    let tables = source.load_tables().await?;
    let report = emit_all(&tables, output_dir, source.label())?;
    info!(
        written = report.written.len(),
        unchanged = report.unchanged.len(),
        failed = report.failed.len(),
        "generation finished"
    );
    Ok(report)
}
