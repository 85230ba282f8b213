//! Error taxonomy for the report pipeline.
//!
//! Template-not-found is deliberately absent: the locator returns `Option`
//! because a missing template is an expected outcome, not a failure. Copy and
//! population errors are non-fatal inputs to the fallback cascade; only the
//! final from-scratch build surfaces an error to the caller.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    /// Cannot reach or authenticate to the data source. Fatal, no retry.
    #[error("cannot reach the data source: {0}")]
    Connectivity(String),

    /// A specific query errored. Fatal to the run.
    #[error("query execution failed: {0}")]
    Query(String),

    /// Caller-supplied input failed the non-emptiness check.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Every query came back empty; there is nothing to report.
    #[error("no rows returned for the requested vendors and period")]
    NoData,

    /// Copying a located template to the output path failed. Non-fatal; the
    /// strategy selector falls back to a from-scratch workbook.
    #[error("failed to copy template {template} to {output}: {source}")]
    TemplateCopy {
        template: PathBuf,
        output: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Population reported per-sheet failures or could not save. Non-fatal
    /// on a template copy; fatal when it happens on the last fallback.
    #[error(transparent)]
    Population(#[from] PopulationFailure),

    /// Writing the output artifact failed on the final fallback attempt.
    #[error("failed to write output workbook {path}: {message}")]
    OutputWrite { path: PathBuf, message: String },
}

impl ReportError {
    /// Whether the strategy cascade may still recover from this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ReportError::TemplateCopy { .. } | ReportError::Population(_)
        )
    }

    pub fn category(&self) -> &'static str {
        match self {
            ReportError::Connectivity(_) => "connectivity",
            ReportError::Query(_) => "query",
            ReportError::InvalidInput(_) => "invalid_input",
            ReportError::NoData => "no_data",
            ReportError::TemplateCopy { .. } => "template_copy",
            ReportError::Population(_) => "population",
            ReportError::OutputWrite { .. } => "output_write",
        }
    }
}

/// A single sheet that could not be cleared or written.
#[derive(Debug, Clone)]
pub struct SheetFailure {
    pub sheet: String,
    pub cause: String,
}

/// Non-success outcome of a populate call. Sheets already written in the same
/// call are listed in `completed`; they stay in the saved file when the save
/// itself succeeded.
#[derive(Debug, Default)]
pub struct PopulationFailure {
    pub failures: Vec<SheetFailure>,
    pub completed: Vec<String>,
}

impl PopulationFailure {
    /// A failure that prevented the whole workbook from being processed,
    /// such as an unreadable template copy or a failed save.
    pub fn workbook(cause: impl Into<String>) -> Self {
        Self {
            failures: vec![SheetFailure {
                sheet: "(workbook)".to_string(),
                cause: cause.into(),
            }],
            completed: Vec::new(),
        }
    }
}

impl fmt::Display for PopulationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "population failed for {} sheet(s)", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; {}: {}", failure.sheet, failure.cause)?;
        }
        if !self.completed.is_empty() {
            write!(f, " (completed: {})", self.completed.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for PopulationFailure {}
