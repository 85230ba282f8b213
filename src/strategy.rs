//! Output strategy selection: an explicit, ordered fallback cascade.
//!
//! The decision table from the run configuration and the locator result
//! becomes a plan, a list of strategies tried in order until one succeeds.
//! Copy and population failures on a template advance to the next strategy;
//! only failure of the final blank-workbook build is fatal.

use crate::config::OutputFormat;
use crate::error::ReportError;
use crate::model::{OutputMethod, ResultSet, TabMapping, TemplateDescriptor, TemplateFormat};
use crate::populate::{PopulateReport, populate};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub enum OutputStrategy {
    /// Copy the located template to the output path, then populate in place.
    CopyTemplate(TemplateDescriptor),
    /// Build a brand-new workbook from scratch in the preferred format.
    BlankWorkbook(OutputFormat),
}

impl OutputStrategy {
    fn extension(&self) -> &'static str {
        match self {
            OutputStrategy::CopyTemplate(template) => template.format.extension(),
            OutputStrategy::BlankWorkbook(format) => format.extension(),
        }
    }

    fn method(&self) -> OutputMethod {
        match self {
            OutputStrategy::CopyTemplate(template) => match template.format {
                TemplateFormat::MacroEnabled => OutputMethod::MacroTemplate,
                TemplateFormat::Standard => OutputMethod::StandardTemplate,
            },
            OutputStrategy::BlankWorkbook(_) => OutputMethod::BlankWorkbook,
        }
    }
}

/// Builds the ordered strategy plan. A blank workbook is always the final
/// entry, so the plan is never empty and template failures have somewhere to
/// fall back to. The template's own format always beats `preferred_format`;
/// the preference only applies to from-scratch builds.
pub fn plan(
    use_template: bool,
    located: Option<TemplateDescriptor>,
    preferred_format: OutputFormat,
) -> Vec<OutputStrategy> {
    let mut strategies = Vec::new();
    if use_template {
        if let Some(template) = located {
            strategies.push(OutputStrategy::CopyTemplate(template));
        }
    }
    strategies.push(OutputStrategy::BlankWorkbook(preferred_format));
    strategies
}

/// Runs the plan to completion: the final path and population report of the
/// first strategy that succeeds, or the fatal error of the last one.
///
/// The output file lands at `output_dir/base_name.<ext>` where the extension
/// comes from the strategy (a copied template keeps its own format, a
/// from-scratch build uses the configured preference).
pub fn select_and_produce(
    strategies: Vec<OutputStrategy>,
    output_dir: &Path,
    base_name: &str,
    tab_mapping: &TabMapping,
    data_sets: &[ResultSet],
) -> Result<(PathBuf, OutputMethod, PopulateReport), ReportError> {
    let total = strategies.len();
    let mut last_error: Option<ReportError> = None;

    for (index, strategy) in strategies.into_iter().enumerate() {
        let is_last = index + 1 == total;
        let output_path = output_dir.join(format!("{base_name}.{}", strategy.extension()));

        match attempt(&strategy, &output_path, tab_mapping, data_sets) {
            Ok(report) => {
                return Ok((output_path, strategy.method(), report));
            }
            Err(error) if !is_last && error.is_recoverable() => {
                tracing::warn!(
                    strategy = ?strategy.method(),
                    %error,
                    "output strategy failed, falling back"
                );
                last_error = Some(error);
            }
            Err(error) => {
                return Err(finalize_error(error, &output_path));
            }
        }
    }

    // The plan always ends in BlankWorkbook, whose attempt either returns or
    // errors above; reaching here means the plan was empty.
    Err(last_error.unwrap_or_else(|| ReportError::OutputWrite {
        path: output_dir.join(base_name),
        message: "no output strategies to try".to_string(),
    }))
}

fn attempt(
    strategy: &OutputStrategy,
    output_path: &Path,
    tab_mapping: &TabMapping,
    data_sets: &[ResultSet],
) -> Result<PopulateReport, ReportError> {
    match strategy {
        OutputStrategy::CopyTemplate(template) => {
            fs::copy(&template.path, output_path).map_err(|source| {
                // A failed copy can leave a truncated destination behind.
                if output_path.exists() {
                    if let Err(remove_error) = fs::remove_file(output_path) {
                        tracing::warn!(
                            path = %output_path.display(),
                            %remove_error,
                            "could not remove partial template copy"
                        );
                    }
                }
                ReportError::TemplateCopy {
                    template: template.path.clone(),
                    output: output_path.to_path_buf(),
                    source,
                }
            })?;
            tracing::info!(
                template = %template.path.display(),
                output = %output_path.display(),
                "template copied"
            );
            populate(output_path, tab_mapping, data_sets, true).inspect_err(|_| {
                // Do not leave a half-written template copy behind; the
                // fallback build writes to a different (standard) path.
                if let Err(remove_error) = fs::remove_file(output_path) {
                    tracing::warn!(
                        path = %output_path.display(),
                        %remove_error,
                        "could not remove failed template copy"
                    );
                }
            })
        }
        OutputStrategy::BlankWorkbook(_) => populate(output_path, tab_mapping, data_sets, false),
    }
}

/// Errors escaping the last strategy surface as the fatal output failure.
fn finalize_error(error: ReportError, output_path: &Path) -> ReportError {
    match error {
        ReportError::TemplateCopy { .. } | ReportError::Population(_) => {
            ReportError::OutputWrite {
                path: output_path.to_path_buf(),
                message: error.to_string(),
            }
        }
        other => other,
    }
}
