//! The orchestrator: one sequential run from query execution to saved file.

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::model::{ReportOutcome, ResultSet, TabMapping, TemplateFormat};
use crate::source::{QueryExecutor, queries, vendor_name_from};
use crate::strategy::{plan, select_and_produce};
use crate::template;
use crate::utils::{readable_period, sanitize_filename_component};
use std::fs;

/// Caller-supplied inputs for one run. The period and date-filter tokens are
/// opaque; they pass through to the query collaborator unmodified.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub vendors: Vec<String>,
    pub report_month: String,
    pub date_filter: String,
}

impl ReportRequest {
    fn validate(&self) -> Result<(), ReportError> {
        if self.vendors.is_empty() || self.vendors.iter().any(|v| v.trim().is_empty()) {
            return Err(ReportError::InvalidInput(
                "at least one non-empty vendor number is required".to_string(),
            ));
        }
        if self.report_month.trim().is_empty() {
            return Err(ReportError::InvalidInput(
                "report month must not be empty".to_string(),
            ));
        }
        if self.date_filter.trim().is_empty() {
            return Err(ReportError::InvalidInput(
                "date filter must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Runs the full pipeline: execute the report queries, derive the vendor
/// name, resolve a template, and drive the output strategy cascade.
pub fn run_report(
    config: &ReportConfig,
    executor: &dyn QueryExecutor,
    request: &ReportRequest,
) -> Result<ReportOutcome, ReportError> {
    request.validate()?;

    tracing::info!(
        vendors = ?request.vendors,
        report_month = %request.report_month,
        date_filter = %request.date_filter,
        "starting report run"
    );

    let summary = executor
        .execute(&queries::summary_metrics(
            &request.vendors,
            &request.report_month,
            &request.date_filter,
        ))?
        .with_name("Summary_Metrics");
    tracing::info!(rows = summary.row_count(), "summary metrics retrieved");

    let basic = executor
        .execute(&queries::basic_metrics(
            &request.vendors,
            &request.report_month,
        ))?
        .with_name("Basic_Metrics");
    tracing::info!(rows = basic.row_count(), "basic metrics retrieved");

    let asn = executor
        .execute(&queries::asn_data(&request.vendors, &request.date_filter))?
        .with_name("ASN_Data");
    tracing::info!(rows = asn.row_count(), "ASN data retrieved");

    let data_sets = vec![summary, basic, asn];
    if data_sets.iter().all(ResultSet::is_empty) {
        return Err(ReportError::NoData);
    }

    let vendor_name = vendor_name_from(&data_sets).unwrap_or_else(|| {
        tracing::warn!("could not determine vendor name from query results");
        "Unknown_Vendor".to_string()
    });

    fs::create_dir_all(&config.output_dir).map_err(|e| ReportError::OutputWrite {
        path: config.output_dir.clone(),
        message: format!("failed to create output directory: {e}"),
    })?;
    let base_name = build_base_name(&request.vendors, &vendor_name, &request.report_month);

    let located = if config.use_template {
        let located = template::locate(
            config.template_path.as_deref(),
            &config.search_paths,
            &config.template_filename,
        );
        if let Some(descriptor) = located.as_ref() {
            if descriptor.format == TemplateFormat::MacroEnabled {
                match template::vba_module_names(&descriptor.path) {
                    Ok(modules) => tracing::info!(
                        count = modules.len(),
                        modules = ?modules,
                        "template carries VBA modules"
                    ),
                    Err(error) => {
                        tracing::debug!(%error, "could not enumerate template VBA modules")
                    }
                }
            }
        }
        located
    } else {
        None
    };

    let tab_mapping = TabMapping::default();
    let strategies = plan(config.use_template, located, config.output_format);
    let (output_path, method, populate_report) = select_and_produce(
        strategies,
        &config.output_dir,
        &base_name,
        &tab_mapping,
        &data_sets,
    )?;

    let summary_text = format!(
        "Report created via {} at {}",
        method.describe(),
        output_path.display()
    );
    tracing::info!(method = %method, path = %output_path.display(), "report run complete");

    Ok(ReportOutcome {
        output_path,
        method,
        sheets: populate_report.sheets,
        skipped: populate_report.skipped,
        summary: summary_text,
    })
}

/// Filename stem: `"{ids} - {NAME} - {MON YYYY}"`; the strategy appends the
/// extension it ends up producing.
fn build_base_name(vendors: &[String], vendor_name: &str, report_month: &str) -> String {
    let vendor_part = vendors.join("_");
    let name_part = sanitize_filename_component(vendor_name);
    let period_part = readable_period(report_month);
    format!("{vendor_part} - {name_part} - {period_part}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_combines_vendors_name_and_period() {
        let vendors = vec!["12345".to_string(), "67890".to_string()];
        assert_eq!(
            build_base_name(&vendors, "Acme Tools", "FY2025-APR"),
            "12345_67890 - ACME_TOOLS - APR 2025"
        );
    }
}
