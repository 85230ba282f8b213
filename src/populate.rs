//! Workbook population: writes named result sets into mapped worksheet tabs.
//!
//! When reusing a template copy, only cell values in rows >= 2 are cleared so
//! that row 1 headers, styles, merged regions, and the VBA project survive
//! the rewrite. Fresh workbooks get their headers written at row 1.

use crate::error::{PopulationFailure, ReportError, SheetFailure};
use crate::format::{WritableCell, to_writable_rows};
use crate::model::{ResultSet, SheetWrite, TabMapping};
use crate::utils::cell_address;
use anyhow::{Result, anyhow};
use std::path::Path;
use umya_spreadsheet::{Spreadsheet, Worksheet};

/// First worksheet row that holds data; row 1 is reserved for headers.
pub const DATA_ANCHOR_ROW: u32 = 2;

const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Successful outcome of a populate call.
#[derive(Debug, Default)]
pub struct PopulateReport {
    pub sheets: Vec<SheetWrite>,
    /// Logical names skipped because no non-empty result set matched them.
    pub skipped: Vec<String>,
}

/// Tagged state of a target sheet, driving the clear-or-create branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SheetSlot {
    Existing,
    Missing,
}

/// Populates `path` with every mapped, non-empty result set and saves it.
///
/// With `reuse_template` set, the file at `path` is opened and its mapped
/// sheets are cleared from row 2 down before writing; otherwise a brand-new
/// workbook is built and the file is overwritten. A failure on one sheet is
/// recorded and the remaining sheets are still attempted; the call then
/// reports non-success so the strategy selector can fall back.
pub fn populate(
    path: &Path,
    tab_mapping: &TabMapping,
    data_sets: &[ResultSet],
    reuse_template: bool,
) -> Result<PopulateReport, ReportError> {
    let mut book = if reuse_template {
        umya_spreadsheet::reader::xlsx::read(path).map_err(|e| {
            PopulationFailure::workbook(format!(
                "failed to open template copy {}: {}",
                path.display(),
                e
            ))
        })?
    } else {
        umya_spreadsheet::new_file()
    };

    for result_set in data_sets {
        if !result_set.is_empty() && tab_mapping.sheet_for(result_set.name()).is_none() {
            tracing::debug!(
                logical = result_set.name(),
                "result set has no tab mapping entry, dropped"
            );
        }
    }

    let mut sheets = Vec::new();
    let mut skipped = Vec::new();
    let mut failures: Vec<SheetFailure> = Vec::new();

    for (logical, sheet_name) in tab_mapping.iter() {
        let data = data_sets.iter().find(|rs| rs.name() == logical);
        let Some(result_set) = data.filter(|rs| !rs.is_empty()) else {
            tracing::debug!(logical, "no data for logical name, sheet untouched");
            skipped.push(logical.to_string());
            continue;
        };

        match write_sheet(&mut book, sheet_name, result_set, reuse_template) {
            Ok(rows) => {
                tracing::info!(sheet = sheet_name, rows, "populated sheet");
                sheets.push(SheetWrite {
                    logical: logical.to_string(),
                    sheet: sheet_name.to_string(),
                    rows,
                });
            }
            Err(error) => {
                tracing::warn!(sheet = sheet_name, %error, "failed to populate sheet");
                failures.push(SheetFailure {
                    sheet: sheet_name.to_string(),
                    cause: error.to_string(),
                });
            }
        }
    }

    if !reuse_template {
        remove_default_sheet_if_unused(&mut book, tab_mapping, &sheets);
    }

    if let Err(error) = umya_spreadsheet::writer::xlsx::write(&book, path) {
        failures.push(SheetFailure {
            sheet: "(workbook)".to_string(),
            cause: format!("failed to save {}: {}", path.display(), error),
        });
    }

    if failures.is_empty() {
        Ok(PopulateReport { sheets, skipped })
    } else {
        Err(ReportError::Population(PopulationFailure {
            failures,
            completed: sheets.into_iter().map(|w| w.sheet).collect(),
        }))
    }
}

fn write_sheet(
    book: &mut Spreadsheet,
    sheet_name: &str,
    result_set: &ResultSet,
    reuse_template: bool,
) -> Result<usize> {
    let slot = if book.get_sheet_by_name(sheet_name).is_some() {
        SheetSlot::Existing
    } else {
        SheetSlot::Missing
    };

    if slot == SheetSlot::Missing {
        book.new_sheet(sheet_name)
            .map_err(|e| anyhow!("failed to create sheet {sheet_name:?}: {e}"))?;
    }
    let sheet = book
        .get_sheet_by_name_mut(sheet_name)
        .ok_or_else(|| anyhow!("sheet {sheet_name:?} vanished after creation"))?;

    if slot == SheetSlot::Existing && reuse_template {
        clear_data_rows(sheet);
    }

    // Template sheets keep their formatted header row; everything else gets
    // the result-set columns written at row 1.
    let write_headers = match slot {
        SheetSlot::Missing => true,
        SheetSlot::Existing if !reuse_template => true,
        SheetSlot::Existing => !header_row_occupied(sheet),
    };
    if write_headers {
        for (idx, column) in result_set.columns().iter().enumerate() {
            sheet
                .get_cell_mut(cell_address(idx as u32 + 1, 1).as_str())
                .set_value(column);
        }
    }

    for (row_idx, row) in to_writable_rows(result_set).iter().enumerate() {
        let row_num = DATA_ANCHOR_ROW + row_idx as u32;
        for (col_idx, value) in row.iter().enumerate() {
            let col_num = col_idx as u32 + 1;
            match value {
                WritableCell::Empty => {}
                WritableCell::Bool(b) => {
                    sheet.get_cell_mut((col_num, row_num)).set_value_bool(*b);
                }
                WritableCell::Number(n) => {
                    sheet.get_cell_mut((col_num, row_num)).set_value_number(*n);
                }
                WritableCell::Text(s) => {
                    sheet.get_cell_mut((col_num, row_num)).set_value(s);
                }
            }
        }
    }

    Ok(result_set.row_count())
}

/// Clears cell values below the header row, leaving styles and row 1 intact.
fn clear_data_rows(sheet: &mut Worksheet) {
    let coords: Vec<(u32, u32)> = sheet
        .get_cell_collection()
        .iter()
        .map(|cell| {
            let coordinate = cell.get_coordinate();
            (*coordinate.get_col_num(), *coordinate.get_row_num())
        })
        .filter(|(_, row)| *row >= DATA_ANCHOR_ROW)
        .collect();
    for (col, row) in coords {
        sheet.get_cell_mut((col, row)).set_value("");
    }
}

fn header_row_occupied(sheet: &Worksheet) -> bool {
    sheet.get_cell_collection().iter().any(|cell| {
        *cell.get_coordinate().get_row_num() == 1 && !cell.get_value().is_empty()
    })
}

/// Fresh workbooks start with an empty default sheet; drop it once real
/// sheets exist, unless the mapping targets it.
fn remove_default_sheet_if_unused(
    book: &mut Spreadsheet,
    tab_mapping: &TabMapping,
    written: &[SheetWrite],
) {
    if written.is_empty() {
        return;
    }
    let is_target = tab_mapping
        .iter()
        .any(|(_, sheet)| sheet == DEFAULT_SHEET_NAME);
    if !is_target {
        let _ = book.remove_sheet_by_name(DEFAULT_SHEET_NAME);
    }
}
