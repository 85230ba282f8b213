use anyhow::{Result, bail};
use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use std::fmt;
use std::path::PathBuf;

/// A single scalar produced by the query collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum CellScalar {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl CellScalar {
    pub fn is_null(&self) -> bool {
        matches!(self, CellScalar::Null)
    }
}

/// Tabular output of one executed query: unique ordered column names plus
/// rows of scalars. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct ResultSet {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<CellScalar>>,
}

impl ResultSet {
    /// Validates the shape invariants: column names must be unique and every
    /// row must have exactly one value per column.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<CellScalar>>,
    ) -> Result<Self> {
        let name = name.into();
        for (idx, column) in columns.iter().enumerate() {
            if columns[..idx].iter().any(|c| c == column) {
                bail!("result set {name:?} has duplicate column {column:?}");
            }
        }
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                bail!(
                    "result set {name:?} row {idx} has {} values, expected {}",
                    row.len(),
                    columns.len()
                );
            }
        }
        Ok(Self {
            name,
            columns,
            rows,
        })
    }

    pub fn empty(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Rebinds the result set to a logical data-set name. The orchestrator
    /// uses this to attach query output to its TabMapping key.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellScalar>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by case-insensitive name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }
}

/// Static association between logical data-set names and target worksheet
/// names. Iteration order is the tab order of the finished workbook.
#[derive(Debug, Clone)]
pub struct TabMapping {
    entries: IndexMap<String, String>,
}

impl TabMapping {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn insert(&mut self, logical: impl Into<String>, sheet: impl Into<String>) {
        self.entries.insert(logical.into(), sheet.into());
    }

    pub fn sheet_for(&self, logical: &str) -> Option<&str> {
        self.entries.get(logical).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TabMapping {
    /// The production report layout: summary first, then detail, then ASN.
    fn default() -> Self {
        let mut mapping = Self::new();
        mapping.insert("Summary_Metrics", "Tab1_Summary_Metrics");
        mapping.insert("Basic_Metrics", "Tab2_Basic_Metrics");
        mapping.insert("ASN_Data", "Tab3_ASN_Data");
        mapping
    }
}

/// Spreadsheet file format of a located template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFormat {
    /// Can embed VBA; copy/save must keep `xl/vbaProject.bin` intact.
    MacroEnabled,
    Standard,
}

impl TemplateFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TemplateFormat::MacroEnabled => "xlsm",
            TemplateFormat::Standard => "xlsx",
        }
    }
}

/// A template file resolved once per run by the locator; read-only afterward.
#[derive(Debug, Clone)]
pub struct TemplateDescriptor {
    pub path: PathBuf,
    pub format: TemplateFormat,
}

/// How the output workbook was ultimately produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMethod {
    MacroTemplate,
    StandardTemplate,
    BlankWorkbook,
}

impl OutputMethod {
    pub fn describe(&self) -> &'static str {
        match self {
            OutputMethod::MacroTemplate => "macro-enabled template (.xlsm)",
            OutputMethod::StandardTemplate => "Excel template (.xlsx)",
            OutputMethod::BlankWorkbook => "standard workbook (.xlsx)",
        }
    }
}

impl fmt::Display for OutputMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// One populated worksheet in the final artifact.
#[derive(Debug, Clone)]
pub struct SheetWrite {
    pub logical: String,
    pub sheet: String,
    pub rows: usize,
}

/// Final result of one report run.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub output_path: PathBuf,
    pub method: OutputMethod,
    pub sheets: Vec<SheetWrite>,
    /// Logical names skipped because their result set was empty or missing.
    pub skipped: Vec<String>,
    pub summary: String,
}
