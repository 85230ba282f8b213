#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::{TempDir, tempdir};
use umya_spreadsheet::{self, Spreadsheet};
use vendor_report::{CellScalar, QueryExecutor, ReportError, ResultSet};

pub fn write_workbook_to_path<F>(path: &Path, f: F)
where
    F: FnOnce(&mut Spreadsheet),
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create dir");
    }
    let mut book = umya_spreadsheet::new_file();
    f(&mut book);
    umya_spreadsheet::writer::xlsx::write(&book, path).expect("write workbook");
}

pub struct TestWorkspace {
    _tempdir: TempDir,
    root: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let tempdir = tempdir().expect("tempdir");
        let root = tempdir.path().to_path_buf();
        Self {
            _tempdir: tempdir,
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn create_workbook<F>(&self, name: &str, f: F) -> PathBuf
    where
        F: FnOnce(&mut Spreadsheet),
    {
        let path = self.path(name);
        write_workbook_to_path(&path, f);
        path
    }

    /// Writes a zip that looks like a macro workbook to content sniffers: a
    /// minimal part layout plus an `xl/vbaProject.bin` entry. Not openable as
    /// a real spreadsheet.
    pub fn create_fake_macro_archive(&self, name: &str) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create dir");
        }
        let file = std::fs::File::create(&path).expect("create archive");
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::FileOptions::default();
        zip.start_file("[Content_Types].xml", options)
            .expect("start entry");
        zip.write_all(b"<Types/>").expect("write entry");
        zip.start_file("xl/vbaProject.bin", options)
            .expect("start entry");
        zip.write_all(b"\xd0\xcf\x11\xe0fake").expect("write entry");
        zip.finish().expect("finish archive");
        path
    }

    pub fn touch(&self, name: &str) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create dir");
        }
        std::fs::write(&path, b"test").expect("write file");
        path
    }
}

pub fn text(value: &str) -> CellScalar {
    CellScalar::Text(value.to_string())
}

pub fn number(value: f64) -> CellScalar {
    CellScalar::Number(value)
}

pub fn make_result_set(name: &str, columns: &[&str], rows: Vec<Vec<CellScalar>>) -> ResultSet {
    ResultSet::new(
        name,
        columns.iter().map(|c| c.to_string()).collect(),
        rows,
    )
    .expect("valid result set")
}

pub fn empty_result_set(name: &str, columns: &[&str]) -> ResultSet {
    ResultSet::empty(name, columns.iter().map(|c| c.to_string()).collect())
}

/// Replays a fixed sequence of query results, one per `execute` call.
pub struct ScriptedExecutor {
    responses: Mutex<VecDeque<Result<ResultSet, ReportError>>>,
}

impl ScriptedExecutor {
    pub fn new(responses: Vec<Result<ResultSet, ReportError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
        }
    }
}

impl QueryExecutor for ScriptedExecutor {
    fn execute(&self, _query: &str) -> Result<ResultSet, ReportError> {
        self.responses
            .lock()
            .expect("executor lock")
            .pop_front()
            .unwrap_or_else(|| {
                Err(ReportError::Query(
                    "scripted executor exhausted".to_string(),
                ))
            })
    }
}

pub fn read_cell_value(path: &Path, sheet: &str, address: &str) -> String {
    let book = umya_spreadsheet::reader::xlsx::read(path).expect("read workbook");
    let sheet = book.get_sheet_by_name(sheet).expect("sheet exists");
    sheet
        .get_cell(address)
        .map(|cell| cell.get_value().to_string())
        .unwrap_or_default()
}

pub fn sheet_names(path: &Path) -> Vec<String> {
    let book = umya_spreadsheet::reader::xlsx::read(path).expect("read workbook");
    book.get_sheet_collection()
        .iter()
        .map(|sheet| sheet.get_name().to_string())
        .collect()
}
