//! Template location and macro introspection.
//!
//! The locator is pure filesystem probing: an explicit user-configured path
//! always wins, then each search path is tried in priority order. A missing
//! template is a normal outcome and triggers the blank-workbook fallback.

use crate::model::{TemplateDescriptor, TemplateFormat};
use anyhow::{Result, anyhow, bail};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use zip::result::ZipError;

const MAX_VBA_PROJECT_BYTES: u64 = 20 * 1024 * 1024;

pub fn locate(
    explicit_path: Option<&Path>,
    search_paths: &[PathBuf],
    template_filename: &str,
) -> Option<TemplateDescriptor> {
    if let Some(path) = explicit_path {
        if path.is_file() {
            tracing::info!(path = %path.display(), "using explicitly configured template");
            return Some(describe(path));
        }
        tracing::warn!(
            path = %path.display(),
            "configured template path does not exist, probing search paths"
        );
    }

    for search_path in search_paths {
        let candidate = search_path.join(template_filename);
        if candidate.is_file() {
            tracing::info!(path = %candidate.display(), "found template");
            return Some(describe(&candidate));
        }
    }

    tracing::info!(
        filename = template_filename,
        probed = search_paths.len(),
        "no template found in any search path"
    );
    None
}

fn describe(path: &Path) -> TemplateDescriptor {
    TemplateDescriptor {
        path: path.to_path_buf(),
        format: detect_format(path),
    }
}

/// A template is macro-enabled when it carries the `.xlsm` extension or,
/// regardless of extension, contains an `xl/vbaProject.bin` part.
pub fn detect_format(path: &Path) -> TemplateFormat {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    if extension.as_deref() == Some("xlsm") {
        return TemplateFormat::MacroEnabled;
    }
    match has_vba_project(path) {
        Ok(true) => TemplateFormat::MacroEnabled,
        Ok(false) => TemplateFormat::Standard,
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "could not inspect template for macros");
            TemplateFormat::Standard
        }
    }
}

pub fn has_vba_project(path: &Path) -> Result<bool> {
    Ok(read_vba_project_bin(path)?.is_some())
}

/// Names of the VBA modules embedded in a workbook, for logging and for
/// verifying that a populated template copy still carries its macros.
pub fn vba_module_names(path: &Path) -> Result<Vec<String>> {
    let raw = read_vba_project_bin(path)?
        .ok_or_else(|| anyhow!("no xl/vbaProject.bin found in {}", path.display()))?;
    let project = ovba::open_project(raw)?;
    Ok(project
        .modules
        .iter()
        .map(|module| module.name.clone())
        .collect())
}

fn read_vba_project_bin(path: &Path) -> Result<Option<Vec<u8>>> {
    let file = File::open(path)
        .map_err(|e| anyhow!("failed to open workbook {}: {}", path.display(), e))?;

    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| anyhow!("failed to open workbook zip {}: {}", path.display(), e))?;

    let mut entry = match archive.by_name("xl/vbaProject.bin") {
        Ok(f) => f,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(anyhow!("failed to locate xl/vbaProject.bin: {}", e)),
    };

    let declared_size = entry.size();
    if declared_size > MAX_VBA_PROJECT_BYTES {
        bail!(
            "xl/vbaProject.bin too large ({} bytes; max {} bytes)",
            declared_size,
            MAX_VBA_PROJECT_BYTES
        );
    }

    let mut buf: Vec<u8> = Vec::with_capacity(declared_size.min(1024 * 1024) as usize);
    entry
        .read_to_end(&mut buf)
        .map_err(|e| anyhow!("failed to read xl/vbaProject.bin: {}", e))?;

    Ok(Some(buf))
}
