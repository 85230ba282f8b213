use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_TEMPLATE_FILENAME: &str = "Vendor_Performance_Template.xlsm";
const DEFAULT_OUTPUT_DIR: &str = "Output";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Xlsx,
    Xlsm,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Xlsm => "xlsm",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Explicit per-run configuration; there is no ambient global state. Values
/// come from CLI flags, then the optional config file, then defaults.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// User-specified template path; overrides the search paths entirely.
    pub template_path: Option<PathBuf>,
    pub use_template: bool,
    pub template_filename: String,
    /// Probed in order when no explicit template path is set.
    pub search_paths: Vec<PathBuf>,
    pub output_dir: PathBuf,
    /// Format used when building a workbook from scratch. A copied template
    /// keeps its own format regardless of this setting.
    pub output_format: OutputFormat,
    /// External database client invocation, e.g. `["snowsql", "-q"]`.
    pub query_command: Vec<String>,
}

impl ReportConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            config,
            template,
            use_template: cli_use_template,
            no_template,
            template_name: cli_template_name,
            search_path: cli_search_paths,
            output_dir: cli_output_dir,
            format: cli_format,
            query_command: cli_query_command,
            ..
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            FileConfig::default()
        };

        let template_path = template
            .or(file_config.template_path)
            .filter(|p| !p.as_os_str().is_empty());

        let use_template = if no_template {
            Some(false)
        } else if cli_use_template {
            Some(true)
        } else {
            None
        }
        .or(file_config.use_template)
        .unwrap_or(true);

        let template_filename = cli_template_name
            .or(file_config.template_name)
            .unwrap_or_else(|| DEFAULT_TEMPLATE_FILENAME.to_string());

        let search_paths = cli_search_paths
            .filter(|paths| !paths.is_empty())
            .or(file_config.search_paths)
            .unwrap_or_else(default_search_paths);

        let output_dir = cli_output_dir
            .or(file_config.output_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        let output_format = cli_format
            .or(file_config.output_format)
            .unwrap_or(OutputFormat::Xlsx);

        let query_command = cli_query_command
            .map(|line| {
                line.split_whitespace()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .or(file_config.query_command)
            .unwrap_or_default();

        Ok(Self {
            template_path,
            use_template,
            template_filename,
            search_paths,
            output_dir,
            output_format,
            query_command,
        })
    }

    /// Persists the effective configuration as a human-editable file (YAML
    /// or JSON chosen by extension).
    pub fn save(&self, path: &Path) -> Result<()> {
        let file_config = FileConfig {
            template_path: self.template_path.clone(),
            use_template: Some(self.use_template),
            template_name: Some(self.template_filename.clone()),
            search_paths: Some(self.search_paths.clone()),
            output_dir: Some(self.output_dir.clone()),
            output_format: Some(self.output_format),
            query_command: if self.query_command.is_empty() {
                None
            } else {
                Some(self.query_command.clone())
            },
        };

        let ext = path
            .extension()
            .and_then(|os| os.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        let contents = match ext.as_str() {
            "yaml" | "yml" => serde_yaml::to_string(&file_config)
                .with_context(|| format!("failed to serialize YAML config {:?}", path))?,
            "json" => serde_json::to_string_pretty(&file_config)
                .with_context(|| format!("failed to serialize JSON config {:?}", path))?,
            other => anyhow::bail!("unsupported config extension: {other}"),
        };
        fs::write(path, contents).with_context(|| format!("failed to write config {:?}", path))
    }
}

fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join("OneDrive").join("Documents"));
        paths.push(home.join("Documents"));
    }
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd);
    }
    paths
}

#[derive(Parser, Debug, Default, Clone)]
#[command(name = "vendor-report", about = "Vendor performance report generator", version)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "VENDOR_REPORT_VENDORS",
        value_name = "ID",
        value_delimiter = ',',
        required = true,
        help = "Vendor numbers to report on"
    )]
    pub vendors: Vec<String>,

    #[arg(
        long,
        env = "VENDOR_REPORT_MONTH",
        value_name = "TOKEN",
        required = true,
        help = "Report-period token, e.g. FY2025-APR"
    )]
    pub report_month: String,

    #[arg(
        long,
        env = "VENDOR_REPORT_DATE_FILTER",
        value_name = "TOKEN",
        required = true,
        help = "Date-filter token for the ASN query, e.g. 202504"
    )]
    pub date_filter: String,

    #[arg(
        long,
        env = "VENDOR_REPORT_TEMPLATE",
        value_name = "FILE",
        help = "Explicit template path; overrides the search paths"
    )]
    pub template: Option<PathBuf>,

    #[arg(long, help = "Force template usage on", conflicts_with = "no_template")]
    pub use_template: bool,

    #[arg(long, help = "Always build a from-scratch workbook")]
    pub no_template: bool,

    #[arg(
        long,
        env = "VENDOR_REPORT_TEMPLATE_NAME",
        value_name = "NAME",
        help = "Template filename probed under each search path"
    )]
    pub template_name: Option<String>,

    #[arg(
        long,
        value_name = "DIR",
        help = "Template search path, highest priority first (repeatable)"
    )]
    pub search_path: Option<Vec<PathBuf>>,

    #[arg(
        long,
        env = "VENDOR_REPORT_OUTPUT_DIR",
        value_name = "DIR",
        help = "Directory the report workbook is written to"
    )]
    pub output_dir: Option<PathBuf>,

    #[arg(
        long,
        env = "VENDOR_REPORT_FORMAT",
        value_enum,
        value_name = "FORMAT",
        help = "Preferred output format"
    )]
    pub format: Option<OutputFormat>,

    #[arg(
        long,
        env = "VENDOR_REPORT_QUERY_COMMAND",
        value_name = "CMD",
        help = "Database client command that reads SQL on stdin and prints CSV"
    )]
    pub query_command: Option<String>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Write the effective configuration to a file after merging"
    )]
    pub save_config: Option<PathBuf>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    template_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    use_template: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    template_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search_paths: Option<Vec<PathBuf>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_format: Option<OutputFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_command: Option<Vec<String>>,
}

fn load_config_file(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
