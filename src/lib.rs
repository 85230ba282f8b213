pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod model;
pub mod populate;
pub mod report;
pub mod source;
pub mod strategy;
pub mod template;
pub mod utils;

pub use config::{CliArgs, OutputFormat, ReportConfig};
pub use error::{PopulationFailure, ReportError, SheetFailure};
pub use logging::{LoggingConfig, init_logging};
pub use model::{
    CellScalar, OutputMethod, ReportOutcome, ResultSet, TabMapping, TemplateDescriptor,
    TemplateFormat,
};
pub use report::{ReportRequest, run_report};
pub use source::{CommandExecutor, QueryExecutor};
