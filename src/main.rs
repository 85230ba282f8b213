use clap::Parser;
use vendor_report::{
    CliArgs, CommandExecutor, LoggingConfig, ReportConfig, ReportRequest, init_logging,
    run_report,
};

fn main() -> anyhow::Result<()> {
    let logging_config = LoggingConfig::from_env();
    let _guard = init_logging(logging_config)?;

    let cli = CliArgs::parse();
    let request = ReportRequest {
        vendors: cli.vendors.clone(),
        report_month: cli.report_month.clone(),
        date_filter: cli.date_filter.clone(),
    };
    let save_config = cli.save_config.clone();
    let config = ReportConfig::from_args(cli)?;
    if let Some(path) = save_config {
        config.save(&path)?;
        tracing::info!(path = %path.display(), "configuration saved");
    }

    let executor = CommandExecutor::from_command_line(&config.query_command)?;
    let outcome = run_report(&config, &executor, &request)?;

    println!("{}", outcome.summary);
    Ok(())
}
