use crate::chat::HealthReport;
use crate::cli::parse::OutputFormat;
use crate::error::RelayError;
use owo_colors::OwoColorize;

pub fn format_health(report: &HealthReport, format: OutputFormat) -> Result<String, RelayError> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(report)?);
    }
    let status = if report.is_healthy() {
        report.status.green().to_string()
    } else {
        report.status.red().to_string()
    };
    Ok(format!(
        "Status:    {}\nDatabase:  {}\nProvider:  {} ({})\nTimestamp: {}",
        status, report.database, report.provider, report.model, report.timestamp
    ))
}
