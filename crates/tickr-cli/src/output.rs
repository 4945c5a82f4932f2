use serde::Serialize;
use serde_json::Value;
use tickr_core::UtcDateTime;

use crate::cli::OutputFormat;
use crate::error::CliError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    pub request_id: String,
    pub generated_at: UtcDateTime,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportError {
    pub code: String,
    pub message: String,
}

impl ReportError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Command output: `{ meta, data, errors }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub meta: ReportMeta,
    pub data: Value,
    pub errors: Vec<ReportError>,
    /// Human summary printed in table mode.
    #[serde(skip)]
    pub lines: Vec<String>,
}

pub fn render(report: &Report, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => println!("{}", to_json(report, pretty)?),
        OutputFormat::Table => render_table(report)?,
    }
    Ok(())
}

pub fn to_json(report: &Report, pretty: bool) -> Result<String, CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    Ok(payload)
}

fn render_table(report: &Report) -> Result<(), CliError> {
    println!("request_id  : {}", report.meta.request_id);
    println!("generated_at: {}", report.meta.generated_at);
    println!("latency_ms  : {}", report.meta.latency_ms);

    if !report.meta.warnings.is_empty() {
        println!("warnings:");
        for warning in &report.meta.warnings {
            println!("  - {warning}");
        }
    }

    if report.lines.is_empty() {
        println!("data:");
        let pretty_data = serde_json::to_string_pretty(&report.data)?;
        for line in pretty_data.lines() {
            println!("  {line}");
        }
    } else {
        for line in &report.lines {
            println!("{line}");
        }
    }

    if !report.errors.is_empty() {
        println!("errors:");
        for error in &report.errors {
            println!("  - {}: {}", error.code, error.message);
        }
    }

    Ok(())
}

/// Left-aligns cells into columns separated by two spaces.
pub fn table(header: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths = header.iter().map(|cell| cell.chars().count()).collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| {
                let padding = width.saturating_sub(cell.chars().count());
                format!("{cell}{}", " ".repeat(padding))
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_owned()
    };

    let mut lines = vec![format_row(header.to_vec())];
    lines.extend(
        rows.iter()
            .map(|row| format_row(row.iter().map(String::as_str).collect())),
    );
    lines
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn report_uses_camel_case_meta_and_hides_lines() {
        let report = Report {
            meta: ReportMeta {
                request_id: String::from("req-1"),
                generated_at: UtcDateTime::parse("2024-03-01T09:15:00Z").expect("ts"),
                latency_ms: 12,
                warnings: Vec::new(),
            },
            data: json!({ "ok": true }),
            errors: Vec::new(),
            lines: vec![String::from("ignored")],
        };

        let value: Value = serde_json::from_str(&to_json(&report, false).expect("json"))
            .expect("valid json");
        assert_eq!(value["meta"]["requestId"], "req-1");
        assert_eq!(value["meta"]["generatedAt"], "2024-03-01T09:15:00Z");
        assert!(value["meta"].get("warnings").is_none());
        assert!(value.get("lines").is_none());
    }

    #[test]
    fn table_pads_by_character_count() {
        let lines = table(
            &["SYMBOL", "CHANGE"],
            &[vec![String::from("TCS"), String::from("+₹20.00")]],
        );
        assert_eq!(lines, vec!["SYMBOL  CHANGE", "TCS     +₹20.00"]);
    }
}
