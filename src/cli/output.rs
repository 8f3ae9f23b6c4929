// Output formatting for CLI

use crate::cli::{CliResult, OutputFormat};
use std::io::Write;

/// Format and output reports
pub struct OutputFormatter {
    format: OutputFormat,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    /// Output a report
    pub fn output_report(&self, report: &serde_json::Value, writer: &mut impl Write) -> CliResult<()> {
        match self.format {
            OutputFormat::Pretty => {
                writeln!(writer, "{}", serde_json::to_string_pretty(report)?)?;
            }
            OutputFormat::Json => {
                writeln!(writer, "{}", serde_json::to_string(report)?)?;
            }
            OutputFormat::KeyValue => {
                self.output_key_value(report, writer)?;
            }
            OutputFormat::Table => {
                self.output_table(report, writer)?;
            }
        }
        Ok(())
    }

    /// Output as key-value pairs
    fn output_key_value(&self, report: &serde_json::Value, writer: &mut impl Write) -> CliResult<()> {
        if let Some(obj) = report.as_object() {
            let mut items: Vec<_> = obj.iter().collect();
            items.sort_by(|a, b| a.0.cmp(b.0));

            for (key, value) in items {
                writeln!(writer, "{}: {}", key, self.format_value(value))?;
            }
        }
        Ok(())
    }

    /// Output scalar fields, then every array of objects as rows
    fn output_table(&self, report: &serde_json::Value, writer: &mut impl Write) -> CliResult<()> {
        let Some(obj) = report.as_object() else {
            return Ok(());
        };
        let max_key_len = obj.keys().map(|k| k.len()).max().unwrap_or(0);

        writeln!(writer, "{}", "=".repeat(max_key_len + 30))?;
        for (key, value) in obj {
            if !is_row_list(value) {
                writeln!(writer, "{:<width$}: {}", format!("{}:", key), self.format_value(value), width = max_key_len + 2)?;
            }
        }
        writeln!(writer, "{}", "=".repeat(max_key_len + 30))?;

        for (key, value) in obj {
            if let Some(rows) = value.as_array().filter(|_| is_row_list(value)) {
                writeln!(writer, "{}:", key)?;
                self.output_rows(rows, writer)?;
            }
        }
        Ok(())
    }

    fn output_rows(&self, rows: &[serde_json::Value], writer: &mut impl Write) -> CliResult<()> {
        let Some(columns) = rows.first().and_then(|row| row.as_object()) else {
            return Ok(());
        };
        let columns: Vec<&String> = columns.keys().collect();

        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| row.get(c.as_str()).map(|v| self.format_value(v)).unwrap_or_default())
                    .collect()
            })
            .collect();
        let widths: Vec<usize> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| cells.iter().map(|r| r[i].len()).chain([c.len()]).max().unwrap_or(0))
            .collect();

        let header: Vec<String> = columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<w$}", c, w = *w))
            .collect();
        writeln!(writer, "  {}", header.join("  "))?;
        for row in &cells {
            let line: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, w)| format!("{:<w$}", cell, w = *w))
                .collect();
            writeln!(writer, "  {}", line.join("  "))?;
        }
        Ok(())
    }

    /// Format a JSON value for display
    fn format_value(&self, value: &serde_json::Value) -> String {
        match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => "(null)".to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Array(arr) => {
                if arr.is_empty() {
                    "[]".to_string()
                } else {
                    format!("[{} items]", arr.len())
                }
            }
            serde_json::Value::Object(obj) => {
                if obj.is_empty() {
                    "{}".to_string()
                } else {
                    let fields: Vec<String> = obj
                        .iter()
                        .map(|(k, v)| format!("{}={}", k, self.format_value(v)))
                        .collect();
                    fields.join(" ")
                }
            }
        }
    }

    /// Print success message
    pub fn print_success(&self, message: &str) {
        if !self.quiet {
            println!("✓ {}", message);
        }
    }

    /// Print error message
    pub fn print_error(&self, message: &str) {
        eprintln!("✗ {}", message);
    }

    /// Print info message
    pub fn print_info(&self, message: &str) {
        if !self.quiet {
            println!("  {}", message);
        }
    }
}

fn is_row_list(value: &serde_json::Value) -> bool {
    value
        .as_array()
        .is_some_and(|arr| !arr.is_empty() && arr.iter().all(|v| v.is_object()))
}
