use serde_json::Value;

use crate::cli::OutputFormat;
use crate::commands::CommandOutput;
use crate::error::CliError;

pub fn render(output: &CommandOutput, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(output)?
            } else {
                serde_json::to_string(output)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => {
            for line in table_lines(output)? {
                println!("{line}");
            }
        }
    }

    Ok(())
}

fn table_lines(output: &CommandOutput) -> Result<Vec<String>, CliError> {
    let mut lines = vec![format!("command: {}", output.command)];

    if !output.warnings.is_empty() {
        lines.push(String::from("warnings:"));
        for warning in &output.warnings {
            lines.push(format!("  - {warning}"));
        }
    }

    lines.push(String::from("data:"));
    match &output.data {
        Value::Object(fields) => {
            let width = fields.keys().map(String::len).max().unwrap_or(0);
            for (key, value) in fields {
                match value {
                    Value::Array(_) | Value::Object(_) => {
                        lines.push(format!("  {key}:"));
                        for line in serde_json::to_string_pretty(value)?.lines() {
                            lines.push(format!("    {line}"));
                        }
                    }
                    scalar => lines.push(format!("  {key:<width$} : {}", scalar_text(scalar))),
                }
            }
        }
        other => {
            for line in serde_json::to_string_pretty(other)?.lines() {
                lines.push(format!("  {line}"));
            }
        }
    }

    Ok(lines)
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::from("-"),
        other => other.to_string(),
    }
}
