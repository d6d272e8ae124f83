use console::style;
use serde::Serialize;
use std::fmt::Display;
use tabled::{settings::Style, Table, Tabled};

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self {
            format: if json {
                OutputFormat::Json
            } else {
                OutputFormat::Human
            },
        }
    }

    pub fn success(&self, message: impl Display) {
        if self.format == OutputFormat::Human {
            println!("{} {}", style("✓").green().bold(), message);
        }
    }

    pub fn info(&self, message: impl Display) {
        if self.format == OutputFormat::Human {
            println!("{} {}", style("ℹ").blue().bold(), message);
        }
    }

    /// Warnings go to stderr so JSON on stdout stays parseable
    pub fn warning(&self, message: impl Display) {
        match self.format {
            OutputFormat::Human => {
                eprintln!("{} {}", style("⚠").yellow().bold(), message);
            }
            OutputFormat::Json => {
                eprintln!("{}", envelope("warning", serde_json::json!(message.to_string())));
            }
        }
    }

    pub fn table<T: Tabled>(&self, data: Vec<T>) {
        if self.format != OutputFormat::Human {
            return;
        }
        if data.is_empty() {
            println!("{}", style("(no data)").dim());
        } else {
            let mut table = Table::new(data);
            table.with(Style::rounded());
            println!("{}", table);
        }
    }

    /// Print the command result; JSON mode wraps it in a status envelope
    pub fn result<T: Serialize>(&self, data: &T) -> anyhow::Result<()> {
        if self.format == OutputFormat::Json {
            let output = serde_json::json!({
                "status": "success",
                "data": data,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Ok(())
    }

    pub fn kv(&self, key: impl Display, value: impl Display) {
        if self.format == OutputFormat::Human {
            println!("{}: {}", style(key).bold(), value);
        }
    }

    pub fn section(&self, title: impl Display) {
        if self.format == OutputFormat::Human {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

fn envelope(status: &str, message: serde_json::Value) -> String {
    let output = serde_json::json!({
        "status": status,
        "message": message,
    });
    output.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_selection() {
        assert!(OutputWriter::new(true).is_json());
        assert!(!OutputWriter::new(false).is_json());
    }

    #[test]
    fn test_envelope_is_valid_json() {
        let line = envelope("warning", serde_json::json!("dropped 2 features"));
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["status"], "warning");
        assert_eq!(parsed["message"], "dropped 2 features");
    }
}
