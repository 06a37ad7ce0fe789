//! Output formatting utilities
//!
//! Provides table and JSON output formatting for CLI commands.

use crate::cli::args::OutputFormat;
use serde::Serialize;
use std::io::{self, Write};

/// Format and print output based on the selected format
pub fn print_output<T: Serialize + TableDisplay>(data: &T, format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match format {
        OutputFormat::Table => {
            writeln!(handle, "{}", data.to_table())?;
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string());
            writeln!(handle, "{}", json)?;
        }
        OutputFormat::Compact => {
            writeln!(handle, "{}", data.to_compact())?;
        }
    }

    Ok(())
}

/// Trait for types that can be displayed as a table
pub trait TableDisplay {
    /// Format as a table string
    fn to_table(&self) -> String;

    /// Format as a compact single line
    fn to_compact(&self) -> String {
        self.to_table().replace('\n', " | ")
    }
}

/// One zone's snapshot for the status command
#[derive(Debug, Clone, Serialize)]
pub struct ZoneStatusEntry {
    pub id: String,
    pub temperature: Option<i32>,
    pub source: Option<String>,
    pub computed_speed: u8,
    pub emergency: bool,
    pub targets: Vec<String>,
}

impl TableDisplay for ZoneStatusEntry {
    fn to_table(&self) -> String {
        let temp = match self.temperature {
            Some(t) => format!("{}°C", t),
            None => "unavailable".to_string(),
        };
        let source = self.source.as_deref().unwrap_or("-");
        let mut output = format!(
            "  {}: {} ({}) -> {}/255 on {}",
            self.id,
            temp,
            source,
            self.computed_speed,
            self.targets.join(", ")
        );
        if self.emergency {
            output.push_str("  [EMERGENCY]");
        }
        output
    }

    fn to_compact(&self) -> String {
        format!(
            "{}:{}:{}",
            self.id,
            self.temperature
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".to_string()),
            self.computed_speed
        )
    }
}

/// Status command output
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub endpoint: String,
    pub dialect: String,
    pub zones: Vec<ZoneStatusEntry>,
}

impl TableDisplay for StatusReport {
    fn to_table(&self) -> String {
        let mut output = format!("Controller: {} ({})\n", self.endpoint, self.dialect);
        output.push_str(&format!("Zones: {}\n\n", self.zones.len()));

        for zone in &self.zones {
            output.push_str(&zone.to_table());
            output.push('\n');
        }

        output
    }

    fn to_compact(&self) -> String {
        self.zones
            .iter()
            .map(|z| z.to_compact())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Check command output
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub endpoint: String,
    pub dialect: String,
    pub reachable: bool,
}

impl TableDisplay for CheckReport {
    fn to_table(&self) -> String {
        if self.reachable {
            format!("✓ {} ({}) reachable", self.endpoint, self.dialect)
        } else {
            format!("✗ {} ({}) not reachable", self.endpoint, self.dialect)
        }
    }
}

/// Simple message output
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub message: String,
    pub success: bool,
}

impl TableDisplay for Message {
    fn to_table(&self) -> String {
        if self.success {
            format!("✓ {}", self.message)
        } else {
            format!("✗ {}", self.message)
        }
    }
}
