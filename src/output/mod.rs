//! Rendering of resolution results
//!
//! Printers write to any `io::Write` so the CLI can target stdout and tests
//! can target a buffer. Risk reports have their own text and JSON forms.

mod graph;
mod json;
mod risk;
mod text;
mod yaml;

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use crate::core::RbacError;
use crate::permissions::PermissionResult;

pub use graph::{DotPrinter, MermaidPrinter};
pub use json::{JsonPrinter, ResultReport, SubjectReport};
pub use risk::{print_risks, print_risks_json};
pub use text::TextPrinter;
pub use yaml::YamlPrinter;

/// Supported output formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
    Dot,
    Mermaid,
}

impl OutputFormat {
    pub const NAMES: [&'static str; 5] = ["text", "json", "yaml", "dot", "mermaid"];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Dot => "dot",
            OutputFormat::Mermaid => "mermaid",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = RbacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" | "" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "dot" => Ok(OutputFormat::Dot),
            "mermaid" => Ok(OutputFormat::Mermaid),
            other => Err(RbacError::Config(format!(
                "unknown output format: {} (valid: {})",
                other,
                Self::NAMES.join(", ")
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renders a permission result
pub trait Printer {
    fn print(&self, out: &mut dyn Write, result: &PermissionResult) -> io::Result<()>;
}

/// Printer for a format; `color` only affects text output
pub fn printer_for(format: OutputFormat, color: bool) -> Box<dyn Printer> {
    match format {
        OutputFormat::Text => Box::new(TextPrinter::new().with_color(color)),
        OutputFormat::Json => Box::new(JsonPrinter),
        OutputFormat::Yaml => Box::new(YamlPrinter),
        OutputFormat::Dot => Box::new(DotPrinter),
        OutputFormat::Mermaid => Box::new(MermaidPrinter),
    }
}
