//! Human-readable output

use colored::{ColoredString, Colorize};
use std::io::{self, Write};

use super::Printer;
use crate::permissions::{Grant, PermissionRequest, PermissionResult};

/// Plain text report with one block per grant chain
#[derive(Debug, Clone, Default)]
pub struct TextPrinter {
    color: bool,
}

impl TextPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn print_grant(&self, out: &mut dyn Write, index: usize, result: &PermissionResult, grant: &Grant) -> io::Result<()> {
        writeln!(out, "{}", self.paint(&format!("Path {}:", index + 1), |s| s.bold()))?;
        writeln!(out, "  Subject: {}", result.subject)?;
        write_arrow(out)?;
        write!(out, "  {}: {}", grant.binding.kind, grant.binding.name)?;
        if let Some(ns) = &grant.binding.namespace {
            write!(out, " (namespace: {})", ns)?;
        }
        writeln!(out)?;
        write_arrow(out)?;
        write!(out, "  {}: {}", grant.role.kind, grant.role.name)?;
        if let Some(ns) = &grant.role.namespace {
            write!(out, " (namespace: {})", ns)?;
        }
        writeln!(out)?;
        write_arrow(out)?;
        writeln!(out, "  Rule: {}", grant.matching_rule)?;
        writeln!(out, "  Scope: {}", grant.scope)?;
        writeln!(out)
    }
}

fn write_arrow(out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "      |")?;
    writeln!(out, "      v")
}

/// `resource[/subresource][.group][ (name: x)]`
fn format_resource(request: &PermissionRequest) -> String {
    let mut resource = request.full_resource();
    if !request.api_group.is_empty() {
        resource.push('.');
        resource.push_str(&request.api_group);
    }
    if let Some(name) = &request.resource_name {
        resource.push_str(&format!(" (name: {})", name));
    }
    resource
}

impl Printer for TextPrinter {
    fn print(&self, out: &mut dyn Write, result: &PermissionResult) -> io::Result<()> {
        let request = &result.request;

        if result.allowed {
            write!(
                out,
                "{} {} can {} {}",
                self.paint("ALLOWED:", |s| s.green().bold()),
                result.subject,
                request.verb,
                format_resource(request)
            )?;
            if let Some(ns) = &request.namespace {
                write!(out, " in namespace {}", ns)?;
            }
            writeln!(out)?;
            writeln!(out)?;
            writeln!(out, "Permission granted through {} path(s):", result.grants.len())?;
            writeln!(out)?;

            for (index, grant) in result.grants.iter().enumerate() {
                self.print_grant(out, index, result, grant)?;
            }
        } else {
            writeln!(
                out,
                "{} No RBAC rules grant {} {} to {}",
                self.paint("DENIED:", |s| s.red().bold()),
                request.verb,
                format_resource(request),
                result.subject
            )?;
            if let Some(ns) = &request.namespace {
                writeln!(out, "Namespace: {}", ns)?;
            }
        }

        if !result.errors.is_empty() {
            if !result.allowed {
                writeln!(out)?;
            }
            writeln!(
                out,
                "{} {} binding(s) could not be followed:",
                self.paint("INCOMPLETE:", |s| s.yellow().bold()),
                result.errors.len()
            )?;
            for error in &result.errors {
                writeln!(out, "  - {}", error)?;
            }
        }

        Ok(())
    }
}
