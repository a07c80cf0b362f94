//! YAML output

use std::io::{self, Write};

use super::json::ResultReport;
use super::Printer;
use crate::permissions::PermissionResult;

/// YAML document with the same fields as the JSON report
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlPrinter;

impl Printer for YamlPrinter {
    fn print(&self, out: &mut dyn Write, result: &PermissionResult) -> io::Result<()> {
        serde_yaml::to_writer(&mut *out, &ResultReport::from(result)).map_err(io::Error::other)
    }
}
