//! JSON output and the report structure it shares with YAML

use serde::Serialize;
use std::io::{self, Write};

use super::Printer;
use crate::permissions::{Grant, PermissionRequest, PermissionResult};
use crate::subject::Subject;

/// Serialized form of a permission result, shared by the JSON and YAML printers
#[derive(Debug, Serialize)]
pub struct ResultReport<'a> {
    pub allowed: bool,
    pub subject: SubjectReport<'a>,
    pub request: &'a PermissionRequest,
    pub grants: &'a [Grant],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SubjectReport<'a> {
    pub kind: &'static str,
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<&'a str>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    pub groups: &'a [String],
}

impl<'a> From<&'a Subject> for SubjectReport<'a> {
    fn from(subject: &'a Subject) -> Self {
        Self {
            kind: subject.kind.as_str(),
            name: &subject.name,
            namespace: subject.namespace.as_deref(),
            groups: &subject.groups,
        }
    }
}

impl<'a> From<&'a PermissionResult> for ResultReport<'a> {
    fn from(result: &'a PermissionResult) -> Self {
        Self {
            allowed: result.allowed,
            subject: SubjectReport::from(&result.subject),
            request: &result.request,
            grants: &result.grants,
            errors: result.errors.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Pretty-printed JSON, one document per result
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPrinter;

impl Printer for JsonPrinter {
    fn print(&self, out: &mut dyn Write, result: &PermissionResult) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, &ResultReport::from(result))?;
        writeln!(out)
    }
}
