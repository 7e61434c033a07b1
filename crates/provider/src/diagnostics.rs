//! Diagnostics returned to the host and the adapter error type

use std::fmt;

use ibmcloud_common::ErrorKind;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single problem reported alongside an entry point's payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    pub attribute: Option<String>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

/// Adapter operation names carried by [`ResourceError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Exists,
    Import,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Exists => "exists",
            Operation::Import => "import",
        };
        f.write_str(name)
    }
}

/// An SDK error annotated with where in the adapter layer it happened
#[derive(Error, Debug)]
#[error("{operation} {resource_type}{}: {source}", describe_id(.id))]
pub struct ResourceError {
    pub operation: Operation,
    pub resource_type: String,
    pub id: Option<String>,
    #[source]
    pub source: ibmcloud_common::Error,
}

fn describe_id(id: &Option<String>) -> String {
    id.as_deref()
        .map(|id| format!(" ({})", id))
        .unwrap_or_default()
}

impl ResourceError {
    pub fn new(
        operation: Operation,
        resource_type: impl Into<String>,
        id: Option<&str>,
        source: ibmcloud_common::Error,
    ) -> Self {
        Self {
            operation,
            resource_type: resource_type.into(),
            id: id.map(str::to_string),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let summary = match self.operation {
            Operation::Create => "Failed to create resource",
            Operation::Read => "Failed to read resource",
            Operation::Update => "Failed to update resource",
            Operation::Delete => "Failed to delete resource",
            Operation::Exists => "Failed to check resource existence",
            Operation::Import => "Failed to import resource",
        };
        Diagnostic::error(summary, self.to_string())
    }
}
