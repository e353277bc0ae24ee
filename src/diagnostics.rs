//! Diagnostics: located failure reports.
//!
//! Pulls and coordinate reads do not stop at the first bad line. Every
//! problem becomes a [`Diagnostic`] carrying the file path and 1-based
//! line, and the collection is returned at once.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::base::Origin;
use crate::project::SourceMap;
use crate::section::LineFailure;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    Error,
    Warning,
}

/// A file and 1-based line.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub path: PathBuf,
    pub line: u32,
}

impl Location {
    pub fn new(path: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            path: path.into(),
            line,
        }
    }

    /// Resolve an origin through the source map of its resolution.
    pub fn of(sources: &SourceMap, origin: Origin) -> Self {
        let path = sources
            .path(origin.file)
            .map_or_else(|| PathBuf::from(origin.file.to_string()), Path::to_path_buf);
        Self::new(path, origin.line)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)
    }
}

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Diagnostic {
    pub location: Location,
    pub severity: Severity,
    /// Error/warning code (e.g., "E0001").
    pub code: Option<&'static str>,
    pub message: String,
    /// The raw line the diagnostic is about, when there is one.
    pub source_line: Option<String>,
    pub related: Vec<RelatedInfo>,
}

/// Related information for a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RelatedInfo {
    pub location: Location,
    pub message: String,
}

impl Diagnostic {
    pub fn error(location: Location, message: impl Into<String>) -> Self {
        Self {
            location,
            severity: Severity::Error,
            code: None,
            message: message.into(),
            source_line: None,
            related: Vec::new(),
        }
    }

    pub fn warning(location: Location, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(location, message)
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_source_line(mut self, line: impl Into<String>) -> Self {
        self.source_line = Some(line.into());
        self
    }

    pub fn with_related(mut self, location: Location, message: impl Into<String>) -> Self {
        self.related.push(RelatedInfo {
            location,
            message: message.into(),
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {severity}", self.location)?;
        if let Some(code) = self.code {
            write!(f, "[{code}]")?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(line) = &self.source_line {
            write!(f, "\n    | {}", line.trim_end())?;
        }
        for related in &self.related {
            write!(f, "\n  note: {}: {}", related.location, related.message)?;
        }
        Ok(())
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Stable diagnostic codes.
pub mod codes {
    /// A line that does not follow its record schema.
    pub const SYNTAX: &str = "E0001";
    /// Conflicting definitions under one name.
    pub const AMBIGUOUS_DEFINITION: &str = "E0002";
    /// A name with no definition in the reachable include graph.
    pub const UNDEFINED_REFERENCE: &str = "E0003";
    /// A molecule body section with no open `[ moleculetype ]`.
    pub const OUTSIDE_MOLECULE_TYPE: &str = "E0004";
    /// Declared and observed atom counts differ.
    pub const ATOM_COUNT_MISMATCH: &str = "E0005";

    /// A conflicting definition replaced an earlier one.
    pub const OVERRIDDEN_DEFINITION: &str = "W0001";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics while a pull or read runs.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Add a line that failed its record schema.
    pub fn syntax_failure(&mut self, sources: &SourceMap, failure: &LineFailure) {
        self.add(
            Diagnostic::error(Location::of(sources, failure.origin), failure.error.to_string())
                .with_code(codes::SYNTAX)
                .with_source_line(failure.text.clone()),
        );
    }

    /// Add a conflicting redefinition of `name`.
    pub fn ambiguous_definition(&mut self, what: &str, name: &str, at: Location, previous: Location) {
        self.add(
            Diagnostic::error(at, format!("conflicting definitions of {what} '{name}'"))
                .with_code(codes::AMBIGUOUS_DEFINITION)
                .with_related(previous, format!("previous definition of '{name}'")),
        );
    }

    /// Add a reference to `name` that nothing defines.
    pub fn undefined_reference(&mut self, what: &str, name: &str, at: Location) {
        self.add(
            Diagnostic::error(at, format!("undefined {what}: '{name}'"))
                .with_code(codes::UNDEFINED_REFERENCE),
        );
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| !d.is_error()).count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// `Ok(value)` when no errors were collected; otherwise every
    /// diagnostic, warnings included.
    pub fn finish<T>(self, value: T) -> Result<T, Vec<Diagnostic>> {
        if self.has_errors() {
            Err(self.diagnostics)
        } else {
            Ok(value)
        }
    }
}
