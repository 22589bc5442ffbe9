//! Validation report types for structured error reporting.
//!
//! Reports can be printed for users or serialized to JSON for tooling.

use std::fmt;

use serde::Serialize;

use crate::error::AnnotoolError;

/// The result of validating a workspace.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ValidationReport {
    /// All issues found during validation, in shape order.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Adds an issue to the report.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Returns the number of errors in the report.
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    /// Returns the number of warnings in the report.
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// Returns true if there are no issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Turns the report into an error if it has errors, or, when `strict`,
    /// any warnings.
    pub fn into_result(self, strict: bool) -> Result<(), AnnotoolError> {
        let failed = !self.is_ok() || (strict && !self.is_clean());
        if failed {
            Err(AnnotoolError::ValidationFailed {
                error_count: self.error_count(),
                warning_count: self.warning_count(),
                report: self,
            })
        } else {
            Ok(())
        }
    }

    /// The report as pretty-printed JSON, with summary counts.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        #[derive(Serialize)]
        struct Summary<'a> {
            error_count: usize,
            warning_count: usize,
            issues: &'a [ValidationIssue],
        }
        serde_json::to_string_pretty(&Summary {
            error_count: self.error_count(),
            warning_count: self.warning_count(),
            issues: &self.issues,
        })
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(f, "Validation passed: no issues found");
        }

        writeln!(
            f,
            "Validation completed with {} error(s) and {} warning(s):",
            self.error_count(),
            self.warning_count()
        )?;
        writeln!(f)?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// A single validation issue (error or warning).
#[derive(Clone, Debug, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,

    /// A stable code for the issue type.
    pub code: IssueCode,

    /// A human-readable description of the issue.
    pub message: String,

    /// Where the issue occurred.
    pub context: IssueContext,
}

impl ValidationIssue {
    pub fn new(
        severity: Severity,
        code: IssueCode,
        message: impl Into<String>,
        context: IssueContext,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            context,
        }
    }

    /// Creates a new error.
    pub fn error(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Error, code, message, context)
    }

    /// Creates a new warning.
    pub fn warning(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Warning, code, message, context)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        write!(
            f,
            "[{}] {:?} in {}: {}",
            severity, self.code, self.context, self.message
        )
    }
}

/// The severity of a validation issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// Suspicious but loadable data.
    Warning,
    /// Data that breaks a shape's structural contract.
    Error,
}

/// A stable code identifying the type of validation issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IssueCode {
    // Labels
    /// A shape has an empty label.
    EmptyLabel,

    // Point lists
    /// A rectangle does not have exactly two corners.
    RectanglePointCount,
    /// A polygon has fewer than three vertices.
    PolygonTooFewPoints,
    /// A mask shape does not have exactly two box corners.
    MaskPointCount,
    /// A point has a NaN or infinite coordinate.
    NonFinitePoint,
    /// A point lies outside the image.
    PointOutOfBounds,

    // Masks
    /// The run lengths of a compacted mask do not add up to its area.
    RleLengthMismatch,
    /// A mask's size differs from its detection box.
    MaskSizeMismatch,

    // Detection metadata
    /// A confidence score is outside `[0, 1]`.
    ConfidenceOutOfRange,
}

/// Where a validation issue occurred.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueContext {
    /// The shape at `index`.
    Shape { index: usize },
}

impl fmt::Display for IssueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueContext::Shape { index } => write!(f, "shape {}", index),
        }
    }
}
