//! Verification results.

use crate::{Violation, ViolationKind};
use plumb_schema::Dialect;
use std::collections::BTreeMap;
use std::fmt;

/// Which part of a run produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Check {
    /// Listing tables and pairing them with models.
    Coverage,
    Attributes,
    OrderStates,
    ForeignKeys,
    Indexes,
}

impl Check {
    pub fn as_str(&self) -> &'static str {
        match self {
            Check::Coverage => "coverage",
            Check::Attributes => "attributes",
            Check::OrderStates => "order-states",
            Check::ForeignKeys => "foreign-keys",
            Check::Indexes => "indexes",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational; never affects the verdict.
    Notice,
    /// Fails the table it belongs to.
    Failure,
}

/// What a diagnostic is about.
#[derive(Debug, Clone, PartialEq)]
pub enum Finding {
    /// The table diverges from its model.
    Violation(Violation),
    /// The database couldn't be read; the check didn't run.
    Introspection(String),
    /// The table exists in the database but no model declares it.
    UnmatchedTable,
    /// More than one model declares the table; only the first was checked.
    DuplicateModel,
}

/// One finding about one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub table: String,
    pub check: Check,
    pub finding: Finding,
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self.finding {
            Finding::UnmatchedTable => Severity::Notice,
            Finding::Violation(_) | Finding::Introspection(_) | Finding::DuplicateModel => {
                Severity::Failure
            }
        }
    }

    pub fn is_failure(&self) -> bool {
        self.severity() == Severity::Failure
    }

    pub fn violation(&self) -> Option<&Violation> {
        match &self.finding {
            Finding::Violation(v) => Some(v),
            _ => None,
        }
    }

    /// Short label: the violation kind, or the kind of problem otherwise.
    pub fn label(&self) -> &'static str {
        match &self.finding {
            Finding::Violation(v) => v.kind().as_str(),
            Finding::Introspection(_) => "IntrospectionFailed",
            Finding::UnmatchedTable => "UnmatchedTable",
            Finding::DuplicateModel => "DuplicateModel",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.severity() {
            Severity::Failure => '✗',
            Severity::Notice => '·',
        };
        write!(f, "{} [{}] {}: ", marker, self.check, self.label())?;
        match &self.finding {
            Finding::Violation(v) => write!(f, "{}", v),
            Finding::Introspection(err) => write!(f, "{}", err),
            Finding::UnmatchedTable => write!(f, "table exists in the database but has no model"),
            Finding::DuplicateModel => write!(f, "more than one model declares this table"),
        }
    }
}

/// Outcome of one table across all passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOutcome {
    pub table: String,
    pub passed: bool,
}

/// Everything a verification run found.
#[derive(Debug, Clone)]
pub struct VerificationReport {
    dialect: Dialect,
    tables: Vec<TableOutcome>,
    diagnostics: Vec<Diagnostic>,
}

impl VerificationReport {
    pub(crate) fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            tables: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// A report for a run that couldn't get past listing tables.
    pub(crate) fn aborted(dialect: Dialect, err: &crate::Error) -> Self {
        let mut report = Self::new(dialect);
        report.introspection_failed("*", Check::Coverage, err);
        report
    }

    pub(crate) fn begin_table(&mut self, table: &str) {
        self.tables.push(TableOutcome {
            table: table.to_string(),
            passed: true,
        });
    }

    fn fail_table(&mut self, table: &str) {
        if let Some(outcome) = self.tables.iter_mut().find(|t| t.table == table) {
            outcome.passed = false;
        }
    }

    /// Record a check's violations.
    pub(crate) fn record(&mut self, table: &str, check: Check, violations: Vec<Violation>) {
        if violations.is_empty() {
            return;
        }
        for violation in violations {
            tracing::error!(
                table,
                check = %check,
                kind = %violation.kind(),
                "{}",
                violation
            );
            self.diagnostics.push(Diagnostic {
                table: table.to_string(),
                check,
                finding: Finding::Violation(violation),
            });
        }
        self.fail_table(table);
    }

    pub(crate) fn introspection_failed(&mut self, table: &str, check: Check, err: &crate::Error) {
        tracing::error!(table, check = %check, error = %err, "introspection failed");
        self.diagnostics.push(Diagnostic {
            table: table.to_string(),
            check,
            finding: Finding::Introspection(err.to_string()),
        });
        self.fail_table(table);
    }

    pub(crate) fn duplicate_model(&mut self, table: &str) {
        tracing::warn!(table, "more than one model declares this table");
        self.diagnostics.push(Diagnostic {
            table: table.to_string(),
            check: Check::Coverage,
            finding: Finding::DuplicateModel,
        });
        self.fail_table(table);
    }

    pub(crate) fn unmatched(&mut self, table: &str) {
        tracing::info!(table, "table exists in the database but has no model");
        self.diagnostics.push(Diagnostic {
            table: table.to_string(),
            check: Check::Coverage,
            finding: Finding::UnmatchedTable,
        });
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// True when no diagnostic is a failure.
    pub fn passed(&self) -> bool {
        !self.diagnostics.iter().any(Diagnostic::is_failure)
    }

    /// Verified tables in the order they were checked.
    pub fn tables(&self) -> &[TableOutcome] {
        &self.tables
    }

    /// Outcome for `table`, or `None` if it wasn't verified.
    pub fn table_passed(&self, table: &str) -> Option<bool> {
        self.tables
            .iter()
            .find(|t| t.table == table)
            .map(|t| t.passed)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn failures(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_failure())
    }

    pub fn notices(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_failure())
    }

    /// Database tables without a model.
    pub fn unmatched_tables(&self) -> impl Iterator<Item = &str> {
        self.diagnostics
            .iter()
            .filter(|d| d.finding == Finding::UnmatchedTable)
            .map(|d| d.table.as_str())
    }

    /// Kinds of every violation recorded for `table`, in order.
    pub fn violation_kinds(&self, table: &str) -> Vec<ViolationKind> {
        self.diagnostics
            .iter()
            .filter(|d| d.table == table)
            .filter_map(|d| d.violation().map(Violation::kind))
            .collect()
    }

    /// Emit a one-line summary through tracing.
    pub fn log_summary(&self) {
        let failures = self.failures().count();
        let notices = self.notices().count();
        if self.passed() {
            tracing::info!(
                dialect = %self.dialect,
                tables = self.tables.len(),
                notices,
                "schema matches models"
            );
        } else {
            let failed_tables: Vec<&str> = self
                .tables
                .iter()
                .filter(|t| !t.passed)
                .map(|t| t.table.as_str())
                .collect();
            tracing::error!(
                dialect = %self.dialect,
                tables = self.tables.len(),
                failures,
                failed_tables = ?failed_tables,
                "schema does not match models"
            );
        }
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failures = self.failures().count();
        let notices = self.notices().count();
        writeln!(
            f,
            "{} ({}): {} tables checked, {} failures, {} notices",
            if self.passed() { "PASSED" } else { "FAILED" },
            self.dialect,
            self.tables.len(),
            failures,
            notices
        )?;

        let mut by_table: BTreeMap<&str, Vec<&Diagnostic>> = BTreeMap::new();
        for diagnostic in &self.diagnostics {
            by_table
                .entry(diagnostic.table.as_str())
                .or_default()
                .push(diagnostic);
        }

        for (table, diagnostics) in by_table {
            writeln!(f, "{}:", table)?;
            for diagnostic in diagnostics {
                writeln!(f, "  {}", diagnostic)?;
            }
        }
        Ok(())
    }
}
