//! Diagnostics produced while maintaining and validating a design.
//!
//! Issues are never fatal: they describe suspicious netlist structure (cycles,
//! undriven nets) that a design may legitimately pass through while it is
//! being edited.

use std::fmt::{Display, Formatter};

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};
use tracing::Level;

/// An enumeration of possible severity levels.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Severity {
    /// An informational message.
    Info,
    /// A warning.
    #[default]
    Warning,
    /// An error.
    Error,
}

impl Severity {
    /// Returns the log level corresponding to this severity.
    #[inline]
    pub const fn as_tracing_level(&self) -> Level {
        match *self {
            Self::Info => Level::INFO,
            Self::Warning => Level::WARN,
            Self::Error => Level::ERROR,
        }
    }

    /// Returns `true` if the severity is [`Severity::Error`].
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(*self, Self::Error)
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// The kind of problem an [`Issue`] reports.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Cause {
    /// Order propagation came back to the pin that started it, or kept
    /// revisiting the same pin.
    Cycle,
    /// A net has more than one driver.
    MultipleDrivers,
    /// A net has sinks but no driver.
    NoDrivers,
    /// A net has no pins at all.
    Floating,
    /// An arc goes from a pin with a larger order to one with a smaller order.
    OrderViolation,
}

impl Display for Cause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cycle => write!(f, "combinational cycle"),
            Self::MultipleDrivers => write!(f, "multiple drivers on the same net"),
            Self::NoDrivers => write!(f, "net is read from, but has no drivers"),
            Self::Floating => write!(f, "floating net"),
            Self::OrderViolation => write!(f, "arc violates topological order"),
        }
    }
}

/// A diagnostic about a design object.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    cause: Cause,
    severity: Severity,
    subject: ArcStr,
}

impl Issue {
    pub(crate) fn new(cause: Cause, subject: ArcStr, severity: Severity) -> Self {
        Self {
            cause,
            severity,
            subject,
        }
    }

    /// Creates a new issue and logs it at the level matching `severity`.
    pub(crate) fn new_and_log(cause: Cause, subject: ArcStr, severity: Severity) -> Self {
        let issue = Self::new(cause, subject, severity);
        match severity {
            Severity::Info => tracing::event!(Level::INFO, issue = ?issue.cause, "{}", issue),
            Severity::Warning => tracing::event!(Level::WARN, issue = ?issue.cause, "{}", issue),
            Severity::Error => tracing::event!(Level::ERROR, issue = ?issue.cause, "{}", issue),
        }
        issue
    }

    /// The underlying cause of this issue.
    #[inline]
    pub fn cause(&self) -> Cause {
        self.cause
    }

    /// The severity of this issue.
    #[inline]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// The name of the pin, net or arc the issue is about.
    #[inline]
    pub fn subject(&self) -> &ArcStr {
        &self.subject
    }
}

impl Display for Issue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.cause, self.subject)
    }
}

/// Issues in the order they were reported, counted by severity.
#[derive(Debug, Clone, Default)]
pub struct IssueSet {
    issues: Vec<Issue>,
    /// Indexed by [`Severity`].
    counts: [usize; 3],
}

impl IssueSet {
    /// Creates a new, empty issue set.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the given issue to the set.
    pub fn add(&mut self, issue: Issue) {
        self.counts[issue.severity() as usize] += 1;
        self.issues.push(issue);
    }

    /// Returns an iterator over all issues in the set.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter()
    }

    /// Returns an iterator over the issues with the given cause.
    pub fn with_cause(&self, cause: Cause) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |issue| issue.cause == cause)
    }

    /// The number of issues in this set.
    #[inline]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Returns `true` if this set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// The number of issues with the given severity.
    #[inline]
    pub fn count(&self, severity: Severity) -> usize {
        self.counts[severity as usize]
    }

    /// The most severe level among the issues, or `None` if the set is empty.
    pub fn worst(&self) -> Option<Severity> {
        [Severity::Error, Severity::Warning, Severity::Info]
            .into_iter()
            .find(|&severity| self.count(severity) > 0)
    }

    /// Returns `true` if this set contains an error.
    #[inline]
    pub fn has_error(&self) -> bool {
        self.num_errors() > 0
    }

    /// The number of errors in this set.
    #[inline]
    pub fn num_errors(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Returns `true` if this set contains a warning.
    #[inline]
    pub fn has_warning(&self) -> bool {
        self.num_warnings() > 0
    }

    /// The number of warnings in this set.
    #[inline]
    pub fn num_warnings(&self) -> usize {
        self.count(Severity::Warning)
    }
}

impl Extend<Issue> for IssueSet {
    fn extend<I: IntoIterator<Item = Issue>>(&mut self, iter: I) {
        for issue in iter {
            self.add(issue);
        }
    }
}

impl IntoIterator for IssueSet {
    type Item = Issue;
    type IntoIter = std::vec::IntoIter<Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.into_iter()
    }
}

impl Display for IssueSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for issue in self.issues.iter() {
            writeln!(f, "{}", issue)?;
        }
        Ok(())
    }
}
