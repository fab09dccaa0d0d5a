//! Structural checks over a whole design.
//!
//! Looks for nets with suspicious drivers, and for arcs and port boundaries
//! that run against the topological order.

use tracing::{span, Level};

use crate::diagnostics::{Cause, Issue, IssueSet, Severity};
use crate::{Design, Direction};

impl Design {
    /// Checks every net and arc of the design.
    ///
    /// Issues found are logged and returned. They are not added to
    /// [`Design::issues`].
    pub fn validate(&self) -> IssueSet {
        let _guard = span!(Level::INFO, "validating design", design = %self.name).entered();
        let mut issues = IssueSet::new();
        self.validate_drivers(&mut issues);
        self.validate_order(&mut issues);
        issues
    }

    fn validate_drivers(&self, issues: &mut IssueSet) {
        let _guard = span!(Level::INFO, "validating drivers").entered();
        for (_, net) in self.nets.iter() {
            let [sinks, drivers] = net.num_pins;
            let cause = if net.pins.is_empty() {
                Cause::Floating
            } else if drivers > 1 {
                Cause::MultipleDrivers
            } else if drivers == 0 && sinks > 0 {
                Cause::NoDrivers
            } else {
                continue;
            };
            issues.add(Issue::new_and_log(cause, net.name.clone(), Severity::Warning));
        }
    }

    fn validate_order(&self, issues: &mut IssueSet) {
        let _guard = span!(Level::INFO, "validating topological order").entered();
        let arcs = self.arcs.iter().map(|(_, arc)| (arc.from, arc.to));
        // An input pin on a port boundary precedes its peer, on either side.
        let boundaries = self
            .pins
            .iter()
            .filter(|(_, pin)| pin.is_boundary() && pin.direction == Direction::Input)
            .map(|(id, pin)| (id, pin.peer));
        for (from, to) in arcs.chain(boundaries) {
            if self.pins[from].order > self.pins[to].order {
                let subject = arcstr::format!(
                    "{} -> {}",
                    self.pin_full_name(from),
                    self.pin_full_name(to)
                );
                issues.add(Issue::new_and_log(
                    Cause::OrderViolation,
                    subject,
                    Severity::Warning,
                ));
            }
        }
    }
}
