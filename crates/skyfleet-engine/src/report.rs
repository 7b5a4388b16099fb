//! Plain-text status report printed at the end of a run.

use core::fmt;

use skyfleet_core::{AllocationEngine, AllocationSummary, AuditResult, RefuelSummary};

/// Final fleet and task state after the allocation and refuel passes.
pub struct StatusReport<'a> {
    /// The engine after both passes.
    pub engine: &'a AllocationEngine,
    /// Result of the allocation pass.
    pub allocation: &'a AllocationSummary,
    /// Result of the refuel pass.
    pub refuel: &'a RefuelSummary,
    /// Result of the event log audit.
    pub audit: &'a AuditResult,
}

impl fmt::Display for StatusReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let engine = self.engine;
        let time = engine.config().current_time;

        writeln!(f, "=== Allocation log ===")?;
        for event in engine.events() {
            writeln!(f, "{event}")?;
        }

        writeln!(f)?;
        writeln!(f, "=== UAV status ===")?;
        writeln!(
            f,
            "{:<6} {:<10} {:>10} {:>10} {:<20} {:>6}",
            "ID", "PHASE", "ENERGY", "CAPACITY", "POSITION", "TASKS"
        )?;
        for uav in engine.fleet() {
            let phase = engine
                .phase(uav.id())
                .map_or_else(|| String::from("-"), |p| format!("{p:?}"));
            let tasks = self
                .allocation
                .outcomes
                .iter()
                .find(|o| o.uav_id == uav.id())
                .map_or(0, |o| o.assigned.len());
            writeln!(
                f,
                "{:<6} {:<10} {:>10.2} {:>10.2} {:<20} {:>6}",
                uav.id().to_string(),
                phase,
                uav.energy(),
                uav.energy_capacity(),
                uav.position().to_string(),
                tasks
            )?;
        }

        writeln!(f)?;
        writeln!(f, "=== Task status ===")?;
        writeln!(
            f,
            "{:<6} {:<10} {:>10} {:>10} {:<20}",
            "ID", "STATUS", "VALUE", "DEADLINE", "POSITION"
        )?;
        for task in engine.tasks() {
            let status = if task.is_completed() {
                "completed"
            } else if task.is_expired(time) {
                "expired"
            } else {
                "open"
            };
            writeln!(
                f,
                "{:<6} {:<10} {:>10.2} {:>10.2} {:<20}",
                task.id().to_string(),
                status,
                task.current_value(time).unwrap_or(0.0),
                task.deadline(),
                task.position().to_string()
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Tasks assigned: {}", self.allocation.tasks_assigned)?;
        writeln!(f, "UAVs refueled:  {}", self.refuel.refueled.len())?;
        for (uav_id, err) in &self.refuel.stranded {
            writeln!(f, "UAV {uav_id} stranded: {err}")?;
        }
        match self.audit {
            AuditResult::Clean => writeln!(f, "Event log audit: clean"),
            AuditResult::Violations(violations) => {
                writeln!(f, "Event log audit: {} violation(s)", violations.len())?;
                for violation in violations {
                    writeln!(f, "  {violation}")?;
                }
                Ok(())
            }
        }
    }
}
