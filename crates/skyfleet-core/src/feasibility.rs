//! Feasibility checks for assigning a task to a UAV.
//!
//! The evaluator runs a pipeline of checks:
//! 1. **Payload** -- Is the UAV free, and does the task fit its capacity?
//! 2. **Energy** -- Can the UAV fly to the task and then back to the
//!    station, keeping the configured safety reserve?
//!
//! The energy check is what guarantees a UAV is never sent somewhere it
//! cannot come back from. It models a single outbound leg and a single
//! return leg with no refuel in between.

use skyfleet_fleet::{FleetError, Task, Uav, checked_distance};
use skyfleet_types::Position;

/// Why a task cannot be assigned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Infeasibility {
    /// The UAV is already carrying a task.
    Busy,
    /// The task is heavier than the UAV's capacity.
    TooHeavy {
        /// Task weight.
        weight: f64,
        /// UAV capacity.
        capacity: f64,
    },
    /// The round trip needs more energy than the UAV has.
    InsufficientEnergy {
        /// Energy needed including the reserve.
        required: f64,
        /// Energy the UAV has.
        available: f64,
    },
}

/// The result of evaluating a (UAV, task) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeasibilityResult {
    /// The task can be assigned.
    Feasible(ReachAssessment),
    /// The task cannot be assigned.
    Infeasible(Infeasibility),
}

impl FeasibilityResult {
    /// Whether the task can be assigned.
    pub const fn is_feasible(&self) -> bool {
        matches!(self, Self::Feasible(_))
    }
}

/// Energy breakdown of a UAV -> task -> station round trip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReachAssessment {
    /// Distance from the UAV to the task.
    pub outbound: f64,
    /// Distance from the task to the station.
    pub return_leg: f64,
    /// Energy held back as safety margin.
    pub reserve: f64,
    /// Energy the UAV has now.
    pub available: f64,
}

impl ReachAssessment {
    /// Total energy the round trip needs.
    pub fn required(&self) -> f64 {
        self.outbound + self.return_leg + self.reserve
    }

    /// Whether the UAV has enough energy.
    pub fn is_feasible(&self) -> bool {
        self.available >= self.required()
    }
}

/// Energy reserve for a UAV with `energy_capacity` at `safety_margin_pct`.
pub fn safety_reserve(energy_capacity: f64, safety_margin_pct: f64) -> f64 {
    energy_capacity * safety_margin_pct / 100.0
}

/// Whether `uav` can pick up `task`.
///
/// # Errors
///
/// Returns [`FleetError::InvalidWeight`] for a negative or non-finite weight.
pub fn can_carry(uav: &Uav, task: &Task) -> Result<bool, FleetError> {
    uav.can_carry(task.weight())
}

/// Measure the round trip `uav -> task -> station`.
///
/// # Errors
///
/// Returns [`FleetError::NonFinitePosition`] if any point is not finite.
pub fn assess_reach(
    uav: &Uav,
    task: &Task,
    station: &Position,
    safety_margin_pct: f64,
) -> Result<ReachAssessment, FleetError> {
    let outbound = checked_distance(&uav.position(), &task.position(), "outbound leg")?;
    let return_leg = checked_distance(&task.position(), station, "return leg")?;
    Ok(ReachAssessment {
        outbound,
        return_leg,
        reserve: safety_reserve(uav.energy_capacity(), safety_margin_pct),
        available: uav.energy(),
    })
}

/// Whether `uav` can fly to `task` and then back to `station` while keeping
/// `safety_margin_pct` percent of its capacity in reserve.
///
/// # Errors
///
/// Returns [`FleetError::NonFinitePosition`] if any point is not finite.
pub fn can_reach_with_return(
    uav: &Uav,
    task: &Task,
    station: &Position,
    safety_margin_pct: f64,
) -> Result<bool, FleetError> {
    Ok(assess_reach(uav, task, station, safety_margin_pct)?.is_feasible())
}

/// Run the full pipeline: payload first, then energy.
///
/// # Errors
///
/// Propagates invalid-input errors from the individual checks.
pub fn evaluate(
    uav: &Uav,
    task: &Task,
    station: &Position,
    safety_margin_pct: f64,
) -> Result<FeasibilityResult, FleetError> {
    // Step 1: payload
    if !can_carry(uav, task)? {
        let reason = if uav.is_carrying() {
            Infeasibility::Busy
        } else {
            Infeasibility::TooHeavy {
                weight: task.weight(),
                capacity: uav.weight_capacity(),
            }
        };
        return Ok(FeasibilityResult::Infeasible(reason));
    }

    // Step 2: energy
    let reach = assess_reach(uav, task, station, safety_margin_pct)?;
    if !reach.is_feasible() {
        return Ok(FeasibilityResult::Infeasible(
            Infeasibility::InsufficientEnergy {
                required: reach.required(),
                available: reach.available,
            },
        ));
    }

    Ok(FeasibilityResult::Feasible(reach))
}
