//! UAVs: energy-limited, payload-limited agents.
//!
//! This module implements the per-UAV state transitions used by the
//! allocation engine:
//!
//! - Energy debits for flight legs, governed by a [`DepletionPolicy`]
//! - Refuel back to capacity (idempotent)
//! - Position updates
//! - Picking up and dropping a single payload
//!
//! Energy never goes below zero.

use serde::{Deserialize, Serialize};
use skyfleet_types::{DepletionPolicy, Position, TaskId, UavId};
use tracing::warn;

use crate::error::FleetError;
use crate::geometry::{is_non_negative_finite, is_positive_finite};
use crate::registry::Keyed;
use crate::task::Task;

/// Construction parameters for a [`Uav`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UavSpec {
    /// Positive identifier, unique within the fleet.
    pub id: UavId,
    /// Maximum payload weight.
    pub weight_capacity: f64,
    /// Full-tank energy. One unit of distance costs one unit of energy.
    pub energy_capacity: f64,
    /// Starting position (default: origin).
    #[serde(default)]
    pub position: Position,
}

/// Outcome of a successful [`Uav::debit_energy`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyDebit {
    /// Energy the leg asked for.
    pub cost: f64,
    /// Energy before the debit.
    pub energy_before: f64,
    /// Energy after the debit.
    pub remaining: f64,
    /// The debit exceeded the available energy and was clamped to zero.
    pub depleted: bool,
}

/// A validated UAV.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Uav {
    id: UavId,
    weight_capacity: f64,
    energy_capacity: f64,
    energy: f64,
    position: Position,
    payload: Option<TaskId>,
}

impl Uav {
    /// Validate `spec` and build a UAV with a full tank and no payload.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::InvalidId`] for a zero ID,
    /// [`FleetError::InvalidParameter`] for non-positive capacities and
    /// [`FleetError::NonFinitePosition`] for bad coordinates.
    pub fn new(spec: UavSpec) -> Result<Self, FleetError> {
        if !spec.id.is_valid() {
            return Err(FleetError::InvalidId {
                entity: "uav",
                id: spec.id.get(),
            });
        }
        if !is_positive_finite(spec.weight_capacity) {
            return Err(FleetError::InvalidParameter {
                field: "weight_capacity",
                value: spec.weight_capacity,
                reason: "must be positive",
            });
        }
        if !is_positive_finite(spec.energy_capacity) {
            return Err(FleetError::InvalidParameter {
                field: "energy_capacity",
                value: spec.energy_capacity,
                reason: "must be positive",
            });
        }
        if !spec.position.is_finite() {
            return Err(FleetError::NonFinitePosition {
                context: format!("uav {} position", spec.id),
            });
        }

        Ok(Self {
            id: spec.id,
            weight_capacity: spec.weight_capacity,
            energy_capacity: spec.energy_capacity,
            energy: spec.energy_capacity,
            position: spec.position,
            payload: None,
        })
    }

    /// UAV identifier.
    pub const fn id(&self) -> UavId {
        self.id
    }

    /// Maximum payload weight.
    pub const fn weight_capacity(&self) -> f64 {
        self.weight_capacity
    }

    /// Full-tank energy.
    pub const fn energy_capacity(&self) -> f64 {
        self.energy_capacity
    }

    /// Current energy.
    pub const fn energy(&self) -> f64 {
        self.energy
    }

    /// Current position.
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Whether the UAV is carrying a task.
    pub const fn is_carrying(&self) -> bool {
        self.payload.is_some()
    }

    /// Distance from the UAV to `point`.
    pub fn distance_to(&self, point: &Position) -> f64 {
        self.position.distance_to(point)
    }

    /// Whether the UAV sits exactly on `point`.
    pub fn is_at(&self, point: &Position) -> bool {
        self.distance_to(point) <= 0.0
    }

    /// Whether energy is strictly below `threshold`.
    pub fn needs_refuel(&self, threshold: f64) -> bool {
        self.energy < threshold
    }

    /// Whether the UAV could pick up `weight`: it must not already carry a
    /// task and `weight` must fit its capacity.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::InvalidWeight`] if `weight` is negative or not
    /// finite.
    pub fn can_carry(&self, weight: f64) -> Result<bool, FleetError> {
        if !is_non_negative_finite(weight) {
            return Err(FleetError::InvalidWeight { weight });
        }
        Ok(!self.is_carrying() && weight <= self.weight_capacity)
    }

    /// Debit `cost` units of energy.
    ///
    /// If `cost` exceeds the remaining energy, `policy` decides: `Clamp`
    /// sets energy to zero, logs a warning and reports `depleted`; `Reject`
    /// returns [`FleetError::EnergyDepleted`] and leaves energy unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::InvalidEnergyCost`] if `cost` is negative or
    /// not finite, or [`FleetError::EnergyDepleted`] under `Reject`.
    pub fn debit_energy(
        &mut self,
        cost: f64,
        policy: DepletionPolicy,
    ) -> Result<EnergyDebit, FleetError> {
        if !is_non_negative_finite(cost) {
            return Err(FleetError::InvalidEnergyCost { cost });
        }

        let energy_before = self.energy;
        if cost <= energy_before {
            self.energy = energy_before - cost;
            return Ok(EnergyDebit {
                cost,
                energy_before,
                remaining: self.energy,
                depleted: false,
            });
        }

        match policy {
            DepletionPolicy::Clamp => {
                warn!(
                    uav_id = %self.id,
                    cost,
                    available = energy_before,
                    "UAV energy depleted, clamping to zero"
                );
                self.energy = 0.0;
                Ok(EnergyDebit {
                    cost,
                    energy_before,
                    remaining: 0.0,
                    depleted: true,
                })
            }
            DepletionPolicy::Reject => Err(FleetError::EnergyDepleted {
                uav_id: self.id,
                required: cost,
                available: energy_before,
            }),
        }
    }

    /// Refill energy to capacity. Returns the amount restored.
    pub fn refuel(&mut self) -> f64 {
        let restored = self.energy_capacity - self.energy;
        self.energy = self.energy_capacity;
        restored
    }

    /// Move the UAV to `position`.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::NonFinitePosition`] for bad coordinates.
    pub fn move_to(&mut self, position: Position) -> Result<(), FleetError> {
        if !position.is_finite() {
            return Err(FleetError::NonFinitePosition {
                context: format!("uav {} move target", self.id),
            });
        }
        self.position = position;
        Ok(())
    }

    /// Pick up `task` as the UAV's payload.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::AlreadyCarrying`] if a payload is already
    /// aboard and [`FleetError::TaskAlreadyCompleted`] for a finished task.
    pub fn begin_carry(&mut self, task: &Task) -> Result<(), FleetError> {
        if let Some(carried) = self.payload {
            return Err(FleetError::AlreadyCarrying {
                uav_id: self.id,
                carried,
            });
        }
        if task.is_completed() {
            return Err(FleetError::TaskAlreadyCompleted(task.id()));
        }
        self.payload = Some(task.id());
        Ok(())
    }

    /// Drop the current payload, returning the task it belonged to.
    pub const fn finish_carry(&mut self) -> Option<TaskId> {
        self.payload.take()
    }
}

impl Keyed for Uav {
    type Id = UavId;
    const ENTITY: &'static str = "uav";

    fn key(&self) -> UavId {
        self.id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::task::TaskSpec;

    fn uav() -> Uav {
        Uav::new(UavSpec {
            id: UavId::new(1),
            weight_capacity: 5.0,
            energy_capacity: 100.0,
            position: Position::ORIGIN,
        })
        .unwrap()
    }

    fn task(id: u64, weight: f64) -> Task {
        Task::new(TaskSpec {
            id: TaskId::new(id),
            position: Position::new(10.0, 0.0),
            deadline: 100.0,
            initial_value: 50.0,
            decay_rate: 0.0,
            weight,
        })
        .unwrap()
    }

    #[test]
    fn starts_full_and_empty_handed() {
        let u = uav();
        assert!((u.energy() - 100.0).abs() < f64::EPSILON);
        assert!(!u.is_carrying());
    }

    #[test]
    fn debit_within_budget() {
        let mut u = uav();
        let debit = u.debit_energy(30.0, DepletionPolicy::Clamp).unwrap();
        assert!(!debit.depleted);
        assert!((debit.energy_before - 100.0).abs() < f64::EPSILON);
        assert!((u.energy() - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn clamp_policy_floors_at_zero() {
        let mut u = uav();
        let debit = u.debit_energy(150.0, DepletionPolicy::Clamp).unwrap();
        assert!(debit.depleted);
        assert!(u.energy().abs() < f64::EPSILON);
    }

    #[test]
    fn reject_policy_leaves_energy_unchanged() {
        let mut u = uav();
        let err = u.debit_energy(150.0, DepletionPolicy::Reject).unwrap_err();
        assert_eq!(
            err,
            FleetError::EnergyDepleted {
                uav_id: UavId::new(1),
                required: 150.0,
                available: 100.0,
            }
        );
        assert!((u.energy() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn negative_cost_is_invalid_and_mutates_nothing() {
        let mut u = uav();
        assert_eq!(
            u.debit_energy(-1.0, DepletionPolicy::Clamp),
            Err(FleetError::InvalidEnergyCost { cost: -1.0 })
        );
        assert!(u.debit_energy(f64::NAN, DepletionPolicy::Clamp).is_err());
        assert!((u.energy() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn refuel_is_idempotent() {
        let mut u = uav();
        u.debit_energy(40.0, DepletionPolicy::Clamp).unwrap();
        assert!((u.refuel() - 40.0).abs() < f64::EPSILON);
        assert!(u.refuel().abs() < f64::EPSILON);
        assert!((u.energy() - u.energy_capacity()).abs() < f64::EPSILON);
    }

    #[test]
    fn carry_checks_weight_and_payload() {
        let mut u = uav();
        assert!(u.can_carry(5.0).unwrap());
        assert!(!u.can_carry(5.5).unwrap());
        assert!(u.can_carry(-1.0).is_err());

        u.begin_carry(&task(1, 2.0)).unwrap();
        assert!(!u.can_carry(1.0).unwrap());
    }

    #[test]
    fn carrying_two_tasks_is_an_invariant_violation() {
        let mut u = uav();
        u.begin_carry(&task(1, 1.0)).unwrap();
        let err = u.begin_carry(&task(2, 1.0)).unwrap_err();
        assert_eq!(
            err,
            FleetError::AlreadyCarrying {
                uav_id: UavId::new(1),
                carried: TaskId::new(1),
            }
        );
        assert_eq!(u.finish_carry(), Some(TaskId::new(1)));
        assert!(!u.is_carrying());
    }

    #[test]
    fn completed_tasks_cannot_be_picked_up() {
        let mut u = uav();
        let mut t = task(3, 1.0);
        t.mark_completed().unwrap();
        assert_eq!(
            u.begin_carry(&t),
            Err(FleetError::TaskAlreadyCompleted(TaskId::new(3)))
        );
    }

    #[test]
    fn needs_refuel_is_strict() {
        let mut u = uav();
        u.debit_energy(90.0, DepletionPolicy::Clamp).unwrap();
        assert!(!u.needs_refuel(10.0));
        assert!(u.needs_refuel(10.5));
    }

    #[test]
    fn move_rejects_non_finite_targets() {
        let mut u = uav();
        assert!(u.move_to(Position::new(f64::NAN, 0.0)).is_err());
        assert!(u.is_at(&Position::ORIGIN));
        u.move_to(Position::new(3.0, 4.0)).unwrap();
        assert!((u.distance_to(&Position::ORIGIN) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn construction_guards() {
        let bad_id = UavSpec {
            id: UavId::new(0),
            weight_capacity: 1.0,
            energy_capacity: 1.0,
            position: Position::ORIGIN,
        };
        assert!(matches!(Uav::new(bad_id), Err(FleetError::InvalidId { .. })));

        let bad_energy = UavSpec {
            id: UavId::new(1),
            weight_capacity: 1.0,
            energy_capacity: 0.0,
            position: Position::ORIGIN,
        };
        assert!(matches!(
            Uav::new(bad_energy),
            Err(FleetError::InvalidParameter { field: "energy_capacity", .. })
        ));
    }
}
