//! Tasks: positioned, deadline-bound units of work with a decaying value.
//!
//! A task's value decays exponentially from `initial_value` at rate
//! `decay_rate` and drops to zero at the deadline or once the task is
//! completed:
//!
//! ```text
//! value(t) = initial_value * exp(-decay_rate * t)   if t < deadline and not completed
//!          = 0                                       otherwise
//! ```
//!
//! Completion is the only mutation and it is terminal.

use serde::{Deserialize, Serialize};
use skyfleet_types::{Position, TaskId};

use crate::error::FleetError;
use crate::geometry::{is_non_negative_finite, is_positive_finite};
use crate::registry::Keyed;

/// Construction parameters for a [`Task`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Positive identifier, unique within the registry.
    pub id: TaskId,
    /// Where the task must be performed.
    pub position: Position,
    /// Time at which the task's value drops to zero.
    pub deadline: f64,
    /// Value at time zero.
    pub initial_value: f64,
    /// Exponential decay rate in `[0, 1]`.
    pub decay_rate: f64,
    /// Payload weight the UAV must carry (default: 0).
    #[serde(default)]
    pub weight: f64,
}

/// A validated task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    id: TaskId,
    position: Position,
    deadline: f64,
    initial_value: f64,
    decay_rate: f64,
    weight: f64,
    completed: bool,
}

impl Task {
    /// Validate `spec` and build an incomplete task.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::InvalidId`] for a zero ID,
    /// [`FleetError::NonFinitePosition`] for bad coordinates, and
    /// [`FleetError::InvalidParameter`] when deadline or initial value is not
    /// positive, decay rate is outside `[0, 1]` or weight is negative.
    pub fn new(spec: TaskSpec) -> Result<Self, FleetError> {
        if !spec.id.is_valid() {
            return Err(FleetError::InvalidId {
                entity: "task",
                id: spec.id.get(),
            });
        }
        if !spec.position.is_finite() {
            return Err(FleetError::NonFinitePosition {
                context: format!("task {} position", spec.id),
            });
        }
        if !is_positive_finite(spec.deadline) {
            return Err(FleetError::InvalidParameter {
                field: "deadline",
                value: spec.deadline,
                reason: "must be positive",
            });
        }
        if !is_positive_finite(spec.initial_value) {
            return Err(FleetError::InvalidParameter {
                field: "initial_value",
                value: spec.initial_value,
                reason: "must be positive",
            });
        }
        if !(0.0..=1.0).contains(&spec.decay_rate) {
            return Err(FleetError::InvalidParameter {
                field: "decay_rate",
                value: spec.decay_rate,
                reason: "must be between 0 and 1",
            });
        }
        if !is_non_negative_finite(spec.weight) {
            return Err(FleetError::InvalidParameter {
                field: "weight",
                value: spec.weight,
                reason: "must not be negative",
            });
        }

        Ok(Self {
            id: spec.id,
            position: spec.position,
            deadline: spec.deadline,
            initial_value: spec.initial_value,
            decay_rate: spec.decay_rate,
            weight: spec.weight,
            completed: false,
        })
    }

    /// Task identifier.
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Task location.
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Deadline.
    pub const fn deadline(&self) -> f64 {
        self.deadline
    }

    /// Value at time zero.
    pub const fn initial_value(&self) -> f64 {
        self.initial_value
    }

    /// Exponential decay rate.
    pub const fn decay_rate(&self) -> f64 {
        self.decay_rate
    }

    /// Payload weight.
    pub const fn weight(&self) -> f64 {
        self.weight
    }

    /// Whether the task has been completed.
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    /// Whether the deadline has passed at `time`.
    pub fn is_expired(&self, time: f64) -> bool {
        time >= self.deadline
    }

    /// Deadline urgency factor `1 / (deadline + 1)`.
    pub fn urgency(&self) -> f64 {
        1.0 / (self.deadline + 1.0)
    }

    /// Value of the task at `time`.
    ///
    /// Zero once the task is completed or `time >= deadline`.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::InvalidTime`] if `time` is negative or not finite.
    pub fn current_value(&self, time: f64) -> Result<f64, FleetError> {
        if !is_non_negative_finite(time) {
            return Err(FleetError::InvalidTime { time });
        }
        if self.completed || self.is_expired(time) {
            return Ok(0.0);
        }
        Ok(self.initial_value * (-self.decay_rate * time).exp())
    }

    /// Distance from the task to `point`.
    pub fn distance_to(&self, point: &Position) -> f64 {
        self.position.distance_to(point)
    }

    /// Mark the task completed.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::TaskAlreadyCompleted`] if it already was.
    pub fn mark_completed(&mut self) -> Result<(), FleetError> {
        if self.completed {
            return Err(FleetError::TaskAlreadyCompleted(self.id));
        }
        self.completed = true;
        Ok(())
    }
}

impl Keyed for Task {
    type Id = TaskId;
    const ENTITY: &'static str = "task";

    fn key(&self) -> TaskId {
        self.id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn spec() -> TaskSpec {
        TaskSpec {
            id: TaskId::new(1),
            position: Position::new(10.0, 0.0),
            deadline: 5.0,
            initial_value: 100.0,
            decay_rate: 0.5,
            weight: 1.0,
        }
    }

    #[test]
    fn value_at_time_zero_is_initial_value() {
        let task = Task::new(spec()).unwrap();
        assert!((task.current_value(0.0).unwrap() - 100.0).abs() < 1e-12);
    }

    #[test]
    fn value_is_zero_at_deadline() {
        let task = Task::new(spec()).unwrap();
        assert!(task.current_value(5.0).unwrap().abs() < f64::EPSILON);
        assert!(task.current_value(50.0).unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn value_decays_exponentially() {
        let task = Task::new(spec()).unwrap();
        let expected = 100.0 * (-0.5_f64 * 2.0).exp();
        assert!((task.current_value(2.0).unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn value_is_non_increasing() {
        let task = Task::new(spec()).unwrap();
        let mut previous = f64::INFINITY;
        for step in 0..80 {
            let t = f64::from(step) * 0.1;
            let v = task.current_value(t).unwrap();
            assert!(v >= 0.0);
            assert!(v <= previous);
            previous = v;
        }
    }

    #[test]
    fn zero_decay_keeps_value_until_deadline() {
        let mut s = spec();
        s.decay_rate = 0.0;
        let task = Task::new(s).unwrap();
        assert!((task.current_value(4.99).unwrap() - 100.0).abs() < 1e-12);
    }

    #[test]
    fn negative_time_is_invalid() {
        let task = Task::new(spec()).unwrap();
        assert_eq!(
            task.current_value(-1.0),
            Err(FleetError::InvalidTime { time: -1.0 })
        );
        assert!(task.current_value(f64::NAN).is_err());
    }

    #[test]
    fn completed_task_has_no_value() {
        let mut task = Task::new(spec()).unwrap();
        task.mark_completed().unwrap();
        assert!(task.is_completed());
        assert!(task.current_value(0.0).unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn completing_twice_is_an_error() {
        let mut task = Task::new(spec()).unwrap();
        task.mark_completed().unwrap();
        assert_eq!(
            task.mark_completed(),
            Err(FleetError::TaskAlreadyCompleted(TaskId::new(1)))
        );
    }

    #[test]
    fn construction_guards() {
        let mut s = spec();
        s.id = TaskId::new(0);
        assert!(matches!(Task::new(s), Err(FleetError::InvalidId { .. })));

        let mut s = spec();
        s.deadline = 0.0;
        assert!(matches!(
            Task::new(s),
            Err(FleetError::InvalidParameter { field: "deadline", .. })
        ));

        let mut s = spec();
        s.initial_value = -3.0;
        assert!(Task::new(s).is_err());

        let mut s = spec();
        s.decay_rate = 1.5;
        assert!(matches!(
            Task::new(s),
            Err(FleetError::InvalidParameter { field: "decay_rate", .. })
        ));

        let mut s = spec();
        s.weight = -0.1;
        assert!(Task::new(s).is_err());

        let mut s = spec();
        s.position = Position::new(f64::INFINITY, 0.0);
        assert!(matches!(
            Task::new(s),
            Err(FleetError::NonFinitePosition { .. })
        ));
    }

    #[test]
    fn urgency_shrinks_with_deadline() {
        let near = Task::new(spec()).unwrap();
        let mut s = spec();
        s.deadline = 99.0;
        let far = Task::new(s).unwrap();
        assert!((near.urgency() - 1.0 / 6.0).abs() < 1e-12);
        assert!(far.urgency() < near.urgency());
    }

    #[test]
    fn weight_defaults_to_zero_in_yaml() {
        let yaml = "id: 3\nposition: { x: 1.0, y: 2.0 }\ndeadline: 10.0\ninitial_value: 5.0\ndecay_rate: 0.1\n";
        let parsed: TaskSpec = serde_yml::from_str(yaml).unwrap();
        assert!(parsed.weight.abs() < f64::EPSILON);
        assert_eq!(parsed.id, TaskId::new(3));
    }
}
