//! Task scoring and best-task selection.
//!
//! The canonical score combines decayed value, deadline urgency and
//! distance:
//!
//! ```text
//! priority = value(t) * 1/(deadline + 1) / (distance + 1)
//! ```
//!
//! The legacy [`PriorityFormula::ValueDistance`] drops the urgency factor.
//! The `+ 1` on the distance keeps the denominator away from zero when the
//! UAV sits on the task.
//!
//! Completed tasks are never candidates: [`Rank::Completed`] orders below
//! every [`Rank::Open`] score, including zero.

use core::cmp::Ordering;

use skyfleet_fleet::{FleetError, Task, Uav, checked_distance};
use skyfleet_types::{PriorityFormula, TaskId};

/// Score `task` for `uav` at `time`.
///
/// Zero for completed or expired tasks.
///
/// # Errors
///
/// Returns [`FleetError::InvalidTime`] for a negative or non-finite time and
/// [`FleetError::NonFinitePosition`] if either position is not finite.
pub fn priority(
    uav: &Uav,
    task: &Task,
    time: f64,
    formula: PriorityFormula,
) -> Result<f64, FleetError> {
    let value = task.current_value(time)?;
    let distance = checked_distance(&uav.position(), &task.position(), "priority distance")?;
    let score = match formula {
        PriorityFormula::ValueUrgencyDistance => value * task.urgency() / (distance + 1.0),
        PriorityFormula::ValueDistance => value / (distance + 1.0),
    };
    Ok(score)
}

/// Ordering key for task selection.
#[derive(Debug, Clone, Copy)]
pub enum Rank {
    /// A completed task. Ranks below every open task.
    Completed,
    /// An open task with its priority score.
    Open(f64),
}

impl Rank {
    /// Rank `task` for `uav` at `time`.
    ///
    /// # Errors
    ///
    /// Propagates scoring errors for open tasks.
    pub fn of(
        uav: &Uav,
        task: &Task,
        time: f64,
        formula: PriorityFormula,
    ) -> Result<Self, FleetError> {
        if task.is_completed() {
            return Ok(Self::Completed);
        }
        priority(uav, task, time, formula).map(Self::Open)
    }

    /// The score of an open task.
    pub const fn score(self) -> Option<f64> {
        match self {
            Self::Completed => None,
            Self::Open(score) => Some(score),
        }
    }
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Completed, Self::Completed) => Ordering::Equal,
            (Self::Completed, Self::Open(_)) => Ordering::Less,
            (Self::Open(_), Self::Completed) => Ordering::Greater,
            (Self::Open(a), Self::Open(b)) => a.total_cmp(b),
        }
    }
}

impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Rank {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Rank {}

/// The winning task of a selection round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Position of the task in registry order.
    pub index: usize,
    /// The task.
    pub task_id: TaskId,
    /// Its priority score.
    pub score: f64,
}

/// Pick the highest-ranked open task that `uav` can carry.
///
/// Tasks are visited in slice order and a later task only wins with a
/// strictly higher rank, so ties go to the earliest task. Returns `None`
/// when no open, carriable task exists.
///
/// # Errors
///
/// Propagates scoring and weight-check errors.
pub fn select_best(
    uav: &Uav,
    tasks: &[Task],
    time: f64,
    formula: PriorityFormula,
) -> Result<Option<Candidate>, FleetError> {
    let mut best: Option<(Rank, Candidate)> = None;

    for (index, task) in tasks.iter().enumerate() {
        let rank = Rank::of(uav, task, time, formula)?;
        let Some(score) = rank.score() else {
            continue;
        };
        if !uav.can_carry(task.weight())? {
            continue;
        }
        let better = best
            .as_ref()
            .is_none_or(|(best_rank, _)| rank.cmp(best_rank) == Ordering::Greater);
        if better {
            best = Some((
                rank,
                Candidate {
                    index,
                    task_id: task.id(),
                    score,
                },
            ));
        }
    }

    Ok(best.map(|(_, candidate)| candidate))
}
