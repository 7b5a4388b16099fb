//! Validated distance computation.

use skyfleet_types::Position;

use crate::error::FleetError;

/// Euclidean distance between `from` and `to`, rejecting non-finite input.
///
/// `context` names the leg being measured and ends up in the error.
pub fn checked_distance(from: &Position, to: &Position, context: &str) -> Result<f64, FleetError> {
    if !from.is_finite() || !to.is_finite() {
        return Err(FleetError::NonFinitePosition {
            context: context.to_owned(),
        });
    }
    let distance = from.distance_to(to);
    if distance.is_finite() {
        Ok(distance)
    } else {
        Err(FleetError::NonFinitePosition {
            context: format!("{context} (distance overflow)"),
        })
    }
}

/// Finite and strictly positive.
pub(crate) const fn is_positive_finite(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Finite and zero or greater.
pub(crate) const fn is_non_negative_finite(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}
