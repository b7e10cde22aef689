use crate::error::QueueError;
use crate::record::Status;

/// Validates a status transition.
///
/// Unset records can be approved or held; approved and held records can be
/// re-disposed either way (the later action wins). Nothing returns to Unset.
pub fn validate_transition(from: Status, to: Status) -> Result<(), QueueError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(QueueError::IllegalTransition { from, to })
    }
}

pub fn allowed_transitions(from: Status) -> Vec<Status> {
    use Status::*;
    match from {
        Unset => vec![Approved, Held],
        Approved => vec![Approved, Held],
        Held => vec![Approved, Held],
    }
}

fn allowed(from: Status, to: Status) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}
