use quire_queue::state_machine::{allowed_transitions, validate_transition};
use quire_queue::{QueueError, Status};
use proptest::prelude::*;

#[test]
fn test_unset_transitions() {
    assert!(validate_transition(Status::Unset, Status::Approved).is_ok());
    assert!(validate_transition(Status::Unset, Status::Held).is_ok());

    assert!(validate_transition(Status::Unset, Status::Unset).is_err());
}

#[test]
fn test_redisposition_allowed() {
    assert!(validate_transition(Status::Approved, Status::Held).is_ok());
    assert!(validate_transition(Status::Held, Status::Approved).is_ok());
    assert!(validate_transition(Status::Approved, Status::Approved).is_ok());
}

#[test]
fn test_no_return_to_unset() {
    assert_eq!(
        validate_transition(Status::Held, Status::Unset),
        Err(QueueError::IllegalTransition {
            from: Status::Held,
            to: Status::Unset
        })
    );
    assert!(validate_transition(Status::Approved, Status::Unset).is_err());
}

fn any_status() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Unset),
        Just(Status::Approved),
        Just(Status::Held),
    ]
}

proptest! {
    #[test]
    fn prop_all_transitions_are_subset_of_allowed(from in any_status(), to in any_status()) {
        let res = validate_transition(from, to);
        let allowed = allowed_transitions(from);

        if res.is_ok() {
            assert!(allowed.contains(&to));
        } else {
            assert!(!allowed.contains(&to));
        }
    }
}
