use pretty_assertions::assert_eq;
use proptest::prelude::*;
use quire_queue::{Direction, Disposition, QueueError, ReviewQueue, Status};
use quire_table::{Cell, JsonTableCodec, TableLoader, TableWriter};
use quire_test_utils::{question_table, question_table_with_status};

fn question_text(queue: &ReviewQueue, position: usize) -> String {
    let record = queue.get(position).unwrap();
    queue.value(record, "question").unwrap().as_text()
}

#[test]
fn test_three_record_review_pass() {
    let mut queue = ReviewQueue::load(&question_table(3)).unwrap();
    assert_eq!(queue.current_position().unwrap(), 1);

    assert_eq!(queue.mark(1, Disposition::Approved).unwrap(), 2);
    assert_eq!(queue.mark(2, Disposition::Held).unwrap(), 3);
    assert_eq!(queue.mark(3, Disposition::Approved).unwrap(), 3);

    let approved: Vec<_> = queue
        .filter(Status::Approved)
        .into_iter()
        .map(|r| queue.value(r, "question").unwrap().as_text())
        .collect();
    assert_eq!(approved, vec!["Question 1", "Question 3"]);
    assert_eq!(queue.filter(Status::Held).len(), 1);
    assert!(queue.filter(Status::Unset).is_empty());
}

#[test]
fn test_goto_bounds() {
    let mut queue = ReviewQueue::load(&question_table(5)).unwrap();
    assert!(matches!(
        queue.goto_position(0),
        Err(QueueError::OutOfRange { position: 0, len: 5 })
    ));
    assert!(matches!(
        queue.goto_position(6),
        Err(QueueError::OutOfRange { position: 6, len: 5 })
    ));
    assert!(matches!(queue.goto("three"), Err(QueueError::InvalidInput { .. })));
    assert_eq!(queue.current_position().unwrap(), 1);
}

#[test]
fn test_resume_partially_reviewed_upload() {
    let table = question_table_with_status(&["검수 완료", "보류", "", "approved"]);
    let queue = ReviewQueue::load(&table).unwrap();

    assert_eq!(queue.current_position().unwrap(), 3);
    assert_eq!(queue.get(1).unwrap().status(), Status::Approved);
    assert_eq!(queue.get(2).unwrap().status(), Status::Held);
}

#[test]
fn test_export_then_load_through_codec() {
    let mut queue = ReviewQueue::load(&question_table(4)).unwrap();
    queue.mark(2, Disposition::Held).unwrap();
    queue.mark(4, Disposition::Approved).unwrap();

    let codec = JsonTableCodec::new();
    let bytes = codec.serialize(&queue.export(None).unwrap(), "output").unwrap();
    let reloaded = ReviewQueue::load(&codec.parse(&bytes).unwrap()).unwrap();

    let statuses: Vec<Status> = reloaded.records().iter().map(|r| r.status()).collect();
    assert_eq!(
        statuses,
        vec![Status::Unset, Status::Held, Status::Unset, Status::Approved]
    );
    assert_eq!(reloaded.columns(), queue.columns());
}

#[test]
fn test_remove_keeps_identity_of_survivors() {
    let mut queue = ReviewQueue::load(&question_table(4)).unwrap();
    let third = queue.get(3).unwrap().id();
    queue.mark(3, Disposition::Held).unwrap();

    let removed = queue.remove(1).unwrap();
    assert_eq!(removed.values()[3], Cell::text("Question 1"));
    assert_eq!(queue.position_of(third), Some(2));
    assert_eq!(queue.get(2).unwrap().status(), Status::Held);
    assert_eq!(question_text(&queue, 1), "Question 2");
}

#[test]
fn test_pagination_labels() {
    let queue = ReviewQueue::load(&question_table(12)).unwrap();
    let page = queue.paginate(2, 10).unwrap();
    assert_eq!(page.total_pages, 2);
    assert!(page.has_previous());
    assert!(!page.has_next());

    let labels: Vec<String> = page.entries.iter().map(|e| queue.entry_label(e)).collect();
    assert_eq!(
        labels,
        vec![
            "11 / Q_IDX: 1011 [unreviewed]".to_string(),
            "12 / Q_IDX: 1012 [unreviewed]".to_string(),
        ]
    );
}

fn disposition() -> impl Strategy<Value = Disposition> {
    prop_oneof![Just(Disposition::Approved), Just(Disposition::Held)]
}

fn raw_status() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just(""), Just("approved"), Just("held")]
}

proptest! {
    #[test]
    fn prop_load_cursor_is_first_unset(statuses in prop::collection::vec(raw_status(), 1..20)) {
        let queue = ReviewQueue::load(&question_table_with_status(&statuses)).unwrap();
        let expected = statuses.iter().position(|s| s.is_empty()).unwrap_or(0) + 1;
        prop_assert_eq!(queue.current_position().unwrap(), expected);
    }

    #[test]
    fn prop_goto_is_stable_under_marks(
        len in 1usize..15,
        marks in prop::collection::vec((0usize..15, disposition()), 0..20),
        target in 0usize..15,
    ) {
        let mut queue = ReviewQueue::load(&question_table(len)).unwrap();
        let target = target % len + 1;
        let expected = question_text(&queue, target);
        let id = queue.get(target).unwrap().id();

        for (p, d) in marks {
            queue.mark(p % len + 1, d).unwrap();
        }
        queue.goto_position(i64::try_from(target).unwrap()).unwrap();
        let current = queue.current().unwrap();
        prop_assert_eq!(current.id(), id);
        prop_assert_eq!(queue.value(current, "question").unwrap().as_text(), expected);
    }

    #[test]
    fn prop_mark_removes_from_pending(
        len in 1usize..15,
        p in 0usize..15,
        d in disposition(),
    ) {
        let mut queue = ReviewQueue::load(&question_table(len)).unwrap();
        let p = p % len + 1;
        let id = queue.get(p).unwrap().id();

        let next = queue.mark(p, d).unwrap();
        prop_assert!(queue.filter(Status::Unset).iter().all(|r| r.id() != id));
        prop_assert!((1..=len).contains(&next));
        prop_assert_eq!(queue.current_position().unwrap(), next);
    }

    #[test]
    fn prop_mark_twice_counts_once(len in 1usize..10, p in 0usize..10) {
        let mut queue = ReviewQueue::load(&question_table(len)).unwrap();
        let p = p % len + 1;
        queue.mark(p, Disposition::Approved).unwrap();
        queue.mark(p, Disposition::Approved).unwrap();
        prop_assert_eq!(queue.filter(Status::Approved).len(), 1);
        prop_assert_eq!(queue.get(p).unwrap().status(), Status::Approved);
    }

    #[test]
    fn prop_advance_next_clamps_at_end(len in 1usize..10, steps in 0usize..20) {
        let mut queue = ReviewQueue::load(&question_table(len)).unwrap();
        for _ in 0..steps {
            queue.advance(Direction::Next).unwrap();
        }
        queue.goto_position(i64::try_from(len).unwrap()).unwrap();
        prop_assert_eq!(queue.advance(Direction::Next).unwrap(), len);
        prop_assert_eq!(queue.current_position().unwrap(), len);
    }

    #[test]
    fn prop_goto_outside_range_rejected(len in 1usize..10) {
        let mut queue = ReviewQueue::load(&question_table(len)).unwrap();
        let over = i64::try_from(len).unwrap() + 1;
        let is_out_of_range = |r: Result<(), QueueError>| matches!(r, Err(QueueError::OutOfRange { .. }));
        prop_assert!(is_out_of_range(queue.goto_position(0)));
        prop_assert!(is_out_of_range(queue.goto_position(over)));
    }

    #[test]
    fn prop_export_round_trips_statuses(
        len in 1usize..12,
        marks in prop::collection::vec((0usize..12, disposition()), 0..12),
    ) {
        let mut queue = ReviewQueue::load(&question_table(len)).unwrap();
        for (p, d) in marks {
            queue.mark(p % len + 1, d).unwrap();
        }
        let reloaded = ReviewQueue::load(&queue.export(None).unwrap()).unwrap();
        let before: Vec<Status> = queue.records().iter().map(|r| r.status()).collect();
        let after: Vec<Status> = reloaded.records().iter().map(|r| r.status()).collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn prop_cursor_valid_after_removals(len in 1usize..10, removals in prop::collection::vec(0usize..10, 0..10)) {
        let mut queue = ReviewQueue::load(&question_table(len)).unwrap();
        for r in removals {
            if queue.is_empty() {
                break;
            }
            let p = r % queue.len() + 1;
            queue.remove(p).unwrap();
            if !queue.is_empty() {
                let pos = queue.current_position().unwrap();
                prop_assert!((1..=queue.len()).contains(&pos));
            }
        }
    }
}
