//! Review workflow driven through session commands

use pretty_assertions::assert_eq;
use quire_queue::Status;
use quire_session::{NoticeLevel, ReviewCommand, ReviewConfig, ReviewSession};
use quire_table::{Cell, JsonTableCodec, Table, TableLoader, TableWriter};
use quire_test_utils::{question_table, question_table_with_status};

fn session_with(table: &Table, page_size: usize) -> ReviewSession {
    let mut session = ReviewSession::new(ReviewConfig::new().with_page_size(page_size));
    let notice = session.upload_table(table);
    assert_eq!(notice.level, NoticeLevel::Success, "{notice}");
    session
}

#[test]
fn commands_before_upload_warn() {
    let mut session = ReviewSession::default();
    let notice = session.handle(ReviewCommand::Next);
    assert_eq!(notice.level, NoticeLevel::Warning);
    assert!(session.view().is_none());
    assert!(session.list().is_none());
    assert!(session.export(&JsonTableCodec::new(), None).is_err());
}

#[test]
fn cursor_starts_on_first_unreviewed() {
    let session = session_with(&question_table_with_status(&["approved", "보류", "", ""]), 10);
    let view = session.view().unwrap();
    assert_eq!(view.position, 3);
    assert_eq!(view.total, 4);
    assert_eq!(view.status, Status::Unset);
    assert_eq!(view.field("q_idx"), Some(&Cell::Int(1003)));
}

#[test]
fn marking_advances_to_next_unreviewed() {
    let mut session = session_with(&question_table_with_status(&["", "approved", "", ""]), 10);
    assert_eq!(session.view().unwrap().position, 1);

    session.handle(ReviewCommand::Approve);
    assert_eq!(session.view().unwrap().position, 3);

    session.handle(ReviewCommand::Hold);
    assert_eq!(session.view().unwrap().position, 4);

    // nothing unreviewed after the last record: stay on it
    session.handle(ReviewCommand::Approve);
    let view = session.view().unwrap();
    assert_eq!(view.position, 4);
    assert_eq!(view.status, Status::Approved);

    let counts = session.counts().unwrap();
    assert_eq!((counts.unset, counts.approved, counts.held), (0, 3, 1));
}

#[test]
fn bad_navigation_input_changes_nothing() {
    let mut session = session_with(&question_table(5), 10);
    session.handle(ReviewCommand::Goto("3".to_string()));
    assert_eq!(session.view().unwrap().position, 3);

    for input in ["abc", "0", "6", "-1", ""] {
        let notice = session.handle(ReviewCommand::Goto(input.to_string()));
        assert_eq!(notice.level, NoticeLevel::Warning, "{input:?}");
        assert_eq!(session.view().unwrap().position, 3);
    }
}

#[test]
fn paging_is_clamped() {
    let mut session = session_with(&question_table(2), 10);
    session.handle(ReviewCommand::Previous);
    assert_eq!(session.view().unwrap().position, 1);
    session.handle(ReviewCommand::Next);
    session.handle(ReviewCommand::Next);
    assert_eq!(session.view().unwrap().position, 2);
}

#[test]
fn list_pages_and_jumps() {
    let mut session = session_with(&question_table(23), 10);
    let list = session.list().unwrap();
    assert_eq!((list.number, list.total_pages), (1, 3));
    assert_eq!(list.entries.len(), 10);
    assert_eq!(list.entries[0].label, "1 / Q_IDX: 1001 [unreviewed]");
    assert!(list.entries[0].current);

    session.handle(ReviewCommand::PreviousPage);
    assert_eq!(session.list().unwrap().number, 1);

    session.handle(ReviewCommand::NextPage);
    session.handle(ReviewCommand::NextPage);
    session.handle(ReviewCommand::NextPage);
    let list = session.list().unwrap();
    assert_eq!(list.number, 3);
    assert_eq!(list.entries.len(), 3);
    assert_eq!(list.entries[0].position, 21);

    let target = list.entries[1].id;
    session.handle(ReviewCommand::Open(target));
    let view = session.view().unwrap();
    assert_eq!(view.position, 22);
    assert_eq!(view.id, target);
}

#[test]
fn removal_keeps_identities() {
    let mut session = session_with(&question_table(4), 10);
    session.handle(ReviewCommand::Goto("2".to_string()));
    let survivors: Vec<_> = session.list().unwrap().entries.iter().map(|e| e.id).collect();

    session.handle(ReviewCommand::Remove);
    let view = session.view().unwrap();
    assert_eq!(view.total, 3);
    assert_eq!(view.position, 2);
    assert_eq!(view.id, survivors[2]);

    // the removed record can no longer be opened
    let notice = session.handle(ReviewCommand::Open(survivors[1]));
    assert_eq!(notice.level, NoticeLevel::Warning);
    assert!(notice.message.contains("no longer in the queue"), "{notice}");
    assert_eq!(session.view().unwrap().position, 2);

    session.handle(ReviewCommand::Open(survivors[3]));
    assert_eq!(session.view().unwrap().position, 3);
}

#[test]
fn removing_everything_leaves_an_empty_queue() {
    let mut session = session_with(&question_table(1), 10);
    session.handle(ReviewCommand::Remove);
    assert!(session.view().is_none());
    let notice = session.handle(ReviewCommand::Approve);
    assert_eq!(notice.level, NoticeLevel::Error);
    let list = session.list().unwrap();
    assert_eq!((list.number, list.total_pages), (1, 1));
    assert!(list.entries.is_empty());
}

#[test]
fn rejected_upload_keeps_previous_queue() {
    let mut session = session_with(&question_table(3), 10);
    let broken = Table::from_rows(["subject", "question"], vec![]).unwrap();
    let notice = session.upload_table(&broken);
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.contains("missing required columns"));
    assert_eq!(session.view().unwrap().total, 3);

    let notice = session.upload(&JsonTableCodec::new(), b"not json");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(session.view().unwrap().total, 3);
}

#[test]
fn exports_round_trip_through_the_writer() {
    let codec = JsonTableCodec::new();
    let mut session = session_with(&question_table(3), 10);
    session.handle(ReviewCommand::Approve);
    session.handle(ReviewCommand::Hold);

    let all = session.export(&codec, None).unwrap();
    assert_eq!(all.file_name, "output_check.json");
    assert_eq!(JsonTableCodec::sheet_name(&all.bytes).unwrap().as_deref(), Some("전체문제"));
    let table = codec.parse(&all.bytes).unwrap();
    assert_eq!(table.columns().last().map(String::as_str), Some("status"));
    assert_eq!(
        table.column("status").unwrap(),
        vec![Cell::text("approved"), Cell::text("held"), Cell::text("")]
    );

    let held = session.export(&codec, Some(Status::Held)).unwrap();
    assert_eq!(held.file_name, "output_check_held.json");
    let table = codec.parse(&held.bytes).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.cell(0, "q_idx"), Some(&Cell::Int(1002)));

    // an exported sheet loads back with its dispositions
    let mut reloaded = ReviewSession::default();
    reloaded.upload(&codec, &codec.serialize(&codec.parse(&all.bytes).unwrap(), "s").unwrap());
    assert_eq!(reloaded.view().unwrap().position, 3);
}

#[test]
fn reset_forgets_the_queue() {
    let mut session = session_with(&question_table(3), 10);
    session.reset();
    assert!(session.queue().is_none());
    assert_eq!(session.handle(ReviewCommand::Next).level, NoticeLevel::Warning);
}
