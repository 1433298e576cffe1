//! State machine integration tests.
//!
//! Drives several quests through visit events the way the agent does.

use quest_packet_core::{ContentItem, Error, TaskDefinition, TaskKey, TaskStatus, VisitTrigger};
use quest_packet_quest::{QuestEvent, TaskStateMachine};

// =============================================================================
// Helpers
// =============================================================================

fn tasks() -> Vec<TaskDefinition> {
    vec![
        TaskDefinition::new(
            "quest-1",
            "task-1",
            "Visit https://google.com",
            VisitTrigger::contains("google.com"),
        ),
        TaskDefinition::new(
            "quest-1",
            "task-2",
            "Open the docs",
            VisitTrigger::domain("docs.rs"),
        ),
        TaskDefinition::new(
            "quest-2",
            "task-1",
            "Read the book",
            VisitTrigger::exact("https://doc.rust-lang.org/book/"),
        )
        .with_completion_message("Book opened!"),
    ]
}

fn machine() -> TaskStateMachine {
    let mut machine = TaskStateMachine::new();
    machine
        .initialize(
            tasks(),
            vec![ContentItem::webpage("google-item", "https://google.com", "Visit Google")],
        )
        .unwrap();
    machine
}

// =============================================================================
// 1. Transitions
// =============================================================================

#[test]
fn test_each_trigger_kind_fires_independently() {
    let mut machine = machine();

    let fired = machine.on_event(&QuestEvent::visit("https://docs.rs/serde"));
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].key, TaskKey::new("quest-1", "task-2"));
    assert_eq!(fired[0].notification, "Task Complete: quest-1/task-2");

    let fired = machine.on_event(&QuestEvent::visit("https://doc.rust-lang.org/book/"));
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].notification, "Book opened!");

    let statuses: Vec<TaskStatus> = machine.snapshot().iter().map(|t| t.status).collect();
    assert_eq!(
        statuses,
        vec![TaskStatus::Pending, TaskStatus::Completed, TaskStatus::Completed]
    );
}

#[test]
fn test_one_visit_can_complete_several_tasks() {
    let mut machine = TaskStateMachine::new();
    machine
        .initialize(
            vec![
                TaskDefinition::new("a", "1", "first", VisitTrigger::contains("example")),
                TaskDefinition::new("b", "1", "second", VisitTrigger::domain("example.com")),
            ],
            vec![],
        )
        .unwrap();
    let fired = machine.on_event(&QuestEvent::visit("https://www.example.com"));
    let keys: Vec<String> = fired.iter().map(|t| t.key.to_string()).collect();
    assert_eq!(keys, vec!["a/1", "b/1"]);
}

#[test]
fn test_redelivery_is_idempotent() {
    let mut machine = machine();
    let event = QuestEvent::visit("https://google.com");
    assert_eq!(machine.on_event(&event).len(), 1);
    for _ in 0..3 {
        assert!(machine.on_event(&event).is_empty());
    }
}

#[test]
fn test_unmatched_visit_changes_nothing() {
    let mut machine = machine();
    let before = machine.snapshot();
    assert!(machine.on_event(&QuestEvent::visit("https://bing.com")).is_empty());
    assert_eq!(machine.snapshot(), before);
}

// =============================================================================
// 2. Definitions
// =============================================================================

#[test]
fn test_same_task_id_in_different_quests_is_allowed() {
    let machine = machine();
    assert!(machine.status(&TaskKey::new("quest-2", "task-1")).is_some());
    assert_eq!(machine.definitions().count(), 3);
}

#[test]
fn test_invalid_definitions_are_rejected() {
    let mut machine = TaskStateMachine::new();
    let empty_id = TaskDefinition::new("quest-1", "", "blank", VisitTrigger::contains("x"));
    assert!(matches!(
        machine.initialize(vec![empty_id], vec![]),
        Err(Error::InvalidTask(_))
    ));

    let item = ContentItem::webpage("dup", "https://a.example", "A");
    assert!(matches!(
        machine.initialize(vec![], vec![item.clone(), item]),
        Err(Error::DuplicateItem(_))
    ));
    assert!(machine.is_empty());
}

#[test]
fn test_events_and_transitions_serialize() {
    let event: QuestEvent =
        serde_json::from_str(r#"{"type":"visit","locator":"https://google.com"}"#).unwrap();
    assert_eq!(event, QuestEvent::visit("https://google.com"));

    let mut machine = machine();
    let fired = machine.on_event(&event);
    let json = serde_json::to_value(&fired[0]).unwrap();
    assert_eq!(json["key"]["quest_id"], "quest-1");
    assert_eq!(json["from"], "PENDING");
    assert_eq!(json["to"], "COMPLETED");
}
