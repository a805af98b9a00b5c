// tests/dispatcher.rs

use std::sync::Arc;

use zpsexec::engine::ContinuationQueue;
use zpsexec::exec::ReactionDispatcher;
use zpsexec::reaction::Reaction;
use zpsexec::task::Task;
use zpsexec_test_utils::builders::{ScriptBuilder, error_reaction};
use zpsexec_test_utils::init_tracing;
use zpsexec_test_utils::recording_handler::{FailingHandler, PanickingHandler, RecordingHandler};

fn task() -> Task {
    Task::new("/jobs/script.json", "/jobs/work").with_id("dispatch")
}

#[test]
fn next_process_reactions_are_queued_not_forwarded() {
    init_tracing();
    let recorder = RecordingHandler::new();
    let mut dispatcher = ReactionDispatcher::new();
    dispatcher.register(Arc::new(recorder.clone()));
    let mut queue = ContinuationQueue::new();

    let first = ScriptBuilder::new().execute("python").build();
    let second = ScriptBuilder::new().execute("java").build();
    dispatcher.dispatch(&task(), Reaction::NextProcess(first.clone()), &mut queue);
    dispatcher.dispatch(&task(), Reaction::NextProcess(second.clone()), &mut queue);

    assert!(recorder.seen().is_empty());
    assert_eq!(queue.len(), 2);
    assert_eq!(queue.pop(), Some(first));
    assert_eq!(queue.pop(), Some(second));
    assert!(queue.is_empty());
}

#[test]
fn error_reactions_reach_every_handler() {
    let a = RecordingHandler::new();
    let b = RecordingHandler::new();
    let mut dispatcher = ReactionDispatcher::new();
    dispatcher.register(Arc::new(a.clone()));
    dispatcher.register(Arc::new(b.clone()));
    let mut queue = ContinuationQueue::new();

    let reaction = error_reaction("ValueError", "bad input");
    dispatcher.dispatch(&task(), reaction.clone(), &mut queue);

    assert_eq!(a.seen(), vec![reaction.clone()]);
    assert_eq!(b.seen(), vec![reaction]);
    assert!(queue.is_empty());
}

#[test]
fn failing_or_panicking_handler_does_not_stop_the_others() {
    init_tracing();
    let after = RecordingHandler::new();
    let mut dispatcher = ReactionDispatcher::new();
    dispatcher.register(Arc::new(FailingHandler));
    dispatcher.register(Arc::new(PanickingHandler));
    dispatcher.register(Arc::new(after.clone()));
    assert_eq!(dispatcher.handler_count(), 3);

    let mut queue = ContinuationQueue::new();
    dispatcher.dispatch(&task(), error_reaction("E", "one"), &mut queue);
    dispatcher.dispatch(&task(), error_reaction("E", "two"), &mut queue);

    let messages: Vec<String> = after
        .seen()
        .iter()
        .map(|r| r.as_error().unwrap().message.clone())
        .collect();
    assert_eq!(messages, vec!["one", "two"]);
}
