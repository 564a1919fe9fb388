//! End-to-end session lifecycle tests through the SessionManager
//!
//! Paused-time tests: the runtime auto-advances the clock while every
//! task is idle, so countdowns run deterministically and instantly.

use std::sync::Arc;

use invigilator_core::{
    AssessmentDefinition, AssessmentId, AttemptStatus, EngineError, EventBus, MemoryEventBus,
    MockGateway, OptionLabel, Phase, Question, SessionEvent, SessionError, SessionGateway,
    SessionManager, SubmitTrigger, Verdict,
};
use tokio::time::{Duration, sleep};

fn definition(id: AssessmentId, question_count: u64, duration_minutes: u32) -> AssessmentDefinition {
    AssessmentDefinition {
        id,
        title: format!("Assessment {id}"),
        course_id: 10,
        course_title: "Distributed Systems".to_string(),
        questions: (0..question_count)
            .map(|i| Question {
                id: 100 + i,
                text: format!("Question {i}?"),
                option_a: "first".to_string(),
                option_b: "second".to_string(),
                option_c: "third".to_string(),
                option_d: "fourth".to_string(),
                correct_answer: Some(OptionLabel::A),
                marks: 5,
            })
            .collect(),
        duration_minutes,
        total_marks: question_count as u32 * 5,
    }
}

fn setup(def: AssessmentDefinition) -> (SessionManager, Arc<MockGateway>, Arc<MemoryEventBus>) {
    let gateway = Arc::new(MockGateway::with_definition(def));
    let bus = Arc::new(MemoryEventBus::new(1000));
    let manager = SessionManager::new(
        Arc::clone(&gateway) as Arc<dyn SessionGateway>,
        Arc::clone(&bus) as Arc<dyn EventBus>,
    );
    (manager, gateway, bus)
}

#[tokio::test(start_paused = true)]
async fn full_take_submit_review_retake_flow() {
    let (manager, gateway, bus) = setup(definition(1, 3, 30));
    gateway.queue_submit_result(MockGateway::graded(10, 15, AttemptStatus::Passed));

    let session_id = manager.start_session(1).await.unwrap();
    assert_eq!(manager.phase(&session_id).await.unwrap(), Phase::InProgress);
    assert_eq!(manager.remaining_seconds(&session_id).await.unwrap(), 1800);

    // Take some time, answer two of three
    sleep(Duration::from_secs(45)).await;
    manager.set_answer(&session_id, 100, OptionLabel::A).await.unwrap();
    manager.set_answer(&session_id, 101, OptionLabel::C).await.unwrap();

    // One unanswered: manual submit asks for confirmation first
    manager.submit(&session_id).await.unwrap();
    assert_eq!(
        manager.phase(&session_id).await.unwrap(),
        Phase::ConfirmingSubmit { unanswered: 1 }
    );

    manager.respond_confirmation(&session_id, true).await.unwrap();
    assert_eq!(manager.phase(&session_id).await.unwrap(), Phase::Reviewing);

    let view = manager.review(&session_id).await.unwrap();
    assert_eq!(view.score.marks_obtained, 10);
    assert_eq!(view.score.status, AttemptStatus::Passed);
    assert_eq!(view.questions.len(), 3);
    assert_eq!(view.questions[0].verdict, Verdict::Correct);
    assert_eq!(view.questions[1].verdict, Verdict::Incorrect);
    assert_eq!(view.questions[2].verdict, Verdict::Unanswered);

    // Retake: everything resets, clock restarts at full duration
    manager.retake(&session_id).await.unwrap();
    assert_eq!(manager.phase(&session_id).await.unwrap(), Phase::InProgress);
    assert_eq!(manager.remaining_seconds(&session_id).await.unwrap(), 1800);
    assert!(matches!(
        manager.review(&session_id).await,
        Err(EngineError::Session(SessionError::InvalidPhase { .. }))
    ));

    // The second attempt submits independently
    gateway.queue_submit_result(MockGateway::graded(15, 15, AttemptStatus::Passed));
    for q in [100, 101, 102] {
        manager.set_answer(&session_id, q, OptionLabel::A).await.unwrap();
    }
    manager.submit(&session_id).await.unwrap();

    assert_eq!(manager.phase(&session_id).await.unwrap(), Phase::Reviewing);
    assert_eq!(gateway.submit_call_count(), 2);

    let accepted: Vec<_> = bus
        .session_events(&session_id)
        .await
        .into_iter()
        .filter(|(_, e)| matches!(e, SessionEvent::SubmissionAccepted { .. }))
        .collect();
    assert_eq!(accepted.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn expiry_auto_submits_whatever_is_answered() {
    let (manager, gateway, bus) = setup(definition(1, 2, 1));
    gateway.queue_submit_result(MockGateway::graded(5, 10, AttemptStatus::Failed));

    let session_id = manager.start_session(1).await.unwrap();
    manager.set_answer(&session_id, 100, OptionLabel::A).await.unwrap();

    // Run the clock out; confirmation is never requested on timeout
    sleep(Duration::from_secs(61)).await;

    assert_eq!(manager.phase(&session_id).await.unwrap(), Phase::Reviewing);
    assert_eq!(manager.remaining_seconds(&session_id).await.unwrap(), 0);
    assert_eq!(gateway.submit_call_count(), 1);

    let payload = &gateway.submit_calls()[0].1;
    assert_eq!(payload.answers[0].selected_answer, Some(OptionLabel::A));
    assert_eq!(payload.answers[1].selected_answer, None);

    let events = bus.session_events(&session_id).await;
    assert!(!events
        .iter()
        .any(|(_, e)| matches!(e, SessionEvent::ConfirmationRequested { .. })));
    assert!(events.iter().any(|(_, e)| matches!(
        e,
        SessionEvent::SubmissionAccepted {
            trigger: SubmitTrigger::Timeout,
            ..
        }
    )));
}

#[tokio::test(start_paused = true)]
async fn zero_duration_assessment_submits_on_load() {
    let (manager, gateway, _bus) = setup(definition(1, 1, 0));
    gateway.queue_submit_result(MockGateway::graded(0, 5, AttemptStatus::Failed));

    let session_id = manager.start_session(1).await.unwrap();
    sleep(Duration::from_millis(10)).await;

    assert_eq!(manager.phase(&session_id).await.unwrap(), Phase::Reviewing);
    assert_eq!(gateway.submit_call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn ineligible_learner_cannot_take_the_assessment() {
    let (manager, gateway, _bus) = setup(definition(1, 2, 30));
    gateway.set_eligibility(10, false);

    let result = manager.start_session(1).await;

    assert!(matches!(
        result,
        Err(EngineError::Session(SessionError::Ineligible { course_id: 10 }))
    ));

    let session_id = manager.list_sessions().await.pop().unwrap();
    assert_eq!(manager.phase(&session_id).await.unwrap(), Phase::Ineligible);
    assert!(matches!(
        manager.set_answer(&session_id, 100, OptionLabel::A).await,
        Err(EngineError::Session(SessionError::InvalidPhase { .. }))
    ));
    assert!(matches!(
        manager.submit(&session_id).await,
        Err(EngineError::Session(SessionError::InvalidPhase { .. }))
    ));
    assert_eq!(gateway.submit_call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_submission_leaves_the_attempt_resumable() {
    let (manager, gateway, bus) = setup(definition(1, 1, 30));
    gateway.queue_submit_error(invigilator_core::GatewayError::Network(
        "gateway unreachable".to_string(),
    ));

    let session_id = manager.start_session(1).await.unwrap();
    manager.set_answer(&session_id, 100, OptionLabel::B).await.unwrap();
    sleep(Duration::from_secs(100)).await;
    // Let the pump deliver the tick that shares the sleep's deadline
    sleep(Duration::from_millis(10)).await;

    let result = manager.submit(&session_id).await;
    assert!(matches!(
        result,
        Err(EngineError::Session(SessionError::Submission(_)))
    ));

    // Back in progress with the elapsed time gone, answers intact
    assert_eq!(manager.phase(&session_id).await.unwrap(), Phase::InProgress);
    let remaining = manager.remaining_seconds(&session_id).await.unwrap();
    assert!(remaining <= 1800 - 100, "time was refunded: {remaining}");

    let events = bus.session_events(&session_id).await;
    assert!(events
        .iter()
        .any(|(_, e)| matches!(e, SessionEvent::SubmissionFailed { .. })));

    // Manual retry succeeds with the same answers
    gateway.queue_submit_result(MockGateway::graded(0, 5, AttemptStatus::Failed));
    manager.submit(&session_id).await.unwrap();

    assert_eq!(manager.phase(&session_id).await.unwrap(), Phase::Reviewing);
    assert_eq!(gateway.submit_call_count(), 2);
    let retry_payload = &gateway.submit_calls()[1].1;
    assert_eq!(retry_payload.answers[0].selected_answer, Some(OptionLabel::B));
}

#[tokio::test(start_paused = true)]
async fn declined_confirmation_resumes_the_attempt() {
    let (manager, gateway, _bus) = setup(definition(1, 2, 30));

    let session_id = manager.start_session(1).await.unwrap();
    manager.submit(&session_id).await.unwrap();
    assert_eq!(
        manager.phase(&session_id).await.unwrap(),
        Phase::ConfirmingSubmit { unanswered: 2 }
    );

    manager.respond_confirmation(&session_id, false).await.unwrap();

    assert_eq!(manager.phase(&session_id).await.unwrap(), Phase::InProgress);
    assert_eq!(gateway.submit_call_count(), 0);

    // The clock kept running during the confirmation
    sleep(Duration::from_secs(10)).await;
    let remaining = manager.remaining_seconds(&session_id).await.unwrap();
    assert!(remaining < 1800);
}

#[tokio::test(start_paused = true)]
async fn retake_uses_a_freshly_loaded_definition() {
    let (manager, gateway, _bus) = setup(definition(1, 1, 30));
    gateway.queue_submit_result(MockGateway::graded(5, 5, AttemptStatus::Passed));

    let session_id = manager.start_session(1).await.unwrap();
    manager.set_answer(&session_id, 100, OptionLabel::A).await.unwrap();
    manager.submit(&session_id).await.unwrap();
    assert_eq!(manager.phase(&session_id).await.unwrap(), Phase::Reviewing);

    // The instructor shortens the assessment between attempts
    gateway.insert_definition(definition(1, 1, 10));
    manager.retake(&session_id).await.unwrap();

    assert_eq!(manager.remaining_seconds(&session_id).await.unwrap(), 600);
}
