//! Scheduler and worker behaviour against an in-memory store and a scripted classifier.

mod support;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use pretty_assertions::assert_eq;
use rstest::rstest;
use stash_core::classification::ProjectMatch;
use stash_core::entities::CaptureState;
use stash_core::enums::{ActivityType, CaptureStatus, GtdList};
use stash_db::repos::activity::ActivityFilter;
use stash_db::repos::task::TaskFilter;
use stash_db::updates::capture::CaptureDraft;
use stash_pipeline::{Scheduler, Tick, Worker};
use support::{FakeClassifier, Reply, classification, existing_project, new_project, setup};

#[tokio::test]
async fn tick_is_idle_without_pending_captures() {
    let (_store, classifier, scheduler) =
        setup(FakeClassifier::always(Reply::Fail("unused"))).await;

    assert_eq!(scheduler.tick().await.unwrap(), Tick::Idle);
    assert_eq!(classifier.calls(), 0);
}

#[tokio::test]
async fn confident_new_project_is_filed_automatically() {
    let (store, _classifier, scheduler) = setup(FakeClassifier::always(Reply::Result(
        classification("Buy milk", new_project("Groceries", 95)),
    )))
    .await;
    let capture = store.create_capture("  need milk!! ").await.unwrap();

    let Tick::Processed(done) = scheduler.tick().await.unwrap() else {
        panic!("expected the capture to be processed");
    };
    assert_eq!(done.capture_id, capture.id);
    assert_eq!(done.status, CaptureStatus::Success);

    let projects = store.list_projects(None, 10).await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].name, "Groceries");
    assert_eq!(projects[0].outcome, "Groceries handled");

    let tasks = store.list_tasks(&TaskFilter::default()).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Buy milk");
    assert_eq!(tasks[0].project_id.as_deref(), Some(projects[0].id.as_str()));
    assert_eq!(tasks[0].original_thought.as_deref(), Some("  need milk!! "));

    let filed = store.get_capture(&capture.id).await.unwrap();
    assert_eq!(
        filed.state,
        CaptureState::Success(ProjectMatch {
            id: Some(projects[0].id.clone()),
            name: "Groceries".into(),
            is_new: true,
            outcome: Some("Groceries handled".into()),
            confidence: 100,
        })
    );
    assert_eq!(filed.progress, None);
    assert_eq!(filed.original_text, "  need milk!! ");

    let activities = store
        .list_activities(&ActivityFilter {
            activity_type: Some(ActivityType::AiProcessed),
            limit: None,
        })
        .await
        .unwrap();
    assert_eq!(activities.len(), 1);
    assert_eq!(
        activities[0].detail.as_deref(),
        Some("Created new project automatically")
    );
    assert_eq!(activities[0].metadata.capture_id.as_deref(), Some(capture.id.as_str()));
    assert_eq!(activities[0].metadata.task_id.as_deref(), Some(tasks[0].id.as_str()));
}

#[tokio::test]
async fn confident_existing_project_reuses_it() {
    let store = Arc::new(stash_db::test_support::memory_service().await.unwrap());
    let errands = store.create_project("Errands", "Errands run").await.unwrap();
    let classifier = Arc::new(FakeClassifier::always(Reply::Result(classification(
        "Pick up dry cleaning",
        existing_project(&errands.id, "Errands", 97),
    ))));
    let scheduler = Scheduler::new(Arc::clone(&store), classifier.clone());

    store.create_capture("dry cleaning").await.unwrap();
    let report = scheduler.drain().await.unwrap();
    assert_eq!(report.processed.len(), 1);
    assert_eq!(report.remaining_pending, 0);
    assert_eq!(report.error, None);

    let known = classifier.last_known.lock().unwrap().clone();
    assert_eq!(known.len(), 1);
    assert_eq!(known[0].id, errands.id);

    assert_eq!(store.list_projects(None, 10).await.unwrap().len(), 1);
    let tasks = store.list_tasks(&TaskFilter::default()).await.unwrap();
    assert_eq!(tasks[0].project_id.as_deref(), Some(errands.id.as_str()));

    let activities = store.list_activities(&ActivityFilter::default()).await.unwrap();
    let filed = activities
        .iter()
        .find(|entry| entry.activity_type == ActivityType::AiProcessed)
        .unwrap();
    assert_eq!(filed.detail, None);
}

#[rstest]
#[case::just_below(89, CaptureStatus::NeedsReview)]
#[case::at_threshold(90, CaptureStatus::Success)]
#[case::certain(100, CaptureStatus::Success)]
#[case::no_idea(0, CaptureStatus::NeedsReview)]
#[tokio::test]
async fn confidence_threshold_routes(#[case] confidence: u8, #[case] expected: CaptureStatus) {
    let (store, _classifier, scheduler) = setup(FakeClassifier::always(Reply::Result(
        classification("Book dentist", new_project("Health", confidence)),
    )))
    .await;
    let capture = store.create_capture("dentist").await.unwrap();

    scheduler.tick().await.unwrap();

    let capture = store.get_capture(&capture.id).await.unwrap();
    assert_eq!(capture.status(), expected);
    let created = usize::from(expected == CaptureStatus::Success);
    assert_eq!(store.list_projects(None, 10).await.unwrap().len(), created);
    assert_eq!(store.list_tasks(&TaskFilter::default()).await.unwrap().len(), created);
}

#[tokio::test]
async fn review_route_keeps_the_draft_and_creates_nothing() {
    let (store, _classifier, scheduler) = setup(FakeClassifier::always(Reply::Result(
        classification("Plan trip", new_project("Travel", 60)),
    )))
    .await;
    let capture = store.create_capture("trip??").await.unwrap();

    scheduler.tick().await.unwrap();

    let parked = store.get_capture(&capture.id).await.unwrap();
    assert_eq!(parked.state, CaptureState::NeedsReview(new_project("Travel", 60)));
    assert_eq!(parked.rewritten_text, "Plan trip");
    assert_eq!(parked.progress, None);
    assert_eq!(parked.last_error, None);
    assert!(store.list_activities(&ActivityFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn classifier_failure_parks_capture_with_error_match() {
    let (store, _classifier, scheduler) =
        setup(FakeClassifier::always(Reply::Fail("upstream exploded"))).await;
    let capture = store.create_capture("call mom").await.unwrap();

    let report = scheduler.drain().await.unwrap();
    assert_eq!(report.error, None);
    assert_eq!(report.processed[0].status, CaptureStatus::NeedsReview);

    let parked = store.get_capture(&capture.id).await.unwrap();
    assert_eq!(
        parked.state,
        CaptureState::NeedsReview(ProjectMatch::classification_error())
    );
    assert_eq!(parked.rewritten_text, "");
    assert!(parked.last_error.as_ref().unwrap().contains("upstream exploded"));
    assert_eq!(parked.filing_title(), "call mom");
}

#[rstest]
#[case::fractional_confidence(
    r#"{"rewrittenTitle":"Book dentist","list":"next","projectMatch":{"name":"Health","isNew":true,"confidence":89.6}}"#,
    "whole number"
)]
#[case::confidence_above_range(
    r#"{"rewrittenTitle":"Book dentist","list":"next","projectMatch":{"name":"Health","isNew":true,"confidence":101}}"#,
    "outside 0..=100"
)]
#[case::inbox_list(
    r#"{"rewrittenTitle":"Book dentist","list":"inbox","projectMatch":{"name":"Health","isNew":true,"confidence":95}}"#,
    "inbox"
)]
#[case::blank_title(
    r#"{"rewrittenTitle":"  ","list":"next","projectMatch":{"name":"Health","isNew":true,"confidence":95}}"#,
    "rewrittenTitle"
)]
#[tokio::test]
async fn contract_breaking_answer_goes_to_review(#[case] body: &'static str, #[case] reason: &str) {
    let (store, _classifier, scheduler) = setup(FakeClassifier::always(Reply::Raw(body))).await;
    let capture = store.create_capture("dentist").await.unwrap();

    let report = scheduler.drain().await.unwrap();
    assert_eq!(report.error, None);

    let parked = store.get_capture(&capture.id).await.unwrap();
    assert_eq!(
        parked.state,
        CaptureState::NeedsReview(ProjectMatch::classification_error())
    );
    let last_error = parked.last_error.expect("last_error should be set");
    assert!(last_error.contains(reason), "{last_error}");
    assert!(store.list_projects(None, 10).await.unwrap().is_empty());
    assert!(store.list_tasks(&TaskFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn inbox_list_is_rejected_whatever_the_backend() {
    let mut result = classification("Book dentist", new_project("Health", 95));
    result.list = Some(GtdList::Inbox);
    let (store, _classifier, scheduler) = setup(FakeClassifier::always(Reply::Result(result))).await;
    let capture = store.create_capture("dentist").await.unwrap();

    scheduler.tick().await.unwrap();

    let parked = store.get_capture(&capture.id).await.unwrap();
    assert_eq!(parked.status(), CaptureStatus::NeedsReview);
    assert!(parked.last_error.unwrap().contains("inbox"));
    assert!(store.list_tasks(&TaskFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn slow_classifier_times_out_into_review() {
    let classifier = FakeClassifier::always(Reply::Hang);
    let store = Arc::new(stash_db::test_support::memory_service().await.unwrap());
    let scheduler = Scheduler::new(Arc::clone(&store), Arc::new(classifier))
        .with_classify_timeout(Duration::from_millis(50));
    let capture = store.create_capture("renew passport").await.unwrap();

    scheduler.tick().await.unwrap();

    let parked = store.get_capture(&capture.id).await.unwrap();
    assert_eq!(parked.status(), CaptureStatus::NeedsReview);
    assert!(parked.last_error.unwrap().contains("timed out"));
    assert!(!scheduler.lease().is_held());
}

#[tokio::test]
async fn captures_are_processed_oldest_first() {
    let (store, _classifier, scheduler) = setup(FakeClassifier::new(|text| {
        Reply::Result(classification(text, new_project(text, 50)))
    }))
    .await;
    let first = store.create_capture("first").await.unwrap();
    let second = store.create_capture("second").await.unwrap();
    let third = store.create_capture("third").await.unwrap();

    let report = scheduler.drain().await.unwrap();

    let order: Vec<_> = report.processed.iter().map(|p| p.capture_id.clone()).collect();
    assert_eq!(order, vec![first.id, second.id, third.id]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_ticks_process_one_capture_at_a_time() {
    let classifier = FakeClassifier::new(|text| {
        Reply::Result(classification(text, new_project(text, 99)))
    })
    .with_delay(Duration::from_millis(20));
    let (store, classifier, scheduler) = setup(classifier).await;
    for text in ["alpha", "beta", "gamma", "delta"] {
        store.create_capture(text).await.unwrap();
    }

    let scheduler = Arc::new(scheduler);
    let mut callers = Vec::new();
    for _ in 0..6 {
        let scheduler = Arc::clone(&scheduler);
        callers.push(tokio::spawn(async move {
            loop {
                match scheduler.tick().await.unwrap() {
                    Tick::Idle => break,
                    Tick::Busy { .. } => tokio::time::sleep(Duration::from_millis(2)).await,
                    Tick::Processed(_) => {}
                }
            }
        }));
    }
    for caller in callers {
        caller.await.unwrap();
    }

    assert_eq!(classifier.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(classifier.calls(), 4);
    assert_eq!(store.list_projects(None, 10).await.unwrap().len(), 4);

    let tasks = store.list_tasks(&TaskFilter::default()).await.unwrap();
    assert_eq!(tasks.len(), 4);
    let captures = store.list_captures(&Default::default()).await.unwrap();
    for capture in &captures {
        assert_eq!(capture.status(), CaptureStatus::Success);
        let filed: Vec<_> = tasks
            .iter()
            .filter(|task| task.original_thought.as_deref() == Some(capture.original_text.as_str()))
            .collect();
        assert_eq!(filed.len(), 1, "capture {} filed once", capture.id);
    }
}

#[tokio::test]
async fn interrupted_filing_resumes_without_duplicates() {
    let (store, classifier, scheduler) =
        setup(FakeClassifier::always(Reply::Fail("must not be asked again"))).await;
    let capture = store.create_capture("weed the beds").await.unwrap();

    // A crash right after the project was created.
    let target = new_project("Garden", 96);
    let draft = CaptureDraft {
        rewritten_text: "Weed the flower beds".into(),
        project_match: target.clone(),
        ..Default::default()
    };
    let staged = store.stage_for_filing(&capture.id, &draft).await.unwrap();
    let project = store
        .file_new_project(&staged, &target, "Garden", "Garden handled")
        .await
        .unwrap();

    let Tick::Processed(done) = scheduler.tick().await.unwrap() else {
        panic!("expected the staged capture to be resumed");
    };
    assert_eq!(done.status, CaptureStatus::Success);
    assert_eq!(classifier.calls(), 0);

    let projects = store.list_projects(None, 10).await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].id, project.id);

    let tasks = store.list_tasks(&TaskFilter::default()).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Weed the flower beds");
    assert_eq!(tasks[0].project_id.as_deref(), Some(project.id.as_str()));

    let filed = store.get_capture(&capture.id).await.unwrap();
    assert_eq!(
        filed.project_match().and_then(|m| m.id.as_deref()),
        Some(project.id.as_str())
    );
    assert_eq!(filed.project_match().map(|m| m.confidence), Some(100));
}

#[tokio::test]
async fn every_filed_task_traces_back_to_its_capture() {
    let (store, _classifier, scheduler) = setup(FakeClassifier::new(|text| {
        Reply::Result(classification(
            &format!("Do: {}", text.trim()),
            new_project(text.trim(), 92),
        ))
    }))
    .await;
    for text in ["walk dog ", " pay rent", "email Sam"] {
        store.create_capture(text).await.unwrap();
    }

    scheduler.drain().await.unwrap();

    let captures = store.list_captures(&Default::default()).await.unwrap();
    let activities = store.list_activities(&ActivityFilter::default()).await.unwrap();
    for capture in captures {
        let entry = activities
            .iter()
            .find(|a| a.metadata.capture_id.as_deref() == Some(capture.id.as_str()))
            .unwrap();
        let task_id = entry.metadata.task_id.clone().unwrap();
        let task = store.get_task(&task_id).await.unwrap();
        assert_eq!(task.original_thought.as_deref(), Some(capture.original_text.as_str()));
        assert_eq!(entry.metadata.original_text.as_deref(), Some(capture.original_text.as_str()));
    }
}

#[tokio::test]
async fn worker_drains_on_start_and_on_new_captures() {
    let (store, _classifier, scheduler) = setup(FakeClassifier::new(|text| {
        Reply::Result(classification(text, new_project("Inbox zero", 95)))
    }))
    .await;
    let early = store.create_capture("queued before start").await.unwrap();

    let handle = Worker::new(Arc::new(scheduler))
        .with_poll_interval(Duration::from_millis(50))
        .spawn();

    wait_for_status(&store, &early.id, CaptureStatus::Success).await;
    let late = store.create_capture("queued while running").await.unwrap();
    wait_for_status(&store, &late.id, CaptureStatus::Success).await;

    let processed = handle.shutdown().await;
    assert_eq!(processed, 2);
}

async fn wait_for_status(
    store: &stash_db::service::StashService,
    capture_id: &str,
    status: CaptureStatus,
) {
    for _ in 0..200 {
        if store.get_capture(capture_id).await.unwrap().status() == status {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("capture {capture_id} never reached {status}");
}
