mod common;

use std::time::Duration;

use common::{photo, report_input, Harness};
use reports_application::NotificationOutcome;
use reports_core::{
    CancellationHandle, Department, PlaceRepository, ReportError, ReportPriority,
    ReportRepository, ReportStatus, SubjectObjectRepository, ReportCreatorLinkRepository,
};
use reports_testing_utils::{short_context, test_context, TestEnv};
use tokio::time::sleep;

#[tokio::test]
async fn test_create_report_assigns_worker_from_pool() {
    let harness = Harness::new();
    let pool = TestEnv::seed_workers(&harness.store, Department::Maintenance, 3);
    TestEnv::seed_workers(&harness.store, Department::Systems, 2);

    let outcome = harness
        .orchestrator
        .create_report(&test_context(), report_input(Department::Maintenance))
        .await
        .unwrap();

    let assigned = outcome.assigned_worker_id.clone().unwrap();
    assert!(pool.iter().any(|w| w.id == assigned));
    assert_eq!(outcome.notification, NotificationOutcome::Sent);
    assert!(!outcome.is_partial_success());

    let report = harness.store.reports.get(outcome.report_id).unwrap();
    assert_eq!(report.status, ReportStatus::Pending);
    assert_eq!(report.priority, ReportPriority::Unassigned);
    assert!(report.comment.is_empty());
    assert_eq!(report.creator_id, "alice");

    let link = harness
        .store
        .creator_links
        .get_by_report_id(outcome.report_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(link.creator_id, "alice");

    let subject = harness
        .store
        .subject_objects
        .get_by_report_id(outcome.report_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(subject.place_id, outcome.place_id);
    assert_eq!(subject.name, "Ceiling light");

    let sent = harness.notifier.sent();
    assert_eq!(sent.len(), 1);
    let (recipient, payload) = &sent[0];
    assert_eq!(recipient.worker_id, assigned);
    assert_eq!(recipient.contact, format!("{assigned}@example.org"));
    assert_eq!(payload.report_id, outcome.report_id);
    assert_eq!(payload.creator_display_name, "Alice Chen");
    assert_eq!(payload.place_name, "Library");
    assert_eq!(payload.floor, 2);
}

#[tokio::test]
async fn test_create_report_with_empty_pool_is_unassigned() {
    let harness = Harness::new();
    TestEnv::seed_workers(&harness.store, Department::Systems, 2);

    let outcome = harness
        .orchestrator
        .create_report(&test_context(), report_input(Department::Maintenance))
        .await
        .unwrap();

    assert!(outcome.assigned_worker_id.is_none());
    assert_eq!(outcome.notification, NotificationOutcome::Skipped);
    assert!(!outcome.is_partial_success());
    assert_eq!(harness.notifier.attempts(), 0);

    let report = harness.store.reports.get(outcome.report_id).unwrap();
    assert!(report.assigned_worker_id.is_none());
}

#[tokio::test]
async fn test_systems_report_with_empty_pool_and_one_photo() {
    let harness = Harness::new();
    TestEnv::seed_workers(&harness.store, Department::Maintenance, 1);

    let mut input = report_input(Department::Systems);
    input.attachments = vec![photo("screen.jpg")];

    let outcome = harness
        .orchestrator
        .create_report(&test_context(), input)
        .await
        .unwrap();

    assert!(outcome.assigned_worker_id.is_none());
    assert_eq!(outcome.attachment_refs.len(), 1);
    assert_eq!(outcome.notification, NotificationOutcome::Skipped);
    assert_eq!(harness.notifier.attempts(), 0);

    let report = harness.store.reports.get(outcome.report_id).unwrap();
    assert_eq!(report.attachment_refs, outcome.attachment_refs);
}

#[tokio::test]
async fn test_same_place_twice_creates_one_place_two_reports() {
    let harness = Harness::new();
    TestEnv::seed_workers(&harness.store, Department::Maintenance, 1);
    let ctx = test_context();

    let first = harness
        .orchestrator
        .create_report(&ctx, report_input(Department::Maintenance))
        .await
        .unwrap();
    let second = harness
        .orchestrator
        .create_report(&ctx, report_input(Department::Maintenance))
        .await
        .unwrap();

    assert_ne!(first.report_id, second.report_id);
    assert_eq!(first.place_id, second.place_id);
    assert_eq!(
        harness
            .store
            .places
            .count_by_name_and_floor("Library", 2)
            .await
            .unwrap(),
        1
    );
    assert_eq!(harness.store.reports.count(), 2);
    assert_eq!(harness.store.subject_objects.count(), 2);
}

#[tokio::test]
async fn test_subject_object_failure_compensates() {
    let harness = Harness::new();
    TestEnv::seed_workers(&harness.store, Department::Maintenance, 1);
    harness.store.faults.fail("subject_objects.create");

    let mut input = report_input(Department::Maintenance);
    input.attachments = vec![photo("a.jpg")];

    let result = harness
        .orchestrator
        .create_report(&test_context(), input)
        .await;

    assert!(matches!(result, Err(ReportError::DependencyUnavailable { .. })));
    assert!(harness
        .store
        .reports
        .get_by_id(1)
        .await
        .unwrap()
        .is_none());
    assert_eq!(harness.store.reports.count(), 0);
    assert_eq!(harness.store.creator_links.count(), 0);
    assert_eq!(harness.object_store.upload_count(), 0);
    assert_eq!(harness.notifier.attempts(), 0);
    assert!(harness.alerts.alerts().is_empty());
}

#[tokio::test]
async fn test_creator_link_failure_compensates() {
    let harness = Harness::new();
    TestEnv::seed_workers(&harness.store, Department::Maintenance, 1);
    harness.store.faults.fail("creator_links.create");

    let result = harness
        .orchestrator
        .create_report(&test_context(), report_input(Department::Maintenance))
        .await;

    assert!(result.unwrap_err().is_retryable());
    assert_eq!(harness.store.reports.count(), 0);
    assert_eq!(harness.store.faults.call_count("subject_objects.create"), 0);
    assert_eq!(harness.store.faults.call_count("reports.delete"), 1);
}

#[tokio::test]
async fn test_report_create_failure_writes_nothing() {
    let harness = Harness::new();
    TestEnv::seed_workers(&harness.store, Department::Maintenance, 1);
    harness.store.faults.fail("reports.create");

    let result = harness
        .orchestrator
        .create_report(&test_context(), report_input(Department::Maintenance))
        .await;

    assert!(matches!(result, Err(ReportError::DependencyUnavailable { .. })));
    assert_eq!(harness.store.faults.call_count("creator_links.create"), 0);
    assert_eq!(harness.store.faults.call_count("reports.delete"), 0);
}

#[tokio::test]
async fn test_timed_out_report_write_is_removed_once_it_lands() {
    let harness = Harness::new();
    TestEnv::seed_workers(&harness.store, Department::Maintenance, 1);
    // 写入晚于 100ms 的调用超时才落库
    harness
        .store
        .faults
        .delay_once("reports.create", Duration::from_millis(300));

    let result = harness
        .orchestrator
        .create_report(&short_context(), report_input(Department::Maintenance))
        .await;
    assert!(matches!(result, Err(ReportError::Timeout(_))));

    sleep(Duration::from_millis(500)).await;

    assert_eq!(harness.store.faults.call_count("reports.delete"), 1);
    assert_eq!(harness.store.reports.count(), 0);
    assert_eq!(harness.store.creator_links.count(), 0);
    assert_eq!(harness.notifier.attempts(), 0);
    assert!(harness.alerts.alerts().is_empty());
}

#[tokio::test]
async fn test_cancelled_report_write_that_cannot_be_removed_raises_alert() {
    let harness = Harness::new();
    TestEnv::seed_workers(&harness.store, Department::Maintenance, 1);
    harness
        .store
        .faults
        .delay_once("reports.create", Duration::from_millis(200));
    harness.store.faults.fail("reports.delete");

    let handle = CancellationHandle::new();
    let ctx = handle.context(Duration::from_secs(5));

    let (result, _) = tokio::join!(
        harness
            .orchestrator
            .create_report(&ctx, report_input(Department::Maintenance)),
        async {
            sleep(Duration::from_millis(50)).await;
            handle.cancel();
        }
    );
    assert!(matches!(result, Err(ReportError::Cancelled(_))));

    sleep(Duration::from_millis(400)).await;

    let orphan = harness.store.reports.all();
    assert_eq!(orphan.len(), 1);
    let alerts = harness.alerts.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].report_id, orphan[0].id);
    assert_eq!(
        alerts[0].orphaned_records,
        vec![format!("report(id={})", orphan[0].id)]
    );
}

#[tokio::test]
async fn test_assignment_failure_aborts_before_writes() {
    let harness = Harness::new();
    harness.store.faults.fail("workers.list");

    let result = harness
        .orchestrator
        .create_report(&test_context(), report_input(Department::Maintenance))
        .await;

    assert!(matches!(result, Err(ReportError::DependencyUnavailable { .. })));
    assert_eq!(harness.store.places.count(), 0);
    assert_eq!(harness.store.reports.count(), 0);
}

#[tokio::test]
async fn test_invalid_input_has_no_side_effects() {
    let harness = Harness::new();

    let mut input = report_input(Department::Maintenance);
    input.floor = 0;
    let result = harness
        .orchestrator
        .create_report(&test_context(), input)
        .await;
    assert!(matches!(result, Err(ReportError::Validation(_))));

    let mut input = report_input(Department::Maintenance);
    input.description = " ".to_string();
    let result = harness
        .orchestrator
        .create_report(&test_context(), input)
        .await;
    assert!(result.unwrap_err().is_caller_error());

    assert!(harness.store.faults.calls().is_empty());
}

#[tokio::test]
async fn test_one_of_three_attachments_fails() {
    let harness = Harness::new();
    TestEnv::seed_workers(&harness.store, Department::Maintenance, 1);
    harness.object_store.fail_uploads_containing("side.jpg");

    let mut input = report_input(Department::Maintenance);
    input.attachments = vec![photo("front.jpg"), photo("side.jpg"), photo("back.jpg")];

    let outcome = harness
        .orchestrator
        .create_report(&test_context(), input)
        .await
        .unwrap();

    assert!(outcome.is_partial_success());
    assert_eq!(outcome.attachment_failures.len(), 1);
    assert_eq!(outcome.attachment_failures[0].file_name, "side.jpg");
    assert_eq!(outcome.attachment_failures[0].index, 1);
    assert_eq!(outcome.attachment_refs.len(), 2);
    assert!(outcome.attachment_refs[0].contains("front.jpg"));
    assert!(outcome.attachment_refs[1].contains("back.jpg"));

    let report = harness.store.reports.get(outcome.report_id).unwrap();
    assert_eq!(report.attachment_refs, outcome.attachment_refs);

    // 通知在全部附件尝试之后发出，只带成功的引用
    let (_, payload) = &harness.notifier.sent()[0];
    assert_eq!(payload.attachment_refs, outcome.attachment_refs);
}

#[tokio::test]
async fn test_attachment_reference_write_failure_is_soft() {
    let harness = Harness::new();
    TestEnv::seed_workers(&harness.store, Department::Maintenance, 1);
    harness.store.faults.fail("reports.append_attachments");

    let mut input = report_input(Department::Maintenance);
    input.attachments = vec![photo("front.jpg"), photo("back.jpg")];

    let outcome = harness
        .orchestrator
        .create_report(&test_context(), input)
        .await
        .unwrap();

    assert!(outcome.attachment_refs.is_empty());
    assert_eq!(outcome.attachment_failures.len(), 2);
    assert!(harness.store.reports.get(outcome.report_id).is_some());
    assert_eq!(outcome.notification, NotificationOutcome::Sent);
}

#[tokio::test]
async fn test_notification_failure_is_soft() {
    let harness = Harness::new();
    TestEnv::seed_workers(&harness.store, Department::Maintenance, 1);
    harness.notifier.set_failing(true);

    let outcome = harness
        .orchestrator
        .create_report(&test_context(), report_input(Department::Maintenance))
        .await
        .unwrap();

    assert!(matches!(outcome.notification, NotificationOutcome::Failed(_)));
    assert!(outcome.is_partial_success());
    assert_eq!(outcome.warnings().len(), 1);

    let report = harness.store.reports.get(outcome.report_id).unwrap();
    assert_eq!(report.assigned_worker_id.as_deref(), Some("maintenance-1"));
}

#[tokio::test]
async fn test_failed_compensation_raises_consistency_alert() {
    let harness = Harness::new();
    TestEnv::seed_workers(&harness.store, Department::Maintenance, 1);
    harness.store.faults.fail("subject_objects.create");
    harness.store.faults.fail("reports.delete");

    let result = harness
        .orchestrator
        .create_report(&test_context(), report_input(Department::Maintenance))
        .await;

    let err = result.unwrap_err();
    assert!(err.is_consistency_violation());
    let ReportError::ConsistencyViolation {
        report_id, orphaned, ..
    } = err
    else {
        panic!("expected a consistency violation");
    };

    assert_eq!(orphaned, vec![format!("report(id={report_id})")]);
    assert!(harness.store.reports.get(report_id).is_some());
    assert_eq!(harness.store.creator_links.count(), 0);

    let alerts = harness.alerts.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].report_id, report_id);
    assert_eq!(alerts[0].orphaned_records, orphaned);
}

#[tokio::test]
async fn test_cancellation_during_core_writes_compensates() {
    let harness = Harness::new();
    TestEnv::seed_workers(&harness.store, Department::Maintenance, 1);
    harness.store.faults.hang("subject_objects.create");

    let handle = CancellationHandle::new();
    let ctx = handle.context(Duration::from_secs(5));

    let (result, _) = tokio::join!(
        harness
            .orchestrator
            .create_report(&ctx, report_input(Department::Maintenance)),
        async {
            sleep(Duration::from_millis(50)).await;
            handle.cancel();
        }
    );

    assert!(matches!(result, Err(ReportError::Cancelled(_))));
    assert_eq!(harness.store.reports.count(), 0);
    assert_eq!(harness.store.creator_links.count(), 0);
    assert_eq!(harness.notifier.attempts(), 0);
}

#[tokio::test]
async fn test_retry_attachments_by_creator() {
    let harness = Harness::new();
    TestEnv::seed_workers(&harness.store, Department::Maintenance, 1);
    harness.object_store.fail_uploads_containing("side.jpg");
    let ctx = test_context();

    let mut input = report_input(Department::Maintenance);
    input.attachments = vec![photo("front.jpg"), photo("side.jpg")];
    let outcome = harness.orchestrator.create_report(&ctx, input).await.unwrap();
    assert_eq!(outcome.attachment_failures.len(), 1);

    let creator = reports_core::Actor::reporter("alice", "Alice Chen");
    let retried = harness
        .orchestrator
        .retry_attachments(&ctx, outcome.report_id, &creator, vec![photo("side-retake.jpg")])
        .await
        .unwrap();
    assert_eq!(retried.attachment_refs.len(), 1);
    assert!(retried.failures.is_empty());

    let report = harness.store.reports.get(outcome.report_id).unwrap();
    assert_eq!(report.attachment_refs.len(), 2);

    let stranger = reports_core::Actor::reporter("bob", "Bob");
    let result = harness
        .orchestrator
        .retry_attachments(&ctx, outcome.report_id, &stranger, vec![photo("x.jpg")])
        .await;
    assert!(matches!(result, Err(ReportError::Permission(_))));
}

#[tokio::test]
async fn test_concurrent_retries_cannot_exceed_attachment_limit() {
    let harness = Harness::new();
    TestEnv::seed_workers(&harness.store, Department::Maintenance, 1);
    let ctx = test_context();

    let outcome = harness
        .orchestrator
        .create_report(&ctx, report_input(Department::Maintenance))
        .await
        .unwrap();

    // 第一批的引用写入被推迟，第二批基于同样的旧计数通过了预检
    harness
        .store
        .faults
        .delay_once("reports.append_attachments", Duration::from_millis(200));

    let creator = reports_core::Actor::reporter("alice", "Alice Chen");
    let batch = |prefix: &str| -> Vec<_> {
        (0..6).map(|i| photo(&format!("{prefix}-{i}.jpg"))).collect()
    };

    let (first, second) = tokio::join!(
        harness
            .orchestrator
            .retry_attachments(&ctx, outcome.report_id, &creator, batch("first")),
        async {
            sleep(Duration::from_millis(50)).await;
            harness
                .orchestrator
                .retry_attachments(&ctx, outcome.report_id, &creator, batch("second"))
                .await
        }
    );

    let first = first.unwrap();
    let second = second.unwrap();
    assert_eq!(second.attachment_refs.len(), 6);
    assert!(first.attachment_refs.is_empty());
    assert_eq!(first.failures.len(), 6);

    let report = harness.store.reports.get(outcome.report_id).unwrap();
    assert_eq!(report.attachment_refs, second.attachment_refs);
}

#[tokio::test]
async fn test_notification_uses_trimmed_object_name() {
    let harness = Harness::new();
    TestEnv::seed_workers(&harness.store, Department::Maintenance, 1);

    let mut input = report_input(Department::Maintenance);
    input.object_name = "  Ceiling light  ".to_string();
    let outcome = harness
        .orchestrator
        .create_report(&test_context(), input)
        .await
        .unwrap();

    let (_, payload) = &harness.notifier.sent()[0];
    assert_eq!(payload.object_name, "Ceiling light");

    let subject = harness
        .store
        .subject_objects
        .get_by_report_id(outcome.report_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payload.object_name, subject.name);
}

#[tokio::test]
async fn test_renotify_rebuilds_payload_from_records() {
    let harness = Harness::new();
    TestEnv::seed_workers(&harness.store, Department::Maintenance, 1);
    harness.notifier.set_failing(true);
    let ctx = test_context();

    let mut input = report_input(Department::Maintenance);
    input.attachments = vec![photo("front.jpg")];
    let outcome = harness.orchestrator.create_report(&ctx, input).await.unwrap();
    assert!(matches!(outcome.notification, NotificationOutcome::Failed(_)));

    harness.notifier.set_failing(false);
    let renotified = harness
        .orchestrator
        .renotify(&ctx, outcome.report_id)
        .await
        .unwrap();
    assert_eq!(renotified, NotificationOutcome::Sent);

    let (recipient, payload) = &harness.notifier.sent()[0];
    assert_eq!(recipient.worker_id, "maintenance-1");
    assert_eq!(payload.object_name, "Ceiling light");
    assert_eq!(payload.place_name, "Library");
    assert_eq!(payload.attachment_refs, outcome.attachment_refs);
}

#[tokio::test]
async fn test_renotify_unassigned_report_is_skipped() {
    let harness = Harness::new();
    let ctx = test_context();

    let outcome = harness
        .orchestrator
        .create_report(&ctx, report_input(Department::Systems))
        .await
        .unwrap();

    let renotified = harness
        .orchestrator
        .renotify(&ctx, outcome.report_id)
        .await
        .unwrap();
    assert_eq!(renotified, NotificationOutcome::Skipped);
    assert_eq!(harness.notifier.attempts(), 0);
}

#[tokio::test]
async fn test_queries_follow_creator_links() {
    let harness = Harness::new();
    TestEnv::seed_workers(&harness.store, Department::Maintenance, 1);
    let ctx = test_context();

    let first = harness
        .orchestrator
        .create_report(&ctx, report_input(Department::Maintenance))
        .await
        .unwrap();
    let mut other = report_input(Department::Maintenance);
    other.creator = reports_core::Actor::reporter("bob", "Bob");
    harness.orchestrator.create_report(&ctx, other).await.unwrap();

    let mine = harness.queries.my_reports(&ctx, "alice").await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, first.report_id);

    let assigned = harness
        .queries
        .assigned_reports(&ctx, "maintenance-1")
        .await
        .unwrap();
    assert_eq!(assigned.len(), 2);

    let details = harness
        .queries
        .report_details(&ctx, first.report_id)
        .await
        .unwrap();
    assert_eq!(details.report.id, first.report_id);
    assert_eq!(details.subject_object.unwrap().name, "Ceiling light");
    let place = details.place.unwrap();
    assert_eq!((place.name.as_str(), place.floor), ("Library", 2));

    let missing = harness.queries.report_details(&ctx, 999).await;
    assert!(matches!(missing, Err(ReportError::ReportNotFound { id: 999 })));
}
