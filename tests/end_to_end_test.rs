use std::path::Path;

use facility_reports::Application;
use reports_application::{AttachmentUpload, CreateReportInput, NotificationOutcome};
use reports_core::config::AppConfig;
use reports_core::{
    Actor, Department, ObjectCategory, ReportError, ReportPriority, ReportStatus, Worker,
    WorkerRepository,
};
use tempfile::TempDir;

async fn setup(dir: &Path) -> Application {
    let mut config = AppConfig::default();
    config.database.url = format!("sqlite:{}", dir.join("db/reports.db").display());
    config.object_store.root_dir = dir.join("attachments").display().to_string();
    config.object_store.public_base_url = "http://files.test".to_string();
    config.alerts.journal_path = Some(dir.join("alerts.jsonl").display().to_string());

    let app = Application::new(config).await.unwrap();
    app.store()
        .workers
        .register(&Worker::new(
            "m1",
            Department::Maintenance,
            "technician",
            "m1@example.org",
        ))
        .await
        .unwrap();
    app.store()
        .workers
        .register(&Worker::new(
            "boss",
            Department::Maintenance,
            "supervisor",
            "boss@example.org",
        ))
        .await
        .unwrap();
    app
}

fn library_report(department: Department, photos: Vec<AttachmentUpload>) -> CreateReportInput {
    CreateReportInput {
        description: "Projector shows no signal".to_string(),
        department,
        object_name: "Projector".to_string(),
        object_category: ObjectCategory::Projector,
        place_name: "Library".to_string(),
        floor: 2,
        creator: Actor::reporter("alice", "Alice Chen"),
        attachments: photos,
    }
}

#[tokio::test]
async fn test_report_full_lifecycle_on_sqlite() {
    let dir = TempDir::new().unwrap();
    let app = setup(dir.path()).await;
    let ctx = app.default_context();

    // 部门里只有 m1 和 boss，两人都可能被分配
    let photo = AttachmentUpload::new("front.jpg", "image/jpeg", b"jpeg-bytes".to_vec());
    let outcome = app
        .orchestrator()
        .create_report(&ctx, library_report(Department::Maintenance, vec![photo]))
        .await
        .unwrap();

    let assignee = outcome.assigned_worker_id.clone().unwrap();
    assert!(assignee == "m1" || assignee == "boss");
    assert_eq!(outcome.notification, NotificationOutcome::Sent);
    assert!(!outcome.is_partial_success());
    assert_eq!(outcome.attachment_refs.len(), 1);

    let reference = &outcome.attachment_refs[0];
    let prefix = format!("http://files.test/report-{}/", outcome.report_id);
    assert!(reference.starts_with(&prefix));
    let key = reference.trim_start_matches("http://files.test/");
    let stored = tokio::fs::read(dir.path().join("attachments").join(key))
        .await
        .unwrap();
    assert_eq!(stored, b"jpeg-bytes");

    let lifecycle = app.lifecycle();
    let report = lifecycle
        .set_priority_and_estimate(
            &ctx,
            outcome.report_id,
            &assignee,
            ReportPriority::High,
            Some("this afternoon".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(report.priority, ReportPriority::High);
    assert_eq!(report.comment, "this afternoon");

    lifecycle
        .advance(&ctx, outcome.report_id, &assignee, ReportStatus::InProgress)
        .await
        .unwrap();
    lifecycle
        .advance(&ctx, outcome.report_id, &assignee, ReportStatus::Resolved)
        .await
        .unwrap();

    let reopened = lifecycle
        .reopen(&ctx, outcome.report_id, &Actor::worker("boss"), "light still flickers")
        .await
        .unwrap();
    assert_eq!(reopened.status, ReportStatus::InProgress);

    let mine = app.queries().my_reports(&ctx, "alice").await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].attachment_refs, outcome.attachment_refs);

    let details = app
        .queries()
        .report_details(&ctx, outcome.report_id)
        .await
        .unwrap();
    let place = details.place.unwrap();
    assert_eq!(place.name, "Library");
    assert_eq!(place.floor, 2);
    assert_eq!(details.subject_object.unwrap().name, "Projector");

    app.shutdown().await;
}

#[tokio::test]
async fn test_same_place_is_reused_across_reports() {
    let dir = TempDir::new().unwrap();
    let app = setup(dir.path()).await;
    let ctx = app.default_context();

    let first = app
        .orchestrator()
        .create_report(&ctx, library_report(Department::Maintenance, vec![]))
        .await
        .unwrap();
    let second = app
        .orchestrator()
        .create_report(&ctx, library_report(Department::Maintenance, vec![]))
        .await
        .unwrap();

    assert_ne!(first.report_id, second.report_id);
    assert_eq!(first.place_id, second.place_id);
    assert_eq!(app.queries().my_reports(&ctx, "alice").await.unwrap().len(), 2);

    app.shutdown().await;
}

#[tokio::test]
async fn test_department_without_workers_leaves_report_unassigned() {
    let dir = TempDir::new().unwrap();
    let app = setup(dir.path()).await;
    let ctx = app.default_context();

    let outcome = app
        .orchestrator()
        .create_report(&ctx, library_report(Department::Systems, vec![]))
        .await
        .unwrap();

    assert_eq!(outcome.assigned_worker_id, None);
    assert_eq!(outcome.notification, NotificationOutcome::Skipped);

    let report = app
        .queries()
        .get_report(&ctx, outcome.report_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(report.status, ReportStatus::Pending);

    app.shutdown().await;
}

#[tokio::test]
async fn test_invalid_input_is_rejected_before_any_write() {
    let dir = TempDir::new().unwrap();
    let app = setup(dir.path()).await;
    let ctx = app.default_context();

    let mut input = library_report(Department::Maintenance, vec![]);
    input.floor = 0;

    let result = app.orchestrator().create_report(&ctx, input).await;
    assert!(matches!(result, Err(ReportError::Validation(_))));
    assert!(app.queries().my_reports(&ctx, "alice").await.unwrap().is_empty());

    app.shutdown().await;
}

#[tokio::test]
async fn test_only_roster_supervisors_can_reassign() {
    let dir = TempDir::new().unwrap();
    let app = setup(dir.path()).await;
    let ctx = app.default_context();

    let outcome = app
        .orchestrator()
        .create_report(&ctx, library_report(Department::Maintenance, vec![]))
        .await
        .unwrap();

    // m1 只是技术员，自称管理角色也不能改派
    let result = app
        .lifecycle()
        .reassign(&ctx, outcome.report_id, &Actor::authority("m1"), "boss")
        .await;
    assert!(matches!(result, Err(ReportError::Permission(_))));

    let result = app
        .lifecycle()
        .reassign(&ctx, outcome.report_id, &Actor::worker("m1"), "boss")
        .await;
    assert!(matches!(result, Err(ReportError::Permission(_))));

    let report = app
        .lifecycle()
        .reassign(&ctx, outcome.report_id, &Actor::worker("boss"), "m1")
        .await
        .unwrap();
    assert_eq!(report.assigned_worker_id.as_deref(), Some("m1"));

    app.shutdown().await;
}
