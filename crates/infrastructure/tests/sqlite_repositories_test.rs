use std::sync::Arc;

use reports_core::{
    Actor, AuthorityCheck, Department, ObjectCategory, Place, PlaceRepository, Report,
    ReportCreatorLink, ReportCreatorLinkRepository, ReportError, ReportPriority, ReportRepository,
    ReportStatus, SubjectObject, SubjectObjectRepository, Worker, WorkerRepository,
};
use reports_infrastructure::{DatabaseManager, RosterAuthority};

async fn setup() -> DatabaseManager {
    DatabaseManager::in_memory().await.unwrap()
}

#[tokio::test]
async fn test_migrate_is_idempotent() {
    let db = setup().await;
    db.migrate().await.unwrap();
    db.health_check().await.unwrap();
}

#[tokio::test]
async fn test_place_unique_key_maps_to_conflict() {
    let db = setup().await;
    let store = db.record_store();

    let created = store.places.create(&Place::new("Library", 2)).await.unwrap();
    assert!(created.id > 0);
    assert!(store.places.enforces_unique_key());

    let duplicate = store.places.create(&Place::new("Library", 2)).await;
    assert!(matches!(duplicate, Err(ReportError::Conflict(_))));

    let found = store
        .places
        .find_by_name_and_floor("Library", 2)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, created.id);
    assert_eq!(
        store.places.count_by_name_and_floor("Library", 2).await.unwrap(),
        1
    );
    assert!(store
        .places
        .find_by_name_and_floor("Library", 3)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_report_round_trip_and_attachments() {
    let db = setup().await;
    let store = db.record_store();

    let report = store
        .reports
        .create(&Report::new("Leaking tap", "alice", Some("maintenance-1".to_string())))
        .await
        .unwrap();
    assert!(report.id > 0);

    store
        .reports
        .append_attachments(report.id, &["u1".to_string(), "u2".to_string()], 10)
        .await
        .unwrap();
    store
        .reports
        .append_attachments(report.id, &["u3".to_string()], 10)
        .await
        .unwrap();

    let loaded = store.reports.get_by_id(report.id).await.unwrap().unwrap();
    assert_eq!(loaded.description, "Leaking tap");
    assert_eq!(loaded.status, ReportStatus::Pending);
    assert_eq!(loaded.priority, ReportPriority::Unassigned);
    assert_eq!(loaded.assigned_worker_id.as_deref(), Some("maintenance-1"));
    assert_eq!(loaded.attachment_refs, vec!["u1", "u2", "u3"]);

    let missing = store
        .reports
        .append_attachments(999, &["x".to_string()], 10)
        .await;
    assert!(matches!(missing, Err(ReportError::ReportNotFound { id: 999 })));
}

#[tokio::test]
async fn test_append_attachments_enforces_limit_atomically() {
    let db = setup().await;
    let store = db.record_store();

    let report = store
        .reports
        .create(&Report::new("Broken window", "alice", None))
        .await
        .unwrap();
    store
        .reports
        .append_attachments(report.id, &["a".to_string(), "b".to_string()], 3)
        .await
        .unwrap();

    // 整批超限时一个都不写入
    let result = store
        .reports
        .append_attachments(report.id, &["c".to_string(), "d".to_string()], 3)
        .await;
    assert!(matches!(result, Err(ReportError::Validation(_))));

    let loaded = store.reports.get_by_id(report.id).await.unwrap().unwrap();
    assert_eq!(loaded.attachment_refs, vec!["a", "b"]);

    store
        .reports
        .append_attachments(report.id, &["c".to_string()], 3)
        .await
        .unwrap();
    let loaded = store.reports.get_by_id(report.id).await.unwrap().unwrap();
    assert_eq!(loaded.attachment_refs, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_compare_and_update_is_conditional() {
    let db = setup().await;
    let store = db.record_store();

    let report = store
        .reports
        .create(&Report::new("Broken chair", "alice", Some("m1".to_string())))
        .await
        .unwrap();

    let mut next = report.clone();
    next.status = ReportStatus::InProgress;
    next.priority = ReportPriority::High;
    next.comment = "tomorrow".to_string();

    assert!(store
        .reports
        .compare_and_update(&next, &report)
        .await
        .unwrap());
    // 快照已过期，第二次条件更新不生效
    assert!(!store
        .reports
        .compare_and_update(&next, &report)
        .await
        .unwrap());

    let loaded = store.reports.get_by_id(report.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, ReportStatus::InProgress);
    assert_eq!(loaded.priority, ReportPriority::High);
    assert_eq!(loaded.comment, "tomorrow");

    let mut ghost = next.clone();
    ghost.id = 404;
    let result = store.reports.compare_and_update(&ghost, &ghost).await;
    assert!(matches!(result, Err(ReportError::ReportNotFound { id: 404 })));
}

#[tokio::test]
async fn test_stale_write_after_reassignment_is_rejected() {
    let db = setup().await;
    let store = db.record_store();

    let snapshot = store
        .reports
        .create(&Report::new("Broken chair", "alice", Some("m1".to_string())))
        .await
        .unwrap();

    let mut reassigned = snapshot.clone();
    reassigned.assigned_worker_id = Some("m2".to_string());
    assert!(store
        .reports
        .compare_and_update(&reassigned, &snapshot)
        .await
        .unwrap());

    // m1 基于改派前的快照推进状态
    let mut stale = snapshot.clone();
    stale.status = ReportStatus::InProgress;
    assert!(!store
        .reports
        .compare_and_update(&stale, &snapshot)
        .await
        .unwrap());

    let loaded = store.reports.get_by_id(snapshot.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, ReportStatus::Pending);
    assert_eq!(loaded.assigned_worker_id.as_deref(), Some("m2"));
}

#[tokio::test]
async fn test_conditional_update_matches_unassigned_report() {
    let db = setup().await;
    let store = db.record_store();

    let snapshot = store
        .reports
        .create(&Report::new("No pool", "alice", None))
        .await
        .unwrap();

    let mut assigned = snapshot.clone();
    assigned.assigned_worker_id = Some("s1".to_string());
    assert!(store
        .reports
        .compare_and_update(&assigned, &snapshot)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_report_queries_and_open_counts() {
    let db = setup().await;
    let store = db.record_store();

    let a = store
        .reports
        .create(&Report::new("a", "alice", Some("m1".to_string())))
        .await
        .unwrap();
    let b = store
        .reports
        .create(&Report::new("b", "bob", Some("m1".to_string())))
        .await
        .unwrap();
    store
        .reports
        .create(&Report::new("c", "alice", None))
        .await
        .unwrap();

    let mut resolved = b.clone();
    resolved.status = ReportStatus::Resolved;
    store
        .reports
        .compare_and_update(&resolved, &b)
        .await
        .unwrap();

    assert_eq!(store.reports.count_open_by_worker("m1").await.unwrap(), 1);
    assert_eq!(store.reports.list_by_assigned_worker("m1").await.unwrap().len(), 2);

    let listed = store.reports.list_by_ids(&[b.id, a.id, 999]).await.unwrap();
    let ids: Vec<i64> = listed.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![a.id, b.id]);
    assert!(store.reports.list_by_ids(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_core_records_and_compensating_deletes() {
    let db = setup().await;
    let store = db.record_store();

    let place = store.places.create(&Place::new("Gym", 1)).await.unwrap();
    let report = store
        .reports
        .create(&Report::new("Scoreboard dead", "alice", None))
        .await
        .unwrap();

    store
        .creator_links
        .create(&ReportCreatorLink::new(report.id, "alice"))
        .await
        .unwrap();
    let subject = store
        .subject_objects
        .create(&SubjectObject::new(
            "Scoreboard",
            ObjectCategory::Electrical,
            place.id,
            report.id,
        ))
        .await
        .unwrap();
    assert!(subject.id > 0);

    // 每个报修单只能有一个报修对象和一个创建者关联
    let second_link = store
        .creator_links
        .create(&ReportCreatorLink::new(report.id, "bob"))
        .await;
    assert!(matches!(second_link, Err(ReportError::Conflict(_))));

    assert_eq!(
        store
            .creator_links
            .list_report_ids_by_creator("alice")
            .await
            .unwrap(),
        vec![report.id]
    );
    let loaded = store
        .subject_objects
        .get_by_report_id(report.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.category, ObjectCategory::Electrical);

    // 补偿顺序：报修对象、创建者关联、报修单
    assert!(store
        .subject_objects
        .delete_by_report_id(report.id)
        .await
        .unwrap());
    assert!(store
        .creator_links
        .delete_by_report_id(report.id)
        .await
        .unwrap());
    assert!(store.reports.delete(report.id).await.unwrap());
    assert!(!store.reports.delete(report.id).await.unwrap());
    assert!(store.reports.get_by_id(report.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_report_delete_blocked_while_subject_object_exists() {
    let db = setup().await;
    let store = db.record_store();

    let place = store.places.create(&Place::new("Hall", 1)).await.unwrap();
    let report = store
        .reports
        .create(&Report::new("Door stuck", "alice", None))
        .await
        .unwrap();
    store
        .subject_objects
        .create(&SubjectObject::new("Door", ObjectCategory::Furniture, place.id, report.id))
        .await
        .unwrap();

    let result = store.reports.delete(report.id).await;
    assert!(matches!(result, Err(ReportError::DependencyUnavailable { .. })));
}

#[tokio::test]
async fn test_worker_roster_and_authority() {
    let db = setup().await;
    let store = db.record_store();

    store
        .workers
        .register(&Worker::new("m1", Department::Maintenance, "technician", "m1@example.org"))
        .await
        .unwrap();
    store
        .workers
        .register(&Worker::new("boss", Department::Maintenance, "Supervisor", "boss@example.org"))
        .await
        .unwrap();
    store
        .workers
        .register(&Worker::new("s1", Department::Systems, "technician", "s1@example.org"))
        .await
        .unwrap();

    // 重复登记是更新
    store
        .workers
        .register(&Worker::new("m1", Department::Maintenance, "technician", "m1@new.org"))
        .await
        .unwrap();

    let maintenance = store
        .workers
        .list_by_department(Department::Maintenance)
        .await
        .unwrap();
    assert_eq!(maintenance.len(), 2);
    let m1 = store.workers.get_by_id("m1").await.unwrap().unwrap();
    assert_eq!(m1.contact, "m1@new.org");

    let authority = RosterAuthority::new(Arc::clone(&store.workers));
    assert!(authority.has_authority(&Actor::worker("boss")).await.unwrap());
    assert!(!authority.has_authority(&Actor::worker("m1")).await.unwrap());
    assert!(!authority.has_authority(&Actor::worker("nobody")).await.unwrap());
    // 自称管理角色不作数，只看名册职级
    assert!(!authority.has_authority(&Actor::authority("dean")).await.unwrap());
    assert!(!authority.has_authority(&Actor::authority("m1")).await.unwrap());
    assert!(authority.has_authority(&Actor::authority("boss")).await.unwrap());
}
