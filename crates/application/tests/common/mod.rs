#![allow(dead_code)]

use std::sync::Arc;

use reports_application::{
    AttachmentUpload, CreateReportInput, InputValidator, ReportLifecycleController,
    ReportOrchestrator, ReportQueries,
};
use reports_core::config::{LifecycleConfig, LimitsConfig};
use reports_core::{Actor, Department, ObjectCategory};
use reports_dispatcher::AssignmentSelector;
use reports_testing_utils::{
    MockAuthorityCheck, MockNotifier, MockObjectStore, MockRecordStore, RecordingAlertSink,
};

pub struct Harness {
    pub store: MockRecordStore,
    pub object_store: MockObjectStore,
    pub notifier: MockNotifier,
    pub alerts: RecordingAlertSink,
    pub authority: MockAuthorityCheck,
    pub orchestrator: ReportOrchestrator,
    pub lifecycle: ReportLifecycleController,
    pub queries: ReportQueries,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(MockRecordStore::new(), LifecycleConfig::default())
    }

    pub fn with_lifecycle(lifecycle: LifecycleConfig) -> Self {
        Self::build(MockRecordStore::new(), lifecycle)
    }

    pub fn build(store: MockRecordStore, lifecycle: LifecycleConfig) -> Self {
        let object_store = MockObjectStore::new();
        let notifier = MockNotifier::new();
        let alerts = RecordingAlertSink::new();
        let authority = MockAuthorityCheck::with_authorities(&["dean"]);
        let validator = InputValidator::new(LimitsConfig::default());

        let records = store.record_store();
        let selector = Arc::new(AssignmentSelector::random(records.workers.clone()));

        let orchestrator = ReportOrchestrator::new(
            records.clone(),
            selector,
            Arc::new(object_store.clone()),
            Arc::new(notifier.clone()),
            Arc::new(alerts.clone()),
            validator.clone(),
        );
        let lifecycle = ReportLifecycleController::new(
            records.reports.clone(),
            records.workers.clone(),
            Arc::new(authority.clone()),
            lifecycle,
            validator,
        );
        let queries = ReportQueries::new(records);

        Self {
            store,
            object_store,
            notifier,
            alerts,
            authority,
            orchestrator,
            lifecycle,
            queries,
        }
    }
}

pub fn report_input(department: Department) -> CreateReportInput {
    CreateReportInput {
        description: "Ceiling light flickers constantly".to_string(),
        department,
        object_name: "Ceiling light".to_string(),
        object_category: ObjectCategory::Lighting,
        place_name: "Library".to_string(),
        floor: 2,
        creator: Actor::reporter("alice", "Alice Chen"),
        attachments: Vec::new(),
    }
}

pub fn photo(file_name: &str) -> AttachmentUpload {
    AttachmentUpload::new(file_name, "image/jpeg", file_name.as_bytes().to_vec())
}
