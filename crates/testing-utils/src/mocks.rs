//! Mock implementations for all repository and collaborator traits
//!
//! Every mock repository created through [`MockRecordStore`] shares one
//! [`FaultInjector`]. Operations are identified by `"<collection>.<operation>"`
//! names, e.g. `"reports.create"`, `"subject_objects.create"`, `"reports.delete"`,
//! `"creator_links.delete"`, `"places.find"`, `"workers.list"`.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use reports_core::{
    Actor, AuthorityCheck, ConsistencyAlert, ConsistencyAlertSink, Department,
    NotificationPayload, NotificationRecipient, Notifier, ObjectStore, Place, PlaceRepository,
    RecordStore, Report, ReportCreatorLink, ReportCreatorLinkRepository, ReportError,
    ReportRepository, ReportResult, SubjectObject, SubjectObjectRepository, Worker,
    WorkerRepository,
};

/// How an injected fault behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultMode {
    /// Fail every call until cleared
    Always,
    /// Fail the next call only
    Once,
    /// Never complete, to exercise timeouts and cancellation
    Hang,
    /// Hold the next call for a while, then let it through
    DelayOnce(Duration),
}

/// Shared fault plan and call log
#[derive(Debug, Clone, Default)]
pub struct FaultInjector {
    faults: Arc<Mutex<HashMap<String, FaultMode>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FaultInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, operation: &str) {
        self.set(operation, FaultMode::Always);
    }

    pub fn fail_once(&self, operation: &str) {
        self.set(operation, FaultMode::Once);
    }

    pub fn hang(&self, operation: &str) {
        self.set(operation, FaultMode::Hang);
    }

    /// Delay the next call so another caller can interleave with it
    pub fn delay_once(&self, operation: &str, delay: Duration) {
        self.set(operation, FaultMode::DelayOnce(delay));
    }

    pub fn clear(&self, operation: &str) {
        self.faults.lock().unwrap().remove(operation);
    }

    pub fn clear_all(&self) {
        self.faults.lock().unwrap().clear();
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.as_str() == operation)
            .count()
    }

    fn set(&self, operation: &str, mode: FaultMode) {
        self.faults
            .lock()
            .unwrap()
            .insert(operation.to_string(), mode);
    }

    /// Record the call and apply the configured fault, if any
    pub async fn check(&self, operation: &str) -> ReportResult<()> {
        self.calls.lock().unwrap().push(operation.to_string());

        let mode = {
            let mut faults = self.faults.lock().unwrap();
            match faults.get(operation).copied() {
                Some(mode @ (FaultMode::Once | FaultMode::DelayOnce(_))) => {
                    faults.remove(operation);
                    Some(mode)
                }
                other => other,
            }
        };

        match mode {
            None => Ok(()),
            Some(FaultMode::Always) | Some(FaultMode::Once) => Err(ReportError::dependency(
                operation,
                "injected failure",
            )),
            Some(FaultMode::Hang) => std::future::pending::<ReportResult<()>>().await,
            Some(FaultMode::DelayOnce(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }
}

/// Mock implementation of PlaceRepository for testing
#[derive(Debug, Clone)]
pub struct MockPlaceRepository {
    places: Arc<Mutex<Vec<Place>>>,
    next_id: Arc<AtomicI64>,
    unique: bool,
    stale_reads: Arc<AtomicUsize>,
    faults: FaultInjector,
}

impl MockPlaceRepository {
    pub fn new(faults: FaultInjector) -> Self {
        Self {
            places: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicI64::new(1)),
            unique: true,
            stale_reads: Arc::new(AtomicUsize::new(0)),
            faults,
        }
    }

    /// A store without a (name, floor) uniqueness constraint
    pub fn without_unique_constraint(mut self) -> Self {
        self.unique = false;
        self
    }

    /// The next `count` lookups miss even when the place exists, as if another
    /// caller inserted it between our lookup and our insert
    pub fn simulate_stale_reads(&self, count: usize) {
        self.stale_reads.store(count, Ordering::SeqCst);
    }

    pub fn insert(&self, name: &str, floor: i32) -> Place {
        let place = Place {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: name.to_string(),
            floor,
        };
        self.places.lock().unwrap().push(place.clone());
        place
    }

    pub fn count(&self) -> usize {
        self.places.lock().unwrap().len()
    }
}

#[async_trait]
impl PlaceRepository for MockPlaceRepository {
    async fn find_by_name_and_floor(&self, name: &str, floor: i32) -> ReportResult<Option<Place>> {
        self.faults.check("places.find").await?;
        let stale = self
            .stale_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if stale {
            return Ok(None);
        }
        let places = self.places.lock().unwrap();
        Ok(places
            .iter()
            .find(|p| p.name == name && p.floor == floor)
            .cloned())
    }

    async fn get_by_id(&self, id: i64) -> ReportResult<Option<Place>> {
        self.faults.check("places.get").await?;
        let places = self.places.lock().unwrap();
        Ok(places.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, place: &Place) -> ReportResult<Place> {
        self.faults.check("places.create").await?;
        let mut places = self.places.lock().unwrap();
        if self.unique
            && places
                .iter()
                .any(|p| p.name == place.name && p.floor == place.floor)
        {
            return Err(ReportError::Conflict(format!(
                "place ({}, {}) already exists",
                place.name, place.floor
            )));
        }
        let mut created = place.clone();
        created.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        places.push(created.clone());
        Ok(created)
    }

    async fn count_by_name_and_floor(&self, name: &str, floor: i32) -> ReportResult<usize> {
        self.faults.check("places.count").await?;
        let places = self.places.lock().unwrap();
        Ok(places
            .iter()
            .filter(|p| p.name == name && p.floor == floor)
            .count())
    }

    fn enforces_unique_key(&self) -> bool {
        self.unique
    }
}

/// Mock implementation of ReportRepository for testing
#[derive(Debug, Clone)]
pub struct MockReportRepository {
    reports: Arc<Mutex<HashMap<i64, Report>>>,
    next_id: Arc<AtomicI64>,
    faults: FaultInjector,
}

impl MockReportRepository {
    pub fn new(faults: FaultInjector) -> Self {
        Self {
            reports: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
            faults,
        }
    }

    pub fn insert(&self, report: Report) -> Report {
        let mut report = report;
        if report.id == 0 {
            report.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        }
        self.reports
            .lock()
            .unwrap()
            .insert(report.id, report.clone());
        report
    }

    pub fn count(&self) -> usize {
        self.reports.lock().unwrap().len()
    }

    pub fn get(&self, id: i64) -> Option<Report> {
        self.reports.lock().unwrap().get(&id).cloned()
    }

    pub fn all(&self) -> Vec<Report> {
        let mut reports: Vec<Report> = self.reports.lock().unwrap().values().cloned().collect();
        reports.sort_by_key(|r| r.id);
        reports
    }
}

#[async_trait]
impl ReportRepository for MockReportRepository {
    async fn create(&self, report: &Report) -> ReportResult<Report> {
        self.faults.check("reports.create").await?;
        let mut created = report.clone();
        created.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.reports
            .lock()
            .unwrap()
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> ReportResult<Option<Report>> {
        self.faults.check("reports.get").await?;
        Ok(self.reports.lock().unwrap().get(&id).cloned())
    }

    async fn compare_and_update(&self, report: &Report, expected: &Report) -> ReportResult<bool> {
        self.faults.check("reports.update").await?;
        let mut reports = self.reports.lock().unwrap();
        match reports.get_mut(&report.id) {
            Some(stored) if stored.same_lifecycle_state(expected) => {
                stored.status = report.status;
                stored.priority = report.priority;
                stored.comment = report.comment.clone();
                stored.assigned_worker_id = report.assigned_worker_id.clone();
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(ReportError::report_not_found(report.id)),
        }
    }

    async fn delete(&self, id: i64) -> ReportResult<bool> {
        self.faults.check("reports.delete").await?;
        Ok(self.reports.lock().unwrap().remove(&id).is_some())
    }

    async fn append_attachments(
        &self,
        id: i64,
        refs: &[String],
        max_total: usize,
    ) -> ReportResult<()> {
        self.faults.check("reports.append_attachments").await?;
        let mut reports = self.reports.lock().unwrap();
        let report = reports
            .get_mut(&id)
            .ok_or_else(|| ReportError::report_not_found(id))?;
        let total = report.attachment_refs.len() + refs.len();
        if total > max_total {
            return Err(ReportError::validation_error(format!(
                "附件数量 {total} 超过上限 {max_total}"
            )));
        }
        report.attachment_refs.extend(refs.iter().cloned());
        Ok(())
    }

    async fn list_by_ids(&self, ids: &[i64]) -> ReportResult<Vec<Report>> {
        self.faults.check("reports.list").await?;
        let reports = self.reports.lock().unwrap();
        Ok(ids.iter().filter_map(|id| reports.get(id).cloned()).collect())
    }

    async fn list_by_assigned_worker(&self, worker_id: &str) -> ReportResult<Vec<Report>> {
        self.faults.check("reports.list").await?;
        let reports = self.reports.lock().unwrap();
        let mut assigned: Vec<Report> = reports
            .values()
            .filter(|r| r.is_assigned_to(worker_id))
            .cloned()
            .collect();
        assigned.sort_by_key(|r| r.id);
        Ok(assigned)
    }

    async fn count_open_by_worker(&self, worker_id: &str) -> ReportResult<usize> {
        self.faults.check("reports.count_open").await?;
        let reports = self.reports.lock().unwrap();
        Ok(reports
            .values()
            .filter(|r| r.is_assigned_to(worker_id) && r.is_open())
            .count())
    }
}

/// Mock implementation of SubjectObjectRepository for testing
#[derive(Debug, Clone)]
pub struct MockSubjectObjectRepository {
    objects: Arc<Mutex<HashMap<i64, SubjectObject>>>,
    next_id: Arc<AtomicI64>,
    faults: FaultInjector,
}

impl MockSubjectObjectRepository {
    pub fn new(faults: FaultInjector) -> Self {
        Self {
            objects: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
            faults,
        }
    }

    pub fn count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl SubjectObjectRepository for MockSubjectObjectRepository {
    async fn create(&self, object: &SubjectObject) -> ReportResult<SubjectObject> {
        self.faults.check("subject_objects.create").await?;
        let mut objects = self.objects.lock().unwrap();
        if objects.values().any(|o| o.report_id == object.report_id) {
            return Err(ReportError::Conflict(format!(
                "subject object for report {} already exists",
                object.report_id
            )));
        }
        let mut created = object.clone();
        created.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        objects.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_by_report_id(&self, report_id: i64) -> ReportResult<Option<SubjectObject>> {
        self.faults.check("subject_objects.get").await?;
        let objects = self.objects.lock().unwrap();
        Ok(objects.values().find(|o| o.report_id == report_id).cloned())
    }

    async fn delete_by_report_id(&self, report_id: i64) -> ReportResult<bool> {
        self.faults.check("subject_objects.delete").await?;
        let mut objects = self.objects.lock().unwrap();
        let before = objects.len();
        objects.retain(|_, o| o.report_id != report_id);
        Ok(objects.len() != before)
    }
}

/// Mock implementation of ReportCreatorLinkRepository for testing
#[derive(Debug, Clone)]
pub struct MockCreatorLinkRepository {
    links: Arc<Mutex<Vec<ReportCreatorLink>>>,
    faults: FaultInjector,
}

impl MockCreatorLinkRepository {
    pub fn new(faults: FaultInjector) -> Self {
        Self {
            links: Arc::new(Mutex::new(Vec::new())),
            faults,
        }
    }

    pub fn count(&self) -> usize {
        self.links.lock().unwrap().len()
    }
}

#[async_trait]
impl ReportCreatorLinkRepository for MockCreatorLinkRepository {
    async fn create(&self, link: &ReportCreatorLink) -> ReportResult<ReportCreatorLink> {
        self.faults.check("creator_links.create").await?;
        let mut links = self.links.lock().unwrap();
        if links.iter().any(|l| l.report_id == link.report_id) {
            return Err(ReportError::Conflict(format!(
                "creator link for report {} already exists",
                link.report_id
            )));
        }
        links.push(link.clone());
        Ok(link.clone())
    }

    async fn get_by_report_id(&self, report_id: i64) -> ReportResult<Option<ReportCreatorLink>> {
        self.faults.check("creator_links.get").await?;
        let links = self.links.lock().unwrap();
        Ok(links.iter().find(|l| l.report_id == report_id).cloned())
    }

    async fn delete_by_report_id(&self, report_id: i64) -> ReportResult<bool> {
        self.faults.check("creator_links.delete").await?;
        let mut links = self.links.lock().unwrap();
        let before = links.len();
        links.retain(|l| l.report_id != report_id);
        Ok(links.len() != before)
    }

    async fn list_report_ids_by_creator(&self, creator_id: &str) -> ReportResult<Vec<i64>> {
        self.faults.check("creator_links.list").await?;
        let links = self.links.lock().unwrap();
        Ok(links
            .iter()
            .filter(|l| l.creator_id == creator_id)
            .map(|l| l.report_id)
            .collect())
    }
}

/// Mock implementation of WorkerRepository for testing
#[derive(Debug, Clone)]
pub struct MockWorkerRepository {
    workers: Arc<Mutex<Vec<Worker>>>,
    faults: FaultInjector,
}

impl MockWorkerRepository {
    pub fn new(faults: FaultInjector) -> Self {
        Self {
            workers: Arc::new(Mutex::new(Vec::new())),
            faults,
        }
    }

    pub fn add(&self, worker: Worker) {
        self.workers.lock().unwrap().push(worker);
    }
}

#[async_trait]
impl WorkerRepository for MockWorkerRepository {
    async fn list_by_department(&self, department: Department) -> ReportResult<Vec<Worker>> {
        self.faults.check("workers.list").await?;
        let workers = self.workers.lock().unwrap();
        Ok(workers
            .iter()
            .filter(|w| w.department == department)
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: &str) -> ReportResult<Option<Worker>> {
        self.faults.check("workers.get").await?;
        let workers = self.workers.lock().unwrap();
        Ok(workers.iter().find(|w| w.id == id).cloned())
    }

    async fn register(&self, worker: &Worker) -> ReportResult<()> {
        self.faults.check("workers.register").await?;
        let mut workers = self.workers.lock().unwrap();
        workers.retain(|w| w.id != worker.id);
        workers.push(worker.clone());
        Ok(())
    }
}

/// All five mock repositories sharing one fault injector
#[derive(Debug, Clone)]
pub struct MockRecordStore {
    pub faults: FaultInjector,
    pub places: MockPlaceRepository,
    pub reports: MockReportRepository,
    pub subject_objects: MockSubjectObjectRepository,
    pub creator_links: MockCreatorLinkRepository,
    pub workers: MockWorkerRepository,
}

impl MockRecordStore {
    pub fn new() -> Self {
        let faults = FaultInjector::new();
        Self {
            places: MockPlaceRepository::new(faults.clone()),
            reports: MockReportRepository::new(faults.clone()),
            subject_objects: MockSubjectObjectRepository::new(faults.clone()),
            creator_links: MockCreatorLinkRepository::new(faults.clone()),
            workers: MockWorkerRepository::new(faults.clone()),
            faults,
        }
    }

    /// A store whose places collection has no uniqueness constraint
    pub fn without_unique_places() -> Self {
        let mut store = Self::new();
        store.places = store.places.without_unique_constraint();
        store
    }

    pub fn record_store(&self) -> RecordStore {
        RecordStore::new(
            Arc::new(self.places.clone()),
            Arc::new(self.reports.clone()),
            Arc::new(self.subject_objects.clone()),
            Arc::new(self.creator_links.clone()),
            Arc::new(self.workers.clone()),
        )
    }
}

impl Default for MockRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Recorded object store upload
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub key_hint: String,
    pub content_type: String,
    pub data: Bytes,
    pub url: String,
}

/// Mock implementation of ObjectStore for testing
#[derive(Debug, Clone, Default)]
pub struct MockObjectStore {
    blobs: Arc<Mutex<Vec<StoredBlob>>>,
    failing_keys: Arc<Mutex<HashSet<String>>>,
    fail_all: Arc<Mutex<bool>>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail uploads whose key hint contains `fragment`, e.g. a file name
    pub fn fail_uploads_containing(&self, fragment: &str) {
        self.failing_keys
            .lock()
            .unwrap()
            .insert(fragment.to_string());
    }

    pub fn fail_all(&self, fail: bool) {
        *self.fail_all.lock().unwrap() = fail;
    }

    pub fn blobs(&self) -> Vec<StoredBlob> {
        self.blobs.lock().unwrap().clone()
    }

    pub fn upload_count(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn put(&self, key_hint: &str, content_type: &str, data: Bytes) -> ReportResult<String> {
        let failing = *self.fail_all.lock().unwrap()
            || self
                .failing_keys
                .lock()
                .unwrap()
                .iter()
                .any(|fragment| key_hint.contains(fragment.as_str()));
        if failing {
            return Err(ReportError::dependency(
                "object_store.put",
                format!("injected upload failure for {key_hint}"),
            ));
        }

        let mut blobs = self.blobs.lock().unwrap();
        let url = format!("mem://attachments/{}/{}", blobs.len() + 1, key_hint);
        blobs.push(StoredBlob {
            key_hint: key_hint.to_string(),
            content_type: content_type.to_string(),
            data,
            url: url.clone(),
        });
        Ok(url)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Mock implementation of Notifier for testing
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
    sent: Arc<Mutex<Vec<(NotificationRecipient, NotificationPayload)>>>,
    attempts: Arc<AtomicUsize>,
    failing: Arc<Mutex<bool>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let notifier = Self::new();
        notifier.set_failing(true);
        notifier
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn sent(&self) -> Vec<(NotificationRecipient, NotificationPayload)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(
        &self,
        recipient: &NotificationRecipient,
        payload: &NotificationPayload,
    ) -> ReportResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if *self.failing.lock().unwrap() {
            return Err(ReportError::dependency(
                "notifier.notify",
                "injected notification failure",
            ));
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient.clone(), payload.clone()));
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Mock implementation of AuthorityCheck for testing
#[derive(Debug, Clone, Default)]
pub struct MockAuthorityCheck {
    authorities: Arc<Mutex<HashSet<String>>>,
}

impl MockAuthorityCheck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_authorities(ids: &[&str]) -> Self {
        let check = Self::new();
        for id in ids {
            check.grant(id);
        }
        check
    }

    pub fn grant(&self, actor_id: &str) {
        self.authorities
            .lock()
            .unwrap()
            .insert(actor_id.to_string());
    }
}

#[async_trait]
impl AuthorityCheck for MockAuthorityCheck {
    async fn has_authority(&self, actor: &Actor) -> ReportResult<bool> {
        Ok(self.authorities.lock().unwrap().contains(&actor.id))
    }
}

/// Alert sink that keeps every alert for assertions
#[derive(Debug, Clone, Default)]
pub struct RecordingAlertSink {
    alerts: Arc<Mutex<Vec<ConsistencyAlert>>>,
}

impl RecordingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<ConsistencyAlert> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConsistencyAlertSink for RecordingAlertSink {
    async fn raise(&self, alert: &ConsistencyAlert) -> ReportResult<()> {
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(())
    }
}
