use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use reports_core::{
    Actor, CallContext, ConsistencyAlert, ConsistencyAlertSink, NotificationPayload,
    NotificationRecipient, Notifier, ObjectStore, RecordStore, Report, ReportCreatorLink,
    ReportError, ReportResult, SubjectObject, Worker,
};
use reports_dispatcher::AssignmentSelector;

use crate::inputs::{AttachmentFailure, AttachmentUpload, CreateReportInput};
use crate::use_cases::place_resolver::PlaceResolver;
use crate::validation::InputValidator;

/// 一次创建编排所处的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestrationStage {
    Validating,
    Assigning,
    ResolvingPlace,
    PersistingCore,
    UploadingAttachments,
    Notifying,
    Done,
    RollingBack,
    Failed,
}

impl fmt::Display for OrchestrationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrchestrationStage::Validating => "Validating",
            OrchestrationStage::Assigning => "Assigning",
            OrchestrationStage::ResolvingPlace => "ResolvingPlace",
            OrchestrationStage::PersistingCore => "PersistingCore",
            OrchestrationStage::UploadingAttachments => "UploadingAttachments",
            OrchestrationStage::Notifying => "Notifying",
            OrchestrationStage::Done => "Done",
            OrchestrationStage::RollingBack => "RollingBack",
            OrchestrationStage::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// 通知步骤的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationOutcome {
    Sent,
    Failed(String),
    /// 没有负责的维修人员，无人可通知
    Skipped,
}

/// 报修单创建结果。附件或通知失败不会让创建失败，而是记录在这里
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReportOutcome {
    pub report_id: i64,
    pub assigned_worker_id: Option<String>,
    pub place_id: i64,
    pub attachment_refs: Vec<String>,
    pub attachment_failures: Vec<AttachmentFailure>,
    pub notification: NotificationOutcome,
}

impl CreateReportOutcome {
    /// 报修单已创建，但附件或通知至少有一项失败
    pub fn is_partial_success(&self) -> bool {
        !self.attachment_failures.is_empty()
            || matches!(self.notification, NotificationOutcome::Failed(_))
    }

    pub fn warnings(&self) -> Vec<String> {
        let mut warnings: Vec<String> = self
            .attachment_failures
            .iter()
            .map(|f| format!("附件 {} 上传失败: {}", f.file_name, f.error))
            .collect();
        if let NotificationOutcome::Failed(reason) = &self.notification {
            warnings.push(format!("通知维修人员失败: {reason}"));
        }
        warnings
    }
}

/// 单独重试附件上传的结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttachmentBatchOutcome {
    pub attachment_refs: Vec<String>,
    pub failures: Vec<AttachmentFailure>,
}

/// 已写入、补偿时需要撤销的核心记录，按撤销顺序排列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CoreRecord {
    SubjectObject,
    CreatorLink,
    Report,
}

impl CoreRecord {
    fn label(&self, report_id: i64) -> String {
        match self {
            CoreRecord::SubjectObject => format!("subject_object(report_id={report_id})"),
            CoreRecord::CreatorLink => format!("report_creator_link(report_id={report_id})"),
            CoreRecord::Report => format!("report(id={report_id})"),
        }
    }
}

/// 报修单创建编排器
///
/// 顺序执行：校验、分配、解析场所、写入核心记录、上传附件、通知。
/// 第 4 到 6 步失败（包括取消）时删除已写入的核心记录；补偿本身失败时发出一致性告警
/// 并返回 `ConsistencyViolation`。附件和通知是软失败，只记录在结果里。
pub struct ReportOrchestrator {
    store: RecordStore,
    selector: Arc<AssignmentSelector>,
    place_resolver: PlaceResolver,
    object_store: Arc<dyn ObjectStore>,
    notifier: Arc<dyn Notifier>,
    alerts: Arc<dyn ConsistencyAlertSink>,
    validator: InputValidator,
}

impl ReportOrchestrator {
    pub fn new(
        store: RecordStore,
        selector: Arc<AssignmentSelector>,
        object_store: Arc<dyn ObjectStore>,
        notifier: Arc<dyn Notifier>,
        alerts: Arc<dyn ConsistencyAlertSink>,
        validator: InputValidator,
    ) -> Self {
        let place_resolver = PlaceResolver::new(store.places.clone(), validator.clone());
        Self {
            store,
            selector,
            place_resolver,
            object_store,
            notifier,
            alerts,
            validator,
        }
    }

    /// 创建报修单
    #[instrument(
        skip(self, ctx, input),
        fields(department = %input.department, creator = %input.creator.id)
    )]
    pub async fn create_report(
        &self,
        ctx: &CallContext,
        input: CreateReportInput,
    ) -> ReportResult<CreateReportOutcome> {
        enter_stage(OrchestrationStage::Validating);
        self.validator.validate_create(&input)?;

        enter_stage(OrchestrationStage::Assigning);
        let worker = self.selector.select_worker(ctx, input.department).await?;

        enter_stage(OrchestrationStage::ResolvingPlace);
        let place_id = self
            .place_resolver
            .resolve(ctx, &input.place_name, input.floor)
            .await?;

        enter_stage(OrchestrationStage::PersistingCore);
        let report = self.persist_core(ctx, &input, worker.as_ref(), place_id).await?;
        metrics::counter!("reports_created_total").increment(1);
        info!("报修单已创建: {}", report.entity_description());

        enter_stage(OrchestrationStage::UploadingAttachments);
        let uploads = self
            .upload_attachments(ctx, report.id, &input.attachments)
            .await;

        enter_stage(OrchestrationStage::Notifying);
        let notification = match &worker {
            Some(worker) => {
                let payload = NotificationPayload {
                    report_id: report.id,
                    creator_display_name: input.creator.display_name.clone(),
                    description: report.description.clone(),
                    object_name: input.object_name.trim().to_string(),
                    object_category: input.object_category,
                    place_name: input.place_name.trim().to_string(),
                    floor: input.floor,
                    attachment_refs: uploads.attachment_refs.clone(),
                };
                self.notify(ctx, worker, &payload).await
            }
            None => {
                debug!("报修单 {} 未分配维修人员，跳过通知", report.id);
                NotificationOutcome::Skipped
            }
        };

        enter_stage(OrchestrationStage::Done);
        let outcome = CreateReportOutcome {
            report_id: report.id,
            assigned_worker_id: report.assigned_worker_id.clone(),
            place_id,
            attachment_refs: uploads.attachment_refs,
            attachment_failures: uploads.failures,
            notification,
        };

        if outcome.is_partial_success() {
            warn!(
                "报修单 {} 已创建，但部分步骤失败: {:?}",
                outcome.report_id,
                outcome.warnings()
            );
        }

        Ok(outcome)
    }

    /// 单独重试附件上传，只有报修单的创建者可以操作
    #[instrument(skip(self, ctx, actor, attachments), fields(actor = %actor.id))]
    pub async fn retry_attachments(
        &self,
        ctx: &CallContext,
        report_id: i64,
        actor: &Actor,
        attachments: Vec<AttachmentUpload>,
    ) -> ReportResult<AttachmentBatchOutcome> {
        let report = self.load_report(ctx, report_id).await?;
        if report.creator_id != actor.id {
            return Err(ReportError::permission(format!(
                "用户 {} 不是报修单 {} 的创建者",
                actor.id, report_id
            )));
        }

        self.validator
            .validate_attachments(&attachments, report.attachment_refs.len())?;

        let outcome = self.upload_attachments(ctx, report_id, &attachments).await;
        info!(
            "报修单 {} 附件重试完成: {} 成功，{} 失败",
            report_id,
            outcome.attachment_refs.len(),
            outcome.failures.len()
        );
        Ok(outcome)
    }

    /// 单独重新发送通知，内容从已保存的记录重建
    ///
    /// 报修人显示名没有持久化，重发时使用报修人ID。
    #[instrument(skip(self, ctx))]
    pub async fn renotify(
        &self,
        ctx: &CallContext,
        report_id: i64,
    ) -> ReportResult<NotificationOutcome> {
        let report = self.load_report(ctx, report_id).await?;
        let Some(worker_id) = report.assigned_worker_id.clone() else {
            debug!("报修单 {} 未分配维修人员，无需通知", report_id);
            return Ok(NotificationOutcome::Skipped);
        };

        let worker = ctx
            .run("get_worker", self.store.workers.get_by_id(&worker_id))
            .await?
            .ok_or_else(|| ReportError::worker_not_found(&worker_id))?;

        let subject = ctx
            .run(
                "get_subject_object",
                self.store.subject_objects.get_by_report_id(report_id),
            )
            .await?
            .ok_or_else(|| {
                ReportError::Internal(format!("报修单 {report_id} 缺少报修对象记录"))
            })?;

        let place = ctx
            .run("get_place", self.store.places.get_by_id(subject.place_id))
            .await?
            .ok_or_else(|| {
                ReportError::Internal(format!("报修对象引用的场所 {} 不存在", subject.place_id))
            })?;

        let payload = NotificationPayload {
            report_id,
            creator_display_name: report.creator_id.clone(),
            description: report.description.clone(),
            object_name: subject.name,
            object_category: subject.category,
            place_name: place.name,
            floor: place.floor,
            attachment_refs: report.attachment_refs.clone(),
        };

        Ok(self.notify(ctx, &worker, &payload).await)
    }

    /// 第 4 到 6 步：报修单、创建者关联、报修对象
    async fn persist_core(
        &self,
        ctx: &CallContext,
        input: &CreateReportInput,
        worker: Option<&Worker>,
        place_id: i64,
    ) -> ReportResult<Report> {
        let draft = Report::new(
            input.description.trim(),
            input.creator.id.clone(),
            worker.map(|w| w.id.clone()),
        );

        // 写入在独立任务中进行。超时或取消时还拿不到编号，
        // 由后台任务等它结束，落库了就删掉
        let reports = Arc::clone(&self.store.reports);
        let mut pending = tokio::spawn(async move { reports.create(&draft).await });
        let mut settled = false;
        let created = ctx
            .run("create_report", async {
                let joined = (&mut pending).await;
                settled = true;
                joined.map_err(|e| ReportError::Internal(format!("报修单写入任务异常结束: {e}")))?
            })
            .await;
        let report = match created {
            Ok(report) => report,
            Err(e) => {
                if !settled {
                    self.reap_unconfirmed_report(pending, &e);
                }
                return Err(e);
            }
        };

        let link = ReportCreatorLink::new(report.id, input.creator.id.clone());
        if let Err(e) = ctx
            .run("create_creator_link", self.store.creator_links.create(&link))
            .await
        {
            return Err(self
                .compensate(ctx, report.id, &[CoreRecord::CreatorLink, CoreRecord::Report], e)
                .await);
        }

        let subject = SubjectObject::new(
            input.object_name.trim(),
            input.object_category,
            place_id,
            report.id,
        );
        if let Err(e) = ctx
            .run(
                "create_subject_object",
                self.store.subject_objects.create(&subject),
            )
            .await
        {
            return Err(self
                .compensate(
                    ctx,
                    report.id,
                    &[
                        CoreRecord::SubjectObject,
                        CoreRecord::CreatorLink,
                        CoreRecord::Report,
                    ],
                    e,
                )
                .await);
        }

        Ok(report)
    }

    /// 超时或取消时仍在进行的报修单写入：等它结束，已落库则删除，删除失败时发出一致性告警
    fn reap_unconfirmed_report(
        &self,
        pending: JoinHandle<ReportResult<Report>>,
        cause: &ReportError,
    ) {
        let reports = Arc::clone(&self.store.reports);
        let alerts = Arc::clone(&self.alerts);
        let cause = cause.to_string();

        tokio::spawn(async move {
            let report = match pending.await {
                Ok(Ok(report)) => report,
                Ok(Err(e)) => {
                    debug!("未确认的报修单写入最终失败，无需清理: {}", e);
                    return;
                }
                Err(e) => {
                    error!("未确认的报修单写入任务异常结束: {}", e);
                    return;
                }
            };

            warn!("报修单 {} 在调用方放弃后才写入，删除该记录", report.id);
            metrics::counter!("reports_compensated_total").increment(1);
            match reports.delete(report.id).await {
                Ok(_) => info!("报修单 {} 清理完成", report.id),
                Err(e) => {
                    let orphaned = vec![CoreRecord::Report.label(report.id)];
                    error!(
                        "数据一致性被破坏: 报修单 {} 遗留孤立记录 {:?}",
                        report.id, orphaned
                    );
                    let alert = ConsistencyAlert::new(report.id, orphaned, cause, e.to_string());
                    if let Err(e) = alerts.raise(&alert).await {
                        error!("一致性告警发送失败: {}", e);
                    }
                }
            }
        });
    }

    /// 按顺序撤销已写入的记录。超时的写入可能已经生效，所以失败的那一步也一并删除
    ///
    /// 补偿使用不响应取消的上下文，被取消的编排同样会回滚。
    async fn compensate(
        &self,
        ctx: &CallContext,
        report_id: i64,
        records: &[CoreRecord],
        cause: ReportError,
    ) -> ReportError {
        enter_stage(OrchestrationStage::RollingBack);
        warn!("报修单 {} 核心记录写入失败，开始补偿: {}", report_id, cause);
        metrics::counter!("reports_compensated_total").increment(1);

        let rollback = ctx.detached();
        let mut orphaned = Vec::new();
        let mut failures = Vec::new();

        for record in records {
            let deleted = match record {
                CoreRecord::SubjectObject => {
                    rollback
                        .run(
                            "delete_subject_object",
                            self.store.subject_objects.delete_by_report_id(report_id),
                        )
                        .await
                }
                CoreRecord::CreatorLink => {
                    rollback
                        .run(
                            "delete_creator_link",
                            self.store.creator_links.delete_by_report_id(report_id),
                        )
                        .await
                }
                CoreRecord::Report => {
                    rollback
                        .run("delete_report", self.store.reports.delete(report_id))
                        .await
                }
            };

            match deleted {
                Ok(existed) => debug!("补偿删除 {}: 存在={}", record.label(report_id), existed),
                Err(e) => {
                    error!("补偿删除 {} 失败: {}", record.label(report_id), e);
                    orphaned.push(record.label(report_id));
                    failures.push(e.to_string());
                }
            }
        }

        enter_stage(OrchestrationStage::Failed);
        if orphaned.is_empty() {
            info!("报修单 {} 补偿完成", report_id);
            return cause;
        }

        let compensation_error = failures.join("; ");
        let alert = ConsistencyAlert::new(
            report_id,
            orphaned.clone(),
            cause.to_string(),
            compensation_error.clone(),
        );
        error!(
            "数据一致性被破坏: 报修单 {} 遗留孤立记录 {:?}",
            report_id, orphaned
        );
        if let Err(e) = self.alerts.raise(&alert).await {
            error!("一致性告警发送失败: {}", e);
        }

        ReportError::ConsistencyViolation {
            report_id,
            orphaned,
            message: format!("原因: {cause}; 补偿失败: {compensation_error}"),
        }
    }

    /// 并发上传全部附件，再一次性按输入顺序追加引用
    async fn upload_attachments(
        &self,
        ctx: &CallContext,
        report_id: i64,
        attachments: &[AttachmentUpload],
    ) -> AttachmentBatchOutcome {
        if attachments.is_empty() {
            return AttachmentBatchOutcome::default();
        }

        let results = join_all(attachments.iter().enumerate().map(|(index, attachment)| {
            let key_hint = format!("report-{report_id}/{index}-{}", attachment.file_name);
            async move {
                ctx.run(
                    "upload_attachment",
                    self.object_store.put(
                        &key_hint,
                        &attachment.content_type,
                        attachment.bytes.clone(),
                    ),
                )
                .await
            }
        }))
        .await;

        let mut uploaded = Vec::new();
        let mut failures = Vec::new();
        for ((index, attachment), result) in attachments.iter().enumerate().zip(results) {
            match result {
                Ok(reference) => uploaded.push((index, attachment, reference)),
                Err(e) => {
                    warn!("附件 {} 上传失败: {}", attachment.file_name, e);
                    failures.push(AttachmentFailure {
                        index,
                        file_name: attachment.file_name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let refs: Vec<String> = uploaded.iter().map(|(_, _, r)| r.clone()).collect();
        let attachment_refs = if refs.is_empty() {
            refs
        } else {
            match ctx
                .run(
                    "append_attachments",
                    self.store.reports.append_attachments(
                        report_id,
                        &refs,
                        self.validator.limits().max_attachments,
                    ),
                )
                .await
            {
                Ok(()) => refs,
                Err(e) => {
                    warn!("报修单 {} 附件引用写入失败: {}", report_id, e);
                    for (index, attachment, _) in &uploaded {
                        failures.push(AttachmentFailure {
                            index: *index,
                            file_name: attachment.file_name.clone(),
                            error: format!("附件已上传但引用写入失败: {e}"),
                        });
                    }
                    failures.sort_by_key(|f| f.index);
                    Vec::new()
                }
            }
        };

        if !failures.is_empty() {
            metrics::counter!("report_attachment_failures_total").increment(failures.len() as u64);
        }

        AttachmentBatchOutcome {
            attachment_refs,
            failures,
        }
    }

    async fn notify(
        &self,
        ctx: &CallContext,
        worker: &Worker,
        payload: &NotificationPayload,
    ) -> NotificationOutcome {
        let recipient = NotificationRecipient {
            worker_id: worker.id.clone(),
            contact: worker.contact.clone(),
        };

        match ctx
            .run("notify_worker", self.notifier.notify(&recipient, payload))
            .await
        {
            Ok(()) => {
                info!(
                    "已通过 {} 通知维修人员 {} (报修单 {})",
                    self.notifier.name(),
                    worker.id,
                    payload.report_id
                );
                NotificationOutcome::Sent
            }
            Err(e) => {
                warn!("通知维修人员 {} 失败: {}", worker.id, e);
                metrics::counter!("report_notification_failures_total").increment(1);
                NotificationOutcome::Failed(e.to_string())
            }
        }
    }

    async fn load_report(&self, ctx: &CallContext, report_id: i64) -> ReportResult<Report> {
        ctx.run("get_report", self.store.reports.get_by_id(report_id))
            .await?
            .ok_or_else(|| ReportError::report_not_found(report_id))
    }
}

fn enter_stage(stage: OrchestrationStage) {
    debug!(stage = %stage, "编排阶段");
}
