use std::sync::Arc;

use tracing::{info, instrument, warn};

use reports_core::config::LifecycleConfig;
use reports_core::{
    Actor, AuthorityCheck, CallContext, Report, ReportError, ReportPriority, ReportRepository,
    ReportResult, ReportStatus, WorkerRepository,
};

use crate::validation::InputValidator;

/// 报修单生命周期控制器
///
/// 状态顺序为 Pending -> InProgress -> Resolved，只能推进到直接后继。
/// 优先级、状态和备注只能由被分配的维修人员修改；改派和重新打开需要管理权限。
/// 每次写入都是以读取时的快照为条件的单次更新：读取之后的改派、推进或其他修改
/// 都会让写入失败并得到 `Conflict`，不会用旧快照覆盖新数据。
pub struct ReportLifecycleController {
    reports: Arc<dyn ReportRepository>,
    workers: Arc<dyn WorkerRepository>,
    authority: Arc<dyn AuthorityCheck>,
    lifecycle: LifecycleConfig,
    validator: InputValidator,
}

impl ReportLifecycleController {
    pub fn new(
        reports: Arc<dyn ReportRepository>,
        workers: Arc<dyn WorkerRepository>,
        authority: Arc<dyn AuthorityCheck>,
        lifecycle: LifecycleConfig,
        validator: InputValidator,
    ) -> Self {
        Self {
            reports,
            workers,
            authority,
            lifecycle,
            validator,
        }
    }

    /// 设置优先级，可同时写入预计处理时间等说明（保存为备注）
    #[instrument(skip(self, ctx, estimate))]
    pub async fn set_priority_and_estimate(
        &self,
        ctx: &CallContext,
        report_id: i64,
        actor_id: &str,
        priority: ReportPriority,
        estimate: Option<String>,
    ) -> ReportResult<Report> {
        if !priority.is_assignable() {
            return Err(ReportError::validation_error(
                "优先级必须是 LOW、MEDIUM、HIGH 或 URGENT 之一",
            ));
        }
        if let Some(estimate) = &estimate {
            self.validator.validate_comment(estimate)?;
        }

        let report = self.load(ctx, report_id).await?;
        ensure_assigned(&report, actor_id)?;
        if !report.is_open() {
            return Err(ReportError::validation_error(format!(
                "报修单 {report_id} 已解决，不能再修改优先级"
            )));
        }

        let mut updated = report.clone();
        updated.priority = priority;
        if let Some(estimate) = estimate {
            updated.comment = estimate;
        }

        self.commit(ctx, &updated, &report).await?;
        info!(
            "报修单 {} 优先级由 {} 设置为 {}",
            report_id, report.priority, priority
        );
        Ok(updated)
    }

    /// 推进到下一个状态
    #[instrument(skip(self, ctx))]
    pub async fn advance(
        &self,
        ctx: &CallContext,
        report_id: i64,
        actor_id: &str,
        target: ReportStatus,
    ) -> ReportResult<Report> {
        let report = self.load(ctx, report_id).await?;
        ensure_assigned(&report, actor_id)?;

        if !report.status.can_advance_to(target) {
            let reason = match report.status.successor() {
                Some(next) => format!("只能推进到 {next}"),
                None => "报修单已解决，不能继续推进".to_string(),
            };
            return Err(ReportError::invalid_transition(
                report_id,
                report.status,
                target,
                reason,
            ));
        }

        let mut updated = report.clone();
        updated.status = target;
        self.commit(ctx, &updated, &report).await?;

        metrics::counter!(
            "report_transitions_total",
            "from" => report.status.as_str(),
            "to" => target.as_str()
        )
        .increment(1);
        info!("报修单 {} 状态由 {} 推进到 {}", report_id, report.status, target);
        Ok(updated)
    }

    #[instrument(skip(self, ctx, comment))]
    pub async fn update_comment(
        &self,
        ctx: &CallContext,
        report_id: i64,
        actor_id: &str,
        comment: String,
    ) -> ReportResult<Report> {
        self.validator.validate_comment(&comment)?;

        let report = self.load(ctx, report_id).await?;
        ensure_assigned(&report, actor_id)?;

        let mut updated = report.clone();
        updated.comment = comment;
        self.commit(ctx, &updated, &report).await?;
        info!("报修单 {} 备注已更新", report_id);
        Ok(updated)
    }

    /// 改派给另一位维修人员，不重新运行分配策略
    #[instrument(skip(self, ctx, actor), fields(actor = %actor.id))]
    pub async fn reassign(
        &self,
        ctx: &CallContext,
        report_id: i64,
        actor: &Actor,
        new_worker_id: &str,
    ) -> ReportResult<Report> {
        self.ensure_authority(ctx, actor, "改派报修单").await?;

        let worker = ctx
            .run("get_worker", self.workers.get_by_id(new_worker_id))
            .await?
            .ok_or_else(|| ReportError::worker_not_found(new_worker_id))?;

        let report = self.load(ctx, report_id).await?;
        let previous = report.assigned_worker_id.clone();

        let mut updated = report.clone();
        updated.assigned_worker_id = Some(worker.id.clone());
        self.commit(ctx, &updated, &report).await?;

        info!(
            "报修单 {} 由 {} 改派: {:?} -> {}",
            report_id, actor.id, previous, worker.id
        );
        Ok(updated)
    }

    /// 把已解决的报修单重新打开为 InProgress，与正常推进分开记录
    #[instrument(skip(self, ctx, actor), fields(actor = %actor.id))]
    pub async fn reopen(
        &self,
        ctx: &CallContext,
        report_id: i64,
        actor: &Actor,
        reason: &str,
    ) -> ReportResult<Report> {
        if !self.lifecycle.allow_reopen {
            return Err(ReportError::invalid_transition(
                report_id,
                ReportStatus::Resolved,
                ReportStatus::InProgress,
                "系统未启用重新打开",
            ));
        }

        self.ensure_authority(ctx, actor, "重新打开报修单").await?;

        let report = self.load(ctx, report_id).await?;
        if report.status != ReportStatus::Resolved {
            return Err(ReportError::invalid_transition(
                report_id,
                report.status,
                ReportStatus::InProgress,
                "只有已解决的报修单可以重新打开",
            ));
        }

        let mut updated = report.clone();
        updated.status = ReportStatus::InProgress;
        self.commit(ctx, &updated, &report).await?;

        metrics::counter!(
            "report_transitions_total",
            "from" => ReportStatus::Resolved.as_str(),
            "to" => ReportStatus::InProgress.as_str()
        )
        .increment(1);
        warn!(
            "报修单 {} 被 {} 重新打开 (RESOLVED -> IN_PROGRESS)，原因: {}",
            report_id, actor.id, reason
        );
        Ok(updated)
    }

    async fn load(&self, ctx: &CallContext, report_id: i64) -> ReportResult<Report> {
        ctx.run("get_report", self.reports.get_by_id(report_id))
            .await?
            .ok_or_else(|| ReportError::report_not_found(report_id))
    }

    async fn commit(
        &self,
        ctx: &CallContext,
        updated: &Report,
        snapshot: &Report,
    ) -> ReportResult<()> {
        let applied = ctx
            .run(
                "update_report",
                self.reports.compare_and_update(updated, snapshot),
            )
            .await?;

        if !applied {
            warn!("报修单 {} 已被并发修改，更新未生效", updated.id);
            return Err(ReportError::Conflict(format!(
                "报修单 {} 在读取后已被修改（状态、优先级、备注或维修人员），请刷新后重试",
                updated.id
            )));
        }
        Ok(())
    }

    async fn ensure_authority(
        &self,
        ctx: &CallContext,
        actor: &Actor,
        action: &str,
    ) -> ReportResult<()> {
        let permitted = ctx
            .run("check_authority", self.authority.has_authority(actor))
            .await?;
        if !permitted {
            return Err(ReportError::permission(format!(
                "用户 {} 没有{}的权限",
                actor.id, action
            )));
        }
        Ok(())
    }
}

fn ensure_assigned(report: &Report, actor_id: &str) -> ReportResult<()> {
    if !report.is_assigned_to(actor_id) {
        return Err(ReportError::permission(format!(
            "用户 {} 不是报修单 {} 的负责维修人员",
            actor_id, report.id
        )));
    }
    Ok(())
}
