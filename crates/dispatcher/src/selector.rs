use std::sync::Arc;

use tracing::{info, instrument};

use reports_core::config::AssignmentStrategyKind;
use reports_core::{
    CallContext, Department, ReportRepository, ReportResult, Worker, WorkerRepository,
};

use crate::strategies::{AssignmentStrategy, LeastLoadedStrategy, RandomStrategy};

/// 按部门选择负责的维修人员
///
/// 纯读取操作：拉取部门名册，交给策略选择。名册为空时返回 `None`，
/// 未分配的报修单是合法且可见的状态。
pub struct AssignmentSelector {
    workers: Arc<dyn WorkerRepository>,
    strategy: Arc<dyn AssignmentStrategy>,
}

impl AssignmentSelector {
    pub fn new(workers: Arc<dyn WorkerRepository>, strategy: Arc<dyn AssignmentStrategy>) -> Self {
        Self { workers, strategy }
    }

    pub fn random(workers: Arc<dyn WorkerRepository>) -> Self {
        Self::new(workers, Arc::new(RandomStrategy::new()))
    }

    pub fn from_kind(
        kind: AssignmentStrategyKind,
        workers: Arc<dyn WorkerRepository>,
        reports: Arc<dyn ReportRepository>,
    ) -> Self {
        let strategy: Arc<dyn AssignmentStrategy> = match kind {
            AssignmentStrategyKind::Random => Arc::new(RandomStrategy::new()),
            AssignmentStrategyKind::LeastLoaded => Arc::new(LeastLoadedStrategy::new(reports)),
        };
        Self::new(workers, strategy)
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    /// 返回被选中的维修人员ID
    pub async fn select(
        &self,
        ctx: &CallContext,
        department: Department,
    ) -> ReportResult<Option<String>> {
        Ok(self
            .select_worker(ctx, department)
            .await?
            .map(|worker| worker.id))
    }

    /// 返回被选中的维修人员完整信息（通知需要联系方式）
    #[instrument(skip(self, ctx), fields(strategy = %self.strategy.name()))]
    pub async fn select_worker(
        &self,
        ctx: &CallContext,
        department: Department,
    ) -> ReportResult<Option<Worker>> {
        let pool = ctx
            .run("list_workers_by_department", self.workers.list_by_department(department))
            .await?;

        let selected = self.strategy.select_worker(ctx, department, &pool).await?;
        match &selected {
            Some(worker) => info!("部门 {} 的报修单分配给维修人员 {}", department, worker.id),
            None => info!("部门 {} 没有维修人员，报修单保持未分配", department),
        }
        Ok(selected)
    }
}
