use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use rand::seq::IndexedRandom;
use tracing::debug;

use reports_core::{CallContext, Department, ReportRepository, ReportResult, Worker};

/// 维修人员选择策略
#[async_trait]
pub trait AssignmentStrategy: Send + Sync {
    async fn select_worker(
        &self,
        ctx: &CallContext,
        department: Department,
        candidates: &[Worker],
    ) -> ReportResult<Option<Worker>>;

    fn name(&self) -> &str;
}

/// 在候选人中均匀随机选择，不考虑当前负载
///
/// 不需要实时负载计数，也就没有跨调用的共享状态；代价是小样本下不保证均衡。
pub struct RandomStrategy;

/// 选择未解决报修单最少的维修人员，负载相同时随机打破平局
///
/// 负载每次都从记录存储读取，策略本身不保存状态。
pub struct LeastLoadedStrategy {
    reports: Arc<dyn ReportRepository>,
}

impl RandomStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RandomStrategy {
    fn default() -> Self {
        Self::new()
    }
}

fn eligible(department: Department, candidates: &[Worker]) -> Vec<&Worker> {
    candidates
        .iter()
        .filter(|worker| worker.belongs_to(department))
        .collect()
}

#[async_trait]
impl AssignmentStrategy for RandomStrategy {
    async fn select_worker(
        &self,
        _ctx: &CallContext,
        department: Department,
        candidates: &[Worker],
    ) -> ReportResult<Option<Worker>> {
        let pool = eligible(department, candidates);
        if pool.is_empty() {
            debug!("部门 {} 没有可用的维修人员", department);
            return Ok(None);
        }

        let selected = pool.choose(&mut rand::rng()).map(|worker| (*worker).clone());
        if let Some(worker) = &selected {
            debug!(
                "随机策略选择维修人员: {} (候选人数: {})",
                worker.id,
                pool.len()
            );
        }
        Ok(selected)
    }

    fn name(&self) -> &str {
        "Random"
    }
}

impl LeastLoadedStrategy {
    pub fn new(reports: Arc<dyn ReportRepository>) -> Self {
        Self { reports }
    }
}

#[async_trait]
impl AssignmentStrategy for LeastLoadedStrategy {
    async fn select_worker(
        &self,
        ctx: &CallContext,
        department: Department,
        candidates: &[Worker],
    ) -> ReportResult<Option<Worker>> {
        let pool = eligible(department, candidates);
        if pool.is_empty() {
            debug!("部门 {} 没有可用的维修人员", department);
            return Ok(None);
        }

        let loads = try_join_all(pool.iter().map(|worker| {
            ctx.run(
                "count_open_by_worker",
                self.reports.count_open_by_worker(&worker.id),
            )
        }))
        .await?;

        let min_load = loads.iter().copied().min().unwrap_or(0);
        let least_loaded: Vec<&Worker> = pool
            .iter()
            .zip(loads.iter())
            .filter(|(_, load)| **load == min_load)
            .map(|(worker, _)| *worker)
            .collect();

        let selected = least_loaded
            .choose(&mut rand::rng())
            .map(|worker| (*worker).clone());
        if let Some(worker) = &selected {
            debug!(
                "最少负载策略选择维修人员: {} (未解决报修单: {}, 同负载人数: {})",
                worker.id,
                min_load,
                least_loaded.len()
            );
        }
        Ok(selected)
    }

    fn name(&self) -> &str {
        "LeastLoaded"
    }
}
