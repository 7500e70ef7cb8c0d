use std::sync::Arc;

use async_trait::async_trait;
use reports_core::{Actor, AuthorityCheck, ReportResult, WorkerRepository};
use tracing::debug;

/// 名册中可以改派和重新打开报修单的职级
pub const DEFAULT_AUTHORITY_RANKS: &[&str] = &["supervisor", "manager"];

/// 管理权限检查
///
/// 只按维修人员名册判定：调用方在名册中且职级属于管理职级时具备权限。
/// 调用方自带的角色不参与判定。
pub struct RosterAuthority {
    workers: Arc<dyn WorkerRepository>,
    authority_ranks: Vec<String>,
}

impl RosterAuthority {
    pub fn new(workers: Arc<dyn WorkerRepository>) -> Self {
        Self::with_ranks(workers, DEFAULT_AUTHORITY_RANKS)
    }

    pub fn with_ranks(workers: Arc<dyn WorkerRepository>, ranks: &[&str]) -> Self {
        Self {
            workers,
            authority_ranks: ranks.iter().map(|r| r.to_ascii_lowercase()).collect(),
        }
    }
}

#[async_trait]
impl AuthorityCheck for RosterAuthority {
    async fn has_authority(&self, actor: &Actor) -> ReportResult<bool> {
        let permitted = match self.workers.get_by_id(&actor.id).await? {
            Some(worker) => self
                .authority_ranks
                .contains(&worker.rank.to_ascii_lowercase()),
            None => false,
        };
        debug!("用户 {} (角色 {:?}) 管理权限: {}", actor.id, actor.role, permitted);
        Ok(permitted)
    }
}
