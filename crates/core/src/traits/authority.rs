use async_trait::async_trait;

use crate::models::Actor;
use crate::ReportResult;

/// 外部身份系统提供的管理权限检查
#[async_trait]
pub trait AuthorityCheck: Send + Sync {
    async fn has_authority(&self, actor: &Actor) -> ReportResult<bool>;
}
