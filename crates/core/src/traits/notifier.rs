use async_trait::async_trait;

use crate::models::{NotificationPayload, NotificationRecipient};
use crate::ReportResult;

/// 尽力而为的通知投递
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        recipient: &NotificationRecipient,
        payload: &NotificationPayload,
    ) -> ReportResult<()>;

    fn name(&self) -> &str;
}
