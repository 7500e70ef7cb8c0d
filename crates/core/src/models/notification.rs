use serde::{Deserialize, Serialize};

use crate::models::ObjectCategory;

/// 通知接收人
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecipient {
    pub worker_id: String,
    pub contact: String,
}

/// 发送给被分配维修人员的新报修单通知
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub report_id: i64,
    pub creator_display_name: String,
    pub description: String,
    pub object_name: String,
    pub object_category: ObjectCategory,
    pub place_name: String,
    pub floor: i32,
    pub attachment_refs: Vec<String>,
}

impl NotificationPayload {
    pub fn title(&self) -> String {
        format!("新报修单 #{}: {}", self.report_id, self.object_name)
    }

    pub fn body(&self) -> String {
        format!(
            "{} 报修了 {} ({}楼) 的 {}: {}",
            self.creator_display_name,
            self.place_name,
            self.floor,
            self.object_name,
            self.description
        )
    }
}
