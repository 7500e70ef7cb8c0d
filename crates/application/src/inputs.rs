use bytes::Bytes;
use serde::{Deserialize, Serialize};

use reports_core::{Actor, Department, ObjectCategory};

/// 一张待上传的照片或其他附件
#[derive(Debug, Clone)]
pub struct AttachmentUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl AttachmentUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// 创建报修单的完整输入
#[derive(Debug, Clone)]
pub struct CreateReportInput {
    pub description: String,
    pub department: Department,
    pub object_name: String,
    pub object_category: ObjectCategory,
    pub place_name: String,
    pub floor: i32,
    pub creator: Actor,
    pub attachments: Vec<AttachmentUpload>,
}

/// 某个附件上传失败的记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentFailure {
    /// 附件在输入列表中的位置
    pub index: usize,
    pub file_name: String,
    pub error: String,
}
