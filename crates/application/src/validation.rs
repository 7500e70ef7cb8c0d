//! 输入校验
//!
//! 界面层的校验不可信，所有边界在任何写入之前于此重新检查。

use reports_core::config::LimitsConfig;
use reports_core::{ReportError, ReportResult};

use crate::inputs::{AttachmentUpload, CreateReportInput};

/// 基于 `LimitsConfig` 的输入校验器
#[derive(Debug, Clone, Default)]
pub struct InputValidator {
    limits: LimitsConfig,
}

impl InputValidator {
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    /// 创建报修单前的完整校验，任何一项失败都不会产生副作用
    pub fn validate_create(&self, input: &CreateReportInput) -> ReportResult<()> {
        check_text("报修描述", &input.description, self.limits.max_description_len)?;
        check_text("报修对象名称", &input.object_name, self.limits.max_object_name_len)?;
        self.validate_place(&input.place_name, input.floor)?;

        if input.creator.id.trim().is_empty() {
            return Err(ReportError::validation_error("报修人身份不能为空"));
        }

        self.validate_attachments(&input.attachments, 0)
    }

    pub fn validate_place(&self, name: &str, floor: i32) -> ReportResult<()> {
        check_text("场所名称", name, self.limits.max_place_name_len)?;

        if floor < 1 {
            return Err(ReportError::validation_error(format!(
                "楼层必须是正整数，实际为 {floor}"
            )));
        }
        if floor > self.limits.max_floor {
            return Err(ReportError::validation_error(format!(
                "楼层 {floor} 超过上限 {}",
                self.limits.max_floor
            )));
        }

        Ok(())
    }

    /// 校验一批附件；`existing` 是报修单上已有的附件数量
    pub fn validate_attachments(
        &self,
        attachments: &[AttachmentUpload],
        existing: usize,
    ) -> ReportResult<()> {
        let total = existing + attachments.len();
        if total > self.limits.max_attachments {
            return Err(ReportError::validation_error(format!(
                "附件数量 {total} 超过上限 {}",
                self.limits.max_attachments
            )));
        }

        for (index, attachment) in attachments.iter().enumerate() {
            if attachment.file_name.trim().is_empty() {
                return Err(ReportError::validation_error(format!(
                    "第 {} 个附件缺少文件名",
                    index + 1
                )));
            }
            if attachment.content_type.trim().is_empty() {
                return Err(ReportError::validation_error(format!(
                    "附件 {} 缺少内容类型",
                    attachment.file_name
                )));
            }
            if attachment.is_empty() {
                return Err(ReportError::validation_error(format!(
                    "附件 {} 内容为空",
                    attachment.file_name
                )));
            }
            if attachment.len() > self.limits.max_attachment_bytes {
                return Err(ReportError::validation_error(format!(
                    "附件 {} 大小 {} 字节超过上限 {} 字节",
                    attachment.file_name,
                    attachment.len(),
                    self.limits.max_attachment_bytes
                )));
            }
        }

        Ok(())
    }

    pub fn validate_comment(&self, comment: &str) -> ReportResult<()> {
        let len = comment.chars().count();
        if len > self.limits.max_comment_len {
            return Err(ReportError::validation_error(format!(
                "备注长度 {len} 超过上限 {}",
                self.limits.max_comment_len
            )));
        }
        Ok(())
    }
}

fn check_text(field: &str, value: &str, max_len: usize) -> ReportResult<()> {
    if value.trim().is_empty() {
        return Err(ReportError::validation_error(format!("{field}不能为空")));
    }

    let len = value.chars().count();
    if len > max_len {
        return Err(ReportError::validation_error(format!(
            "{field}长度 {len} 超过上限 {max_len}"
        )));
    }

    Ok(())
}
