use serde::{Deserialize, Serialize};

/// 输入校验边界，不信任界面层已做过的检查
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub max_description_len: usize,
    pub max_object_name_len: usize,
    pub max_place_name_len: usize,
    pub max_comment_len: usize,
    pub max_attachments: usize,
    pub max_attachment_bytes: usize,
    pub max_floor: i32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_description_len: 2000,
            max_object_name_len: 200,
            max_place_name_len: 200,
            max_comment_len: 2000,
            max_attachments: 10,
            max_attachment_bytes: 10 * 1024 * 1024, // 10MB
            max_floor: 200,
        }
    }
}

impl LimitsConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_description_len == 0
            || self.max_object_name_len == 0
            || self.max_place_name_len == 0
            || self.max_comment_len == 0
        {
            return Err(anyhow::anyhow!("文本长度上限必须大于0"));
        }

        if self.max_attachment_bytes == 0 {
            return Err(anyhow::anyhow!("单个附件大小上限必须大于0"));
        }

        if self.max_floor < 1 {
            return Err(anyhow::anyhow!("最高楼层必须大于等于1"));
        }

        Ok(())
    }
}
