use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    /// 照片落盘目录
    pub root_dir: String,
    /// 对外公开访问的基础URL，引用为 `{public_base_url}/{key}`
    pub public_base_url: String,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            root_dir: "data/attachments".to_string(),
            public_base_url: "http://localhost:8080/attachments".to_string(),
        }
    }
}

impl ObjectStoreConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.root_dir.is_empty() {
            return Err(anyhow::anyhow!("对象存储目录不能为空"));
        }

        if self.public_base_url.is_empty() {
            return Err(anyhow::anyhow!("对象存储公开URL不能为空"));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifierKind {
    Log,
    Webhook,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    pub kind: NotifierKind,
    pub webhook_url: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            kind: NotifierKind::Log,
            webhook_url: None,
            timeout_seconds: 10,
        }
    }
}

impl NotifierConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.kind == NotifierKind::Webhook {
            match &self.webhook_url {
                Some(url) if url.starts_with("http://") || url.starts_with("https://") => {}
                Some(url) => return Err(anyhow::anyhow!("无效的通知Webhook地址: {}", url)),
                None => return Err(anyhow::anyhow!("webhook通知必须配置webhook_url")),
            }
        }

        if self.timeout_seconds == 0 {
            return Err(anyhow::anyhow!("通知超时时间必须大于0"));
        }

        Ok(())
    }
}

/// 一致性告警配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertConfig {
    /// 告警追加写入的 JSON Lines 文件，未配置时只写日志
    pub journal_path: Option<String>,
}
