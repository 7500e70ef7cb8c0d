use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use reports_core::config::ObjectStoreConfig;
use reports_core::{ObjectStore, ReportError, ReportResult};
use tracing::debug;
use uuid::Uuid;

/// 本地文件系统对象存储
///
/// 每次上传生成新的键 `{目录}/{uuid}-{文件名}`，同名文件不会互相覆盖。
/// 返回的引用是 `{public_base_url}/{键}`，由外部静态文件服务对外提供。
pub struct LocalObjectStore {
    root_dir: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    pub fn new(root_dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ObjectStoreConfig) -> Self {
        Self::new(&config.root_dir, &config.public_base_url)
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// 由提示生成存储键，只保留安全字符，丢弃 `.` 和 `..` 路径段
    fn object_key(key_hint: &str) -> String {
        let mut segments: Vec<String> = key_hint
            .split('/')
            .map(sanitize_segment)
            .filter(|s| !s.is_empty() && s != "." && s != "..")
            .collect();

        let file_name = segments.pop().unwrap_or_else(|| "object".to_string());
        segments.push(format!("{}-{}", Uuid::new_v4().simple(), file_name));
        segments.join("/")
    }
}

fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key_hint: &str, content_type: &str, data: Bytes) -> ReportResult<String> {
        let key = Self::object_key(key_hint);
        let path = self.root_dir.join(&key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ReportError::dependency("object_store.put", format!("创建目录失败: {e}"))
            })?;
        }

        tokio::fs::write(&path, &data).await.map_err(|e| {
            ReportError::dependency(
                "object_store.put",
                format!("写入文件 {} 失败: {e}", path.display()),
            )
        })?;

        debug!(
            "对象已保存: {} ({} 字节, {})",
            key,
            data.len(),
            content_type
        );
        Ok(format!("{}/{}", self.public_base_url, key))
    }

    fn name(&self) -> &str {
        "local"
    }
}
