use async_trait::async_trait;
use bytes::Bytes;

use crate::ReportResult;

/// 二进制对象存储，用于报修照片
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// 上传数据并返回可公开访问的持久引用
    async fn put(&self, key_hint: &str, content_type: &str, data: Bytes) -> ReportResult<String>;

    fn name(&self) -> &str;
}
