//! 记录存储接口定义
//!
//! 报修系统把持久化视为外部协作方，只依赖这里定义的增删改查和按字段相等过滤的能力：
//! - `PlaceRepository` - 场所的查找与创建
//! - `ReportRepository` - 报修单的生命周期管理
//! - `SubjectObjectRepository` - 报修对象
//! - `ReportCreatorLinkRepository` - 报修单与创建者的关联
//! - `WorkerRepository` - 维修人员名册（只读）
//!
//! 所有方法都是异步的，返回 `ReportResult<T>`。无法完成的远程调用统一映射为
//! `ReportError::DependencyUnavailable`，唯一约束冲突映射为 `ReportError::Conflict`。

use std::sync::Arc;

use async_trait::async_trait;

use crate::models::{
    Department, Place, Report, ReportCreatorLink, SubjectObject, Worker,
};
use crate::ReportResult;

/// 场所仓储
#[async_trait]
pub trait PlaceRepository: Send + Sync {
    async fn find_by_name_and_floor(&self, name: &str, floor: i32) -> ReportResult<Option<Place>>;
    async fn get_by_id(&self, id: i64) -> ReportResult<Option<Place>>;
    /// 存储若对 (name, floor) 有唯一约束，重复插入返回 `ReportError::Conflict`
    async fn create(&self, place: &Place) -> ReportResult<Place>;
    async fn count_by_name_and_floor(&self, name: &str, floor: i32) -> ReportResult<usize>;
    /// 存储是否对 (name, floor) 强制唯一
    fn enforces_unique_key(&self) -> bool;
}

/// 报修单仓储
#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn create(&self, report: &Report) -> ReportResult<Report>;
    async fn get_by_id(&self, id: i64) -> ReportResult<Option<Report>>;
    /// 条件写入：仅当存储中的状态、优先级、备注和维修人员仍与读取时的快照 `expected`
    /// 一致时写入 `report` 的这四个字段，返回是否写入成功。
    /// 读取之后发生的改派或其他修改都会让写入失败。
    async fn compare_and_update(&self, report: &Report, expected: &Report) -> ReportResult<bool>;
    async fn delete(&self, id: i64) -> ReportResult<bool>;
    /// 按顺序追加附件引用。追加后总数会超过 `max_total` 时整批拒绝并返回校验错误，
    /// 计数和追加在同一次写入中完成
    async fn append_attachments(
        &self,
        id: i64,
        refs: &[String],
        max_total: usize,
    ) -> ReportResult<()>;
    async fn list_by_ids(&self, ids: &[i64]) -> ReportResult<Vec<Report>>;
    async fn list_by_assigned_worker(&self, worker_id: &str) -> ReportResult<Vec<Report>>;
    async fn count_open_by_worker(&self, worker_id: &str) -> ReportResult<usize>;
}

/// 报修对象仓储
#[async_trait]
pub trait SubjectObjectRepository: Send + Sync {
    async fn create(&self, object: &SubjectObject) -> ReportResult<SubjectObject>;
    async fn get_by_report_id(&self, report_id: i64) -> ReportResult<Option<SubjectObject>>;
    async fn delete_by_report_id(&self, report_id: i64) -> ReportResult<bool>;
}

/// 报修单创建者关联仓储
#[async_trait]
pub trait ReportCreatorLinkRepository: Send + Sync {
    async fn create(&self, link: &ReportCreatorLink) -> ReportResult<ReportCreatorLink>;
    async fn get_by_report_id(&self, report_id: i64) -> ReportResult<Option<ReportCreatorLink>>;
    async fn delete_by_report_id(&self, report_id: i64) -> ReportResult<bool>;
    async fn list_report_ids_by_creator(&self, creator_id: &str) -> ReportResult<Vec<i64>>;
}

/// 维修人员仓储
#[async_trait]
pub trait WorkerRepository: Send + Sync {
    async fn list_by_department(&self, department: Department) -> ReportResult<Vec<Worker>>;
    async fn get_by_id(&self, id: &str) -> ReportResult<Option<Worker>>;
    /// 名册维护入口，核心流程不会调用
    async fn register(&self, worker: &Worker) -> ReportResult<()>;
}

/// 五个实体集合的仓储组合
#[derive(Clone)]
pub struct RecordStore {
    pub places: Arc<dyn PlaceRepository>,
    pub reports: Arc<dyn ReportRepository>,
    pub subject_objects: Arc<dyn SubjectObjectRepository>,
    pub creator_links: Arc<dyn ReportCreatorLinkRepository>,
    pub workers: Arc<dyn WorkerRepository>,
}

impl RecordStore {
    pub fn new(
        places: Arc<dyn PlaceRepository>,
        reports: Arc<dyn ReportRepository>,
        subject_objects: Arc<dyn SubjectObjectRepository>,
        creator_links: Arc<dyn ReportCreatorLinkRepository>,
        workers: Arc<dyn WorkerRepository>,
    ) -> Self {
        Self {
            places,
            reports,
            subject_objects,
            creator_links,
            workers,
        }
    }
}
