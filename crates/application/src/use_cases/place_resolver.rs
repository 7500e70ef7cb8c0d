use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use reports_core::{CallContext, Place, PlaceRepository, ReportError, ReportResult};

use crate::validation::InputValidator;

/// 场所解析器 - 把 (名称, 楼层) 幂等地解析为场所ID，不存在时创建
///
/// 并发时两个调用者可能都走到"未找到"分支：
/// - 存储对 (名称, 楼层) 有唯一约束时，插入冲突表示别人刚刚创建了它，重新读取并返回对方的ID；
/// - 存储没有唯一约束时，并发创建可能产生重复场所，这是已接受的限制，见 DESIGN.md。
pub struct PlaceResolver {
    places: Arc<dyn PlaceRepository>,
    validator: InputValidator,
}

impl PlaceResolver {
    pub fn new(places: Arc<dyn PlaceRepository>, validator: InputValidator) -> Self {
        if !places.enforces_unique_key() {
            warn!("场所存储没有 (名称, 楼层) 唯一约束，并发创建可能产生重复场所");
        }
        Self { places, validator }
    }

    /// 名称会去掉首尾空白后按精确相等匹配
    #[instrument(skip(self, ctx))]
    pub async fn resolve(&self, ctx: &CallContext, name: &str, floor: i32) -> ReportResult<i64> {
        self.validator.validate_place(name, floor)?;
        let name = name.trim();

        if let Some(existing) = self.find(ctx, name, floor).await? {
            debug!("复用已有场所: {}", existing.entity_description());
            return Ok(existing.id);
        }

        let place = Place::new(name, floor);
        match ctx.run("create_place", self.places.create(&place)).await {
            Ok(created) => {
                info!("创建新场所: {}", created.entity_description());
                Ok(created.id)
            }
            Err(ReportError::Conflict(message)) => {
                debug!("场所 ({}, {}) 插入冲突，重新读取: {}", name, floor, message);
                match self.find(ctx, name, floor).await? {
                    Some(existing) => Ok(existing.id),
                    None => Err(ReportError::dependency(
                        "resolve_place",
                        format!("场所 ({name}, {floor}) 插入冲突但重新读取未找到"),
                    )),
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn find(&self, ctx: &CallContext, name: &str, floor: i32) -> ReportResult<Option<Place>> {
        ctx.run("find_place", self.places.find_by_name_and_floor(name, floor))
            .await
    }
}
