use tracing::debug;

use reports_core::{CallContext, RecordStore, Report, ReportDetails, ReportError, ReportResult};

/// 报修单只读查询
pub struct ReportQueries {
    store: RecordStore,
}

impl ReportQueries {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    /// "我的报修"：通过创建者关联查询，最新的在前
    pub async fn my_reports(&self, ctx: &CallContext, creator_id: &str) -> ReportResult<Vec<Report>> {
        let ids = ctx
            .run(
                "list_report_ids_by_creator",
                self.store.creator_links.list_report_ids_by_creator(creator_id),
            )
            .await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut reports = ctx
            .run("list_reports_by_ids", self.store.reports.list_by_ids(&ids))
            .await?;
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        debug!("用户 {} 共有 {} 个报修单", creator_id, reports.len());
        Ok(reports)
    }

    /// 分配给某位维修人员的报修单，未解决的在前
    pub async fn assigned_reports(
        &self,
        ctx: &CallContext,
        worker_id: &str,
    ) -> ReportResult<Vec<Report>> {
        let mut reports = ctx
            .run(
                "list_reports_by_worker",
                self.store.reports.list_by_assigned_worker(worker_id),
            )
            .await?;
        reports.sort_by(|a, b| {
            b.is_open()
                .cmp(&a.is_open())
                .then(b.priority.cmp(&a.priority))
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(reports)
    }

    pub async fn get_report(&self, ctx: &CallContext, report_id: i64) -> ReportResult<Option<Report>> {
        ctx.run("get_report", self.store.reports.get_by_id(report_id))
            .await
    }

    /// 报修单连同报修对象和场所
    pub async fn report_details(
        &self,
        ctx: &CallContext,
        report_id: i64,
    ) -> ReportResult<ReportDetails> {
        let report = self
            .get_report(ctx, report_id)
            .await?
            .ok_or_else(|| ReportError::report_not_found(report_id))?;

        let subject_object = ctx
            .run(
                "get_subject_object",
                self.store.subject_objects.get_by_report_id(report_id),
            )
            .await?;

        let place = match &subject_object {
            Some(subject) => {
                ctx.run("get_place", self.store.places.get_by_id(subject.place_id))
                    .await?
            }
            None => None,
        };

        Ok(ReportDetails {
            report,
            subject_object,
            place,
        })
    }
}
