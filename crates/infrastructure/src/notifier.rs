use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reports_core::config::{NotifierConfig, NotifierKind};
use reports_core::{NotificationPayload, NotificationRecipient, Notifier, ReportError, ReportResult};
use serde::Serialize;
use tracing::info;

/// 只写日志的通知器，用于开发环境和没有推送服务的部署
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        recipient: &NotificationRecipient,
        payload: &NotificationPayload,
    ) -> ReportResult<()> {
        info!(
            worker_id = %recipient.worker_id,
            contact = %recipient.contact,
            report_id = payload.report_id,
            "{} - {}",
            payload.title(),
            payload.body()
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    recipient: &'a NotificationRecipient,
    title: String,
    body: String,
    report: &'a NotificationPayload,
}

/// 把通知以 JSON POST 到推送服务
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("创建HTTP客户端失败")?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(
        &self,
        recipient: &NotificationRecipient,
        payload: &NotificationPayload,
    ) -> ReportResult<()> {
        let message = WebhookMessage {
            recipient,
            title: payload.title(),
            body: payload.body(),
            report: payload,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&message)
            .send()
            .await
            .map_err(|e| ReportError::dependency("notifier.webhook", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReportError::dependency(
                "notifier.webhook",
                format!("推送服务返回 {status}: {body}"),
            ));
        }

        info!(
            "已推送报修单 {} 通知给 {}",
            payload.report_id, recipient.worker_id
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "webhook"
    }
}

/// 按配置创建通知器
pub fn build_notifier(config: &NotifierConfig) -> Result<Arc<dyn Notifier>> {
    match config.kind {
        NotifierKind::Log => Ok(Arc::new(LogNotifier)),
        NotifierKind::Webhook => {
            let url = config
                .webhook_url
                .clone()
                .context("webhook通知必须配置webhook_url")?;
            let notifier = WebhookNotifier::new(url, Duration::from_secs(config.timeout_seconds))?;
            Ok(Arc::new(notifier))
        }
    }
}
