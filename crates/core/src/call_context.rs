//! 远程调用的超时与取消控制
//!
//! 每一次对记录存储、对象存储和通知服务的调用都在调用方提供的 `CallContext` 下执行，
//! 超时返回 `ReportError::Timeout`，取消返回 `ReportError::Cancelled`。

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, error};

use crate::{ReportError, ReportResult};

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(15);

/// 取消信号的发送端
#[derive(Debug)]
pub struct CancellationHandle {
    tx: watch::Sender<bool>,
}

impl CancellationHandle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// 创建绑定到此取消信号的调用上下文
    pub fn context(&self, call_timeout: Duration) -> CallContext {
        CallContext {
            timeout: call_timeout,
            cancel: Some(self.tx.subscribe()),
        }
    }

    pub fn cancel(&self) {
        debug!("发送取消信号给 {} 个订阅者", self.tx.receiver_count());
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancellationHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// 单次远程调用的超时和取消上下文
#[derive(Debug, Clone)]
pub struct CallContext {
    timeout: Duration,
    cancel: Option<watch::Receiver<bool>>,
}

impl CallContext {
    pub fn with_timeout(call_timeout: Duration) -> Self {
        Self {
            timeout: call_timeout,
            cancel: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 同样的超时，但不再响应取消信号。补偿操作使用它，保证取消后仍能回滚
    pub fn detached(&self) -> Self {
        Self::with_timeout(self.timeout)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or(false)
    }

    /// 在超时和取消信号的约束下执行一次远程调用
    pub async fn run<F, T>(&self, operation_name: &str, operation: F) -> ReportResult<T>
    where
        F: Future<Output = ReportResult<T>>,
    {
        if self.is_cancelled() {
            return Err(ReportError::Cancelled(format!(
                "操作 '{operation_name}' 在开始前已被取消"
            )));
        }

        let timed = timeout(self.timeout, operation);
        let outcome = match &self.cancel {
            None => timed.await,
            Some(rx) => {
                let mut rx = rx.clone();
                tokio::select! {
                    outcome = timed => outcome,
                    _ = wait_cancelled(&mut rx) => {
                        debug!("操作 '{}' 被取消", operation_name);
                        return Err(ReportError::Cancelled(format!(
                            "操作 '{operation_name}' 已被取消"
                        )));
                    }
                }
            }
        };

        match outcome {
            Ok(result) => result,
            Err(_) => {
                let error_msg = format!(
                    "操作 '{operation_name}' 超时 (超时时间: {:?})",
                    self.timeout
                );
                error!("{}", error_msg);
                Err(ReportError::timeout_error(error_msg))
            }
        }
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::with_timeout(DEFAULT_CALL_TIMEOUT)
    }
}

async fn wait_cancelled(rx: &mut watch::Receiver<bool>) {
    // 发送端被丢弃时永远不会再取消
    if rx.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}
