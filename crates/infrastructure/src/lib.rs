//! 报修系统的具体协作方实现：SQLite 记录存储、本地对象存储、通知、告警和权限检查

pub mod alerting;
pub mod authority;
pub mod database;
pub mod notifier;
pub mod object_store;

pub use alerting::LogAlertSink;
pub use authority::RosterAuthority;
pub use database::{
    DatabaseManager, SqliteCreatorLinkRepository, SqlitePlaceRepository, SqliteReportRepository,
    SqliteSubjectObjectRepository, SqliteWorkerRepository,
};
pub use notifier::{build_notifier, LogNotifier, WebhookNotifier};
pub use object_store::LocalObjectStore;
