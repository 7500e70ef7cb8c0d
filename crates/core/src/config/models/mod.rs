pub mod app_config;
pub mod collaborators;
pub mod database;
pub mod limits;
pub mod workflow;

// Re-export main types for easier imports
pub use app_config::AppConfig;
pub use collaborators::{AlertConfig, NotifierConfig, NotifierKind, ObjectStoreConfig};
pub use database::DatabaseConfig;
pub use limits::LimitsConfig;
pub use workflow::{AssignmentConfig, AssignmentStrategyKind, CallConfig, LifecycleConfig, LoggingConfig};
