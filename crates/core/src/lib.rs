//! 报修系统核心库：数据模型、错误类型、协作方接口、调用上下文和配置。

pub mod call_context;
pub mod config;
pub mod errors;
pub mod models;
pub mod traits;

pub use call_context::{CallContext, CancellationHandle, DEFAULT_CALL_TIMEOUT};
pub use errors::*;
pub use models::*;
pub use traits::*;
