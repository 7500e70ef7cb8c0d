//! Assignment Selector
//!
//! 为新报修单在对应部门的维修人员中选择负责人。选择策略可插拔：
//! 默认的随机策略是无状态的负载近似，另提供显式的最少负载策略。

pub mod selector;
pub mod strategies;


pub use selector::*;
pub use strategies::*;
