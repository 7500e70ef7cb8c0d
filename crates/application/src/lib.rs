//! 报修应用层：场所解析、报修单创建编排、生命周期控制和查询
//!
//! 所有操作都显式接收调用方身份和 `CallContext`，本层不持有任何跨调用的可变状态。

pub mod inputs;
pub mod use_cases;
pub mod validation;

pub use inputs::*;
pub use use_cases::*;
pub use validation::InputValidator;
