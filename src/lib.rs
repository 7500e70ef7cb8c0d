//! 设施故障报修系统
//!
//! 报修人提交报修单后，系统在对应部门中自动分配维修人员并发送通知；
//! 维修人员设置优先级并推进报修单状态。

pub mod app;

pub use app::Application;
