//! # 数据模型
//!
//! 报修系统的核心数据结构：场所、维修人员、报修单、报修对象以及报修单与
//! 创建者之间的关联记录。
//!
//! ## 报修单状态流转
//! ```text
//! Pending → InProgress → Resolved
//!               ↑            │
//!               └── reopen ──┘
//! ```
//!
//! 状态和优先级只能通过生命周期控制器修改；附件列表只会追加。
//!
//! ## 存储映射
//!
//! - `places` - 场所，(name, floor) 唯一
//! - `reports` - 报修单
//! - `report_attachments` - 报修单附件引用（按上传顺序）
//! - `subject_objects` - 报修对象，与报修单一一对应
//! - `report_creators` - 报修单创建者关联
//! - `workers` - 维修人员名册（只读）

pub mod actor;
pub mod notification;
pub mod place;
pub mod report;
pub mod subject_object;
pub mod worker;

pub use actor::*;
pub use notification::*;
pub use place::*;
pub use report::*;
pub use subject_object::*;
pub use worker::*;
