//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `navigator` - 文件队列
//! - 持有有序文件列表和当前位置
//! - 边界处导航不生效
//! - 提交成功后移除当前文件，或报告队列耗尽
//!
//! ### `session` - 拆分决策会话
//! - 导航变化时重启轮询、清空决策
//! - 决定何时直接提交、何时等待确认
//! - 提交成功后推进队列
//!
//! ## 层次关系
//!
//! ```text
//! session (处理 Vec<QueuedFile>)
//!     ↓
//! workflow::SubmissionCoordinator (处理单个文件的提交)
//!     ↓
//! services (能力层：poller / store / resolver / notifier)
//!     ↓
//! clients (外部接口：SplitService)
//! ```

pub mod navigator;
pub mod session;

pub use navigator::{FileQueue, QueueAdvance};
pub use session::{SplitSession, SubmitOutcome};
