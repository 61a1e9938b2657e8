//! # Split Decision
//!
//! 表格拆分决策工作流：逐个文件等待后台分析，人工判断候选列是否拆分，
//! 未回答的题目按置信度自动补全并经确认后提交。
//!
//! ## 架构设计
//!
//! ### ① 外部接口层（Clients）
//! - `clients/` - `SplitService` trait 及其 HTTP 实现 `SplitApiClient`
//!
//! ### ② 业务能力层（Services）
//! - `DecisionStore` - 当前文件的决策
//! - `StatusPoller` - 带代数校验的状态轮询
//! - `AutoResolver` - 按置信度补全决策
//! - `NoticeWriter` - 面向用户的通知
//!
//! ### ③ 流程层（Workflow）
//! - `FileCtx` - 上下文封装（project_id + file_id）
//! - `SubmissionCoordinator` - 两阶段提交（计算 → 确认 → 提交）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/navigator` - 文件队列
//! - `orchestrator/session` - 会话，串联以上所有组件

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{SplitApiClient, SplitService};
pub use config::{Config, PollSettings};
pub use error::{AppError, AppResult};
pub use models::{AnalysisStatus, QueuedFile, SheetFilter, SplitChoice, SplitManagerResponse};
pub use orchestrator::{FileQueue, SplitSession, SubmitOutcome};
pub use services::{AutoResolver, DecisionStore, NoticeWriter, Notifier, StatusPoller};
pub use workflow::{FileCtx, SubmissionCoordinator, SubmissionPlan};
