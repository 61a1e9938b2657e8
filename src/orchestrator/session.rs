//! 拆分决策会话 - 编排层
//!
//! ## 职责
//!
//! 把文件队列、状态轮询、决策存储和提交协调器串成一个完整流程：
//!
//! 1. **选择文件**：导航变化时先取消旧轮询、清空决策，再为新文件启动轮询
//! 2. **等待分析**：分析结果就绪后决策才可写
//! 3. **提交**：全部回答直接提交；否则先自动补全，确认后再提交
//! 4. **推进队列**：只有提交成功才移除当前文件；队列耗尽时结束会话
//!
//! 会话是当前文件状态的唯一写入者。

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::clients::SplitService;
use crate::config::Config;
use crate::error::{AppResult, BusinessError};
use crate::models::{
    AnalysisStatus, QueuePosition, QueuedFile, QuestionId, SheetFilter, SplitChoice,
    SplitManagerResponse,
};
use crate::orchestrator::navigator::{FileQueue, QueueAdvance};
use crate::services::auto_resolver::{questions_in_scope, AutoResolver, ResolutionSummary};
use crate::services::{DecisionStore, Notice, Notifier, PollSnapshot, StatusPoller};
use crate::workflow::{
    FileCtx, PendingConfirmation, PreparedSubmission, SubmissionCoordinator, SubmissionPlan,
};

/// 一次提交操作的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 有自动补全的决策，等待人工确认
    AwaitingConfirmation(ResolutionSummary),
    /// 提交成功，已切换到下一个文件
    Advanced(QueuedFile),
    /// 提交成功，队列已处理完
    QueueExhausted,
}

/// 拆分决策会话
pub struct SplitSession {
    project_id: String,
    service: Arc<dyn SplitService>,
    notifier: Arc<dyn Notifier>,
    queue: FileQueue,
    poller: StatusPoller,
    store: DecisionStore,
    coordinator: SubmissionCoordinator,
    pending: Option<PendingConfirmation>,
    finished: bool,
}

impl SplitSession {
    pub fn new(config: &Config, service: Arc<dyn SplitService>, notifier: Arc<dyn Notifier>) -> Self {
        let poller = StatusPoller::new(service.clone(), notifier.clone(), config.poll_settings());
        let coordinator = SubmissionCoordinator::new(
            service.clone(),
            AutoResolver::new(config.split_threshold_percent),
        );

        Self {
            project_id: config.project_id.clone(),
            service,
            notifier,
            queue: FileQueue::default(),
            poller,
            store: DecisionStore::new(),
            coordinator,
            pending: None,
            finished: false,
        }
    }

    /// 从文件列表服务加载队列，并开始处理第一个文件
    ///
    /// 返回队列中的文件数量
    pub async fn open(&mut self) -> AppResult<usize> {
        info!("📁 正在获取项目 {} 的待处理文件...", self.project_id);
        let files = self.service.list_files(&self.project_id).await?;
        Ok(self.load_queue(files))
    }

    /// 使用给定的文件列表作为队列
    pub fn load_queue(&mut self, files: Vec<QueuedFile>) -> usize {
        self.queue = FileQueue::new(files);
        self.finished = self.queue.is_empty();
        if self.finished {
            warn!("⚠️ 项目 {} 没有待处理的文件", self.project_id);
            self.poller.stop();
        } else {
            info!("✓ 找到 {} 个待处理的文件", self.queue.len());
            self.activate_current();
        }
        self.queue.len()
    }

    /// 切换到当前索引的文件：取消旧轮询，清空决策，启动新轮询
    fn activate_current(&mut self) {
        self.poller.stop();
        self.store.clear();
        self.pending = None;

        if let Some(ctx) = self.current_ctx() {
            self.poller.start(ctx);
        }
    }

    fn current_ctx(&self) -> Option<FileCtx> {
        self.queue
            .current()
            .map(|file| FileCtx::new(self.project_id.clone(), file))
    }

    // ========== 导航 ==========

    pub fn select_previous(&mut self) -> bool {
        let changed = self.queue.select_previous();
        if changed {
            self.activate_current();
        }
        changed
    }

    pub fn select_next(&mut self) -> bool {
        let changed = self.queue.select_next();
        if changed {
            self.activate_current();
        }
        changed
    }

    pub fn select_index(&mut self, index: usize) -> AppResult<bool> {
        let changed = self.queue.select_index(index)?;
        if changed {
            self.activate_current();
        }
        Ok(changed)
    }

    /// 重新轮询当前文件（决策会被清空）
    pub fn refresh(&mut self) {
        self.activate_current();
    }

    // ========== 只读视图 ==========

    pub fn position(&self) -> Option<QueuePosition> {
        self.queue.position()
    }

    pub fn current_file(&self) -> Option<&QueuedFile> {
        self.queue.current()
    }

    pub fn queue(&self) -> &FileQueue {
        &self.queue
    }

    /// 队列是否已处理完
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn snapshot(&self) -> PollSnapshot {
        self.poller.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot> {
        self.poller.subscribe()
    }

    pub fn status(&self) -> Option<AnalysisStatus> {
        self.poller.snapshot().status
    }

    /// 状态标签和说明
    pub fn status_label(&self) -> Option<(&'static str, &'static str)> {
        self.status().map(|s| (s.label(), s.description()))
    }

    pub fn analysis(&self) -> Option<SplitManagerResponse> {
        self.poller.snapshot().result
    }

    /// 等待当前文件的轮询稳定：拿到结果、失败或停止轮询
    pub async fn wait_for_analysis(&self) -> PollSnapshot {
        let mut changes = self.poller.subscribe();
        loop {
            {
                let snapshot = changes.borrow_and_update();
                if snapshot.is_settled() {
                    return snapshot.clone();
                }
            }
            if changes.changed().await.is_err() {
                return changes.borrow().clone();
            }
        }
    }

    pub fn decisions(&self) -> &DecisionStore {
        &self.store
    }

    pub fn pending_confirmation(&self) -> Option<&PendingConfirmation> {
        self.pending.as_ref()
    }

    // ========== 决策编辑 ==========

    /// 当前文件的可用分析结果；尚未就绪时决策不可写
    fn require_analysis(&self) -> AppResult<(FileCtx, SplitManagerResponse)> {
        let ctx = self.current_ctx().ok_or(BusinessError::NoActiveFile)?;
        let snapshot = self.poller.snapshot();
        match snapshot.result {
            Some(result) if snapshot.file.as_ref() == Some(&ctx) => Ok((ctx, result)),
            _ => Err(BusinessError::AnalysisNotReady {
                file_id: ctx.file_id,
            }
            .into()),
        }
    }

    /// 决策变化后，等待确认的提交已经过期，需要重新 `submit`
    fn invalidate_pending(&mut self) {
        if self.pending.take().is_some() {
            info!("决策已修改，之前的自动补全结果作废");
        }
    }

    pub fn set_decision(&mut self, question_id: impl Into<QuestionId>, choice: SplitChoice) -> AppResult<()> {
        self.require_analysis()?;
        self.invalidate_pending();
        self.store.set_decision(question_id, choice);
        Ok(())
    }

    pub fn set_bulk<I, Q>(&mut self, question_ids: I, choice: SplitChoice) -> AppResult<()>
    where
        I: IntoIterator<Item = Q>,
        Q: Into<QuestionId>,
    {
        self.require_analysis()?;
        self.invalidate_pending();
        self.store.set_bulk(question_ids, choice);
        Ok(())
    }

    /// 把范围内的全部题目设为同一个决策，返回设置的数量
    pub fn mark_all(&mut self, filter: &SheetFilter, choice: SplitChoice) -> AppResult<usize> {
        let (_, result) = self.require_analysis()?;
        let ids: Vec<QuestionId> = questions_in_scope(&result, filter)?
            .iter()
            .map(|q| q.question.question_id.clone())
            .collect();
        let count = ids.len();
        self.invalidate_pending();
        self.store.set_bulk(ids, choice);
        Ok(count)
    }

    // ========== 提交 ==========

    /// 提交当前文件
    ///
    /// 范围内全部已回答时直接提交；否则返回自动补全摘要，等待 `confirm`
    pub async fn submit(&mut self, filter: &SheetFilter) -> AppResult<SubmitOutcome> {
        let (ctx, result) = self.require_analysis()?;

        match self
            .coordinator
            .prepare(&result, self.store.decisions(), filter)?
        {
            SubmissionPlan::Ready(submission) => self.commit_and_advance(ctx, submission).await,
            SubmissionPlan::NeedsConfirmation(pending) => {
                let summary = pending.summary().clone();
                info!(
                    "{} 📝 {} 个题目未回答，已按置信度补全，等待确认",
                    ctx,
                    summary.auto_decided()
                );
                self.pending = Some(pending);
                Ok(SubmitOutcome::AwaitingConfirmation(summary))
            }
        }
    }

    /// 确认自动补全结果并提交
    pub async fn confirm(&mut self) -> AppResult<SubmitOutcome> {
        let ctx = self.current_ctx().ok_or(BusinessError::NoActiveFile)?;
        let submission = self
            .pending
            .clone()
            .ok_or(BusinessError::NoPendingConfirmation)?
            .accept();
        self.commit_and_advance(ctx, submission).await
    }

    /// 放弃确认，决策保持不变
    pub fn cancel_confirmation(&mut self) {
        self.pending = None;
    }

    async fn commit_and_advance(
        &mut self,
        ctx: FileCtx,
        submission: PreparedSubmission,
    ) -> AppResult<SubmitOutcome> {
        if let Err(e) = self.coordinator.commit(&ctx, &submission).await {
            self.notifier
                .notify(Notice::error(format!("{} 提交失败: {}", ctx, e)));
            return Err(e);
        }

        self.notifier
            .notify(Notice::info(format!("{} 拆分决策已提交", ctx)));
        self.store.clear();
        self.pending = None;

        match self.queue.remove_current_and_advance() {
            QueueAdvance::Next(next) => {
                self.activate_current();
                Ok(SubmitOutcome::Advanced(next))
            }
            QueueAdvance::Exhausted => {
                info!("✅ 队列中的文件已全部处理");
                self.poller.stop();
                self.finished = true;
                Ok(SubmitOutcome::QueueExhausted)
            }
        }
    }

    /// 结束会话，停止轮询
    pub fn close(&mut self) {
        self.poller.stop();
        self.pending = None;
    }
}
