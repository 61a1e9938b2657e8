//! 状态轮询服务 - 业务能力层
//!
//! 针对单个文件轮询分析状态，直到拿到可用结果或进入非轮询状态。
//!
//! ## 取消机制
//!
//! 每次 `start` 都会让代数（generation）加一，轮询任务在启动时记下自己的代数。
//! 响应回来时只有代数仍然一致才会写入共享状态，否则直接丢弃；检查和写入在
//! `watch` 通道的同一把锁里完成。`stop` 不会中断已经发出的请求，只是让它的结果失效。

use std::sync::{Arc, OnceLock};

use regex::Regex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::clients::SplitService;
use crate::config::PollSettings;
use crate::error::{AppError, AppResult};
use crate::models::{AnalysisResponse, AnalysisStatus, SplitManagerResponse};
use crate::services::notifier::{Notice, Notifier};
use crate::workflow::FileCtx;

/// 轮询错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollErrorKind {
    /// 文件还没准备好，静默重试
    Transient,
    /// 其他失败，需要提示用户
    Persistent,
}

/// 按错误信息区分"文件尚未就绪"和真正的失败
pub fn classify_poll_error(err: &AppError) -> PollErrorKind {
    static TRANSIENT: OnceLock<Option<Regex>> = OnceLock::new();
    let message = err.to_string();
    let matched = match TRANSIENT
        .get_or_init(|| Regex::new(r"(?i)not found or (is )?still being processed").ok())
    {
        Some(re) => re.is_match(&message),
        None => message
            .to_lowercase()
            .contains("not found or still being processed"),
    };
    if matched {
        PollErrorKind::Transient
    } else {
        PollErrorKind::Persistent
    }
}

/// 轮询器对外发布的状态
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollSnapshot {
    /// 当前代数，每次 start / stop 都会变化
    pub generation: u64,
    /// 正在轮询的文件
    pub file: Option<FileCtx>,
    pub status: Option<AnalysisStatus>,
    /// 可用的分析结果
    pub result: Option<SplitManagerResponse>,
    /// 轮询循环是否仍在运行
    pub polling: bool,
    /// 连续的非临时失败次数
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
}

impl PollSnapshot {
    /// 不会再有新的状态变化（除非重新 start）
    pub fn is_settled(&self) -> bool {
        !self.polling || self.result.is_some() || self.status == Some(AnalysisStatus::Failed)
    }
}

/// 状态轮询服务
///
/// 职责：
/// - 同一时间最多只有一个轮询循环，且对应当前文件
/// - 首次立即请求，之后每次请求结束后等待固定间隔再发起下一次
/// - 过期代数的响应一律丢弃
pub struct StatusPoller {
    service: Arc<dyn SplitService>,
    notifier: Arc<dyn Notifier>,
    settings: PollSettings,
    state: Arc<watch::Sender<PollSnapshot>>,
    task: Option<JoinHandle<()>>,
}

impl StatusPoller {
    pub fn new(
        service: Arc<dyn SplitService>,
        notifier: Arc<dyn Notifier>,
        settings: PollSettings,
    ) -> Self {
        let (state, _) = watch::channel(PollSnapshot::default());
        Self {
            service,
            notifier,
            settings,
            state: Arc::new(state),
            task: None,
        }
    }

    /// 开始轮询一个文件，之前的轮询会先被取消
    pub fn start(&mut self, ctx: FileCtx) {
        self.stop();

        let mut generation = 0;
        self.state.send_modify(|s| {
            generation = s.generation + 1;
            *s = PollSnapshot {
                generation,
                file: Some(ctx.clone()),
                polling: true,
                ..Default::default()
            };
        });

        info!("{} 🔄 开始轮询分析状态", ctx);

        let task = PollTask {
            service: self.service.clone(),
            notifier: self.notifier.clone(),
            settings: self.settings,
            state: self.state.clone(),
            generation,
            ctx,
        };
        self.task = Some(tokio::spawn(task.run()));
    }

    /// 取消当前轮询：等待中的下一次请求不再发起，在途请求的结果会被丢弃
    pub fn stop(&mut self) {
        self.state.send_modify(|s| {
            s.generation += 1;
            s.polling = false;
        });
        // 任务在下一次代数检查时自行退出
        self.task.take();
    }

    pub fn snapshot(&self) -> PollSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot> {
        self.state.subscribe()
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.state.send_modify(|s| {
            s.generation += 1;
            s.polling = false;
        });
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn generation_changed(changes: &mut watch::Receiver<PollSnapshot>, generation: u64) {
    loop {
        if changes.borrow_and_update().generation != generation {
            return;
        }
        if changes.changed().await.is_err() {
            return;
        }
    }
}

/// 单个轮询循环，绑定一个代数
struct PollTask {
    service: Arc<dyn SplitService>,
    notifier: Arc<dyn Notifier>,
    settings: PollSettings,
    state: Arc<watch::Sender<PollSnapshot>>,
    generation: u64,
    ctx: FileCtx,
}

impl PollTask {
    async fn run(self) {
        let mut changes = self.state.subscribe();

        loop {
            if !self.is_current() {
                break;
            }

            let outcome = self
                .service
                .fetch_analysis(&self.ctx.project_id, &self.ctx.file_id)
                .await;

            match self.apply(outcome) {
                Some(true) => {}
                Some(false) => break,
                None => {
                    debug!("{} 丢弃过期的轮询响应", self.ctx);
                    break;
                }
            }

            // 间隔从本次请求结束后开始计算；代数变化时提前醒来
            let generation = self.generation;
            tokio::select! {
                _ = sleep(self.settings.interval) => {}
                _ = generation_changed(&mut changes, generation) => {}
            }
        }
    }

    fn is_current(&self) -> bool {
        self.state.borrow().generation == self.generation
    }

    /// 把一次请求结果写入共享状态
    ///
    /// 返回 `None` 表示代数已过期、结果被丢弃；否则返回是否继续轮询
    fn apply(&self, outcome: AppResult<AnalysisResponse>) -> Option<bool> {
        let mut keep_polling = None;
        let mut notice = None;
        let max_failed_polls = self.settings.max_failed_polls;

        self.state.send_if_modified(|s| {
            if s.generation != self.generation {
                return false;
            }

            let keep = match outcome {
                Ok(response) => {
                    s.status = Some(response.status);
                    s.consecutive_failures = 0;
                    s.last_error = None;
                    match response.usable_result() {
                        Some(result) => {
                            info!(
                                "{} ✓ 分析结果就绪: {} 个工作表, {} 个题目 (状态: {})",
                                self.ctx,
                                result.sheets.len(),
                                result.question_count(),
                                response.status
                            );
                            s.result = Some(result);
                            false
                        }
                        None => {
                            s.result = None;
                            let keep = response.status.is_polling_eligible();
                            if keep {
                                debug!("{} 分析中 (状态: {})", self.ctx, response.status);
                            } else {
                                warn!(
                                    "{} 状态 {} 下没有可用结果，停止轮询",
                                    self.ctx, response.status
                                );
                            }
                            keep
                        }
                    }
                }
                Err(err) => match classify_poll_error(&err) {
                    PollErrorKind::Transient => {
                        debug!("{} 文件尚未就绪: {}", self.ctx, err);
                        s.result = None;
                        s.status = Some(AnalysisStatus::Processing);
                        true
                    }
                    PollErrorKind::Persistent => {
                        error!("{} ❌ 获取分析状态失败: {}", self.ctx, err);
                        s.status = Some(AnalysisStatus::Failed);
                        s.consecutive_failures += 1;
                        s.last_error = Some(err.to_string());
                        notice = Some(format!("{} 获取分析状态失败: {}", self.ctx, err));
                        match max_failed_polls {
                            Some(max) => s.consecutive_failures < max,
                            None => true,
                        }
                    }
                },
            };

            s.polling = keep;
            keep_polling = Some(keep);
            true
        });

        if let Some(message) = notice {
            self.notifier.notify(Notice::error(message));
        }
        keep_polling
    }
}
