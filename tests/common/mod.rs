//! 集成测试共用的内存版拆分服务和通知记录器
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use split_decision::config::PollSettings;
use split_decision::error::{AppError, AppResult};
use split_decision::models::{
    AnalysisResponse, AnalysisStatus, Question, QuestionDecision, QuestionRange, QueuedFile,
    Sheet, SubmissionPayload,
};
use split_decision::services::{Notice, Notifier, PollSnapshot};
use split_decision::SplitService;
use tokio::sync::{watch, Notify};

/// 一次轮询请求的脚本化结果
#[derive(Clone)]
pub enum Step {
    Respond(AnalysisResponse),
    NotReady,
    Fail(&'static str),
    /// 先通知 `fetch_started`，再等 gate 放行后返回
    Gated(Arc<Notify>, AnalysisResponse),
}

#[derive(Default)]
pub struct MockService {
    files: Mutex<Vec<QueuedFile>>,
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    fetches: Mutex<Vec<String>>,
    submissions: Mutex<Vec<(String, SubmissionPayload)>>,
    fail_submissions: AtomicBool,
    pub fetch_started: Notify,
}

impl MockService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_files(self: &Arc<Self>, files: Vec<QueuedFile>) -> Arc<Self> {
        *self.files.lock().unwrap() = files;
        self.clone()
    }

    /// 为文件设置轮询脚本；脚本只剩最后一步时重复返回它
    pub fn script(&self, file_id: &str, steps: Vec<Step>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(file_id.to_string(), steps.into());
    }

    pub fn fail_submissions(&self, fail: bool) {
        self.fail_submissions.store(fail, Ordering::SeqCst);
    }

    pub fn fetch_count(&self, file_id: &str) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|id| id.as_str() == file_id)
            .count()
    }

    pub fn submissions(&self) -> Vec<(String, SubmissionPayload)> {
        self.submissions.lock().unwrap().clone()
    }

    fn next_step(&self, file_id: &str) -> Option<Step> {
        let mut scripts = self.scripts.lock().unwrap();
        let steps = scripts.get_mut(file_id)?;
        if steps.len() > 1 {
            steps.pop_front()
        } else {
            steps.front().cloned()
        }
    }
}

#[async_trait]
impl SplitService for MockService {
    async fn fetch_analysis(&self, _project_id: &str, file_id: &str) -> AppResult<AnalysisResponse> {
        self.fetches.lock().unwrap().push(file_id.to_string());
        match self.next_step(file_id) {
            Some(Step::Respond(response)) => Ok(response),
            Some(Step::NotReady) | None => Err(AppError::bad_response(
                "split-manager",
                Some(404),
                Some(format!("File {} is not found or still being processed", file_id)),
            )),
            Some(Step::Fail(message)) => Err(AppError::bad_response(
                "split-manager",
                Some(500),
                Some(message.to_string()),
            )),
            Some(Step::Gated(gate, response)) => {
                self.fetch_started.notify_one();
                gate.notified().await;
                Ok(response)
            }
        }
    }

    async fn submit_decisions(
        &self,
        _project_id: &str,
        file_id: &str,
        payload: &SubmissionPayload,
    ) -> AppResult<()> {
        if self.fail_submissions.load(Ordering::SeqCst) {
            return Err(AppError::bad_response(
                "split-decisions",
                Some(502),
                Some("Bad Gateway".to_string()),
            ));
        }
        self.submissions
            .lock()
            .unwrap()
            .push((file_id.to_string(), payload.clone()));
        Ok(())
    }

    async fn list_files(&self, _project_id: &str) -> AppResult<Vec<QueuedFile>> {
        Ok(self.files.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

// ========== 测试数据 ==========

pub fn question(id: &str, column: &str, confidence: f64) -> Question {
    Question {
        question_id: id.to_string(),
        range: QuestionRange {
            left_letter: column.to_string(),
            right_letter: None,
            start_row: None,
            end_row: None,
        },
        decision: QuestionDecision { confidence },
    }
}

pub fn sheet(name: &str, questions: Vec<Question>) -> Sheet {
    Sheet {
        sheet_name: name.to_string(),
        questions,
    }
}

pub fn ready(file_url: &str, sheets: Vec<Sheet>) -> AnalysisResponse {
    AnalysisResponse {
        status: AnalysisStatus::InReview,
        file_url: Some(file_url.to_string()),
        sheets: Some(sheets),
    }
}

/// 单个工作表、单个题目的可用结果
pub fn simple_ready(file_id: &str) -> AnalysisResponse {
    ready(
        &format!("https://files.example/{}.xlsx", file_id),
        vec![sheet(
            "Sheet1",
            vec![question(&format!("{}-q1", file_id), "B", 0.4)],
        )],
    )
}

pub fn pending(status: AnalysisStatus) -> AnalysisResponse {
    AnalysisResponse {
        status,
        file_url: None,
        sheets: None,
    }
}

pub fn files(n: usize) -> Vec<QueuedFile> {
    (1..=n)
        .map(|i| QueuedFile::new(format!("f{}", i), format!("warehouse-{}.xlsx", i)))
        .collect()
}

pub fn settings(max_failed_polls: Option<u32>) -> PollSettings {
    PollSettings {
        interval: Duration::from_secs(5),
        max_failed_polls,
    }
}

/// 等待轮询状态稳定
pub async fn settled(mut changes: watch::Receiver<PollSnapshot>) -> PollSnapshot {
    loop {
        {
            let snapshot = changes.borrow_and_update();
            if snapshot.is_settled() {
                return snapshot.clone();
            }
        }
        changes.changed().await.unwrap();
    }
}
