//! 提交流程 - 流程层
//!
//! 核心职责：把当前文件的决策变成一次完整的提交
//!
//! 两阶段流程：
//! 1. `prepare` → 计算提交范围，全部回答时直接得到可提交的请求
//! 2. 有未回答的题目 → 自动补全，生成摘要，等待人工确认
//! 3. `commit` → 调用提交接口（只有确认后的请求才能走到这里）

use std::sync::Arc;

use tracing::{info, warn};

use crate::clients::SplitService;
use crate::error::AppResult;
use crate::models::{
    DecisionEntry, DecisionMap, SheetFilter, SplitManagerResponse, SubmissionPayload,
};
use crate::services::auto_resolver::{questions_in_scope, AutoResolver, ResolutionSummary};
use crate::workflow::file_ctx::FileCtx;

/// 已经完整、可以直接发送的提交
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedSubmission {
    payload: SubmissionPayload,
}

impl PreparedSubmission {
    pub fn payload(&self) -> &SubmissionPayload {
        &self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.decisions.is_empty()
    }
}

/// 等待人工确认的提交（含自动补全的决策）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation {
    summary: ResolutionSummary,
    submission: PreparedSubmission,
}

impl PendingConfirmation {
    pub fn summary(&self) -> &ResolutionSummary {
        &self.summary
    }

    /// 确认后得到可提交的请求
    pub fn accept(self) -> PreparedSubmission {
        self.submission
    }
}

/// `prepare` 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionPlan {
    /// 用户已回答范围内的全部题目，直接提交
    Ready(PreparedSubmission),
    /// 需要先确认自动补全的结果
    NeedsConfirmation(PendingConfirmation),
}

/// 提交协调器
///
/// - 不持有任何文件状态
/// - 只依赖自动补全能力和提交接口
pub struct SubmissionCoordinator {
    service: Arc<dyn SplitService>,
    resolver: AutoResolver,
}

impl SubmissionCoordinator {
    pub fn new(service: Arc<dyn SplitService>, resolver: AutoResolver) -> Self {
        Self { service, resolver }
    }

    /// 计算提交计划，不发起任何请求
    pub fn prepare(
        &self,
        result: &SplitManagerResponse,
        decisions: &DecisionMap,
        filter: &SheetFilter,
    ) -> AppResult<SubmissionPlan> {
        let scope = questions_in_scope(result, filter)?;
        let sheet_name = filter.sheet_name().map(str::to_string);

        let answered = scope
            .iter()
            .filter(|q| decisions.contains_key(&q.question.question_id))
            .count();

        if answered == scope.len() {
            let entries = scope
                .iter()
                .filter_map(|q| {
                    decisions.get(&q.question.question_id).map(|choice| DecisionEntry {
                        question_id: q.question.question_id.clone(),
                        decision: *choice,
                    })
                })
                .collect();
            return Ok(SubmissionPlan::Ready(PreparedSubmission {
                payload: SubmissionPayload {
                    decisions: entries,
                    sheet_name,
                },
            }));
        }

        let resolution = self.resolver.resolve(&scope, decisions);
        let entries = scope
            .iter()
            .filter_map(|q| {
                resolution
                    .decisions
                    .get(&q.question.question_id)
                    .map(|choice| DecisionEntry {
                        question_id: q.question.question_id.clone(),
                        decision: *choice,
                    })
            })
            .collect();

        Ok(SubmissionPlan::NeedsConfirmation(PendingConfirmation {
            summary: resolution.summary,
            submission: PreparedSubmission {
                payload: SubmissionPayload {
                    decisions: entries,
                    sheet_name,
                },
            },
        }))
    }

    /// 发送提交请求
    pub async fn commit(&self, ctx: &FileCtx, submission: &PreparedSubmission) -> AppResult<()> {
        if submission.is_empty() {
            warn!("{} ⚠️ 提交范围内没有题目，发送空的决策列表", ctx);
        }
        info!(
            "{} 📤 正在提交 {} 条拆分决策 ({})...",
            ctx,
            submission.len(),
            submission
                .payload
                .sheet_name
                .as_deref()
                .unwrap_or("全部工作表")
        );

        match self
            .service
            .submit_decisions(&ctx.project_id, &ctx.file_id, &submission.payload)
            .await
        {
            Ok(()) => {
                info!("{} ✓ 拆分决策提交成功", ctx);
                Ok(())
            }
            Err(e) => {
                warn!("{} ⚠️ 拆分决策提交失败: {}", ctx, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AnalysisResponse, Question, QuestionDecision, QuestionRange, QueuedFile, Sheet,
        SplitChoice,
    };
    use async_trait::async_trait;

    struct NoopService;

    #[async_trait]
    impl SplitService for NoopService {
        async fn fetch_analysis(&self, _: &str, _: &str) -> AppResult<AnalysisResponse> {
            unimplemented!()
        }

        async fn submit_decisions(&self, _: &str, _: &str, _: &SubmissionPayload) -> AppResult<()> {
            Ok(())
        }

        async fn list_files(&self, _: &str) -> AppResult<Vec<QueuedFile>> {
            Ok(Vec::new())
        }
    }

    fn coordinator() -> SubmissionCoordinator {
        SubmissionCoordinator::new(Arc::new(NoopService), AutoResolver::default())
    }

    fn question(id: &str, column: &str, confidence: f64) -> Question {
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

    fn result() -> SplitManagerResponse {
        SplitManagerResponse {
            file_url: "https://files.example/demand.xlsx".to_string(),
            sheets: vec![
                Sheet {
                    sheet_name: "A".to_string(),
                    questions: vec![question("A1", "B", 0.5), question("A2", "C", 0.9)],
                },
                Sheet {
                    sheet_name: "B".to_string(),
                    questions: vec![question("B1", "D", 0.85)],
                },
            ],
        }
    }

    fn entry(id: &str, choice: SplitChoice) -> DecisionEntry {
        DecisionEntry {
            question_id: id.to_string(),
            decision: choice,
        }
    }

    #[test]
    fn test_fully_answered_scope_bypasses_resolver() {
        let mut decisions = DecisionMap::new();
        decisions.insert("A1".to_string(), SplitChoice::NoSplit);
        decisions.insert("A2".to_string(), SplitChoice::NoSplit);
        decisions.insert("B1".to_string(), SplitChoice::NoSplit);

        let plan = coordinator()
            .prepare(&result(), &decisions, &SheetFilter::All)
            .unwrap();

        match plan {
            SubmissionPlan::Ready(submission) => {
                assert_eq!(submission.payload().sheet_name, None);
                assert_eq!(
                    submission.payload().decisions,
                    vec![
                        entry("A1", SplitChoice::NoSplit),
                        entry("A2", SplitChoice::NoSplit),
                        entry("B1", SplitChoice::NoSplit),
                    ]
                );
            }
            other => panic!("expected ready plan, got {:?}", other),
        }
    }

    #[test]
    fn test_single_sheet_scope_excludes_other_sheets() {
        let mut decisions = DecisionMap::new();
        decisions.insert("B1".to_string(), SplitChoice::NoSplit);

        // A 表全部未回答，但不在范围内，不影响完整性
        let plan = coordinator()
            .prepare(&result(), &decisions, &SheetFilter::Sheet("B".to_string()))
            .unwrap();

        match plan {
            SubmissionPlan::Ready(submission) => {
                assert_eq!(submission.payload().sheet_name.as_deref(), Some("B"));
                assert_eq!(
                    submission.payload().decisions,
                    vec![entry("B1", SplitChoice::NoSplit)]
                );
            }
            other => panic!("expected ready plan, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_answers_need_confirmation() {
        let mut decisions = DecisionMap::new();
        decisions.insert("A1".to_string(), SplitChoice::Split);

        let plan = coordinator()
            .prepare(&result(), &decisions, &SheetFilter::All)
            .unwrap();

        let pending = match plan {
            SubmissionPlan::NeedsConfirmation(pending) => pending,
            other => panic!("expected confirmation, got {:?}", other),
        };
        assert_eq!(pending.summary().answered_by_user, 1);
        assert!(pending.summary().auto_no_split.is_empty());
        let auto_split: Vec<&str> = pending
            .summary()
            .auto_split
            .iter()
            .map(|d| d.question_id.as_str())
            .collect();
        assert_eq!(auto_split, vec!["A2", "B1"]);

        let submission = pending.accept();
        assert_eq!(
            submission.payload().decisions,
            vec![
                entry("A1", SplitChoice::Split),
                entry("A2", SplitChoice::Split),
                entry("B1", SplitChoice::Split),
            ]
        );
    }

    #[test]
    fn test_stale_decisions_are_not_submitted() {
        let mut decisions = DecisionMap::new();
        decisions.insert("A1".to_string(), SplitChoice::Split);
        decisions.insert("A2".to_string(), SplitChoice::Split);
        decisions.insert("B1".to_string(), SplitChoice::Split);
        decisions.insert("gone".to_string(), SplitChoice::NoSplit);

        let plan = coordinator()
            .prepare(&result(), &decisions, &SheetFilter::All)
            .unwrap();

        match plan {
            SubmissionPlan::Ready(submission) => assert_eq!(submission.len(), 3),
            other => panic!("expected ready plan, got {:?}", other),
        }
    }

    #[test]
    fn test_sheet_without_questions_prepares_empty_submission() {
        let mut result = result();
        result.sheets.push(Sheet {
            sheet_name: "Empty".to_string(),
            questions: Vec::new(),
        });

        let plan = coordinator()
            .prepare(&result, &DecisionMap::new(), &SheetFilter::Sheet("Empty".to_string()))
            .unwrap();

        match plan {
            SubmissionPlan::Ready(submission) => {
                assert!(submission.is_empty());
                assert_eq!(submission.payload().sheet_name.as_deref(), Some("Empty"));
            }
            other => panic!("expected ready plan, got {:?}", other),
        }
    }
}
