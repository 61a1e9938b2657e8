//! 自动补全服务 - 业务能力层
//!
//! 根据置信度补全用户没有回答的拆分决策，并生成可供人工确认的摘要

use std::fmt;

use crate::error::{AppResult, BusinessError};
use crate::models::{
    DecisionMap, Question, QuestionId, SheetFilter, SplitChoice, SplitManagerResponse,
};

/// 提交范围内的一个题目，带上所属工作表
#[derive(Debug, Clone, Copy)]
pub struct ScopedQuestion<'a> {
    pub sheet_name: &'a str,
    pub question: &'a Question,
}

/// 按工作表筛选出提交范围内的全部题目
///
/// 指定的工作表不存在时返回 `BusinessError::UnknownSheet`
pub fn questions_in_scope<'a>(
    result: &'a SplitManagerResponse,
    filter: &SheetFilter,
) -> AppResult<Vec<ScopedQuestion<'a>>> {
    let sheets: Vec<_> = match filter {
        SheetFilter::All => result.sheets.iter().collect(),
        SheetFilter::Sheet(name) => {
            let sheet = result
                .sheet(name)
                .ok_or_else(|| BusinessError::UnknownSheet {
                    sheet_name: name.clone(),
                })?;
            vec![sheet]
        }
    };

    Ok(sheets
        .into_iter()
        .flat_map(|sheet| {
            sheet.questions.iter().map(move |question| ScopedQuestion {
                sheet_name: &sheet.sheet_name,
                question,
            })
        })
        .collect())
}

/// 一条自动判定记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoDecision {
    pub question_id: QuestionId,
    pub confidence_percent: u32,
    /// 列字母（range.left_letter）
    pub column: String,
    pub sheet_name: String,
}

/// 自动补全摘要
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolutionSummary {
    pub total_questions: usize,
    pub answered_by_user: usize,
    pub auto_no_split: Vec<AutoDecision>,
    pub auto_split: Vec<AutoDecision>,
}

impl ResolutionSummary {
    pub fn auto_decided(&self) -> usize {
        self.auto_no_split.len() + self.auto_split.len()
    }
}

impl fmt::Display for ResolutionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "共 {} 个题目，已人工回答 {} 个，自动判定 {} 个",
            self.total_questions,
            self.answered_by_user,
            self.auto_decided()
        )?;
        if !self.auto_split.is_empty() {
            writeln!(f, "自动判定为拆分:")?;
            for item in &self.auto_split {
                writeln!(
                    f,
                    "  - {} 列 {} (置信度 {}%)",
                    item.sheet_name, item.column, item.confidence_percent
                )?;
            }
        }
        if !self.auto_no_split.is_empty() {
            writeln!(f, "自动判定为不拆分:")?;
            for item in &self.auto_no_split {
                writeln!(
                    f,
                    "  - {} 列 {} (置信度 {}%)",
                    item.sheet_name, item.column, item.confidence_percent
                )?;
            }
        }
        Ok(())
    }
}

/// 补全结果：完整的决策表加摘要
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub decisions: DecisionMap,
    pub summary: ResolutionSummary,
}

/// 自动补全服务
///
/// 职责：
/// - 保留用户已有的决策
/// - 置信度百分比低于阈值判为不拆分，否则判为拆分
/// - 输出的决策表恰好覆盖提交范围内的每个题目
#[derive(Debug, Clone, Copy)]
pub struct AutoResolver {
    threshold_percent: u32,
}

impl AutoResolver {
    pub const DEFAULT_THRESHOLD_PERCENT: u32 = 85;

    pub fn new(threshold_percent: u32) -> Self {
        Self { threshold_percent }
    }

    pub fn threshold_percent(&self) -> u32 {
        self.threshold_percent
    }

    /// 单个题目的自动判定
    pub fn classify(&self, question: &Question) -> SplitChoice {
        if question.decision.confidence_percent() < self.threshold_percent {
            SplitChoice::NoSplit
        } else {
            SplitChoice::Split
        }
    }

    /// 补全决策
    pub fn resolve(&self, scope: &[ScopedQuestion<'_>], decisions: &DecisionMap) -> Resolution {
        let mut complete = DecisionMap::new();
        let mut summary = ResolutionSummary {
            total_questions: scope.len(),
            ..Default::default()
        };

        for scoped in scope {
            let id = &scoped.question.question_id;
            if let Some(choice) = decisions.get(id) {
                complete.insert(id.clone(), *choice);
                summary.answered_by_user += 1;
                continue;
            }

            let choice = self.classify(scoped.question);
            let record = AutoDecision {
                question_id: id.clone(),
                confidence_percent: scoped.question.decision.confidence_percent(),
                column: scoped.question.range.left_letter.clone(),
                sheet_name: scoped.sheet_name.to_string(),
            };
            match choice {
                SplitChoice::NoSplit => summary.auto_no_split.push(record),
                SplitChoice::Split => summary.auto_split.push(record),
            }
            complete.insert(id.clone(), choice);
        }

        Resolution {
            decisions: complete,
            summary,
        }
    }
}

impl Default for AutoResolver {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD_PERCENT)
    }
}
