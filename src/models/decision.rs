use crate::error::BusinessError;
use crate::models::analysis::QuestionId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 二元拆分决策，提交时序列化为 0 / 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum SplitChoice {
    NoSplit,
    Split,
}

impl SplitChoice {
    pub fn as_u8(self) -> u8 {
        match self {
            SplitChoice::NoSplit => 0,
            SplitChoice::Split => 1,
        }
    }
}

impl From<SplitChoice> for u8 {
    fn from(choice: SplitChoice) -> Self {
        choice.as_u8()
    }
}

impl TryFrom<u8> for SplitChoice {
    type Error = BusinessError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SplitChoice::NoSplit),
            1 => Ok(SplitChoice::Split),
            other => Err(BusinessError::InvalidDecision {
                value: i64::from(other),
            }),
        }
    }
}

impl fmt::Display for SplitChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitChoice::NoSplit => write!(f, "不拆分"),
            SplitChoice::Split => write!(f, "拆分"),
        }
    }
}

/// 当前文件的决策表：question_id → 决策
pub type DecisionMap = BTreeMap<QuestionId, SplitChoice>;

/// 提交范围：全部工作表或单个工作表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SheetFilter {
    #[default]
    All,
    Sheet(String),
}

impl SheetFilter {
    /// 提交给服务端的工作表名称，全部工作表时为 `None`
    pub fn sheet_name(&self) -> Option<&str> {
        match self {
            SheetFilter::All => None,
            SheetFilter::Sheet(name) => Some(name),
        }
    }
}

impl fmt::Display for SheetFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetFilter::All => write!(f, "全部工作表"),
            SheetFilter::Sheet(name) => write!(f, "工作表 {}", name),
        }
    }
}

/// 提交接口中的单条决策
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionEntry {
    pub question_id: QuestionId,
    pub decision: SplitChoice,
}

/// 提交接口请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub decisions: Vec<DecisionEntry>,
    /// 全部工作表时序列化为 null
    pub sheet_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_serializes_binary_decisions_and_null_sheet() {
        let payload = SubmissionPayload {
            decisions: vec![
                DecisionEntry {
                    question_id: "a1".to_string(),
                    decision: SplitChoice::Split,
                },
                DecisionEntry {
                    question_id: "a2".to_string(),
                    decision: SplitChoice::NoSplit,
                },
            ],
            sheet_name: None,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "decisions": [
                    { "question_id": "a1", "decision": 1 },
                    { "question_id": "a2", "decision": 0 }
                ],
                "sheet_name": null
            })
        );
    }

    #[test]
    fn test_choice_rejects_non_binary_value() {
        assert!(serde_json::from_value::<SplitChoice>(json!(2)).is_err());
        assert_eq!(SplitChoice::try_from(1).unwrap(), SplitChoice::Split);
    }
}
