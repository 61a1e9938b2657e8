use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// 题目ID，只在单个文件的当前分析结果内唯一
pub type QuestionId = String;

/// 文件分析状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisStatus {
    #[serde(rename = "uploaded")]
    Uploaded,
    #[serde(rename = "in_progress")]
    InProgress,
    #[serde(rename = "processing")]
    Processing,
    #[serde(rename = "paused")]
    Paused,
    #[serde(rename = "in-review")]
    InReview,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "failed")]
    Failed,
}

impl AnalysisStatus {
    /// 处于这些状态时需要继续轮询
    pub fn is_polling_eligible(self) -> bool {
        matches!(
            self,
            AnalysisStatus::Uploaded | AnalysisStatus::InProgress | AnalysisStatus::Processing
        )
    }

    /// 状态标签
    pub fn label(self) -> &'static str {
        match self {
            AnalysisStatus::Uploaded => "Uploaded",
            AnalysisStatus::InProgress => "In Progress",
            AnalysisStatus::Processing => "Processing",
            AnalysisStatus::Paused => "Paused",
            AnalysisStatus::InReview => "In Review",
            AnalysisStatus::Completed => "Completed",
            AnalysisStatus::Failed => "Failed",
        }
    }

    /// 状态说明
    pub fn description(self) -> &'static str {
        match self {
            AnalysisStatus::Uploaded => "The file has been uploaded and is waiting to be analyzed.",
            AnalysisStatus::InProgress => "Analysis has started for this file.",
            AnalysisStatus::Processing => "The file is being analyzed. Results will appear automatically.",
            AnalysisStatus::Paused => "Analysis is paused for this file.",
            AnalysisStatus::InReview => "Split suggestions are ready for review.",
            AnalysisStatus::Completed => "Analysis is complete.",
            AnalysisStatus::Failed => "Analysis failed for this file.",
        }
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 候选列范围
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRange {
    pub left_letter: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_letter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_row: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_row: Option<u32>,
}

/// 分析服务给出的拆分建议
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDecision {
    /// 需要拆分的置信度，取值 [0, 1]
    pub confidence: f64,
}

impl QuestionDecision {
    /// 置信度百分比（四舍五入）
    ///
    /// 超出 [0, 1] 的值截断到边界；非有限值按 0% 处理
    pub fn confidence_percent(&self) -> u32 {
        if !self.confidence.is_finite() {
            warn!("⚠️ 置信度不是有限值 ({})，按 0% 处理", self.confidence);
            return 0;
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            warn!("⚠️ 置信度 {} 超出 [0, 1]，已截断", self.confidence);
        }
        (self.confidence.clamp(0.0, 1.0) * 100.0).round() as u32
    }
}

/// 一个待判断是否拆分的列范围
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(deserialize_with = "deserialize_question_id")]
    pub question_id: QuestionId,
    pub range: QuestionRange,
    pub decision: QuestionDecision,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub sheet_name: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// 可用的分析结果：文件地址和非空的工作表列表同时存在
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitManagerResponse {
    pub file_url: String,
    pub sheets: Vec<Sheet>,
}

impl SplitManagerResponse {
    pub fn sheet(&self, sheet_name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.sheet_name == sheet_name)
    }

    pub fn question_count(&self) -> usize {
        self.sheets.iter().map(|s| s.questions.len()).sum()
    }
}

/// 轮询接口的原始返回
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub status: AnalysisStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheets: Option<Vec<Sheet>>,
}

impl AnalysisResponse {
    /// 只有 `file_url` 和非空 `sheets` 都存在时才视为可用，与状态无关
    pub fn usable_result(&self) -> Option<SplitManagerResponse> {
        match (&self.file_url, &self.sheets) {
            (Some(file_url), Some(sheets)) if !file_url.is_empty() && !sheets.is_empty() => {
                Some(SplitManagerResponse {
                    file_url: file_url.clone(),
                    sheets: sheets.clone(),
                })
            }
            _ => None,
        }
    }
}

// 题目ID可能是字符串也可能是整数
fn deserialize_question_id<'de, D>(deserializer: D) -> Result<QuestionId, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;

    struct QuestionIdVisitor;

    impl<'de> Visitor<'de> for QuestionIdVisitor {
        type Value = QuestionId;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer question id")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(QuestionIdVisitor)
}
