pub mod split_client;

pub use split_client::SplitApiClient;

use crate::error::AppResult;
use crate::models::{AnalysisResponse, QueuedFile, SubmissionPayload};
use async_trait::async_trait;

/// 拆分管理服务的全部外部接口
///
/// 轮询器、提交协调器和会话只依赖这个 trait，测试时可以替换为内存实现。
#[async_trait]
pub trait SplitService: Send + Sync {
    /// 获取文件的分析状态，结果就绪时同时带回 `file_url` 和 `sheets`
    async fn fetch_analysis(&self, project_id: &str, file_id: &str) -> AppResult<AnalysisResponse>;

    /// 提交拆分决策
    async fn submit_decisions(
        &self,
        project_id: &str,
        file_id: &str,
        payload: &SubmissionPayload,
    ) -> AppResult<()>;

    /// 列出项目下待处理的文件
    async fn list_files(&self, project_id: &str) -> AppResult<Vec<QueuedFile>>;
}
