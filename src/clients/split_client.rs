/// 拆分管理 API 客户端
///
/// 封装所有与拆分管理 API 相关的调用逻辑
use crate::clients::SplitService;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{AnalysisResponse, QueuedFile, SubmissionPayload};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// 拆分管理 API 客户端
pub struct SplitApiClient {
    http: Client,
    base_url: String,
    token: String,
}

impl SplitApiClient {
    /// 创建新的客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::api_request_failed("client", e))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
        })
    }

    fn analysis_url(&self, project_id: &str, file_id: &str) -> String {
        format!(
            "{}/projects/{}/files/{}/split-manager",
            self.base_url, project_id, file_id
        )
    }

    fn submit_url(&self, project_id: &str, file_id: &str) -> String {
        format!(
            "{}/projects/{}/files/{}/split-decisions",
            self.base_url, project_id, file_id
        )
    }

    fn files_url(&self, project_id: &str) -> String {
        format!("{}/projects/{}/files", self.base_url, project_id)
    }

    /// 附加认证头
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        if self.token.is_empty() {
            request
        } else {
            request.bearer_auth(&self.token)
        }
    }

    /// 发送请求，非 2xx 响应转换为 `ApiError::BadResponse`
    async fn send(&self, endpoint: &str, request: RequestBuilder) -> AppResult<Response> {
        let response = self
            .authorized(request)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!("API 错误响应 ({}): {} {}", endpoint, status, body);
        Err(AppError::bad_response(
            endpoint,
            Some(status.as_u16()),
            Self::extract_error_message(&body),
        ))
    }

    async fn read_json<T: DeserializeOwned>(endpoint: &str, response: Response) -> AppResult<T> {
        let text = response
            .text()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// 从错误响应体中提取可读的错误信息
    pub fn extract_error_message(body: &str) -> Option<String> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return None;
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => ["message", "detail", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
                .map(|s| s.to_string())
                .or_else(|| Some(trimmed.to_string())),
            Err(_) => Some(trimmed.to_string()),
        }
    }
}

#[async_trait]
impl SplitService for SplitApiClient {
    async fn fetch_analysis(&self, project_id: &str, file_id: &str) -> AppResult<AnalysisResponse> {
        let url = self.analysis_url(project_id, file_id);
        debug!("获取分析状态: {}", url);

        let response = self.send("split-manager", self.http.get(&url)).await?;
        Self::read_json("split-manager", response).await
    }

    async fn submit_decisions(
        &self,
        project_id: &str,
        file_id: &str,
        payload: &SubmissionPayload,
    ) -> AppResult<()> {
        let url = self.submit_url(project_id, file_id);
        debug!("提交拆分决策 Payload: {}", serde_json::to_string(payload)?);

        self.send("split-decisions", self.http.post(&url).json(payload))
            .await?;
        Ok(())
    }

    async fn list_files(&self, project_id: &str) -> AppResult<Vec<QueuedFile>> {
        let url = self.files_url(project_id);
        debug!("获取文件列表: {}", url);

        let response = self.send("files", self.http.get(&url)).await?;
        Self::read_json("files", response).await
    }
}
