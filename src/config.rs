use crate::error::{AppError, AppResult, ConfigError};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 拆分管理 API 配置 ---
    pub api_base_url: String,
    pub api_token: String,
    /// 当前处理的项目ID
    pub project_id: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    // --- 轮询配置 ---
    /// 两次轮询之间的间隔（秒），从上一次请求结束开始计时
    pub poll_interval_secs: u64,
    /// 连续失败多少次后停止轮询，`None` 表示一直轮询
    pub max_failed_polls: Option<u32>,
    // --- 自动补全配置 ---
    /// 置信度百分比不低于该值时自动判定为拆分
    pub split_threshold_percent: u32,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 通知日志文件
    pub notice_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            api_token: String::new(),
            project_id: String::new(),
            request_timeout_secs: 30,
            poll_interval_secs: 5,
            max_failed_polls: None,
            split_threshold_percent: 85,
            verbose_logging: false,
            notice_log_file: "notices.txt".to_string(),
        }
    }
}

impl Config {
    /// 从环境变量读取配置，缺失的项使用默认值
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_base_url: std::env::var("SPLIT_API_BASE_URL").unwrap_or(default.api_base_url),
            api_token: std::env::var("SPLIT_API_TOKEN").unwrap_or(default.api_token),
            project_id: std::env::var("SPLIT_PROJECT_ID").unwrap_or(default.project_id),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            poll_interval_secs: std::env::var("POLL_INTERVAL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.poll_interval_secs),
            max_failed_polls: std::env::var("MAX_FAILED_POLLS").ok().and_then(|v| v.parse().ok()).or(default.max_failed_polls),
            split_threshold_percent: std::env::var("SPLIT_THRESHOLD_PERCENT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.split_threshold_percent),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            notice_log_file: std::env::var("NOTICE_LOG_FILE").unwrap_or(default.notice_log_file),
        }
    }

    /// 从 TOML 文件读取配置
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// 优先读取 `SPLIT_CONFIG_FILE` 指向的文件，否则回退到环境变量
    pub fn load() -> AppResult<Self> {
        match std::env::var("SPLIT_CONFIG_FILE") {
            Ok(path) => Self::from_file(Path::new(&path)),
            Err(_) => {
                let config = Self::from_env();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.split_threshold_percent > 100 {
            return Err(ConfigError::InvalidValue {
                field: "split_threshold_percent".to_string(),
                reason: format!("{} 超过 100", self.split_threshold_percent),
            }
            .into());
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_secs".to_string(),
                reason: "轮询间隔不能为 0".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// 轮询相关的配置子集
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_secs(self.poll_interval_secs),
            max_failed_polls: self.max_failed_polls,
        }
    }
}

/// 状态轮询配置
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_failed_polls: Option<u32>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Config::default().poll_settings()
    }
}
