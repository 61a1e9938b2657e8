//! 通知服务 - 业务能力层
//!
//! 只负责"向用户展示一条通知"能力（相当于界面上的 toast），不关心流程

use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;
use tracing::{info, warn};

/// 通知级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// 面向用户的一条通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// 通知出口
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// 通知写入服务
///
/// 职责：
/// - 把通知写入日志
/// - 同时追加到通知文件（notices.txt），方便事后查看
/// - 写文件失败只记日志，不影响流程
pub struct NoticeWriter {
    notice_file_path: Option<String>,
    // 串行化文件追加
    file_lock: Mutex<()>,
}

impl NoticeWriter {
    /// 只写日志，不落盘
    pub fn new() -> Self {
        Self {
            notice_file_path: None,
            file_lock: Mutex::new(()),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            notice_file_path: Some(path.into()),
            file_lock: Mutex::new(()),
        }
    }

    fn append(&self, path: &str, notice: &Notice) -> std::io::Result<()> {
        let _guard = self.file_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let level = match notice.level {
            NoticeLevel::Info => "INFO",
            NoticeLevel::Error => "ERROR",
        };
        writeln!(
            file,
            "{} [{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            level,
            notice.message
        )
    }
}

impl Default for NoticeWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for NoticeWriter {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => info!("📢 {}", notice.message),
            NoticeLevel::Error => warn!("⚠️ {}", notice.message),
        }

        if let Some(path) = &self.notice_file_path {
            if let Err(e) = self.append(path, &notice) {
                warn!("写入通知文件失败 ({}): {}", path, e);
            }
        }
    }
}
