//! 文件处理上下文
//!
//! 封装"我正在处理哪个项目的哪个文件"这一信息

use std::fmt::Display;

use crate::models::QueuedFile;

/// 文件处理上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCtx {
    /// 项目ID
    pub project_id: String,

    /// 文件ID
    pub file_id: String,

    /// 文件名（仅用于日志显示）
    pub file_name: String,
}

impl FileCtx {
    pub fn new(project_id: impl Into<String>, file: &QueuedFile) -> Self {
        Self {
            project_id: project_id.into(),
            file_id: file.id.clone(),
            file_name: file.name.clone(),
        }
    }
}

impl Display for FileCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[文件 {}#{}]", self.file_name, self.file_id)
    }
}
