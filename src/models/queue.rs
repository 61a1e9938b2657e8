use serde::{Deserialize, Serialize};
use std::fmt;

/// 待处理队列中的一个文件，由文件列表服务提供
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedFile {
    pub id: String,
    pub name: String,
}

impl QueuedFile {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for QueuedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

/// 进度指示：当前第几个文件 / 共几个
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuePosition {
    pub index: usize,
    pub total: usize,
    pub name: String,
}
