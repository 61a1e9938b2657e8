//! 文件队列导航 - 编排层
//!
//! 持有有序的文件列表和当前位置。只负责位置变化，
//! 停止轮询、清空决策等副作用由会话根据返回值执行。

use tracing::info;

use crate::error::{AppResult, BusinessError};
use crate::models::{QueuePosition, QueuedFile};

/// 提交成功后队列的去向
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueAdvance {
    /// 停留在同一索引，对应原来的下一个文件
    Next(QueuedFile),
    /// 队列已空或索引越界，流程结束
    Exhausted,
}

/// 文件队列
#[derive(Debug, Clone, Default)]
pub struct FileQueue {
    files: Vec<QueuedFile>,
    current: usize,
}

impl FileQueue {
    pub fn new(files: Vec<QueuedFile>) -> Self {
        Self { files, current: 0 }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> &[QueuedFile] {
        &self.files
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&QueuedFile> {
        self.files.get(self.current)
    }

    /// 进度指示
    pub fn position(&self) -> Option<QueuePosition> {
        self.current().map(|file| QueuePosition {
            index: self.current,
            total: self.files.len(),
            name: file.name.clone(),
        })
    }

    /// 上一个文件，已在开头时不变；返回位置是否变化
    pub fn select_previous(&mut self) -> bool {
        if self.current == 0 || self.files.is_empty() {
            return false;
        }
        self.current -= 1;
        true
    }

    /// 下一个文件，已在末尾时不变；返回位置是否变化
    pub fn select_next(&mut self) -> bool {
        if self.current + 1 >= self.files.len() {
            return false;
        }
        self.current += 1;
        true
    }

    /// 跳到指定索引；与当前索引相同时不变
    pub fn select_index(&mut self, index: usize) -> AppResult<bool> {
        if index >= self.files.len() {
            return Err(BusinessError::IndexOutOfRange {
                index,
                max_index: self.files.len().saturating_sub(1),
            }
            .into());
        }
        if index == self.current {
            return Ok(false);
        }
        self.current = index;
        Ok(true)
    }

    /// 移除当前文件（只在提交成功后调用）
    pub fn remove_current_and_advance(&mut self) -> QueueAdvance {
        if self.current >= self.files.len() {
            return QueueAdvance::Exhausted;
        }

        let removed = self.files.remove(self.current);
        info!(
            "🗑️ 已从队列移除: {} (剩余 {} 个)",
            removed,
            self.files.len()
        );

        match self.files.get(self.current) {
            Some(next) => QueueAdvance::Next(next.clone()),
            None => QueueAdvance::Exhausted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(n: usize) -> FileQueue {
        FileQueue::new(
            (1..=n)
                .map(|i| QueuedFile::new(format!("f{}", i), format!("file-{}.xlsx", i)))
                .collect(),
        )
    }

    #[test]
    fn test_navigation_is_noop_at_bounds() {
        let mut q = queue(2);
        assert!(!q.select_previous());
        assert!(q.select_next());
        assert!(!q.select_next());
        assert_eq!(q.current_index(), 1);
        assert!(q.select_previous());
        assert_eq!(q.current().unwrap().id, "f1");
    }

    #[test]
    fn test_select_index_is_idempotent_and_bounded() {
        let mut q = queue(3);
        assert!(!q.select_index(0).unwrap());
        assert!(q.select_index(2).unwrap());
        assert!(!q.select_index(2).unwrap());
        assert!(q.select_index(3).is_err());
        assert_eq!(q.current_index(), 2);
    }

    #[test]
    fn test_remove_shifts_next_file_into_current_index() {
        let mut q = queue(3);
        assert_eq!(
            q.remove_current_and_advance(),
            QueueAdvance::Next(QueuedFile::new("f2", "file-2.xlsx"))
        );
        assert_eq!(q.len(), 2);
        assert_eq!(q.current_index(), 0);
        assert_eq!(q.position().unwrap().name, "file-2.xlsx");
    }

    #[test]
    fn test_remove_last_file_signals_exhaustion() {
        let mut q = queue(1);
        assert_eq!(q.remove_current_and_advance(), QueueAdvance::Exhausted);
        assert!(q.is_empty());
        assert_eq!(q.remove_current_and_advance(), QueueAdvance::Exhausted);
    }

    #[test]
    fn test_remove_at_tail_exhausts_even_with_earlier_files() {
        let mut q = queue(3);
        q.select_index(2).unwrap();
        assert_eq!(q.remove_current_and_advance(), QueueAdvance::Exhausted);
        assert_eq!(q.len(), 2);
    }
}
