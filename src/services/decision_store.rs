//! 决策存储 - 业务能力层
//!
//! 保存当前文件的人工拆分决策。纯数据，不做校验，合法性在提交时检查。

use crate::models::{DecisionMap, QuestionId, SplitChoice};

/// 决策存储
///
/// 只作用于当前文件，切换文件或提交成功后清空
#[derive(Debug, Clone, Default)]
pub struct DecisionStore {
    decisions: DecisionMap,
}

impl DecisionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置单个决策，覆盖已有值
    pub fn set_decision(&mut self, question_id: impl Into<QuestionId>, choice: SplitChoice) {
        self.decisions.insert(question_id.into(), choice);
    }

    /// 批量设置同一个决策（"全部拆分 / 全部不拆分"）
    pub fn set_bulk<I, Q>(&mut self, question_ids: I, choice: SplitChoice)
    where
        I: IntoIterator<Item = Q>,
        Q: Into<QuestionId>,
    {
        for id in question_ids {
            self.decisions.insert(id.into(), choice);
        }
    }

    pub fn clear(&mut self) {
        self.decisions.clear();
    }

    pub fn get(&self, question_id: &str) -> Option<SplitChoice> {
        self.decisions.get(question_id).copied()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn decisions(&self) -> &DecisionMap {
        &self.decisions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_decision_overwrites() {
        let mut store = DecisionStore::new();
        store.set_decision("q1", SplitChoice::Split);
        store.set_decision("q1", SplitChoice::NoSplit);
        assert_eq!(store.get("q1"), Some(SplitChoice::NoSplit));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_set_bulk_applies_same_value() {
        let mut store = DecisionStore::new();
        store.set_decision("q2", SplitChoice::NoSplit);
        store.set_bulk(["q1", "q2", "q3"], SplitChoice::Split);
        assert_eq!(store.len(), 3);
        assert!(store
            .decisions()
            .values()
            .all(|choice| *choice == SplitChoice::Split));
    }

    #[test]
    fn test_clear_empties_store() {
        let mut store = DecisionStore::new();
        store.set_bulk(vec!["a".to_string(), "b".to_string()], SplitChoice::NoSplit);
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.get("a"), None);
    }
}
