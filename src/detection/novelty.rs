// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 新目标判定: 当前帧标签集合 与 已见标签集合 求差

use std::collections::BTreeSet;

use super::types::Detection;

/// 已见过的目标类别
#[derive(Clone, Debug, Default)]
pub struct SeenObjects {
    labels: BTreeSet<String>,
}

impl SeenObjects {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录当前帧的标签, 返回新出现的标签 (按名称排序)
    ///
    /// 只有出现新标签时才用当前集合替换已见集合;
    /// 没有新标签时保持不变, 已离开画面的目标仍视为已见
    pub fn observe(&mut self, current: BTreeSet<String>) -> Vec<String> {
        let new_objects: Vec<String> = current.difference(&self.labels).cloned().collect();
        if !new_objects.is_empty() {
            self.labels = current;
        }
        new_objects
    }

    /// 从检测结果中取标签后调用 [`observe`](Self::observe)
    pub fn observe_detections(&mut self, detections: &[Detection]) -> Vec<String> {
        let current = detections.iter().map(|d| d.label.clone()).collect();
        self.observe(current)
    }

    pub fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }
}

/// 新目标提示语
pub fn announcement(label: &str) -> String {
    format!("I detected a {} in the frame!", label)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(labels: &[&str]) -> BTreeSet<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_sighting_reports_all() {
        let mut seen = SeenObjects::new();
        assert_eq!(seen.observe(set(&["person", "cat"])), vec!["cat", "person"]);
        assert_eq!(seen.labels(), &set(&["cat", "person"]));
    }

    #[test]
    fn test_repeated_labels_are_silent() {
        let mut seen = SeenObjects::new();
        seen.observe(set(&["person"]));
        assert!(seen.observe(set(&["person"])).is_empty());
        // 子集也不算新目标, 且不替换已见集合
        seen.observe(set(&["person", "cup"]));
        assert!(seen.observe(set(&["cup"])).is_empty());
        assert_eq!(seen.labels(), &set(&["cup", "person"]));
    }

    #[test]
    fn test_new_label_replaces_seen_set() {
        let mut seen = SeenObjects::new();
        seen.observe(set(&["person", "cup"]));
        assert_eq!(seen.observe(set(&["dog"])), vec!["dog"]);
        assert_eq!(seen.labels(), &set(&["dog"]));
        // person 已被替换出已见集合, 再次出现会重新提示
        assert_eq!(seen.observe(set(&["person", "dog"])), vec!["person"]);
    }

    #[test]
    fn test_empty_frame_keeps_state() {
        let mut seen = SeenObjects::new();
        seen.observe(set(&["cat"]));
        assert!(seen.observe(BTreeSet::new()).is_empty());
        assert!(seen.observe(set(&["cat"])).is_empty());
    }

    #[test]
    fn test_announcement() {
        assert_eq!(announcement("dog"), "I detected a dog in the frame!");
    }
}
