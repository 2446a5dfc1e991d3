// ==========================================
// 车间排产执行引擎 - 作业优先级队列
// ==========================================
// 排队规则:
// 1) 加急作业插入队头
// 2) 普通作业插入首个优先级严格更低的普通作业之前,且不越过任何加急作业
// 3) 同优先级保持先来后到
// 红线: 跨 tick 的指派遍历顺序即队列顺序,保证优先级稳定
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// QueueEntry - 队列条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub job_id: String, // 作业ID
    pub priority: i32,  // 优先级(大者优先)
    pub rush: bool,     // 加急标志
}

// ==========================================
// JobQueue - 设施级作业队列
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobQueue {
    entries: Vec<QueueEntry>,
}

impl JobQueue {
    /// 创建空队列
    pub fn new() -> Self {
        Self::default()
    }

    /// 按排队规则插入作业
    pub fn insert(&mut self, job_id: &str, priority: i32, rush: bool) {
        let entry = QueueEntry {
            job_id: job_id.to_string(),
            priority,
            rush,
        };

        if rush {
            // 加急: 插入队头
            self.entries.insert(0, entry);
            return;
        }

        // 普通: 跳过所有加急条目,找到首个优先级严格更低的普通条目
        let position = self
            .entries
            .iter()
            .position(|e| !e.rush && e.priority < priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(position, entry);
    }

    /// 插入队头(设备移除回退专用,无视排队规则)
    pub fn insert_front(&mut self, job_id: &str, priority: i32, rush: bool) {
        self.entries.insert(
            0,
            QueueEntry {
                job_id: job_id.to_string(),
                priority,
                rush,
            },
        );
    }

    /// 移除指定作业
    ///
    /// # 返回
    /// - `true`: 作业在队列中且已移除
    pub fn remove(&mut self, job_id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.job_id != job_id);
        self.entries.len() != before
    }

    /// 是否包含指定作业
    pub fn contains(&self, job_id: &str) -> bool {
        self.entries.iter().any(|e| e.job_id == job_id)
    }

    /// 按队列顺序遍历作业ID
    pub fn iter_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.job_id.as_str())
    }

    /// 队列长度
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn ids(queue: &JobQueue) -> Vec<&str> {
        queue.iter_ids().collect()
    }

    #[test]
    fn test_normal_insert_orders_by_priority_then_arrival() {
        let mut queue = JobQueue::new();
        queue.insert("J_P5_A", 5, false);
        queue.insert("J_P3", 3, false);
        queue.insert("J_P5_B", 5, false); // 同优先级,排在 J_P5_A 之后
        queue.insert("J_P9", 9, false);

        assert_eq!(ids(&queue), vec!["J_P9", "J_P5_A", "J_P5_B", "J_P3"]);
    }

    #[test]
    fn test_rush_inserts_at_head() {
        let mut queue = JobQueue::new();
        queue.insert("J_NORMAL", 9, false);
        queue.insert("J_RUSH", 0, true);

        // 加急无视优先级,直接队头
        assert_eq!(ids(&queue), vec!["J_RUSH", "J_NORMAL"]);
    }

    #[test]
    fn test_normal_never_passes_rush() {
        let mut queue = JobQueue::new();
        queue.insert("J_RUSH", 0, true);
        queue.insert("J_P9", 9, false);
        queue.insert("J_P5", 5, false);

        assert_eq!(ids(&queue), vec!["J_RUSH", "J_P9", "J_P5"]);
    }

    #[test]
    fn test_insert_front_overrides_ordering() {
        let mut queue = JobQueue::new();
        queue.insert("J_RUSH", 0, true);
        queue.insert_front("J_EVICTED", 1, false);

        assert_eq!(ids(&queue), vec!["J_EVICTED", "J_RUSH"]);
    }

    #[test]
    fn test_remove() {
        let mut queue = JobQueue::new();
        queue.insert("J1", 1, false);
        queue.insert("J2", 2, false);

        assert!(queue.remove("J1"));
        assert!(!queue.remove("J1"));
        assert_eq!(queue.len(), 1);
        assert!(queue.contains("J2"));
    }
}
