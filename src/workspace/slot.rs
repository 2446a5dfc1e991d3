// ==========================================
// 车间排产执行引擎 - 机台槽位模型
// ==========================================
// 红线: 槽位与可作业设备实例一一对应;current_job 与 progress 同生同灭
// 红线: 不抢占,占用中的槽位只能由完成/取消/设备移除释放
// ==========================================

use crate::domain::types::SimTime;
use serde::{Deserialize, Serialize};

// ==========================================
// SlotProgress - 工序进度记录
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotProgress {
    pub started_at: SimTime,           // 开工时刻
    pub estimated_completion: SimTime, // 预计完工时刻
}

// ==========================================
// MachineSlot - 机台槽位
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineSlot {
    pub equipment_id: String,           // 对应设备实例
    current_job: Option<String>,        // 占用作业(与 progress 同生同灭)
    current_progress: Option<SlotProgress>, // 进度记录
}

impl MachineSlot {
    /// 创建空闲槽位
    pub fn new(equipment_id: &str) -> Self {
        Self {
            equipment_id: equipment_id.to_string(),
            current_job: None,
            current_progress: None,
        }
    }

    /// 是否空闲
    pub fn is_idle(&self) -> bool {
        self.current_job.is_none()
    }

    /// 占用中的作业ID
    pub fn current_job(&self) -> Option<&str> {
        self.current_job.as_deref()
    }

    /// 进度记录
    pub fn progress(&self) -> Option<SlotProgress> {
        self.current_progress
    }

    /// 占用槽位(同时写入作业与进度,维持同生同灭不变式)
    pub fn occupy(&mut self, job_id: &str, started_at: SimTime, estimated_completion: SimTime) {
        self.current_job = Some(job_id.to_string());
        self.current_progress = Some(SlotProgress {
            started_at,
            estimated_completion,
        });
    }

    /// 返工重置: 保持占用,进度从 now 重新起算
    pub fn restart(&mut self, now: SimTime, estimated_completion: SimTime) {
        if self.current_job.is_some() {
            self.current_progress = Some(SlotProgress {
                started_at: now,
                estimated_completion,
            });
        }
    }

    /// 释放槽位,返回此前占用的作业ID
    pub fn release(&mut self) -> Option<String> {
        self.current_progress = None;
        self.current_job.take()
    }

    /// 工序计时是否已到期
    pub fn is_due(&self, now: SimTime) -> bool {
        match self.current_progress {
            Some(progress) => now >= progress.estimated_completion,
            None => false,
        }
    }
}
