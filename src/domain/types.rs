// ==========================================
// 车间排产执行引擎 - 领域类型定义
// ==========================================
// 红线: 作业状态机与设备状态是等级制枚举,不做字符串散落
// 序列化格式: SCREAMING_SNAKE_CASE
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 模拟时间(秒),由宿主驱动推进,引擎自身不计时
pub type SimTime = f64;

// ==========================================
// 作业状态 (Job State)
// ==========================================
// 状态机: QUEUED → IN_PROGRESS → {QUEUED(下一工序) | COMPLETED | FAILED | CANCELLED}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Queued,     // 排队中,等待满足当前工序能力的机台
    InProgress, // 绑定唯一机台,当前工序执行中
    Completed,  // 全部工序完成
    Failed,     // 报废策略失败终止
    Cancelled,  // 人工取消
}

impl JobState {
    /// 是否为终态(终态作业只进归档,不再参与调度)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Queued => write!(f, "QUEUED"),
            JobState::InProgress => write!(f, "IN_PROGRESS"),
            JobState::Completed => write!(f, "COMPLETED"),
            JobState::Failed => write!(f, "FAILED"),
            JobState::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

// ==========================================
// 设备状态 (Equipment Status)
// ==========================================
// 红线: 只有 AVAILABLE 的设备可被指派;BROKEN 由 condition=0 派生
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EquipmentStatus {
    Available,   // 空闲可指派
    Reserved,    // 宿主预留,暂不参与指派
    InUse,       // 正在执行作业
    Maintenance, // 停机保养,暂不参与指派
    Broken,      // 状态值耗尽(condition=0),须保养恢复
}

impl fmt::Display for EquipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EquipmentStatus::Available => write!(f, "AVAILABLE"),
            EquipmentStatus::Reserved => write!(f, "RESERVED"),
            EquipmentStatus::InUse => write!(f, "IN_USE"),
            EquipmentStatus::Maintenance => write!(f, "MAINTENANCE"),
            EquipmentStatus::Broken => write!(f, "BROKEN"),
        }
    }
}

// ==========================================
// 失败策略 (Failure Policy)
// ==========================================
// 工序失败的数据驱动处置方式,永不抛错
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailurePolicy {
    Scrap,     // 报废: 作业立即以 FAILED 终止,无产出
    Downgrade, // 降级: 质量估计乘以固定惩罚系数,照常推进
    Rework,    // 返工: 当前工序进度清零,原机台重试
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Scrap => write!(f, "SCRAP"),
            FailurePolicy::Downgrade => write!(f, "DOWNGRADE"),
            FailurePolicy::Rework => write!(f, "REWORK"),
        }
    }
}
