// ==========================================
// 车间排产执行引擎 - 统一错误类型
// ==========================================
// 红线: 配置类错误必须显式报错,不允许静默忽略
// 说明: 资源不足不是错误(作业保持排队),工序失败不是错误(由失败策略消化)
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 引擎统一错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 配置类错误(调用方缺陷) =====
    #[error("未知设施: facility_id={0}")]
    UnknownFacility(String),

    #[error("未知工艺方法: method_id={0}")]
    UnknownMethod(String),

    #[error("未知设备定义: definition_id={0}")]
    UnknownEquipmentDefinition(String),

    #[error("未知设备实例: equipment_id={0}")]
    UnknownEquipment(String),

    #[error("设施已存在: facility_id={0}")]
    FacilityAlreadyExists(String),

    #[error("设备实例已存在: equipment_id={0}")]
    EquipmentAlreadyExists(String),

    // ===== 参数类错误 =====
    #[error("作业数量无效: quantity={0}, 必须大于 0")]
    InvalidQuantity(u32),

    #[error("工艺方法为空: method_id={0}, 工序列表不能为空")]
    EmptyMethod(String),

    #[error("设备归属设施不符: equipment_id={equipment_id}, expected={expected}, actual={actual}")]
    FacilityMismatch {
        equipment_id: String,
        expected: String,
        actual: String,
    },

    // ===== 库存类错误 =====
    #[error("库存容量不足: owner={owner}, capacity={capacity}, 放入 {incoming} 件会超限")]
    InventoryCapacityExceeded {
        owner: String,
        capacity: u32,
        incoming: u32,
    },

    #[error("物料不足: item_type={item_type_id}, 需要 {required} 件, 可用 {available} 件")]
    InsufficientMaterials {
        item_type_id: String,
        required: u32,
        available: u32,
    },

    // ===== 生命周期类错误 =====
    #[error("设备正在执行作业,不可变更状态: equipment_id={0}")]
    EquipmentBusy(String),

    #[error("设备状态不可由宿主直接设置: equipment_id={equipment_id}, status={status}")]
    InvalidEquipmentStatus {
        equipment_id: String,
        status: String,
    },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
