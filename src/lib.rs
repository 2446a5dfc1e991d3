// ==========================================
// 车间排产执行引擎 - 核心库
// ==========================================
// 系统定位: 单进程模拟制造调度内核(宿主驱动 tick)
// 技术栈: Rust + serde + tracing
// 红线: 引擎不计时、不持久化、不渲染,这些都归宿主
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 能力聚合/效率惩罚/工序执行
pub mod engine;

// 工作区层 - 设施级调度现场与 tick 主循环
pub mod workspace;

// 参考数据目录 - 显式传入的只读句柄
pub mod catalog;

// 配置层 - 引擎可调参数
pub mod config;

// 错误类型
pub mod error;

// 日志系统
pub mod logging;

// 对外接口层 - 多设施门面
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{EquipmentStatus, FailurePolicy, JobState, SimTime};

// 领域实体
pub use domain::{
    CapabilityRequirement, CapabilityTag, CapabilityValue, ConsumptionRule, EquipmentDefinition,
    EquipmentInstance, Inventory, ItemInstance, Job, JobArchiveRecord, Method, Operation,
    OutputQuality, ProducedRecord, ProductionRule,
};

// 引擎
pub use engine::{
    aggregate_capabilities, efficiency_ratio, penalty_for_ratio, scaled_duration,
    AggregatedCapability, EfficiencyPenalty, OperationExecutor, OperationOutcome,
};

// 工作区
pub use workspace::{JobQueue, MachineSlot, SlotProgress, Workspace, WorkspaceEvent};

// 门面与配套
pub use api::SchedulingApi;
pub use catalog::ReferenceCatalog;
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "车间排产执行引擎";

// ==========================================
// 预编译检查
// ==========================================

// 确保编译时所有模块可见
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
