// ==========================================
// 车间排产执行引擎 - 引擎层
// ==========================================
// 职责: 能力聚合/效率惩罚/工序执行的纯规则计算
// 红线: 引擎层无状态,所有输入显式传入
// ==========================================

pub mod capability;
pub mod executor;

// 重导出核心引擎
pub use capability::{
    aggregate_capabilities, efficiency_ratio, penalty_for_ratio, scaled_duration,
    AggregatedCapability, EfficiencyPenalty,
};
pub use executor::{OperationExecutor, OperationOutcome};
