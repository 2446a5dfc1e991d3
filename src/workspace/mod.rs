// ==========================================
// 车间排产执行引擎 - 工作区层
// ==========================================
// 职责: 设施级调度现场(槽位/队列/归档)与 tick 主循环
// 红线: 工作区独占本设施的库存与队列,设施间互不共享
// ==========================================

pub mod core;
pub mod events;
pub mod queue;
pub mod slot;

// 重导出核心类型
pub use self::core::Workspace;
pub use self::events::WorkspaceEvent;
pub use self::queue::{JobQueue, QueueEntry};
pub use self::slot::{MachineSlot, SlotProgress};
