// ==========================================
// 车间排产执行引擎 - 工作区事件
// ==========================================
// 说明: 事件入队缓冲,tick 主体结束后整体交给宿主;
//       宿主回调不会在槽位/队列遍历中途重入工作区
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// WorkspaceEvent - 工作区对外事件
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkspaceEvent {
    /// 作业完成(每个到达 COMPLETED 的作业恰好一次)
    JobCompleted {
        job_id: String,
        product_id: String,
        method_name: String,
        quantity: u32,
    },
    /// 作业因报废策略失败终止
    JobFailed {
        job_id: String,
        product_id: String,
        operation_id: String,
    },
    /// 作业被取消,附回收物料汇总
    JobCancelled {
        job_id: String,
        recovered_materials: BTreeMap<String, u32>,
    },
}
