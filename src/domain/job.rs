// ==========================================
// 车间排产执行引擎 - 作业运行时模型
// ==========================================
// 红线: 任一时刻恰有一个当前工序下标;一个作业至多占用一台机台
// 红线: current_op_index 在终态前单调不减
// ==========================================

use crate::domain::inventory::Inventory;
use crate::domain::types::{JobState, SimTime};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// ProducedRecord - 工序产出记录
// ==========================================
// 产出台账条目,不持有物料所有权(实例本体在作业库存中)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducedRecord {
    pub item_type_id: String, // 产出物料类型
    pub quantity: u32,        // 产出件数
    pub quality_pct: f64,     // 产出质量分
}

// ==========================================
// Job - 作业(可变运行时单元)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    // ===== 主键与关联 =====
    pub job_id: String,      // 作业唯一标识(UUID)
    pub facility_id: String, // 归属设施
    pub product_id: String,  // 目标产品物料类型
    pub method_id: String,   // 工艺方法(静态参考数据,按ID解析)

    // ===== 订单参数 =====
    pub quantity: u32,    // 产品数量
    pub priority: i32,    // 优先级(大者优先)
    pub rush_order: bool, // 加急标志(插队头)
    pub created_at: SimTime, // 创建时刻(模拟时间)

    // ===== 生命周期 =====
    pub state: JobState,                    // 生命周期状态
    pub current_op_index: usize,            // 当前工序下标
    pub completed_operation_ids: Vec<String>, // 已完成工序ID(按完成顺序)

    // ===== 物料 =====
    pub inventory: Inventory,                          // 作业私有库存
    pub materials_reserved: bool,                      // 净物料清单是否已预留到位
    pub consumed_totals: BTreeMap<String, u32>,        // 累计消耗台账(类型→件数)
    pub produced_by_op: BTreeMap<usize, Vec<ProducedRecord>>, // 工序下标→产出台账

    // ===== 执行现场 =====
    pub assigned_equipment_id: Option<String>, // 当前占用的机台(仅 IN_PROGRESS)
    pub downgrade_factor: f64,                 // 降级累计质量系数(初始 1.0)
    pub rework_count: u32,                     // 返工累计次数(诊断用)
}

impl Job {
    /// 创建新作业(工序 0 起步,排队态)
    pub fn new(
        job_id: &str,
        facility_id: &str,
        product_id: &str,
        method_id: &str,
        quantity: u32,
        priority: i32,
        rush_order: bool,
        created_at: SimTime,
    ) -> Self {
        Self {
            job_id: job_id.to_string(),
            facility_id: facility_id.to_string(),
            product_id: product_id.to_string(),
            method_id: method_id.to_string(),
            quantity,
            priority,
            rush_order,
            created_at,
            state: JobState::Queued,
            current_op_index: 0,
            completed_operation_ids: Vec::new(),
            inventory: Inventory::new(job_id, None),
            materials_reserved: false,
            consumed_totals: BTreeMap::new(),
            produced_by_op: BTreeMap::new(),
            assigned_equipment_id: None,
            downgrade_factor: 1.0,
            rework_count: 0,
        }
    }

    /// 是否处于终态
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// 记录一次消耗(累计台账)
    pub fn record_consumption(&mut self, item_type_id: &str, quantity: u32) {
        *self
            .consumed_totals
            .entry(item_type_id.to_string())
            .or_insert(0) += quantity;
    }

    /// 记录一次产出(按当前工序下标归档)
    pub fn record_production(&mut self, op_index: usize, record: ProducedRecord) {
        self.produced_by_op.entry(op_index).or_default().push(record);
    }

    /// 当前工序完成,推进到下一工序
    ///
    /// # 参数
    /// - `operation_id`: 刚完成的工序ID
    ///
    /// # 返回
    /// - `true`: 还有后续工序,作业回到排队态
    /// - `false`: 已是最后一道工序,由调用方转入 COMPLETED
    pub fn advance_operation(&mut self, operation_id: &str, operation_count: usize) -> bool {
        self.completed_operation_ids.push(operation_id.to_string());
        self.current_op_index += 1;
        self.current_op_index < operation_count
    }
}

// ==========================================
// JobArchiveRecord - 终态作业归档记录
// ==========================================
// 用途: 有界完成/失败/取消日志;物料本体已回流设施库存
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobArchiveRecord {
    pub job_id: String,                            // 作业ID
    pub product_id: String,                        // 产品类型
    pub method_id: String,                         // 工艺方法ID
    pub quantity: u32,                             // 订单数量
    pub final_state: JobState,                     // 终态
    pub completed_operation_ids: Vec<String>,      // 完成的工序清单
    pub recovered_materials: BTreeMap<String, u32>, // 回流物料汇总(类型→件数)
    pub archived_at_sim: SimTime,                  // 归档时刻(模拟时间)
    pub archived_at: DateTime<Utc>,                // 归档时刻(墙钟,审计用)
}
