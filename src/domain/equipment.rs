// ==========================================
// 车间排产执行引擎 - 设备领域模型
// ==========================================
// 红线: 设备定义是静态参考数据,引擎层只读
// 用途: 能力标签声明 + 设备实例状态(condition/status)
// ==========================================

use crate::domain::types::EquipmentStatus;
use serde::{Deserialize, Serialize};

// ==========================================
// CapabilityValue - 能力值
// ==========================================
// 数值能力有强度(如 MILLING=30),布尔能力只有有无(如 HEAT_TREATMENT)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CapabilityValue {
    Numeric(f64),
    Flag(bool),
}

// ==========================================
// CapabilityTag - 能力标签
// ==========================================
// consumable: 数值能力聚合时求和(如台面面积),否则取实例最大值(如加工精度)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityTag {
    pub category: String,       // 能力类别代码(如 MILLING/TURNING)
    pub value: CapabilityValue, // 能力值
    pub consumable: bool,       // 聚合口径: true=求和, false=取最大
}

impl CapabilityTag {
    /// 构造数值能力标签
    pub fn numeric(category: &str, value: f64, consumable: bool) -> Self {
        Self {
            category: category.to_string(),
            value: CapabilityValue::Numeric(value),
            consumable,
        }
    }

    /// 构造布尔能力标签
    pub fn flag(category: &str) -> Self {
        Self {
            category: category.to_string(),
            value: CapabilityValue::Flag(true),
            consumable: false,
        }
    }
}

// ==========================================
// EquipmentDefinition - 设备定义(静态参考数据)
// ==========================================
// 用途: 目录层持有,引擎层按 definition_id 查询
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentDefinition {
    // ===== 主键 =====
    pub definition_id: String, // 设备定义唯一标识

    // ===== 基础信息 =====
    pub name: String,                  // 设备名称
    pub capabilities: Vec<CapabilityTag>, // 能力标签列表

    // ===== 占地与成本 =====
    pub footprint: f64,        // 占地面积(平方米)
    pub acquisition_cost: f64, // 购置成本

    // ===== 损耗曲线 =====
    pub condition_decay_per_op: f64, // 每完成一次工序执行的状态损耗(百分点)
}

impl EquipmentDefinition {
    /// 查找指定类别的能力标签
    pub fn capability(&self, category: &str) -> Option<&CapabilityTag> {
        self.capabilities.iter().find(|c| c.category == category)
    }
}

// ==========================================
// EquipmentInstance - 设备实例
// ==========================================
// 红线: 能力值按 condition/100 比例缩放,condition=0 即 BROKEN
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentInstance {
    // ===== 主键与关联 =====
    pub equipment_id: String,  // 设备实例唯一标识
    pub definition_id: String, // 关联设备定义(静态参考数据)
    pub facility_id: String,   // 归属设施

    // ===== 运行状态 =====
    pub condition_pct: f64,       // 状态值(0-100),随使用损耗,保养恢复
    pub status: EquipmentStatus,  // 设备状态
}

impl EquipmentInstance {
    /// 创建全新设备实例(状态值 100,空闲可指派)
    pub fn new(equipment_id: &str, definition_id: &str, facility_id: &str) -> Self {
        Self {
            equipment_id: equipment_id.to_string(),
            definition_id: definition_id.to_string(),
            facility_id: facility_id.to_string(),
            condition_pct: 100.0,
            status: EquipmentStatus::Available,
        }
    }

    /// 计算指定类别的有效能力值
    ///
    /// 数值能力按 condition/100 缩放;布尔能力在 condition>0 时视为 1.0。
    ///
    /// # 返回
    /// - `Some(value)`: 该类别存在且有效
    /// - `None`: 定义未声明该类别,或布尔能力已失效
    pub fn effective_capability(
        &self,
        definition: &EquipmentDefinition,
        category: &str,
    ) -> Option<f64> {
        let tag = definition.capability(category)?;
        match tag.value {
            CapabilityValue::Numeric(v) => Some(v * self.condition_pct / 100.0),
            CapabilityValue::Flag(present) => {
                if present && self.condition_pct > 0.0 {
                    Some(1.0)
                } else {
                    None
                }
            }
        }
    }

    /// 施加一次工序损耗,状态值耗尽则转为 BROKEN
    pub fn apply_wear(&mut self, decay_pct: f64) {
        self.condition_pct = (self.condition_pct - decay_pct).max(0.0);
        if self.condition_pct <= 0.0 {
            self.status = EquipmentStatus::Broken;
        }
    }

    /// 保养: 状态值恢复至 100,状态转为空闲
    pub fn restore(&mut self) {
        self.condition_pct = 100.0;
        self.status = EquipmentStatus::Available;
    }

    /// 是否可被调度器指派
    pub fn is_assignable(&self) -> bool {
        self.status == EquipmentStatus::Available && self.condition_pct > 0.0
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_definition() -> EquipmentDefinition {
        EquipmentDefinition {
            definition_id: "DEF_MILL".to_string(),
            name: "立式铣床".to_string(),
            capabilities: vec![
                CapabilityTag::numeric("MILLING", 30.0, false),
                CapabilityTag::flag("COOLANT"),
            ],
            footprint: 6.0,
            acquisition_cost: 12000.0,
            condition_decay_per_op: 2.0,
        }
    }

    #[test]
    fn test_effective_capability_scales_with_condition() {
        let definition = create_test_definition();
        let mut instance = EquipmentInstance::new("EQ1", "DEF_MILL", "FAC1");

        assert_eq!(instance.effective_capability(&definition, "MILLING"), Some(30.0));

        // 50% 状态值 → 有效能力减半
        instance.condition_pct = 50.0;
        assert_eq!(instance.effective_capability(&definition, "MILLING"), Some(15.0));
    }

    #[test]
    fn test_flag_capability_requires_positive_condition() {
        let definition = create_test_definition();
        let mut instance = EquipmentInstance::new("EQ1", "DEF_MILL", "FAC1");

        assert_eq!(instance.effective_capability(&definition, "COOLANT"), Some(1.0));

        instance.condition_pct = 0.0;
        assert_eq!(instance.effective_capability(&definition, "COOLANT"), None);
    }

    #[test]
    fn test_unknown_category_is_absent() {
        let definition = create_test_definition();
        let instance = EquipmentInstance::new("EQ1", "DEF_MILL", "FAC1");
        assert_eq!(instance.effective_capability(&definition, "WELDING"), None);
    }

    #[test]
    fn test_wear_to_zero_marks_broken() {
        let mut instance = EquipmentInstance::new("EQ1", "DEF_MILL", "FAC1");
        instance.apply_wear(60.0);
        assert_eq!(instance.condition_pct, 40.0);
        assert_eq!(instance.status, EquipmentStatus::Available);

        instance.apply_wear(60.0);
        assert_eq!(instance.condition_pct, 0.0);
        assert_eq!(instance.status, EquipmentStatus::Broken);
        assert!(!instance.is_assignable());

        instance.restore();
        assert_eq!(instance.condition_pct, 100.0);
        assert!(instance.is_assignable());
    }
}
