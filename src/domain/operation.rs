// ==========================================
// 车间排产执行引擎 - 工序与工艺方法模型
// ==========================================
// 红线: 工序与方法不可变,同方法的所有作业共享同一份定义
// 红线: 消耗/产出只有一种带标签的表示,不保留旧字段形态
// ==========================================

use crate::domain::types::{FailurePolicy, SimTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// CapabilityRequirement - 工序能力要求
// ==========================================
// 效率比 = 可用能力 / (optimal ?? minimum)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityRequirement {
    pub category: String,    // 能力类别代码
    pub minimum: f64,        // 最低要求,低于此值不可指派
    pub optimal: Option<f64>, // 最佳值,缺省时以 minimum 为基准
}

impl CapabilityRequirement {
    /// 效率比基准值
    pub fn baseline(&self) -> f64 {
        self.optimal.unwrap_or(self.minimum)
    }
}

// ==========================================
// ConsumptionRule - 消耗规则
// ==========================================
// count_per_unit 按作业数量线性放大
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionRule {
    pub item_type_id: String,          // 消耗的物料类型
    pub count_per_unit: u32,           // 每件产品消耗数
    #[serde(default)]
    pub required_tags: Vec<String>,    // 批次必须带有的标签
    #[serde(default)]
    pub max_quality_pct: Option<f64>,  // 质量上限过滤(允许消耗低质输入)
}

// ==========================================
// OutputQuality - 产出质量口径
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputQuality {
    Fixed(f64),    // 固定质量分
    InheritInputs, // 按消耗输入的数量加权平均质量派生
}

// ==========================================
// ProductionRule - 产出规则
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRule {
    pub item_type_id: String,    // 产出的物料类型
    pub count_per_unit: u32,     // 每件产品产出数
    #[serde(default)]
    pub tags: Vec<String>,       // 产出批次携带的标签
    pub quality: OutputQuality,  // 质量口径
}

// ==========================================
// Operation - 工序
// ==========================================
// 一个原子步骤: 一项能力要求 + 时长 + 可选物料转换 + 失败策略
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub operation_id: String,               // 工序唯一标识
    pub name: String,                       // 工序名称
    pub requirement: CapabilityRequirement, // 能力要求
    pub base_duration: SimTime,             // 基准时长(模拟秒)
    #[serde(default)]
    pub consumes: Vec<ConsumptionRule>,     // 消耗规则(可为空)
    #[serde(default)]
    pub produces: Vec<ProductionRule>,      // 产出规则(可为空)
    pub failure_chance: f64,                // 基础失败概率(0-1)
    pub failure_policy: FailurePolicy,      // 失败策略
}

// ==========================================
// Method - 工艺方法
// ==========================================
// 产出一种产品的有序工序配方
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Method {
    pub method_id: String,            // 方法唯一标识
    pub name: String,                 // 方法名称
    pub product_id: String,           // 最终产品物料类型
    pub operations: Vec<Operation>,   // 有序工序列表
    #[serde(default)]
    pub output_tags: Vec<String>,     // 最终产品附加标签
    pub quality_range: (f64, f64),    // 最终产品质量分区间(min, max)
}

impl Method {
    /// 计算净物料清单(外部投料需求)
    ///
    /// 按工序顺序推演: 前道工序的产出优先抵扣后道工序的消耗,
    /// 抵扣不掉的部分才是需要从设施库存预留的外部需求。
    /// 抵扣按物料类型口径进行,标签/质量过滤在执行期逐工序判定。
    ///
    /// # 参数
    /// - `quantity`: 作业数量
    ///
    /// # 返回
    /// 物料类型 → 外部需求件数
    pub fn net_bill_of_materials(&self, quantity: u32) -> BTreeMap<String, u32> {
        let mut external: BTreeMap<String, u32> = BTreeMap::new();
        let mut internal: BTreeMap<String, u32> = BTreeMap::new();

        for operation in &self.operations {
            for rule in &operation.consumes {
                let mut needed = rule.count_per_unit * quantity;
                if let Some(stock) = internal.get_mut(&rule.item_type_id) {
                    let offset = needed.min(*stock);
                    *stock -= offset;
                    needed -= offset;
                }
                if needed > 0 {
                    *external.entry(rule.item_type_id.clone()).or_insert(0) += needed;
                }
            }
            for rule in &operation.produces {
                *internal.entry(rule.item_type_id.clone()).or_insert(0) +=
                    rule.count_per_unit * quantity;
            }
        }

        external
    }

    /// 按下标取工序
    pub fn operation(&self, index: usize) -> Option<&Operation> {
        self.operations.get(index)
    }

    /// 工序总数
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_operation(
        operation_id: &str,
        consumes: Vec<ConsumptionRule>,
        produces: Vec<ProductionRule>,
    ) -> Operation {
        Operation {
            operation_id: operation_id.to_string(),
            name: operation_id.to_string(),
            requirement: CapabilityRequirement {
                category: "MILLING".to_string(),
                minimum: 10.0,
                optimal: None,
            },
            base_duration: 60.0,
            consumes,
            produces,
            failure_chance: 0.0,
            failure_policy: FailurePolicy::Scrap,
        }
    }

    fn consume(item_type_id: &str, count_per_unit: u32) -> ConsumptionRule {
        ConsumptionRule {
            item_type_id: item_type_id.to_string(),
            count_per_unit,
            required_tags: vec![],
            max_quality_pct: None,
        }
    }

    fn produce(item_type_id: &str, count_per_unit: u32) -> ProductionRule {
        ProductionRule {
            item_type_id: item_type_id.to_string(),
            count_per_unit,
            tags: vec![],
            quality: OutputQuality::InheritInputs,
        }
    }

    #[test]
    fn test_net_bom_excludes_internal_intermediates() {
        // 铣削: 钢→粗坯, 车削: 粗坯→精坯, 装配: 粗坯+精坯→产品
        let method = Method {
            method_id: "M_GEAR".to_string(),
            name: "齿轮箱".to_string(),
            product_id: "gearbox".to_string(),
            operations: vec![
                create_test_operation(
                    "OP_MILL",
                    vec![consume("steel_bar", 2)],
                    vec![produce("rough_part", 2)],
                ),
                create_test_operation(
                    "OP_TURN",
                    vec![consume("rough_part", 1)],
                    vec![produce("precision_part", 1)],
                ),
                create_test_operation(
                    "OP_ASSEMBLE",
                    vec![consume("rough_part", 1), consume("precision_part", 1)],
                    vec![produce("gearbox", 1)],
                ),
            ],
            output_tags: vec![],
            quality_range: (0.0, 100.0),
        };

        let bom = method.net_bill_of_materials(1);

        // 粗坯与精坯全部由内部产出抵扣,只需外购钢材
        assert_eq!(bom.len(), 1);
        assert_eq!(bom.get("steel_bar"), Some(&2));

        // 数量线性放大
        let bom3 = method.net_bill_of_materials(3);
        assert_eq!(bom3.get("steel_bar"), Some(&6));
    }

    #[test]
    fn test_net_bom_partial_internal_coverage() {
        // 产出 1 件中间品但消耗 3 件 → 缺口 2 件走外部需求
        let method = Method {
            method_id: "M_X".to_string(),
            name: "X".to_string(),
            product_id: "x".to_string(),
            operations: vec![
                create_test_operation("OP_A", vec![consume("ore", 1)], vec![produce("ingot", 1)]),
                create_test_operation("OP_B", vec![consume("ingot", 3)], vec![produce("x", 1)]),
            ],
            output_tags: vec![],
            quality_range: (0.0, 100.0),
        };

        let bom = method.net_bill_of_materials(1);
        assert_eq!(bom.get("ore"), Some(&1));
        assert_eq!(bom.get("ingot"), Some(&2));
    }

    #[test]
    fn test_requirement_baseline_prefers_optimal() {
        let requirement = CapabilityRequirement {
            category: "MILLING".to_string(),
            minimum: 10.0,
            optimal: Some(30.0),
        };
        assert_eq!(requirement.baseline(), 30.0);

        let requirement = CapabilityRequirement {
            category: "MILLING".to_string(),
            minimum: 10.0,
            optimal: None,
        };
        assert_eq!(requirement.baseline(), 10.0);
    }
}
