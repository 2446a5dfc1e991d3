// ==========================================
// 车间排产执行引擎 - 能力聚合与效率惩罚
// ==========================================
// 红线: 五档效率惩罚表是固定口径,档位边界含下界
// 聚合口径: 布尔能力任一实例 condition>0 即在;数值能力
//           consumable 求和、非 consumable 取最大,均按 condition 缩放
// ==========================================

use crate::domain::equipment::{CapabilityValue, EquipmentDefinition, EquipmentInstance};
use crate::domain::operation::CapabilityRequirement;
use crate::domain::types::SimTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// AggregatedCapability - 聚合后的能力值
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregatedCapability {
    Numeric(f64), // 数值能力(求和或取最大后的结果)
    Flag,         // 布尔能力在场
}

/// 聚合一组设备实例的能力视图
///
/// # 参数
/// - `pairs`: (实例, 对应定义) 列表;定义由调用方按目录解析
///
/// # 返回
/// 能力类别 → 聚合值(BTreeMap 保证遍历顺序确定)
pub fn aggregate_capabilities(
    pairs: &[(&EquipmentInstance, &EquipmentDefinition)],
) -> BTreeMap<String, AggregatedCapability> {
    let mut aggregate: BTreeMap<String, AggregatedCapability> = BTreeMap::new();

    for (instance, definition) in pairs {
        for tag in &definition.capabilities {
            match tag.value {
                CapabilityValue::Flag(present) => {
                    // 任一实例 condition>0 即在场
                    if present && instance.condition_pct > 0.0 {
                        aggregate
                            .entry(tag.category.clone())
                            .or_insert(AggregatedCapability::Flag);
                    }
                }
                CapabilityValue::Numeric(v) => {
                    let scaled = v * instance.condition_pct / 100.0;
                    let entry = aggregate
                        .entry(tag.category.clone())
                        .or_insert(AggregatedCapability::Numeric(0.0));
                    if let AggregatedCapability::Numeric(current) = entry {
                        if tag.consumable {
                            *current += scaled;
                        } else {
                            *current = current.max(scaled);
                        }
                    }
                }
            }
        }
    }

    aggregate
}

// ==========================================
// EfficiencyPenalty - 效率惩罚
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyPenalty {
    pub time_factor: f64,    // 时长倍率
    pub quality_factor: f64, // 质量倍率
    pub failure_delta: f64,  // 失败概率加成
}

impl EfficiencyPenalty {
    /// 无惩罚
    pub const NONE: EfficiencyPenalty = EfficiencyPenalty {
        time_factor: 1.0,
        quality_factor: 1.0,
        failure_delta: 0.0,
    };
}

/// 计算效率比
///
/// 效率比 = 可用能力 / (optimal ?? minimum)
pub fn efficiency_ratio(available: f64, requirement: &CapabilityRequirement) -> f64 {
    let baseline = requirement.baseline();
    if baseline <= 0.0 {
        return 1.0;
    }
    available / baseline
}

/// 固定五档效率惩罚表(档位边界含下界)
///
/// | 效率比     | 时长× | 质量× | 失败+ |
/// |-----------|------|-------|------|
/// | ≥0.8      | 1.0  | 1.0   | 0    |
/// | 0.6–0.79  | 1.5  | 0.9   | +5%  |
/// | 0.4–0.59  | 2.0  | 0.8   | +10% |
/// | 0.2–0.39  | 3.0  | 0.65  | +25% |
/// | <0.2      | 5.0  | 0.5   | +50% |
pub fn penalty_for_ratio(ratio: f64) -> EfficiencyPenalty {
    if ratio >= 0.8 {
        EfficiencyPenalty::NONE
    } else if ratio >= 0.6 {
        EfficiencyPenalty {
            time_factor: 1.5,
            quality_factor: 0.9,
            failure_delta: 0.05,
        }
    } else if ratio >= 0.4 {
        EfficiencyPenalty {
            time_factor: 2.0,
            quality_factor: 0.8,
            failure_delta: 0.10,
        }
    } else if ratio >= 0.2 {
        EfficiencyPenalty {
            time_factor: 3.0,
            quality_factor: 0.65,
            failure_delta: 0.25,
        }
    } else {
        EfficiencyPenalty {
            time_factor: 5.0,
            quality_factor: 0.5,
            failure_delta: 0.50,
        }
    }
}

/// 按效率比缩放工序时长
///
/// 效率比 ≥1.0 时按反比缩短(优于最佳值干得快);
/// 效率比 <1.0 时按惩罚表放大([0.8, 1.0) 档不变)。
pub fn scaled_duration(base_duration: SimTime, ratio: f64) -> SimTime {
    if ratio >= 1.0 {
        base_duration / ratio
    } else {
        base_duration * penalty_for_ratio(ratio).time_factor
    }
}
