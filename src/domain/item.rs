// ==========================================
// 车间排产执行引擎 - 物料实例模型
// ==========================================
// 红线: 物料实例除数量递减外不可变;库存间转移是移动,不是复制
// 用途: 带标签、带质量分的物料/产品批次
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// ItemInstance - 物料实例
// ==========================================
// 同一实例内的数量共享同一组标签和质量分(同批次口径)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInstance {
    pub item_type_id: String, // 基础物料类型
    pub quantity: u32,        // 批次数量
    pub tags: Vec<String>,    // 描述性标签(如 ROUGH/PRECISION)
    pub quality_pct: f64,     // 质量分(0-100)
}

impl ItemInstance {
    /// 创建物料实例(质量分夹取到 0-100)
    pub fn new(item_type_id: &str, quantity: u32, tags: Vec<String>, quality_pct: f64) -> Self {
        Self {
            item_type_id: item_type_id.to_string(),
            quantity,
            tags,
            quality_pct: quality_pct.clamp(0.0, 100.0),
        }
    }

    /// 判断是否带有全部要求标签(空要求恒为真)
    pub fn has_tags(&self, required_tags: &[String]) -> bool {
        required_tags.iter().all(|t| self.tags.contains(t))
    }

    /// 判断是否满足质量上限过滤(None 不过滤)
    pub fn within_max_quality(&self, max_quality_pct: Option<f64>) -> bool {
        match max_quality_pct {
            Some(max) => self.quality_pct <= max,
            None => true,
        }
    }

    /// 从本实例移出 count 件,返回移出部分
    ///
    /// 源实例数量递减,移出部分继承标签与质量分。这是所有权移动的
    /// 唯一入口: 调用方必须把返回值放入目标库存,否则物料即丢失。
    ///
    /// # 参数
    /// - `count`: 移出数量,必须 ≤ 当前数量
    ///
    /// # 返回
    /// - `Some(moved)`: 移出的批次
    /// - `None`: count 超过当前数量,不发生任何变化
    pub fn split_off(&mut self, count: u32) -> Option<ItemInstance> {
        if count == 0 || count > self.quantity {
            return None;
        }
        self.quantity -= count;
        Some(ItemInstance {
            item_type_id: self.item_type_id.clone(),
            quantity: count,
            tags: self.tags.clone(),
            quality_pct: self.quality_pct,
        })
    }

    /// 是否可与另一实例合并(同类型、同标签、同质量分)
    pub fn merges_with(&self, other: &ItemInstance) -> bool {
        self.item_type_id == other.item_type_id
            && self.tags == other.tags
            && (self.quality_pct - other.quality_pct).abs() < f64::EPSILON
    }
}
