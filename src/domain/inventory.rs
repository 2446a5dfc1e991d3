// ==========================================
// 车间排产执行引擎 - 库存模型
// ==========================================
// 红线: 库存间转移是移动,不是复制;回流物料永不丢弃
// 用途: 设施库存(长生命周期共享)与作业库存(作业私有)共用同一实现
// ==========================================

use crate::domain::item::ItemInstance;
use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// Inventory - 按所有者划分的有界库存
// ==========================================
// 按基础物料类型分组;BTreeMap 保证遍历顺序确定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    pub owner_id: String,                           // 所有者(设施ID或作业ID)
    pub capacity: Option<u32>,                      // 容量上限(总件数,None=不限)
    items: BTreeMap<String, Vec<ItemInstance>>,     // 物料类型 → 批次列表
}

impl Inventory {
    /// 创建空库存
    pub fn new(owner_id: &str, capacity: Option<u32>) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            capacity,
            items: BTreeMap::new(),
        }
    }

    // ==========================================
    // 查询方法
    // ==========================================

    /// 库存总件数
    pub fn total_quantity(&self) -> u32 {
        self.items
            .values()
            .flat_map(|lots| lots.iter())
            .map(|i| i.quantity)
            .sum()
    }

    /// 指定类型的件数(不过滤)
    pub fn quantity_of(&self, item_type_id: &str) -> u32 {
        self.items
            .get(item_type_id)
            .map(|lots| lots.iter().map(|i| i.quantity).sum())
            .unwrap_or(0)
    }

    /// 满足标签/质量上限过滤的件数
    pub fn count_matching(
        &self,
        item_type_id: &str,
        required_tags: &[String],
        max_quality_pct: Option<f64>,
    ) -> u32 {
        self.items
            .get(item_type_id)
            .map(|lots| {
                lots.iter()
                    .filter(|i| i.has_tags(required_tags) && i.within_max_quality(max_quality_pct))
                    .map(|i| i.quantity)
                    .sum()
            })
            .unwrap_or(0)
    }

    /// 遍历全部批次(确定顺序)
    pub fn iter(&self) -> impl Iterator<Item = &ItemInstance> {
        self.items.values().flat_map(|lots| lots.iter())
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.total_quantity() == 0
    }

    // ==========================================
    // 放入方法
    // ==========================================

    /// 放入物料(容量检查)
    ///
    /// 同类型、同标签、同质量分的批次会被合并,避免批次碎片化。
    /// 调用方须在放入前确认容量;超限时实例不入库。
    ///
    /// # 返回
    /// - `Err(InventoryCapacityExceeded)`: 超出容量上限
    pub fn add(&mut self, instance: ItemInstance) -> EngineResult<()> {
        if let Some(capacity) = self.capacity {
            let incoming = instance.quantity;
            if self.total_quantity() + incoming > capacity {
                return Err(EngineError::InventoryCapacityExceeded {
                    owner: self.owner_id.clone(),
                    capacity,
                    incoming,
                });
            }
        }
        self.add_unchecked(instance);
        Ok(())
    }

    /// 放入物料(绕过容量检查)
    ///
    /// 仅用于终态作业库存回流: 回收物料必须落地,不允许因容量丢弃。
    pub fn add_unchecked(&mut self, instance: ItemInstance) {
        if instance.quantity == 0 {
            return;
        }
        let lots = self.items.entry(instance.item_type_id.clone()).or_default();
        if let Some(existing) = lots.iter_mut().find(|l| l.merges_with(&instance)) {
            existing.quantity += instance.quantity;
        } else {
            lots.push(instance);
        }
    }

    // ==========================================
    // 取出方法
    // ==========================================

    /// 按"最高质量优先"取出满足过滤条件的 count 件
    ///
    /// 全有或全无: 件数不足时库存不发生任何变化。
    ///
    /// # 参数
    /// - `required_tags`: 批次必须带有的全部标签
    /// - `max_quality_pct`: 质量上限过滤(None 不过滤)
    ///
    /// # 返回
    /// 取出的批次列表(质量从高到低),或 InsufficientMaterials
    pub fn take_best(
        &mut self,
        item_type_id: &str,
        count: u32,
        required_tags: &[String],
        max_quality_pct: Option<f64>,
    ) -> EngineResult<Vec<ItemInstance>> {
        let available = self.count_matching(item_type_id, required_tags, max_quality_pct);
        if available < count {
            return Err(EngineError::InsufficientMaterials {
                item_type_id: item_type_id.to_string(),
                required: count,
                available,
            });
        }

        let lots = self.items.entry(item_type_id.to_string()).or_default();

        // 候选批次下标按质量从高到低排序(同质量保持原顺序)
        let mut candidates: Vec<usize> = (0..lots.len())
            .filter(|&i| {
                lots[i].has_tags(required_tags) && lots[i].within_max_quality(max_quality_pct)
            })
            .collect();
        candidates.sort_by(|&a, &b| lots[b].quality_pct.total_cmp(&lots[a].quality_pct));

        let mut remaining = count;
        let mut taken = Vec::new();
        for idx in candidates {
            if remaining == 0 {
                break;
            }
            let take = remaining.min(lots[idx].quantity);
            if let Some(moved) = lots[idx].split_off(take) {
                remaining -= moved.quantity;
                taken.push(moved);
            }
        }

        // 清理耗尽批次
        lots.retain(|l| l.quantity > 0);
        if lots.is_empty() {
            self.items.remove(item_type_id);
        }

        Ok(taken)
    }

    /// 取空全部批次(终态作业回流入口)
    pub fn drain_all(&mut self) -> Vec<ItemInstance> {
        let mut drained = Vec::new();
        for (_, mut lots) in std::mem::take(&mut self.items) {
            drained.append(&mut lots);
        }
        drained
    }

    /// 按类型汇总件数(归档记录用)
    pub fn summarize(&self) -> BTreeMap<String, u32> {
        let mut summary = BTreeMap::new();
        for item in self.iter() {
            *summary.entry(item.item_type_id.clone()).or_insert(0) += item.quantity;
        }
        summary
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_inventory(capacity: Option<u32>) -> Inventory {
        Inventory::new("FAC1", capacity)
    }

    #[test]
    fn test_add_merges_identical_lots() {
        let mut inventory = create_test_inventory(None);
        inventory.add(ItemInstance::new("steel_bar", 5, vec![], 90.0)).unwrap();
        inventory.add(ItemInstance::new("steel_bar", 3, vec![], 90.0)).unwrap();
        inventory.add(ItemInstance::new("steel_bar", 2, vec![], 70.0)).unwrap();

        assert_eq!(inventory.quantity_of("steel_bar"), 10);
        // 同质量批次合并,不同质量分开
        assert_eq!(inventory.iter().count(), 2);
    }

    #[test]
    fn test_capacity_bound_rejects_overflow() {
        let mut inventory = create_test_inventory(Some(8));
        inventory.add(ItemInstance::new("steel_bar", 5, vec![], 90.0)).unwrap();

        let result = inventory.add(ItemInstance::new("steel_bar", 4, vec![], 90.0));
        assert!(matches!(
            result,
            Err(EngineError::InventoryCapacityExceeded { capacity: 8, incoming: 4, .. })
        ));
        assert_eq!(inventory.total_quantity(), 5);

        // 绕过容量的回流路径不受限
        inventory.add_unchecked(ItemInstance::new("steel_bar", 4, vec![], 90.0));
        assert_eq!(inventory.total_quantity(), 9);
    }

    #[test]
    fn test_take_best_prefers_highest_quality() {
        let mut inventory = create_test_inventory(None);
        inventory.add(ItemInstance::new("steel_bar", 4, vec![], 60.0)).unwrap();
        inventory.add(ItemInstance::new("steel_bar", 4, vec![], 95.0)).unwrap();

        let taken = inventory.take_best("steel_bar", 5, &[], None).unwrap();

        // 先取 95 分的 4 件,再取 60 分的 1 件
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[0].quality_pct, 95.0);
        assert_eq!(taken[0].quantity, 4);
        assert_eq!(taken[1].quality_pct, 60.0);
        assert_eq!(taken[1].quantity, 1);
        assert_eq!(inventory.quantity_of("steel_bar"), 3);
    }

    #[test]
    fn test_take_best_all_or_nothing() {
        let mut inventory = create_test_inventory(None);
        inventory.add(ItemInstance::new("steel_bar", 3, vec![], 90.0)).unwrap();

        let result = inventory.take_best("steel_bar", 5, &[], None);
        assert!(matches!(
            result,
            Err(EngineError::InsufficientMaterials { required: 5, available: 3, .. })
        ));
        // 失败不改变库存
        assert_eq!(inventory.quantity_of("steel_bar"), 3);
    }

    #[test]
    fn test_take_best_honors_tag_and_quality_filters() {
        let mut inventory = create_test_inventory(None);
        inventory
            .add(ItemInstance::new("blank", 2, vec!["ROUGH".to_string()], 50.0))
            .unwrap();
        inventory
            .add(ItemInstance::new("blank", 2, vec!["PRECISION".to_string()], 99.0))
            .unwrap();

        // 标签过滤: 只有 ROUGH 的 2 件可用
        assert_eq!(inventory.count_matching("blank", &["ROUGH".to_string()], None), 2);

        // 质量上限过滤: 99 分批次被排除
        let taken = inventory.take_best("blank", 2, &[], Some(60.0)).unwrap();
        assert_eq!(taken[0].quality_pct, 50.0);
        assert_eq!(inventory.quantity_of("blank"), 2);
    }

    #[test]
    fn test_drain_all_empties_inventory() {
        let mut inventory = create_test_inventory(None);
        inventory.add(ItemInstance::new("steel_bar", 3, vec![], 90.0)).unwrap();
        inventory.add(ItemInstance::new("blank", 2, vec![], 80.0)).unwrap();

        let drained = inventory.drain_all();
        let total: u32 = drained.iter().map(|i| i.quantity).sum();
        assert_eq!(total, 5);
        assert!(inventory.is_empty());
    }
}
