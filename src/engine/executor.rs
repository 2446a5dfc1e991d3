// ==========================================
// 车间排产执行引擎 - 工序执行引擎
// ==========================================
// 职责: 工序前置检查、失败判定、物料转换
// 红线: 工序失败不是错误,由失败策略表消化,永不抛错
// 红线: 消耗按"最高质量优先"选取,产出质量按口径派生
// ==========================================

use crate::config::EngineConfig;
use crate::domain::inventory::Inventory;
use crate::domain::item::ItemInstance;
use crate::domain::job::{Job, ProducedRecord};
use crate::domain::operation::{Operation, OutputQuality};
use crate::domain::types::FailurePolicy;
use crate::engine::capability::EfficiencyPenalty;
use crate::error::EngineResult;
use rand::Rng;
use tracing::debug;

// ==========================================
// OperationOutcome - 工序执行结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome {
    /// 成功: 物料已转换,作业可推进(downgraded 表示本次带降级惩罚)
    Succeeded { downgraded: bool },
    /// 返工: 进度清零,原机台重试,无物料变化
    ReworkRequired,
    /// 报废: 作业失败终止,无物料变化
    Scrapped,
}

// ==========================================
// OperationExecutor - 工序执行引擎
// ==========================================
pub struct OperationExecutor {
    // 无状态引擎,不需要注入依赖
}

impl OperationExecutor {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 前置检查
    // ==========================================

    /// 判断工序是否可开工
    ///
    /// 每条消耗规则都必须在库存中找到 ≥ count × quantity 件
    /// 满足标签/质量上限过滤的物料。
    pub fn can_start(&self, operation: &Operation, inventory: &Inventory, quantity: u32) -> bool {
        operation.consumes.iter().all(|rule| {
            let required = rule.count_per_unit * quantity;
            inventory.count_matching(&rule.item_type_id, &rule.required_tags, rule.max_quality_pct)
                >= required
        })
    }

    // ==========================================
    // 执行
    // ==========================================

    /// 执行工序(在工序计时到期时调用)
    ///
    /// 先做失败判定,再做物料转换:
    /// - SCRAP 失败: 立即报废,不消耗不产出
    /// - REWORK 失败: 进度清零,不消耗不产出
    /// - DOWNGRADE 失败: 降级系数乘以配置惩罚,照常转换并推进
    ///
    /// # 参数
    /// - `penalty`: 指派机台的效率惩罚(质量倍率与失败加成在此生效)
    ///
    /// # 返回
    /// 执行结果;Err 仅在内部不变式被破坏时出现(前置检查已保证物料充足)
    pub fn execute<R: Rng>(
        &self,
        operation: &Operation,
        op_index: usize,
        job: &mut Job,
        penalty: EfficiencyPenalty,
        rng: &mut R,
        config: &EngineConfig,
    ) -> EngineResult<OperationOutcome> {
        // ===== 失败判定 =====
        let failure_chance = (operation.failure_chance + penalty.failure_delta).clamp(0.0, 1.0);
        let failed = failure_chance > 0.0 && rng.gen::<f64>() < failure_chance;

        let mut downgraded = false;
        if failed {
            match operation.failure_policy {
                FailurePolicy::Scrap => {
                    debug!(
                        job_id = %job.job_id,
                        operation_id = %operation.operation_id,
                        "工序失败: 报废"
                    );
                    return Ok(OperationOutcome::Scrapped);
                }
                FailurePolicy::Rework => {
                    job.rework_count += 1;
                    debug!(
                        job_id = %job.job_id,
                        operation_id = %operation.operation_id,
                        rework_count = job.rework_count,
                        "工序失败: 返工重试"
                    );
                    return Ok(OperationOutcome::ReworkRequired);
                }
                FailurePolicy::Downgrade => {
                    job.downgrade_factor *= config.downgrade_quality_factor;
                    downgraded = true;
                    debug!(
                        job_id = %job.job_id,
                        operation_id = %operation.operation_id,
                        downgrade_factor = job.downgrade_factor,
                        "工序失败: 降级推进"
                    );
                }
            }
        }

        // ===== 消耗(最高质量优先,记录台账) =====
        let mut consumed_quantity: u32 = 0;
        let mut consumed_quality_weight: f64 = 0.0;

        for rule in &operation.consumes {
            let required = rule.count_per_unit * job.quantity;
            if required == 0 {
                continue;
            }
            let taken = job.inventory.take_best(
                &rule.item_type_id,
                required,
                &rule.required_tags,
                rule.max_quality_pct,
            )?;
            for lot in &taken {
                consumed_quantity += lot.quantity;
                consumed_quality_weight += lot.quality_pct * lot.quantity as f64;
            }
            job.record_consumption(&rule.item_type_id, required);
        }

        // 继承口径的基准质量: 消耗输入的数量加权平均;无输入时取满分
        let inherited_quality = if consumed_quantity > 0 {
            consumed_quality_weight / consumed_quantity as f64
        } else {
            100.0
        };

        // ===== 产出(质量 = 基准 × 效率质量倍率 × 降级累计系数) =====
        for rule in &operation.produces {
            let produced_count = rule.count_per_unit * job.quantity;
            if produced_count == 0 {
                continue;
            }
            let base_quality = match rule.quality {
                OutputQuality::Fixed(q) => q,
                OutputQuality::InheritInputs => inherited_quality,
            };
            let quality =
                (base_quality * penalty.quality_factor * job.downgrade_factor).clamp(0.0, 100.0);

            let instance = ItemInstance::new(
                &rule.item_type_id,
                produced_count,
                rule.tags.clone(),
                quality,
            );
            job.inventory.add(instance)?;
            job.record_production(
                op_index,
                ProducedRecord {
                    item_type_id: rule.item_type_id.clone(),
                    quantity: produced_count,
                    quality_pct: quality,
                },
            );
        }

        Ok(OperationOutcome::Succeeded { downgraded })
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for OperationExecutor {
    fn default() -> Self {
        Self::new()
    }
}
