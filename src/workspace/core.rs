// ==========================================
// 车间排产执行引擎 - 设施工作区
// ==========================================
// 职责: 一个设施的全部机台槽位 + 单一作业队列 + 有界归档日志 + tick 主循环
// 红线: 单线程协作式,tick 内先结算全部完成再做新指派
// 红线: 取消同步生效,不排队到下一 tick
// 红线: 设施间工作区完全独立,不共享设备与库存
// ==========================================

use crate::catalog::ReferenceCatalog;
use crate::config::EngineConfig;
use crate::domain::equipment::EquipmentInstance;
use crate::domain::inventory::Inventory;
use crate::domain::item::ItemInstance;
use crate::domain::job::{Job, JobArchiveRecord};
use crate::domain::types::{EquipmentStatus, JobState, SimTime};
use crate::engine::capability::{
    aggregate_capabilities, efficiency_ratio, penalty_for_ratio, scaled_duration,
    AggregatedCapability,
};
use crate::engine::executor::{OperationExecutor, OperationOutcome};
use crate::error::{EngineError, EngineResult};
use crate::workspace::events::WorkspaceEvent;
use crate::workspace::queue::JobQueue;
use crate::workspace::slot::MachineSlot;
use chrono::Utc;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// Workspace - 设施工作区
// ==========================================
// 可整体序列化: 机台指派、队列顺序、作业库存、归档、随机数流
// 全部落在快照里;设备定义/工艺方法属静态参考数据,不入快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    // ===== 标识与配置 =====
    facility_id: String,
    config: EngineConfig,

    // ===== 模拟时钟(宿主驱动) =====
    now: SimTime,

    // ===== 共享可变资源(本工作区独占) =====
    inventory: Inventory,                            // 设施库存
    queue: JobQueue,                                 // 作业队列

    // ===== 设备与槽位(equipment_id 一一对应) =====
    equipment: BTreeMap<String, EquipmentInstance>,
    slots: BTreeMap<String, MachineSlot>,

    // ===== 作业(仅非终态;终态只留归档) =====
    jobs: BTreeMap<String, Job>,

    // ===== 归档与事件 =====
    archive: VecDeque<JobArchiveRecord>,             // 有界 FIFO
    pending_events: Vec<WorkspaceEvent>,             // tick 结束后整体交付宿主

    // ===== 失败判定随机数流(入快照,恢复后续流不变) =====
    rng: ChaCha8Rng,
}

impl Workspace {
    /// 创建空工作区
    ///
    /// # 参数
    /// - `inventory_capacity`: 设施库存容量上限(None=不限)
    pub fn new(facility_id: &str, inventory_capacity: Option<u32>, config: EngineConfig) -> Self {
        let config = config.sanitized();
        let rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        Self {
            facility_id: facility_id.to_string(),
            config,
            now: 0.0,
            inventory: Inventory::new(facility_id, inventory_capacity),
            queue: JobQueue::new(),
            equipment: BTreeMap::new(),
            slots: BTreeMap::new(),
            jobs: BTreeMap::new(),
            archive: VecDeque::new(),
            pending_events: Vec::new(),
            rng,
        }
    }

    // ==========================================
    // 只读访问
    // ==========================================

    pub fn facility_id(&self) -> &str {
        &self.facility_id
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 设施库存(只读)
    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// 设施库存(可写,宿主入库/出库用)
    pub fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    /// 活跃作业查询(终态作业只在归档中)
    pub fn job(&self, job_id: &str) -> Option<&Job> {
        self.jobs.get(job_id)
    }

    /// 全部活跃作业
    pub fn active_jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    /// 按队列顺序的作业ID
    pub fn queued_ids(&self) -> Vec<String> {
        self.queue.iter_ids().map(String::from).collect()
    }

    /// 归档日志(老→新)
    pub fn archive(&self) -> impl Iterator<Item = &JobArchiveRecord> {
        self.archive.iter()
    }

    pub fn slot(&self, equipment_id: &str) -> Option<&MachineSlot> {
        self.slots.get(equipment_id)
    }

    pub fn equipment(&self, equipment_id: &str) -> Option<&EquipmentInstance> {
        self.equipment.get(equipment_id)
    }

    /// 设施能力聚合视图(诊断用)
    pub fn facility_capabilities(
        &self,
        catalog: &ReferenceCatalog,
    ) -> EngineResult<BTreeMap<String, AggregatedCapability>> {
        let mut pairs = Vec::with_capacity(self.equipment.len());
        for instance in self.equipment.values() {
            let definition = catalog.equipment_definition(&instance.definition_id)?;
            pairs.push((instance, definition));
        }
        Ok(aggregate_capabilities(&pairs))
    }

    /// 停滞作业诊断: 排队中但物料未预留,或设施内没有任何设备
    /// 的有效能力达到当前工序下限。引擎本身永不超时淘汰作业。
    pub fn stalled_jobs(&self, catalog: &ReferenceCatalog) -> EngineResult<Vec<String>> {
        let mut stalled = Vec::new();
        for job_id in self.queue.iter_ids() {
            let Some(job) = self.jobs.get(job_id) else {
                continue;
            };
            if !job.materials_reserved {
                stalled.push(job_id.to_string());
                continue;
            }
            let method = catalog.method(&job.method_id)?;
            let Some(operation) = method.operation(job.current_op_index) else {
                continue;
            };
            let mut satisfiable = false;
            for instance in self.equipment.values() {
                let definition = catalog.equipment_definition(&instance.definition_id)?;
                if let Some(available) =
                    instance.effective_capability(definition, &operation.requirement.category)
                {
                    if available >= operation.requirement.minimum {
                        satisfiable = true;
                        break;
                    }
                }
            }
            if !satisfiable {
                stalled.push(job_id.to_string());
            }
        }
        Ok(stalled)
    }

    // ==========================================
    // 设备管理
    // ==========================================

    /// 新增设备: 建立对应槽位,不打扰运行中的作业
    pub fn add_equipment(
        &mut self,
        catalog: &ReferenceCatalog,
        instance: EquipmentInstance,
    ) -> EngineResult<()> {
        catalog.equipment_definition(&instance.definition_id)?;
        if instance.facility_id != self.facility_id {
            return Err(EngineError::FacilityMismatch {
                equipment_id: instance.equipment_id.clone(),
                expected: self.facility_id.clone(),
                actual: instance.facility_id.clone(),
            });
        }
        if self.equipment.contains_key(&instance.equipment_id) {
            return Err(EngineError::EquipmentAlreadyExists(
                instance.equipment_id.clone(),
            ));
        }
        info!(
            facility_id = %self.facility_id,
            equipment_id = %instance.equipment_id,
            definition_id = %instance.definition_id,
            "新增设备"
        );
        self.slots.insert(
            instance.equipment_id.clone(),
            MachineSlot::new(&instance.equipment_id),
        );
        self.equipment.insert(instance.equipment_id.clone(), instance);
        Ok(())
    }

    /// 移除设备: 执行中的作业回退队头,完成历史保留
    pub fn remove_equipment(&mut self, equipment_id: &str) -> EngineResult<EquipmentInstance> {
        let instance = self
            .equipment
            .remove(equipment_id)
            .ok_or_else(|| EngineError::UnknownEquipment(equipment_id.to_string()))?;

        if let Some(mut slot) = self.slots.remove(equipment_id) {
            if let Some(job_id) = slot.release() {
                let mut requeue = None;
                if let Some(job) = self.jobs.get_mut(&job_id) {
                    job.state = JobState::Queued;
                    job.assigned_equipment_id = None;
                    requeue = Some((job.priority, job.rush_order));
                    warn!(
                        facility_id = %self.facility_id,
                        equipment_id = %equipment_id,
                        job_id = %job_id,
                        "移除执行中设备,作业回退队头"
                    );
                }
                if let Some((priority, rush)) = requeue {
                    self.queue.insert_front(&job_id, priority, rush);
                }
            }
        }
        Ok(instance)
    }

    /// 保养设备: 状态值恢复 100,BROKEN/停放状态清除
    pub fn maintain_equipment(&mut self, equipment_id: &str) -> EngineResult<()> {
        let occupied = self
            .slots
            .get(equipment_id)
            .map(|s| !s.is_idle())
            .unwrap_or(false);
        if occupied {
            return Err(EngineError::EquipmentBusy(equipment_id.to_string()));
        }
        let instance = self
            .equipment
            .get_mut(equipment_id)
            .ok_or_else(|| EngineError::UnknownEquipment(equipment_id.to_string()))?;
        instance.restore();
        info!(equipment_id = %equipment_id, "设备保养完成");
        Ok(())
    }

    /// 停放/恢复设备(宿主控制): 仅允许 AVAILABLE/RESERVED/MAINTENANCE 互转
    ///
    /// BROKEN 设备必须走保养;执行中设备不可变更。
    pub fn park_equipment(
        &mut self,
        equipment_id: &str,
        status: EquipmentStatus,
    ) -> EngineResult<()> {
        if !matches!(
            status,
            EquipmentStatus::Available | EquipmentStatus::Reserved | EquipmentStatus::Maintenance
        ) {
            return Err(EngineError::InvalidEquipmentStatus {
                equipment_id: equipment_id.to_string(),
                status: status.to_string(),
            });
        }
        let occupied = self
            .slots
            .get(equipment_id)
            .map(|s| !s.is_idle())
            .unwrap_or(false);
        if occupied {
            return Err(EngineError::EquipmentBusy(equipment_id.to_string()));
        }
        let instance = self
            .equipment
            .get_mut(equipment_id)
            .ok_or_else(|| EngineError::UnknownEquipment(equipment_id.to_string()))?;
        if instance.status == EquipmentStatus::Broken {
            return Err(EngineError::InvalidEquipmentStatus {
                equipment_id: equipment_id.to_string(),
                status: status.to_string(),
            });
        }
        instance.status = status;
        Ok(())
    }

    // ==========================================
    // 作业准入
    // ==========================================

    /// 创建作业并入队
    ///
    /// 未知方法/空方法/零数量大声报错;物料缺口不拒单,
    /// 作业保持排队,预留在每个 tick 开头原子重试。
    #[instrument(skip(self, catalog), fields(facility_id = %self.facility_id))]
    pub fn start_job(
        &mut self,
        catalog: &ReferenceCatalog,
        product_id: &str,
        method_id: &str,
        quantity: u32,
        priority: i32,
        rush_order: bool,
    ) -> EngineResult<String> {
        let method = catalog.method(method_id)?;
        if method.operations.is_empty() {
            return Err(EngineError::EmptyMethod(method_id.to_string()));
        }
        if quantity == 0 {
            return Err(EngineError::InvalidQuantity(quantity));
        }

        let job_id = Uuid::new_v4().to_string();
        let job = Job::new(
            &job_id,
            &self.facility_id,
            product_id,
            method_id,
            quantity,
            priority,
            rush_order,
            self.now,
        );
        self.jobs.insert(job_id.clone(), job);

        let reserved = self.try_reserve(catalog, &job_id)?;
        self.queue.insert(&job_id, priority, rush_order);

        info!(
            job_id = %job_id,
            method_id = %method_id,
            quantity,
            priority,
            rush_order,
            reserved,
            "作业已创建入队"
        );
        Ok(job_id)
    }

    /// 取消作业(同步生效)
    ///
    /// # 返回
    /// - `true`: 作业存在且非终态,已释放机台并全额回流作业库存
    /// - `false`: 作业未知或已终态,无副作用
    pub fn cancel_job(&mut self, job_id: &str) -> bool {
        let Some(mut job) = self.jobs.remove(job_id) else {
            return false;
        };

        // 释放占用机台
        if let Some(equipment_id) = job.assigned_equipment_id.take() {
            if let Some(slot) = self.slots.get_mut(&equipment_id) {
                slot.release();
            }
            self.free_equipment(&equipment_id);
        }
        self.queue.remove(job_id);

        job.state = JobState::Cancelled;
        info!(
            facility_id = %self.facility_id,
            job_id = %job_id,
            completed_ops = job.completed_operation_ids.len(),
            "作业已取消"
        );
        let recovered = self.finalize_job(job, None);
        self.pending_events.push(WorkspaceEvent::JobCancelled {
            job_id: job_id.to_string(),
            recovered_materials: recovered,
        });
        true
    }

    // ==========================================
    // tick 主循环
    // ==========================================

    /// 推进模拟时间
    ///
    /// 阶段顺序固定: 预留重试 → 完成结算 → 空闲指派。
    /// 本 tick 释放的机台在同一 tick 内即可被重新指派。
    ///
    /// # 返回
    /// tick 期间产生的全部事件(tick 主体结束后整体交付)
    #[instrument(skip(self, catalog), fields(facility_id = %self.facility_id))]
    pub fn advance(
        &mut self,
        catalog: &ReferenceCatalog,
        elapsed: SimTime,
    ) -> EngineResult<Vec<WorkspaceEvent>> {
        self.now += elapsed.max(0.0);

        // 1) 预留重试(队列顺序,先到先得稀缺物料)
        let queued = self.queued_ids();
        for job_id in &queued {
            if self.jobs.contains_key(job_id) {
                self.try_reserve(catalog, job_id)?;
            }
        }

        // 2) 完成结算(equipment_id 升序,顺序确定)
        let due: Vec<String> = self
            .slots
            .values()
            .filter(|s| s.is_due(self.now))
            .map(|s| s.equipment_id.clone())
            .collect();
        for equipment_id in due {
            self.resolve_completion(catalog, &equipment_id)?;
        }

        // 3) 空闲指派
        self.assign_queued(catalog)?;

        Ok(std::mem::take(&mut self.pending_events))
    }

    // ==========================================
    // 预留(全有或全无)
    // ==========================================

    /// 尝试把净物料清单从设施库存一次性移入作业库存
    ///
    /// 缺口时不移动任何物料,下个 tick 重试。
    fn try_reserve(&mut self, catalog: &ReferenceCatalog, job_id: &str) -> EngineResult<bool> {
        let job = self
            .jobs
            .get(job_id)
            .ok_or_else(|| EngineError::Internal(format!("预留目标作业不存在: {job_id}")))?;
        if job.materials_reserved {
            return Ok(true);
        }

        let method = catalog.method(&job.method_id)?;
        let bill = method.net_bill_of_materials(job.quantity);

        // 先整体校验,保证全有或全无
        for (item_type_id, required) in &bill {
            if self.inventory.quantity_of(item_type_id) < *required {
                debug!(
                    job_id = %job_id,
                    item_type_id = %item_type_id,
                    required,
                    available = self.inventory.quantity_of(item_type_id),
                    "物料缺口,预留推迟"
                );
                return Ok(false);
            }
        }

        // 逐类型移动,最高质量优先
        let mut moved: Vec<ItemInstance> = Vec::new();
        for (item_type_id, required) in &bill {
            let mut taken = self.inventory.take_best(item_type_id, *required, &[], None)?;
            moved.append(&mut taken);
        }

        let job = self
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| EngineError::Internal(format!("预留目标作业不存在: {job_id}")))?;
        for lot in moved {
            job.inventory.add_unchecked(lot);
        }
        job.materials_reserved = true;
        debug!(job_id = %job_id, "物料预留到位");
        Ok(true)
    }

    // ==========================================
    // 完成结算
    // ==========================================

    /// 结算一台到期机台上的工序
    fn resolve_completion(
        &mut self,
        catalog: &ReferenceCatalog,
        equipment_id: &str,
    ) -> EngineResult<()> {
        let Some(job_id) = self
            .slots
            .get(equipment_id)
            .and_then(|s| s.current_job().map(String::from))
        else {
            return Ok(());
        };

        // 参考数据与效率档位(以开工时点的状态值口径,损耗在结算后施加)
        let job = self
            .jobs
            .get(&job_id)
            .ok_or_else(|| EngineError::Internal(format!("槽位引用的作业不存在: {job_id}")))?;
        let method = catalog.method(&job.method_id)?;
        let op_index = job.current_op_index;
        let operation = method.operation(op_index).ok_or_else(|| {
            EngineError::Internal(format!("作业 {job_id} 工序下标越界: {op_index}"))
        })?;
        let operation_count = method.operation_count();

        let instance = self
            .equipment
            .get(equipment_id)
            .ok_or_else(|| EngineError::UnknownEquipment(equipment_id.to_string()))?;
        let definition = catalog.equipment_definition(&instance.definition_id)?;
        let available = instance
            .effective_capability(definition, &operation.requirement.category)
            .unwrap_or(0.0);
        let ratio = efficiency_ratio(available, &operation.requirement);
        let penalty = penalty_for_ratio(ratio);
        let decay = definition.condition_decay_per_op;

        // 执行(失败判定 + 物料转换)
        let executor = OperationExecutor::new();
        let job = self
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| EngineError::Internal(format!("槽位引用的作业不存在: {job_id}")))?;
        let outcome =
            executor.execute(operation, op_index, job, penalty, &mut self.rng, &self.config)?;

        // 施加设备损耗(每次结算一次,含返工)
        if let Some(instance) = self.equipment.get_mut(equipment_id) {
            instance.apply_wear(decay);
        }

        match outcome {
            OperationOutcome::ReworkRequired => {
                let broken = self
                    .equipment
                    .get(equipment_id)
                    .map(|e| e.status == EquipmentStatus::Broken)
                    .unwrap_or(true);
                if broken {
                    // 原机台已报废,作业回退队头重新竞争
                    if let Some(slot) = self.slots.get_mut(equipment_id) {
                        slot.release();
                    }
                    let mut requeue = None;
                    if let Some(job) = self.jobs.get_mut(&job_id) {
                        job.state = JobState::Queued;
                        job.assigned_equipment_id = None;
                        requeue = Some((job.priority, job.rush_order));
                    }
                    if let Some((priority, rush)) = requeue {
                        self.queue.insert_front(&job_id, priority, rush);
                    }
                    warn!(job_id = %job_id, equipment_id = %equipment_id, "返工遇设备报废,作业回退队头");
                } else {
                    // 原机台重试,进度清零(效率按损耗后的状态值重算)
                    let available = self
                        .equipment
                        .get(equipment_id)
                        .and_then(|e| {
                            e.effective_capability(definition, &operation.requirement.category)
                        })
                        .unwrap_or(0.0);
                    let ratio = efficiency_ratio(available, &operation.requirement);
                    let duration = scaled_duration(operation.base_duration, ratio);
                    let eta = self.now + duration;
                    if let Some(slot) = self.slots.get_mut(equipment_id) {
                        slot.restart(self.now, eta);
                    }
                    debug!(job_id = %job_id, equipment_id = %equipment_id, eta, "返工重试");
                }
            }
            OperationOutcome::Scrapped => {
                if let Some(slot) = self.slots.get_mut(equipment_id) {
                    slot.release();
                }
                self.free_equipment(equipment_id);
                let mut job = self
                    .jobs
                    .remove(&job_id)
                    .ok_or_else(|| EngineError::Internal(format!("作业不存在: {job_id}")))?;
                job.state = JobState::Failed;
                job.assigned_equipment_id = None;
                warn!(
                    job_id = %job_id,
                    operation_id = %operation.operation_id,
                    "工序报废,作业失败终止"
                );
                self.pending_events.push(WorkspaceEvent::JobFailed {
                    job_id: job_id.clone(),
                    product_id: job.product_id.clone(),
                    operation_id: operation.operation_id.clone(),
                });
                self.finalize_job(job, None);
            }
            OperationOutcome::Succeeded { downgraded } => {
                if let Some(slot) = self.slots.get_mut(equipment_id) {
                    slot.release();
                }
                self.free_equipment(equipment_id);

                let mut job = self
                    .jobs
                    .remove(&job_id)
                    .ok_or_else(|| EngineError::Internal(format!("作业不存在: {job_id}")))?;
                job.assigned_equipment_id = None;
                let has_more = job.advance_operation(&operation.operation_id, operation_count);
                debug!(
                    job_id = %job_id,
                    operation_id = %operation.operation_id,
                    downgraded,
                    has_more,
                    "工序完成"
                );

                if has_more {
                    // 回到排队态,竞争下一工序所需能力(工序不钉死机台)
                    job.state = JobState::Queued;
                    let (priority, rush) = (job.priority, job.rush_order);
                    self.jobs.insert(job_id.clone(), job);
                    self.queue.insert(&job_id, priority, rush);
                } else {
                    job.state = JobState::Completed;
                    info!(
                        facility_id = %self.facility_id,
                        job_id = %job_id,
                        product_id = %job.product_id,
                        quantity = job.quantity,
                        "作业全部工序完成"
                    );
                    self.pending_events.push(WorkspaceEvent::JobCompleted {
                        job_id: job_id.clone(),
                        product_id: job.product_id.clone(),
                        method_name: method.name.clone(),
                        quantity: job.quantity,
                    });
                    self.finalize_job(
                        job,
                        Some((&method.output_tags, method.quality_range)),
                    );
                }
            }
        }
        Ok(())
    }

    // ==========================================
    // 空闲指派
    // ==========================================

    /// 按队列顺序为可开工作业挑选最优适配机台
    ///
    /// 最优适配: 满足工序下限的空闲机台中,富余能力
    /// (available - minimum) 最小者;同富余取设备ID最小者。
    fn assign_queued(&mut self, catalog: &ReferenceCatalog) -> EngineResult<()> {
        let executor = OperationExecutor::new();
        let queued = self.queued_ids();

        for job_id in queued {
            let Some(job) = self.jobs.get(&job_id) else {
                continue;
            };
            if !job.materials_reserved {
                continue;
            }
            let method = catalog.method(&job.method_id)?;
            let Some(operation) = method.operation(job.current_op_index) else {
                return Err(EngineError::Internal(format!(
                    "作业 {job_id} 工序下标越界: {}",
                    job.current_op_index
                )));
            };
            if !executor.can_start(operation, &job.inventory, job.quantity) {
                continue;
            }

            // 最优适配扫描(BTreeMap 升序遍历,同富余自然取最小设备ID)
            let mut best: Option<(String, f64, f64)> = None; // (equipment_id, available, surplus)
            for (equipment_id, slot) in &self.slots {
                if !slot.is_idle() {
                    continue;
                }
                let Some(instance) = self.equipment.get(equipment_id) else {
                    continue;
                };
                if !instance.is_assignable() {
                    continue;
                }
                let definition = catalog.equipment_definition(&instance.definition_id)?;
                let Some(available) =
                    instance.effective_capability(definition, &operation.requirement.category)
                else {
                    continue;
                };
                if available < operation.requirement.minimum {
                    continue;
                }
                let surplus = available - operation.requirement.minimum;
                let better = match &best {
                    None => true,
                    Some((_, _, best_surplus)) => surplus < *best_surplus,
                };
                if better {
                    best = Some((equipment_id.clone(), available, surplus));
                }
            }

            let Some((equipment_id, available, _)) = best else {
                continue;
            };

            let ratio = efficiency_ratio(available, &operation.requirement);
            let duration = scaled_duration(operation.base_duration, ratio);
            let eta = self.now + duration;

            if let Some(slot) = self.slots.get_mut(&equipment_id) {
                slot.occupy(&job_id, self.now, eta);
            }
            if let Some(instance) = self.equipment.get_mut(&equipment_id) {
                instance.status = EquipmentStatus::InUse;
            }
            if let Some(job) = self.jobs.get_mut(&job_id) {
                job.state = JobState::InProgress;
                job.assigned_equipment_id = Some(equipment_id.clone());
            }
            self.queue.remove(&job_id);
            info!(
                job_id = %job_id,
                equipment_id = %equipment_id,
                ratio,
                eta,
                "指派作业上机"
            );
        }
        Ok(())
    }

    // ==========================================
    // 终态处理
    // ==========================================

    /// 终态作业收尾: 库存全额回流设施 + 有界归档
    ///
    /// # 参数
    /// - `finishing`: COMPLETED 作业的最终产品修饰
    ///   (追加方法输出标签,质量夹取到方法区间)
    ///
    /// # 返回
    /// 回流物料汇总(类型→件数)
    fn finalize_job(
        &mut self,
        mut job: Job,
        finishing: Option<(&[String], (f64, f64))>,
    ) -> BTreeMap<String, u32> {
        let mut recovered: BTreeMap<String, u32> = BTreeMap::new();
        for mut item in job.inventory.drain_all() {
            if let Some((output_tags, (quality_min, quality_max))) = finishing {
                if item.item_type_id == job.product_id {
                    for tag in output_tags {
                        if !item.tags.contains(tag) {
                            item.tags.push(tag.clone());
                        }
                    }
                    item.quality_pct = item.quality_pct.clamp(quality_min, quality_max);
                }
            }
            *recovered.entry(item.item_type_id.clone()).or_insert(0) += item.quantity;
            // 回流绕过容量上限: 回收物料永不丢弃
            self.inventory.add_unchecked(item);
        }

        self.archive.push_back(JobArchiveRecord {
            job_id: job.job_id.clone(),
            product_id: job.product_id.clone(),
            method_id: job.method_id.clone(),
            quantity: job.quantity,
            final_state: job.state,
            completed_operation_ids: job.completed_operation_ids.clone(),
            recovered_materials: recovered.clone(),
            archived_at_sim: self.now,
            archived_at: Utc::now(),
        });
        while self.archive.len() > self.config.archive_capacity {
            self.archive.pop_front();
        }
        recovered
    }

    /// 机台释放后的设备状态回置(BROKEN 保持,待保养)
    fn free_equipment(&mut self, equipment_id: &str) {
        if let Some(instance) = self.equipment.get_mut(equipment_id) {
            if instance.status == EquipmentStatus::InUse {
                instance.status = EquipmentStatus::Available;
            }
        }
    }
}
