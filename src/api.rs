// ==========================================
// 车间排产执行引擎 - 对外接口层
// ==========================================
// 职责: 多设施工作区编排 + 静态参考数据句柄持有
// 红线: 未知设施/方法/设备ID大声报错,不静默忽略
// 红线: 引擎不自带节拍,tick 节奏由宿主负责
// ==========================================

use crate::catalog::ReferenceCatalog;
use crate::config::EngineConfig;
use crate::domain::equipment::EquipmentInstance;
use crate::domain::inventory::Inventory;
use crate::domain::types::{EquipmentStatus, SimTime};
use crate::error::{EngineError, EngineResult};
use crate::workspace::{Workspace, WorkspaceEvent};
use std::collections::BTreeMap;
use tracing::info;

// ==========================================
// SchedulingApi - 调度引擎门面
// ==========================================
// 参考数据目录由构造方传入并全程只读;各设施工作区完全独立
pub struct SchedulingApi {
    catalog: ReferenceCatalog,
    config: EngineConfig,
    workspaces: BTreeMap<String, Workspace>,
}

impl SchedulingApi {
    /// 创建引擎门面
    pub fn new(catalog: ReferenceCatalog, config: EngineConfig) -> Self {
        Self {
            catalog,
            config: config.sanitized(),
            workspaces: BTreeMap::new(),
        }
    }

    /// 参考数据目录(只读)
    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    // ==========================================
    // 设施管理
    // ==========================================

    /// 建立设施工作区
    pub fn create_facility(
        &mut self,
        facility_id: &str,
        inventory_capacity: Option<u32>,
    ) -> EngineResult<()> {
        if self.workspaces.contains_key(facility_id) {
            return Err(EngineError::FacilityAlreadyExists(facility_id.to_string()));
        }
        info!(facility_id = %facility_id, "建立设施工作区");
        self.workspaces.insert(
            facility_id.to_string(),
            Workspace::new(facility_id, inventory_capacity, self.config.clone()),
        );
        Ok(())
    }

    /// 设施工作区(只读,快照导出入口)
    pub fn workspace(&self, facility_id: &str) -> EngineResult<&Workspace> {
        self.workspaces
            .get(facility_id)
            .ok_or_else(|| EngineError::UnknownFacility(facility_id.to_string()))
    }

    /// 恢复设施工作区(快照导入入口,同ID覆盖)
    ///
    /// 快照只含运行态;设备定义/工艺方法从目录重新解析。
    pub fn restore_workspace(&mut self, workspace: Workspace) {
        info!(facility_id = %workspace.facility_id(), "恢复设施工作区");
        self.workspaces
            .insert(workspace.facility_id().to_string(), workspace);
    }

    /// 设施库存(可写,宿主入库/出库用)
    pub fn facility_inventory_mut(&mut self, facility_id: &str) -> EngineResult<&mut Inventory> {
        Ok(self.workspace_mut(facility_id)?.inventory_mut())
    }

    // ==========================================
    // 设备管理
    // ==========================================

    /// 新增设备实例
    pub fn add_equipment(
        &mut self,
        facility_id: &str,
        instance: EquipmentInstance,
    ) -> EngineResult<()> {
        let catalog = &self.catalog;
        let workspace = self
            .workspaces
            .get_mut(facility_id)
            .ok_or_else(|| EngineError::UnknownFacility(facility_id.to_string()))?;
        workspace.add_equipment(catalog, instance)
    }

    /// 移除设备实例(执行中作业回退队头)
    pub fn remove_equipment(
        &mut self,
        facility_id: &str,
        equipment_id: &str,
    ) -> EngineResult<EquipmentInstance> {
        self.workspace_mut(facility_id)?.remove_equipment(equipment_id)
    }

    /// 保养设备
    pub fn maintain_equipment(
        &mut self,
        facility_id: &str,
        equipment_id: &str,
    ) -> EngineResult<()> {
        self.workspace_mut(facility_id)?.maintain_equipment(equipment_id)
    }

    /// 停放/恢复设备
    pub fn park_equipment(
        &mut self,
        facility_id: &str,
        equipment_id: &str,
        status: EquipmentStatus,
    ) -> EngineResult<()> {
        self.workspace_mut(facility_id)?.park_equipment(equipment_id, status)
    }

    // ==========================================
    // 作业接口
    // ==========================================

    /// 创建作业
    ///
    /// 未知设施/方法报错不建单;物料缺口不拒单,作业保持排队直到可满足。
    pub fn start_job(
        &mut self,
        facility_id: &str,
        product_id: &str,
        method_id: &str,
        quantity: u32,
        priority: i32,
        rush_order: bool,
    ) -> EngineResult<String> {
        let catalog = &self.catalog;
        let workspace = self
            .workspaces
            .get_mut(facility_id)
            .ok_or_else(|| EngineError::UnknownFacility(facility_id.to_string()))?;
        workspace.start_job(catalog, product_id, method_id, quantity, priority, rush_order)
    }

    /// 取消作业(同步生效)
    ///
    /// # 返回
    /// - `Ok(false)`: 作业未知或已终态,无副作用
    pub fn cancel_job(&mut self, facility_id: &str, job_id: &str) -> EngineResult<bool> {
        Ok(self.workspace_mut(facility_id)?.cancel_job(job_id))
    }

    /// 推进设施模拟时间,返回 tick 产生的事件
    pub fn advance(
        &mut self,
        facility_id: &str,
        elapsed: SimTime,
    ) -> EngineResult<Vec<WorkspaceEvent>> {
        let catalog = &self.catalog;
        let workspace = self
            .workspaces
            .get_mut(facility_id)
            .ok_or_else(|| EngineError::UnknownFacility(facility_id.to_string()))?;
        workspace.advance(catalog, elapsed)
    }

    /// 停滞作业诊断(引擎永不自行超时淘汰)
    pub fn stalled_jobs(&self, facility_id: &str) -> EngineResult<Vec<String>> {
        self.workspace(facility_id)?.stalled_jobs(&self.catalog)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn workspace_mut(&mut self, facility_id: &str) -> EngineResult<&mut Workspace> {
        self.workspaces
            .get_mut(facility_id)
            .ok_or_else(|| EngineError::UnknownFacility(facility_id.to_string()))
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::equipment::{CapabilityTag, EquipmentDefinition};
    use crate::domain::item::ItemInstance;
    use crate::domain::operation::{
        CapabilityRequirement, ConsumptionRule, Method, Operation, OutputQuality, ProductionRule,
    };
    use crate::domain::types::{FailurePolicy, JobState};

    fn create_test_catalog() -> ReferenceCatalog {
        let mut catalog = ReferenceCatalog::new();
        catalog.register_equipment_definition(EquipmentDefinition {
            definition_id: "DEF_MILL".to_string(),
            name: "立式铣床".to_string(),
            capabilities: vec![CapabilityTag::numeric("MILLING", 30.0, false)],
            footprint: 6.0,
            acquisition_cost: 12000.0,
            condition_decay_per_op: 0.0,
        });
        catalog.register_method(Method {
            method_id: "M_PART".to_string(),
            name: "简单零件".to_string(),
            product_id: "part".to_string(),
            operations: vec![Operation {
                operation_id: "OP_MILL".to_string(),
                name: "铣削".to_string(),
                requirement: CapabilityRequirement {
                    category: "MILLING".to_string(),
                    minimum: 10.0,
                    optimal: Some(30.0),
                },
                base_duration: 60.0,
                consumes: vec![ConsumptionRule {
                    item_type_id: "steel_bar".to_string(),
                    count_per_unit: 1,
                    required_tags: vec![],
                    max_quality_pct: None,
                }],
                produces: vec![ProductionRule {
                    item_type_id: "part".to_string(),
                    count_per_unit: 1,
                    tags: vec![],
                    quality: OutputQuality::InheritInputs,
                }],
                failure_chance: 0.0,
                failure_policy: FailurePolicy::Scrap,
            }],
            output_tags: vec![],
            quality_range: (0.0, 100.0),
        });
        catalog
    }

    fn create_test_api() -> SchedulingApi {
        SchedulingApi::new(create_test_catalog(), EngineConfig::default())
    }

    #[test]
    fn test_unknown_facility_rejected_loudly() {
        let mut api = create_test_api();
        assert!(matches!(
            api.start_job("FAC_NONE", "part", "M_PART", 1, 5, false),
            Err(EngineError::UnknownFacility(_))
        ));
        assert!(matches!(
            api.advance("FAC_NONE", 1.0),
            Err(EngineError::UnknownFacility(_))
        ));
        assert!(matches!(
            api.cancel_job("FAC_NONE", "J1"),
            Err(EngineError::UnknownFacility(_))
        ));
    }

    #[test]
    fn test_duplicate_facility_rejected() {
        let mut api = create_test_api();
        api.create_facility("FAC1", None).unwrap();
        assert!(matches!(
            api.create_facility("FAC1", None),
            Err(EngineError::FacilityAlreadyExists(_))
        ));
    }

    #[test]
    fn test_facilities_are_fully_independent() {
        let mut api = create_test_api();
        api.create_facility("FAC1", None).unwrap();
        api.create_facility("FAC2", None).unwrap();

        api.add_equipment("FAC1", EquipmentInstance::new("EQ1", "DEF_MILL", "FAC1")).unwrap();
        api.add_equipment("FAC2", EquipmentInstance::new("EQ2", "DEF_MILL", "FAC2")).unwrap();
        api.facility_inventory_mut("FAC1")
            .unwrap()
            .add(ItemInstance::new("steel_bar", 5, vec![], 90.0))
            .unwrap();

        // FAC2 无钢材: 同样的作业在 FAC1 开工,在 FAC2 停滞
        let job1 = api.start_job("FAC1", "part", "M_PART", 1, 5, false).unwrap();
        let job2 = api.start_job("FAC2", "part", "M_PART", 1, 5, false).unwrap();
        api.advance("FAC1", 0.0).unwrap();
        api.advance("FAC2", 0.0).unwrap();

        assert_eq!(
            api.workspace("FAC1").unwrap().job(&job1).unwrap().state,
            JobState::InProgress
        );
        assert_eq!(
            api.workspace("FAC2").unwrap().job(&job2).unwrap().state,
            JobState::Queued
        );
        assert_eq!(api.stalled_jobs("FAC2").unwrap(), vec![job2]);
        assert!(api.stalled_jobs("FAC1").unwrap().is_empty());
    }

    #[test]
    fn test_equipment_facility_mismatch_rejected() {
        let mut api = create_test_api();
        api.create_facility("FAC1", None).unwrap();
        assert!(matches!(
            api.add_equipment("FAC1", EquipmentInstance::new("EQ1", "DEF_MILL", "FAC2")),
            Err(EngineError::FacilityMismatch { .. })
        ));
    }

    #[test]
    fn test_equipment_lifecycle_through_facade() {
        let mut api = create_test_api();
        api.create_facility("FAC1", None).unwrap();
        api.add_equipment("FAC1", EquipmentInstance::new("EQ1", "DEF_MILL", "FAC1")).unwrap();

        api.park_equipment("FAC1", "EQ1", EquipmentStatus::Reserved).unwrap();
        assert_eq!(
            api.workspace("FAC1").unwrap().equipment("EQ1").unwrap().status,
            EquipmentStatus::Reserved
        );

        api.maintain_equipment("FAC1", "EQ1").unwrap();
        assert_eq!(
            api.workspace("FAC1").unwrap().equipment("EQ1").unwrap().status,
            EquipmentStatus::Available
        );

        let removed = api.remove_equipment("FAC1", "EQ1").unwrap();
        assert_eq!(removed.equipment_id, "EQ1");
        assert!(matches!(
            api.remove_equipment("FAC1", "EQ1"),
            Err(EngineError::UnknownEquipment(_))
        ));
    }
}
