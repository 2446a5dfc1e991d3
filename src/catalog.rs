// ==========================================
// 车间排产执行引擎 - 静态参考数据目录
// ==========================================
// 红线: 不做进程级全局注册表;目录句柄由调用方显式传入
// 说明: 独立的模拟实例(含测试)各持一份目录,互不干扰
// 用途: 设备定义与工艺方法的只读查询
// ==========================================

use crate::domain::equipment::EquipmentDefinition;
use crate::domain::operation::Method;
use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// ReferenceCatalog - 参考数据目录
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceCatalog {
    equipment_definitions: BTreeMap<String, EquipmentDefinition>,
    methods: BTreeMap<String, Method>,
}

impl ReferenceCatalog {
    /// 创建空目录
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================
    // 装载方法(启动期一次性调用)
    // ==========================================

    /// 登记设备定义(同ID覆盖)
    pub fn register_equipment_definition(&mut self, definition: EquipmentDefinition) {
        self.equipment_definitions
            .insert(definition.definition_id.clone(), definition);
    }

    /// 登记工艺方法(同ID覆盖)
    pub fn register_method(&mut self, method: Method) {
        self.methods.insert(method.method_id.clone(), method);
    }

    // ==========================================
    // 查询方法
    // ==========================================

    /// 按ID查询设备定义
    pub fn equipment_definition(&self, definition_id: &str) -> EngineResult<&EquipmentDefinition> {
        self.equipment_definitions
            .get(definition_id)
            .ok_or_else(|| EngineError::UnknownEquipmentDefinition(definition_id.to_string()))
    }

    /// 按ID查询工艺方法
    pub fn method(&self, method_id: &str) -> EngineResult<&Method> {
        self.methods
            .get(method_id)
            .ok_or_else(|| EngineError::UnknownMethod(method_id.to_string()))
    }

    /// 已登记的方法数量
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// 已登记的设备定义数量
    pub fn equipment_definition_count(&self) -> usize {
        self.equipment_definitions.len()
    }
}
