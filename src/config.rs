// ==========================================
// 车间排产执行引擎 - 引擎配置
// ==========================================
// 用途: 工作区构造时显式传入,不做进程级全局配置
// 红线: 同一份配置在整个工作区生命周期内不变
// ==========================================

use serde::{Deserialize, Serialize};

/// 降级失败策略的质量惩罚系数下限/上限
///
/// 降级系数必须落在该区间内,越界的配置在构造时被夹取。
pub const DOWNGRADE_FACTOR_MIN: f64 = 0.7;
pub const DOWNGRADE_FACTOR_MAX: f64 = 0.8;

// ==========================================
// EngineConfig - 引擎可调参数
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 降级失败策略的质量惩罚系数(0.7-0.8)
    pub downgrade_quality_factor: f64,

    /// 终态作业归档日志容量(FIFO,超出淘汰最老记录)
    pub archive_capacity: usize,

    /// 失败判定随机数种子(同种子同输入则全程可复现)
    pub rng_seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            downgrade_quality_factor: 0.75,
            archive_capacity: 64,
            rng_seed: 0x574B_5350, // "WKSP"
        }
    }
}

impl EngineConfig {
    /// 夹取非法参数,返回可安全使用的配置
    ///
    /// # 返回
    /// 降级系数被夹取到 [0.7, 0.8] 区间后的配置
    pub fn sanitized(mut self) -> Self {
        self.downgrade_quality_factor = self
            .downgrade_quality_factor
            .clamp(DOWNGRADE_FACTOR_MIN, DOWNGRADE_FACTOR_MAX);
        if self.archive_capacity == 0 {
            self.archive_capacity = 1;
        }
        self
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_in_band() {
        let config = EngineConfig::default();
        assert!(config.downgrade_quality_factor >= DOWNGRADE_FACTOR_MIN);
        assert!(config.downgrade_quality_factor <= DOWNGRADE_FACTOR_MAX);
        assert!(config.archive_capacity > 0);
    }

    #[test]
    fn test_sanitize_clamps_out_of_band_factor() {
        let config = EngineConfig {
            downgrade_quality_factor: 0.3,
            archive_capacity: 0,
            ..EngineConfig::default()
        }
        .sanitized();

        assert_eq!(config.downgrade_quality_factor, DOWNGRADE_FACTOR_MIN);
        assert_eq!(config.archive_capacity, 1);
    }
}
