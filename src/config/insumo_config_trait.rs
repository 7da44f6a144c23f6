// ==========================================
// 折扣测算系统 - 计算配置读取 Trait
// ==========================================
// 职责: 定义计算流程所需的配置读取接口（不包含实现）
// 约束: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::app_config::{ColumnMapping, PreprocessorConfig};
use crate::config::error::ConfigResult;
use crate::domain::types::DiscountRange;

// ==========================================
// InsumoConfigReader Trait
// ==========================================
// 用途: 计算流程 / 预处理所需的配置读取接口
// 实现者: ConfigManager（YAML 基础配置 + 用户覆写）
pub trait InsumoConfigReader: Send + Sync {
    /// 逻辑字段 → 实际列名
    ///
    /// # 默认值
    /// - 逻辑字段名本身
    fn column_mapping(&self) -> ConfigResult<ColumnMapping>;

    /// 与场景表关联时从基础表选取的列
    fn insumo_columns(&self) -> ConfigResult<Vec<String>>;

    /// 区间标签无法解析时使用的区间
    ///
    /// # 默认值
    /// - (5, 10)
    fn default_range(&self) -> ConfigResult<DiscountRange>;

    /// 增长百分比输入的 (最小值, 最大值)
    ///
    /// # 默认值
    /// - (0, 100)
    fn growth_bounds(&self) -> ConfigResult<(f64, f64)>;

    /// 预处理列配置
    fn preprocessor(&self) -> ConfigResult<PreprocessorConfig>;
}
