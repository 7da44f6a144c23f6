// ==========================================
// 折扣测算系统 - 核心库
// ==========================================
// 技术栈: Rust + calamine/csv + serde_yaml
// 系统定位: 折扣活动测算（分析人员确认参数与场景）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "es");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 表格模型与场景
pub mod domain;

// 引擎层 - 表格变换与计算流程
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 导出层 - 计算结果输出
pub mod exporter;

// 配置层 - 系统配置
pub mod config;

// 会话层 - 单用户会话状态
pub mod session;

// 远程数据 - HTTP + 缓存
pub mod fetch;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域
pub use domain::{
    columns, CellValue, DiscountRange, DiscountScenario, EventWindow, Table, TableError,
};

// 引擎
pub use engine::{InsumoProcessor, PipelineOptions, RangeParser, SalesPreprocessor};

// 配置 / 会话
pub use config::{AppConfig, ConfigManager};
pub use session::{DiscountSession, SessionContext};

// API
pub use api::{ApiError, ApiResult, DiscountApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Planificador de descuentos";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
