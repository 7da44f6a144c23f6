// ==========================================
// 折扣测算系统 - 配置层
// ==========================================
// 职责: YAML 配置加载，基础配置 + 用户覆写
// ==========================================

pub mod app_config;
pub mod config_manager;
pub mod error;
pub mod insumo_config_trait;

// 重导出核心配置类型
pub use app_config::{
    AppConfig, ColumnMapping, ConcepHerrConfig, FetchConfig, LateralVarConfig,
    PreprocessorConfig, SessionKeysConfig,
};
pub use config_manager::{default_overlay_path, ConfigManager, EDITABLE_FILE_NAME};
pub use error::{ConfigError, ConfigResult};
pub use insumo_config_trait::InsumoConfigReader;
