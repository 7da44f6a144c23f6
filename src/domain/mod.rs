// ==========================================
// 折扣测算系统 - 领域层
// ==========================================
// 职责: 表格模型、折扣场景、活动窗口、公共类型
// ==========================================

pub mod scenario;
pub mod table;
pub mod types;

// 重导出核心类型
pub use scenario::{scenarios_to_table, DiscountScenario, EventWindow, ScenarioError};
pub use table::{CellValue, Table, TableError, TableResult};
pub use types::{columns, DiscountRange, DEFAULT_SEPARATOR, DIAS_MES};
