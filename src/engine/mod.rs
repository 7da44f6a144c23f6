// ==========================================
// 折扣测算系统 - 引擎层
// ==========================================
// 职责: 表格变换、折扣计算流程、汇总、销量/价格预处理
// 约束: 引擎只处理内存表格，不做文件读写
// ==========================================

pub mod aggregator;
pub mod concat;
pub mod error;
pub mod insumo;
pub mod preprocessor;
pub mod range_parser;
pub mod table_ops;

// 重导出核心引擎
pub use aggregator::{mean_columns, sum_columns, Totals};
pub use concat::concat_columns;
pub use error::{EngineError, EngineResult};
pub use insumo::{InsumoProcessor, PipelineOptions};
pub use preprocessor::SalesPreprocessor;
pub use range_parser::{discount_labels, discount_options, RangeParser};
pub use table_ops::{
    filter_by_values, group_by, left_join, melt, rename_columns, replace_by_mapping, select,
    AggOp,
};
