// ==========================================
// 折扣测算系统 - 导入层
// ==========================================
// 职责: 上传文件 / 远程 JSON → 内存表格
// 支持: Excel (.xlsx), CSV, JSON 行数据
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod error;
pub mod file_parser;
pub mod json_parser;
pub mod table_parser_trait;

// 重导出核心类型
pub use data_cleaner::DataCleaner;
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use json_parser::JsonRowsParser;

// 重导出 Trait 接口
pub use table_parser_trait::TableParser;
