// ==========================================
// 折扣测算系统 - 导出层
// ==========================================
// 职责: 计算结果 → XLSX / CSV
// ==========================================

pub mod error;
pub mod table_exporter;

pub use error::{ExportError, ExportResult};
pub use table_exporter::{export_csv, export_xlsx, export_xlsx_bytes, SHEET_NAME};
