// ==========================================
// 折扣测算系统 - 表格解析 Trait
// ==========================================
// 职责: 定义文件/缓冲区 → Table 的解析接口（不包含实现）
// ==========================================

use crate::domain::table::Table;
use crate::importer::error::ImportResult;
use std::path::Path;

// ==========================================
// TableParser Trait
// ==========================================
// 用途: 文件解析接口
// 实现者: CsvParser, ExcelParser
pub trait TableParser: Send + Sync {
    /// 解析文件为表格
    ///
    /// # 参数
    /// - file_path: 文件路径
    ///
    /// # 返回
    /// - Ok(Table): 全部单元格为文本（已 TRIM，空值为 Null）
    /// - Err: 文件不存在、扩展名不符、格式错误
    fn parse_file(&self, file_path: &Path) -> ImportResult<Table>;

    /// 解析内存缓冲区（上传文件）
    ///
    /// # 参数
    /// - name: 原始文件名（用于日志与错误信息）
    /// - bytes: 文件内容
    fn parse_bytes(&self, name: &str, bytes: &[u8]) -> ImportResult<Table>;
}
