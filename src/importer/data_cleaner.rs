// ==========================================
// 折扣测算系统 - 数据清洗器实现
// ==========================================
// 职责: 去空格 / NULL 标准化 / 空值占位填充
// ==========================================

use crate::domain::table::{CellValue, Table};
use crate::importer::error::ImportResult;
use tracing::debug;

pub struct DataCleaner;

impl DataCleaner {
    /// 清理文本（TRIM）
    pub fn clean_text(&self, value: &str) -> String {
        value.trim().to_string()
    }

    /// 空白字符串 → None
    pub fn normalize_null(&self, value: Option<String>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    /// 删除指定列中的全部空格（不只是首尾）
    pub fn strip_spaces<S: AsRef<str>>(&self, table: &Table, columns: &[S]) -> ImportResult<Table> {
        let indexes = table.require_columns(columns)?;
        let mut cleaned = table.clone();

        for (name, idx) in columns.iter().zip(indexes) {
            cleaned.derive_column(name.as_ref(), |_, row| match &row[idx] {
                CellValue::Text(s) => CellValue::from_raw(&s.replace(' ', "")),
                other => other.clone(),
            })?;
        }

        debug!(columns = columns.len(), "已删除列内空格");
        Ok(cleaned)
    }

    /// 指定文本列中的 Null 替换为占位值
    pub fn fill_nulls<S: AsRef<str>>(
        &self,
        table: &Table,
        columns: &[S],
        placeholder: &str,
    ) -> ImportResult<Table> {
        let indexes = table.require_columns(columns)?;
        let mut filled = table.clone();

        for (name, idx) in columns.iter().zip(indexes) {
            filled.derive_column(name.as_ref(), |_, row| {
                if row[idx].is_null() {
                    CellValue::text(placeholder)
                } else {
                    row[idx].clone()
                }
            })?;
        }
        Ok(filled)
    }
}
